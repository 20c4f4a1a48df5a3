//! Nickname sanitisation.
//!
//! Discord usernames are arbitrary Unicode; IRC nicknames are not. This module
//! maps one onto the other following the charybdis `NICK_C` character table:
//!
//! - letters and digits
//! - hyphen, except in first position
//! - the specials ``[ ] \ ` ^ _ { | }``
//!
//! The result is a *candidate*. Length limits and collisions are the server's
//! business when relay-spoofing is in use.

use std::backtrace::Backtrace;

use deunicode::deunicode_with_tofu;
use tracing::error;

/// Character substituted for anything that cannot appear in a nickname.
pub const PLACEHOLDER: char = '_';

/// Check whether a character may appear in a nickname (outside first position).
#[inline]
pub fn is_nick_char(c: char) -> bool {
    c.is_ascii_alphanumeric()
        || matches!(
            c,
            '-' | '[' | ']' | '\\' | '`' | '^' | '_' | '{' | '|' | '}'
        )
}

/// Check whether the whole string is already a legal nickname.
pub fn is_legal_nick(nick: &str) -> bool {
    match nick.chars().next() {
        None => false,
        Some(first) if first == '-' || first.is_ascii_digit() => false,
        Some(_) => nick.chars().all(is_nick_char),
    }
}

/// Convert an arbitrary display name into a legal IRC nickname.
///
/// - Empty input is a caller defect: it is logged and [`PLACEHOLDER`] is returned.
/// - The name is transliterated to ASCII; if that leaves nothing (e.g. a name made
///   only of pictographs) the original is kept and the next step scrubs it.
/// - A leading digit or hyphen gets a placeholder prefix.
/// - Every run of illegal characters collapses into a single placeholder.
///
/// The function is idempotent and never returns an empty string.
///
/// # Examples
///
/// ```
/// use slirc_text::nick::sanitize_nickname;
///
/// assert_eq!(sanitize_nickname("Bob"), "Bob");
/// assert_eq!(sanitize_nickname("9lives"), "_9lives");
/// assert_eq!(sanitize_nickname("a  b"), "a_b");
/// assert_eq!(sanitize_nickname("Zoë"), "Zoe");
/// ```
pub fn sanitize_nickname(raw: &str) -> String {
    if raw.is_empty() {
        error!(
            backtrace = %Backtrace::force_capture(),
            "asked to sanitise an empty nickname"
        );
        return PLACEHOLDER.to_string();
    }

    let transliterated = deunicode_with_tofu(raw, "");
    let mut nick = if transliterated.is_empty() {
        raw.to_owned()
    } else {
        transliterated
    };

    if nick.starts_with('-') || nick.starts_with(|c: char| c.is_ascii_digit()) {
        nick.insert(0, PLACEHOLDER);
    }

    let mut out = String::with_capacity(nick.len());
    let mut in_bad_run = false;
    for c in nick.chars() {
        if is_nick_char(c) {
            out.push(c);
            in_bad_run = false;
        } else if !in_bad_run {
            out.push(PLACEHOLDER);
            in_bad_run = true;
        }
    }

    out
}
