//! Channel-name folding and classification.
//!
//! IRC servers compare channel names with the `rfc1459` case mapping, in which
//! `[]\~` are the uppercase forms of `{}|^`. The bridge uses the same folding
//! for its mapping index so that `#Rust` and `#rust` resolve to one mapping.

/// Fold one character with the `rfc1459` case mapping.
#[inline]
pub const fn fold_char(c: char) -> char {
    match c {
        'A'..='Z' => (c as u8 + 32) as char,
        '[' => '{',
        ']' => '}',
        '\\' => '|',
        '~' => '^',
        _ => c,
    }
}

/// Fold a channel name (or nick) to its canonical lookup key.
pub fn fold(name: &str) -> String {
    name.chars().map(fold_char).collect()
}

/// Compare two names under the `rfc1459` case mapping without allocating.
pub fn eq_folded(a: &str, b: &str) -> bool {
    let mut left = a.chars().map(fold_char);
    let mut right = b.chars().map(fold_char);
    loop {
        match (left.next(), right.next()) {
            (None, None) => return true,
            (Some(x), Some(y)) if x == y => {}
            _ => return false,
        }
    }
}

/// Whether a message target names a channel rather than a user.
///
/// Only the sigil is inspected: the server has already validated the rest.
#[inline]
pub fn is_channel_target(target: &str) -> bool {
    matches!(target.chars().next(), Some('#' | '&' | '+' | '!'))
}
