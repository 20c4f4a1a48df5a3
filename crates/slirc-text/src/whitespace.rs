//! Whitespace preservation for Discord.
//!
//! Discord trims message content, so a line of three spaces would arrive as
//! nothing at all. Wrapping such content in zero-width spaces keeps it intact.

use std::borrow::Cow;

/// U+200B ZERO WIDTH SPACE.
pub const ZERO_WIDTH_SPACE: char = '\u{200B}';

/// Wrap `content` in zero-width spaces if it is empty or has leading or
/// trailing whitespace.
///
/// ```
/// use slirc_text::whitespace::preserve_whitespace;
///
/// assert_eq!(preserve_whitespace("   "), "\u{200B}   \u{200B}");
/// assert_eq!(preserve_whitespace("tidy"), "tidy");
/// ```
pub fn preserve_whitespace(content: &str) -> Cow<'_, str> {
    if !content.is_empty() && content.trim() == content {
        return Cow::Borrowed(content);
    }
    let mut wrapped = String::with_capacity(content.len() + 2 * ZERO_WIDTH_SPACE.len_utf8());
    wrapped.push(ZERO_WIDTH_SPACE);
    wrapped.push_str(content);
    wrapped.push(ZERO_WIDTH_SPACE);
    Cow::Owned(wrapped)
}
