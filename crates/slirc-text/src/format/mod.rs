//! IRC formatting codes to Discord markdown.
//!
//! Conversion is split in two pure steps so each can be tested alone:
//!
//! - [`parse`] walks the control codes and produces a list of [`Block`]s, each a
//!   run of text with one [`Style`].
//! - [`render_markdown`] turns blocks into markdown.
//!
//! # IRC Format Codes
//! - 0x02 (^B): Bold
//! - 0x03 (^C): Color (followed by optional foreground,background)
//! - 0x04: Hex color (followed by optional RRGGBB[,RRGGBB])
//! - 0x0F (^O): Reset all formatting
//! - 0x11: Monospace
//! - 0x16 (^V): Reverse/Inverse
//! - 0x1D: Italic
//! - 0x1E: Strikethrough
//! - 0x1F (^_): Underline
//!
//! Reference: <https://modern.ircdocs.horse/formatting>

mod markdown;
mod parse;

pub use markdown::render_markdown;
pub use parse::parse;

/// A colour as carried by `^C` (palette index) or `0x04` (RGB).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Color {
    /// Index into the 99-entry mIRC palette.
    Palette(u8),
    /// 24-bit colour.
    Rgb(u32),
}

/// Formatting state in effect for a run of text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Style {
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub strikethrough: bool,
    pub monospace: bool,
    pub reverse: bool,
    pub foreground: Option<Color>,
    pub background: Option<Color>,
}

impl Style {
    /// True when the style has nothing markdown can express.
    pub fn is_plain(&self) -> bool {
        !(self.bold || self.italic || self.underline || self.strikethrough || self.monospace)
    }
}

/// A run of text sharing one style.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub style: Style,
    pub text: String,
}

/// Convert an IRC line straight to markdown.
///
/// ```
/// use slirc_text::format::irc_to_markdown;
///
/// assert_eq!(irc_to_markdown("\x02hello\x02 world"), "**hello** world");
/// assert_eq!(irc_to_markdown("\x0304red\x03 text"), "red text");
/// ```
pub fn irc_to_markdown(line: &str) -> String {
    render_markdown(&parse(line))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_examples() {
        assert_eq!(irc_to_markdown("plain"), "plain");
        assert_eq!(irc_to_markdown("\x1Ditalic\x0F normal"), "*italic* normal");
        assert_eq!(
            irc_to_markdown("\x02\x1Fbold underline\x0F"),
            "**__bold underline__**"
        );
        assert_eq!(irc_to_markdown("\x11code\x11"), "`code`");
    }

    #[test]
    fn test_style_is_plain() {
        let mut style = Style::default();
        assert!(style.is_plain());
        style.foreground = Some(Color::Palette(4));
        assert!(style.is_plain());
        style.strikethrough = true;
        assert!(!style.is_plain());
    }
}
