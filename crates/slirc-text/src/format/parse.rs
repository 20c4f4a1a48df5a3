//! Control-code walker producing styled [`Block`]s.

use std::iter::Peekable;
use std::str::Chars;

use super::{Block, Color, Style};

const BOLD: char = '\x02';
const COLOR: char = '\x03';
const HEX_COLOR: char = '\x04';
const RESET: char = '\x0F';
const MONOSPACE: char = '\x11';
const REVERSE: char = '\x16';
const ITALIC: char = '\x1D';
const STRIKETHROUGH: char = '\x1E';
const UNDERLINE: char = '\x1F';

/// Parse an IRC line into styled blocks.
///
/// Control codes never appear in block text. Adjacent runs with the same style
/// are merged, so toggling a code on and off with nothing in between leaves no
/// trace.
pub fn parse(line: &str) -> Vec<Block> {
    let mut blocks = Vec::new();
    let mut style = Style::default();
    let mut text = String::new();
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        let next = match c {
            BOLD => Style {
                bold: !style.bold,
                ..style
            },
            ITALIC => Style {
                italic: !style.italic,
                ..style
            },
            UNDERLINE => Style {
                underline: !style.underline,
                ..style
            },
            STRIKETHROUGH => Style {
                strikethrough: !style.strikethrough,
                ..style
            },
            MONOSPACE => Style {
                monospace: !style.monospace,
                ..style
            },
            REVERSE => Style {
                reverse: !style.reverse,
                ..style
            },
            RESET => Style::default(),
            COLOR => apply_colors(style, read_palette_pair(&mut chars)),
            HEX_COLOR => apply_colors(style, read_hex_pair(&mut chars)),
            _ => {
                text.push(c);
                continue;
            }
        };

        if next != style {
            flush(&mut blocks, style, &mut text);
            style = next;
        }
    }

    flush(&mut blocks, style, &mut text);
    blocks
}

/// A bare colour code resets both colours; otherwise only what was given changes.
fn apply_colors(style: Style, pair: Option<(Color, Option<Color>)>) -> Style {
    match pair {
        None => Style {
            foreground: None,
            background: None,
            ..style
        },
        Some((fg, bg)) => Style {
            foreground: Some(fg),
            background: bg.or(style.background),
            ..style
        },
    }
}

fn flush(blocks: &mut Vec<Block>, style: Style, text: &mut String) {
    if text.is_empty() {
        return;
    }
    match blocks.last_mut() {
        Some(last) if last.style == style => last.text.push_str(text),
        _ => blocks.push(Block {
            style,
            text: text.clone(),
        }),
    }
    text.clear();
}

fn read_palette_pair(chars: &mut Peekable<Chars<'_>>) -> Option<(Color, Option<Color>)> {
    let fg = read_palette(chars)?;
    let bg = if comma_then(chars, |rest| {
        rest.peek().is_some_and(|d| d.is_ascii_digit())
    }) {
        chars.next();
        read_palette(chars)
    } else {
        None
    };
    Some((fg, bg))
}

/// Up to two decimal digits.
fn read_palette(chars: &mut Peekable<Chars<'_>>) -> Option<Color> {
    let mut value: Option<u8> = None;
    for _ in 0..2 {
        match chars.peek().and_then(|d| d.to_digit(10)) {
            Some(digit) => {
                value = Some(value.unwrap_or(0) * 10 + digit as u8);
                chars.next();
            }
            None => break,
        }
    }
    value.map(Color::Palette)
}

fn read_hex_pair(chars: &mut Peekable<Chars<'_>>) -> Option<(Color, Option<Color>)> {
    let fg = read_hex(chars)?;
    let bg = if comma_then(chars, has_hex) {
        chars.next();
        read_hex(chars)
    } else {
        None
    };
    Some((fg, bg))
}

/// Exactly six hex digits, or nothing is consumed.
fn read_hex(chars: &mut Peekable<Chars<'_>>) -> Option<Color> {
    if !has_hex(&mut chars.clone()) {
        return None;
    }
    let mut value = 0u32;
    for _ in 0..6 {
        let digit = chars.next().and_then(|d| d.to_digit(16))?;
        value = (value << 4) | digit;
    }
    Some(Color::Rgb(value))
}

fn has_hex(probe: &mut Peekable<Chars<'_>>) -> bool {
    (0..6).all(|_| probe.next().is_some_and(|d| d.is_ascii_hexdigit()))
}

/// Peek for a comma whose continuation satisfies `rest_ok`, without consuming.
fn comma_then(
    chars: &Peekable<Chars<'_>>,
    rest_ok: impl FnOnce(&mut Peekable<Chars<'_>>) -> bool,
) -> bool {
    let mut probe = chars.clone();
    probe.next() == Some(',') && rest_ok(&mut probe)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(blocks: &[Block]) -> Vec<&str> {
        blocks.iter().map(|b| b.text.as_str()).collect()
    }

    #[test]
    fn test_plain_text_is_one_block() {
        let blocks = parse("hello world");
        assert_eq!(blocks.len(), 1);
        assert!(blocks[0].style.is_plain());
        assert_eq!(blocks[0].text, "hello world");
    }

    #[test]
    fn test_empty_line_has_no_blocks() {
        assert!(parse("").is_empty());
        assert!(parse("\x02\x02").is_empty());
    }

    #[test]
    fn test_bold_toggle() {
        let blocks = parse("a\x02b\x02c");
        assert_eq!(texts(&blocks), vec!["a", "b", "c"]);
        assert!(!blocks[0].style.bold);
        assert!(blocks[1].style.bold);
        assert!(!blocks[2].style.bold);
    }

    #[test]
    fn test_reset_clears_everything() {
        let blocks = parse("\x02\x1D\x0304both\x0Fnone");
        assert_eq!(texts(&blocks), vec!["both", "none"]);
        assert!(blocks[0].style.bold && blocks[0].style.italic);
        assert_eq!(blocks[0].style.foreground, Some(Color::Palette(4)));
        assert_eq!(blocks[1].style, Style::default());
    }

    #[test]
    fn test_palette_colors() {
        let blocks = parse("\x034,12x");
        assert_eq!(blocks[0].style.foreground, Some(Color::Palette(4)));
        assert_eq!(blocks[0].style.background, Some(Color::Palette(12)));
        assert_eq!(blocks[0].text, "x");
    }

    #[test]
    fn test_color_digits_are_capped_at_two() {
        let blocks = parse("\x03123");
        assert_eq!(blocks[0].style.foreground, Some(Color::Palette(12)));
        assert_eq!(blocks[0].text, "3");
    }

    #[test]
    fn test_comma_without_digit_is_text() {
        let blocks = parse("\x034,hi");
        assert_eq!(blocks[0].style.foreground, Some(Color::Palette(4)));
        assert_eq!(blocks[0].style.background, None);
        assert_eq!(blocks[0].text, ",hi");
    }

    #[test]
    fn test_bare_color_resets_colors_only() {
        let blocks = parse("\x02\x034red\x03bold");
        assert_eq!(texts(&blocks), vec!["red", "bold"]);
        assert!(blocks[1].style.bold);
        assert_eq!(blocks[1].style.foreground, None);
    }

    #[test]
    fn test_hex_color() {
        let blocks = parse("\x04FF0000,00ff00rgb");
        assert_eq!(blocks[0].style.foreground, Some(Color::Rgb(0xFF0000)));
        assert_eq!(blocks[0].style.background, Some(Color::Rgb(0x00FF00)));
        assert_eq!(blocks[0].text, "rgb");
    }

    #[test]
    fn test_short_hex_is_not_consumed() {
        let blocks = parse("\x04abc");
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].text, "abc");
        assert_eq!(blocks[0].style.foreground, None);
    }

    #[test]
    fn test_same_style_runs_merge() {
        let blocks = parse("a\x02\x02b");
        assert_eq!(texts(&blocks), vec!["ab"]);
    }

    #[test]
    fn test_unicode_text_survives() {
        let blocks = parse("\x1Dnaïve ☕\x1D");
        assert_eq!(blocks[0].text, "naïve ☕");
        assert!(blocks[0].style.italic);
    }
}
