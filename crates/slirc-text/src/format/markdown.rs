//! Markdown rendering of styled blocks.
//!
//! Colours and reverse video have no markdown equivalent and are dropped.
//! Markers never touch whitespace: Discord refuses to render `** bold**`, so
//! leading and trailing whitespace of a block is moved outside the markers.

use super::{Block, Style};

/// Render blocks as Discord-flavoured markdown.
pub fn render_markdown(blocks: &[Block]) -> String {
    let mut out = String::new();

    for block in blocks {
        if block.style.is_plain() {
            out.push_str(&block.text);
            continue;
        }

        let without_lead = block.text.trim_start();
        let lead = &block.text[..block.text.len() - without_lead.len()];
        let core = without_lead.trim_end();
        let trail = &without_lead[core.len()..];

        out.push_str(lead);
        if !core.is_empty() {
            let open = markers(&block.style);
            out.push_str(&open);
            out.push_str(core);
            out.extend(open.chars().rev());
        }
        out.push_str(trail);
    }

    out
}

/// Opening markers, outermost first. Each marker is a run of one character,
/// so the closing sequence is simply the reverse.
fn markers(style: &Style) -> String {
    let mut open = String::new();
    if style.bold {
        open.push_str("**");
    }
    if style.italic {
        open.push('*');
    }
    if style.underline {
        open.push_str("__");
    }
    if style.strikethrough {
        open.push_str("~~");
    }
    if style.monospace {
        open.push('`');
    }
    open
}
