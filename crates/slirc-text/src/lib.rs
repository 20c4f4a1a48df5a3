//! # slirc-text
//!
//! Pure text transformation used by the Straylight IRC/Discord bridge.
//!
//! Nothing in this crate touches the network or spawns tasks. The bridge
//! composes these pieces per direction:
//!
//! - IRC → Discord: [`format::irc_to_markdown`], [`EmojiCache::substitute`],
//!   [`whitespace::preserve_whitespace`].
//! - Discord → IRC: [`nick::sanitize_nickname`] for puppet identities.
//! - Both: [`GlobList`] for hostmask ignores and message-text filters.
//!
//! ```rust
//! use slirc_text::{Emoji, EmojiCache};
//!
//! let emoji = EmojiCache::new();
//! emoji.upsert(Emoji::new("42", "smile", false));
//! assert_eq!(emoji.substitute("hello :smile: world"), "hello <:smile:42> world");
//! ```

#![deny(clippy::all)]

pub mod casemap;
pub mod emoji;
pub mod filter;
pub mod format;
pub mod nick;
pub mod whitespace;

pub use self::casemap::{eq_folded, fold, is_channel_target};
pub use self::emoji::{Emoji, EmojiCache};
pub use self::filter::{FilterError, GlobList};
pub use self::format::{irc_to_markdown, Block, Style};
pub use self::nick::sanitize_nickname;
pub use self::whitespace::preserve_whitespace;
