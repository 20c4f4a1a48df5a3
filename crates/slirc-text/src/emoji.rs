//! Custom emoji cache and `:shortcode:` substitution.
//!
//! IRC users type `:name:`; Discord renders guild emoji only in its
//! `<:name:id>` (or `<a:name:id>` for animated) markup. The cache is fed by the
//! Discord gateway listener and read by the dispatcher at the same time, so it
//! lives in a [`DashMap`]: writes are last-writer-wins per key and nothing
//! spans more than one key.

use std::borrow::Cow;
use std::collections::HashSet;
use std::sync::OnceLock;

use dashmap::DashMap;
use regex::{Captures, Regex};

/// A guild emoji as advertised by Discord.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Emoji {
    pub id: String,
    pub name: String,
    pub animated: bool,
}

impl Emoji {
    pub fn new(id: impl Into<String>, name: impl Into<String>, animated: bool) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            animated,
        }
    }

    /// Discord message markup for this emoji.
    pub fn markup(&self) -> String {
        if self.animated {
            format!("<a:{}:{}>", self.name, self.id)
        } else {
            format!("<:{}:{}>", self.name, self.id)
        }
    }
}

fn shortcode() -> &'static Regex {
    static SHORTCODE: OnceLock<Regex> = OnceLock::new();
    SHORTCODE.get_or_init(|| Regex::new(r":([a-zA-Z_-]+):").expect("shortcode pattern is valid"))
}

/// Emoji lookup table, keyed by lowercase name.
#[derive(Debug, Default)]
pub struct EmojiCache {
    entries: DashMap<String, Emoji>,
}

impl EmojiCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite a single emoji.
    pub fn upsert(&self, emoji: Emoji) {
        self.entries.insert(emoji.name.to_lowercase(), emoji);
    }

    /// Replace the roster with `emojis`.
    ///
    /// New entries are written first and stale ones dropped afterwards, so a
    /// concurrent reader sees either the old or the new value for each name.
    pub fn replace_all(&self, emojis: impl IntoIterator<Item = Emoji>) {
        let mut keep = HashSet::new();
        for emoji in emojis {
            let key = emoji.name.to_lowercase();
            keep.insert(key.clone());
            self.entries.insert(key, emoji);
        }
        self.entries.retain(|key, _| keep.contains(key));
    }

    /// Look up an emoji by name, ignoring case.
    pub fn get(&self, name: &str) -> Option<Emoji> {
        self.entries
            .get(&name.to_lowercase())
            .map(|entry| entry.value().clone())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Replace every known `:shortcode:` in `text` with its markup.
    ///
    /// Unknown shortcodes are left exactly as typed.
    pub fn substitute<'a>(&self, text: &'a str) -> Cow<'a, str> {
        if self.entries.is_empty() {
            return Cow::Borrowed(text);
        }
        shortcode().replace_all(text, |caps: &Captures<'_>| match self.get(&caps[1]) {
            Some(emoji) => emoji.markup(),
            None => caps[0].to_owned(),
        })
    }
}
