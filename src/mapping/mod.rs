//! Channel mapping store.
//!
//! A [`MappingSet`] is an immutable snapshot of the IRC ↔ Discord channel
//! table. The dispatcher owns the [`MappingStore`] and swaps whole snapshots on
//! reconfiguration, so a reader holding an `Arc<MappingSet>` never observes a
//! half-applied table.
//!
//! Entries arrive as `"#irc-channel[ key]" -> "discord-channel-id"`. IRC names
//! compare under RFC 1459 case mapping, Discord ids compare exactly.

use std::collections::HashMap;
use std::sync::Arc;

use slirc_text::fold;
use tracing::{debug, warn};

use crate::error::MappingError;

/// One bidirectional channel association.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelMapping {
    pub irc_channel: String,
    pub discord_channel_id: String,
    /// Channel key (`+k`) used when joining.
    pub key: Option<String>,
}

impl ChannelMapping {
    pub fn new(
        irc_channel: impl Into<String>,
        discord_channel_id: impl Into<String>,
        key: Option<String>,
    ) -> Self {
        Self {
            irc_channel: irc_channel.into(),
            discord_channel_id: discord_channel_id.into(),
            key,
        }
    }

    /// Parse a `"#channel[ key]"` entry. More than one space is invalid.
    pub fn parse(entry: &str, discord_channel_id: &str) -> Option<Self> {
        let mut parts = entry.split(' ');
        let channel = parts.next().filter(|c| !c.is_empty())?;
        let key = parts.next();
        if parts.next().is_some() {
            return None;
        }
        Some(Self::new(
            channel,
            discord_channel_id,
            key.filter(|k| !k.is_empty()).map(str::to_owned),
        ))
    }
}

/// Changes to apply on IRC after a reconfiguration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MappingDiff {
    /// IRC channels no longer mapped at all.
    pub parted: Vec<String>,
    /// Mappings whose IRC channel was not mapped before.
    pub joined: Vec<ChannelMapping>,
}

impl MappingDiff {
    pub fn is_empty(&self) -> bool {
        self.parted.is_empty() && self.joined.is_empty()
    }

    /// `PART #a,#b`, or `None` when nothing is parted.
    pub fn part_command(&self) -> Option<String> {
        if self.parted.is_empty() {
            return None;
        }
        Some(format!("PART {}", self.parted.join(",")))
    }

    /// `JOIN` line for the newly mapped channels.
    pub fn join_command(&self) -> Option<String> {
        join_line(&self.joined)
    }
}

/// Build a single JOIN line: keyed channels first so the key list lines up,
/// then unkeyed channels, then the keys.
pub fn join_line<'a>(mappings: impl IntoIterator<Item = &'a ChannelMapping>) -> Option<String> {
    let (keyed, open): (Vec<&ChannelMapping>, Vec<&ChannelMapping>) =
        mappings.into_iter().partition(|m| m.key.is_some());
    if keyed.is_empty() && open.is_empty() {
        return None;
    }

    let channels: Vec<&str> = keyed
        .iter()
        .chain(open.iter())
        .map(|m| m.irc_channel.as_str())
        .collect();
    let keys: Vec<&str> = keyed.iter().filter_map(|m| m.key.as_deref()).collect();

    let mut line = format!("JOIN {}", channels.join(","));
    if !keys.is_empty() {
        line.push(' ');
        line.push_str(&keys.join(","));
    }
    Some(line)
}

/// Immutable mapping snapshot with lookup indexes on both sides.
#[derive(Debug, Default)]
pub struct MappingSet {
    mappings: Vec<ChannelMapping>,
    by_irc: HashMap<String, usize>,
    by_discord: HashMap<String, usize>,
}

impl MappingSet {
    /// Index `mappings`, failing on the first duplicate on either side.
    pub fn build(mappings: Vec<ChannelMapping>) -> Result<Self, MappingError> {
        let mut by_irc = HashMap::with_capacity(mappings.len());
        let mut by_discord = HashMap::with_capacity(mappings.len());

        for (idx, mapping) in mappings.iter().enumerate() {
            if by_irc.insert(fold(&mapping.irc_channel), idx).is_some() {
                return Err(MappingError::DuplicateIrcChannel(mapping.irc_channel.clone()));
            }
            if by_discord
                .insert(mapping.discord_channel_id.clone(), idx)
                .is_some()
            {
                return Err(MappingError::DuplicateDiscordChannel(
                    mapping.discord_channel_id.clone(),
                ));
            }
        }

        Ok(Self {
            mappings,
            by_irc,
            by_discord,
        })
    }

    /// Parse raw entries, skipping malformed ones, then [`build`](Self::build).
    pub fn from_entries<I, K, V>(entries: I) -> Result<Self, MappingError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut mappings = Vec::new();
        for (entry, discord_id) in entries {
            let (entry, discord_id) = (entry.as_ref(), discord_id.as_ref());
            match ChannelMapping::parse(entry, discord_id) {
                Some(mapping) => mappings.push(mapping),
                None => warn!(
                    entry = %entry,
                    discord_channel = %discord_id,
                    "invalid mapping entry, skipping"
                ),
            }
        }
        Self::build(mappings)
    }

    pub fn lookup_by_irc(&self, irc_channel: &str) -> Option<&ChannelMapping> {
        self.by_irc
            .get(&fold(irc_channel))
            .map(|&idx| &self.mappings[idx])
    }

    pub fn lookup_by_discord(&self, discord_channel_id: &str) -> Option<&ChannelMapping> {
        self.by_discord
            .get(discord_channel_id)
            .map(|&idx| &self.mappings[idx])
    }

    pub fn iter(&self) -> impl Iterator<Item = &ChannelMapping> {
        self.mappings.iter()
    }

    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }

    /// JOIN line covering every mapped channel.
    pub fn join_command(&self) -> Option<String> {
        join_line(&self.mappings)
    }

    /// What IRC must do to move from `self` to `next`.
    ///
    /// A channel that stays mapped (even to a different Discord channel) is
    /// neither parted nor re-joined.
    pub fn diff(&self, next: &MappingSet) -> MappingDiff {
        let parted = self
            .mappings
            .iter()
            .filter(|m| next.lookup_by_irc(&m.irc_channel).is_none())
            .map(|m| m.irc_channel.clone())
            .collect();
        let joined = next
            .mappings
            .iter()
            .filter(|m| self.lookup_by_irc(&m.irc_channel).is_none())
            .cloned()
            .collect();
        MappingDiff { parted, joined }
    }
}

/// Owner of the live mapping snapshot.
#[derive(Debug, Default)]
pub struct MappingStore {
    current: Arc<MappingSet>,
}

impl MappingStore {
    pub fn new(initial: MappingSet) -> Self {
        Self {
            current: Arc::new(initial),
        }
    }

    /// First load from configuration. Produces no diff.
    pub fn from_entries<I, K, V>(entries: I) -> Result<Self, MappingError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        MappingSet::from_entries(entries).map(Self::new)
    }

    pub fn snapshot(&self) -> Arc<MappingSet> {
        Arc::clone(&self.current)
    }

    /// Replace the table. On error the previous snapshot is kept untouched.
    pub fn set_mappings<I, K, V>(&mut self, entries: I) -> Result<MappingDiff, MappingError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let next = MappingSet::from_entries(entries)?;
        let diff = self.current.diff(&next);
        debug!(
            parted = diff.parted.len(),
            joined = diff.joined.len(),
            total = next.len(),
            "mappings replaced"
        );
        self.current = Arc::new(next);
        Ok(diff)
    }

    pub fn lookup_by_irc(&self, irc_channel: &str) -> Option<&ChannelMapping> {
        self.current.lookup_by_irc(irc_channel)
    }

    pub fn lookup_by_discord(&self, discord_channel_id: &str) -> Option<&ChannelMapping> {
        self.current.lookup_by_discord(discord_channel_id)
    }
}
