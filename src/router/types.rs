use tokio::sync::oneshot;

use crate::caps::{CapTables, RelayCapability};
use crate::error::MappingError;
use crate::mapping::MappingDiff;
use crate::network::Hostmask;

/// A line from an IRC channel, already converted to markdown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundIrcMessage {
    pub irc_channel: String,
    /// Empty for system messages.
    pub username: String,
    pub text: String,
    pub is_action: bool,
}

impl InboundIrcMessage {
    /// A message posted as the bot itself rather than under a user's name.
    pub fn system(irc_channel: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            irc_channel: irc_channel.into(),
            username: String::new(),
            text: text.into(),
            is_action: false,
        }
    }

    pub fn is_system(&self) -> bool {
        self.username.is_empty()
    }
}

/// A Discord message author.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscordUser {
    pub id: String,
    pub username: String,
    pub discriminator: String,
}

/// A message from a Discord channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundDiscordEvent {
    pub discord_channel_id: String,
    pub author_id: String,
    pub author_username: String,
    pub author_discriminator: String,
    pub content: String,
    pub is_action: bool,
}

impl InboundDiscordEvent {
    pub fn author(&self) -> DiscordUser {
        DiscordUser {
            id: self.author_id.clone(),
            username: self.author_username.clone(),
            discriminator: self.author_discriminator.clone(),
        }
    }
}

/// Channel membership changes relayed as system messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PresenceEvent {
    Join {
        channel: String,
        source: Hostmask,
    },
    Part {
        channel: String,
        source: Hostmask,
        reason: Option<String>,
    },
    Quit {
        source: Hostmask,
        reason: Option<String>,
    },
    Kick {
        channel: String,
        source: Hostmask,
        target: String,
        reason: Option<String>,
    },
    Nick {
        source: Hostmask,
        new_nick: String,
    },
}

/// Events handled by the dispatcher.
#[derive(Debug)]
pub enum BridgeEvent {
    /// IRC → Discord.
    IrcMessage(InboundIrcMessage),
    /// Discord → IRC.
    DiscordMessage(InboundDiscordEvent),
    /// Join/part/quit/kick/nick on IRC.
    Presence(PresenceEvent),
    /// Join every mapped channel.
    JoinAll,
    /// Join one mapped channel again, e.g. after being kicked.
    Rejoin { channel: String },
    /// Replace the mapping table.
    SetMappings {
        entries: Vec<(String, String)>,
        reply_tx: oneshot::Sender<Result<MappingDiff, MappingError>>,
    },
    /// Apply the outcome of a (re)connection handshake.
    Capabilities {
        tables: CapTables,
        reply_tx: oneshot::Sender<RelayCapability>,
    },
    /// Tear everything down, then acknowledge.
    Shutdown { reply_tx: oneshot::Sender<()> },
}
