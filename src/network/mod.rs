//! Network module.
//!
//! The protocol connections themselves live outside this crate. Frontends
//! implement [`IrcClient`] and [`DiscordClient`] over their transports and feed
//! decoded events into the listeners:
//!
//! - [`IrcListener`]: typed [`IrcEvent`]s from the IRC connection.
//! - [`DiscordListener`]: typed [`DiscordEvent`]s from the Discord gateway.

mod discord;
mod irc_listener;

pub use discord::{
    AllowedMentions, DiscordEvent, DiscordEventHandler, DiscordListener, MentionType, SendAs,
};
pub use irc_listener::{
    Hostmask, IrcEvent, IrcEventHandler, IrcListener, MessageKind, expand_prejoin,
};

use async_trait::async_trait;

use crate::caps::CapTables;
use crate::error::ClientError;

/// The bridge's IRC connection.
///
/// Synchronous methods must not block on the network: implementations queue
/// the line and return.
#[async_trait]
pub trait IrcClient: Send + Sync + 'static {
    /// Connect and register, requesting the capabilities from
    /// [`CapabilityNegotiator::request_line`](crate::caps::CapabilityNegotiator::request_line).
    /// Returns the tables left by the handshake.
    async fn connect(&self) -> Result<CapTables, ClientError>;

    /// Queue one raw protocol line, without the trailing CRLF.
    fn send_raw(&self, line: &str) -> Result<(), ClientError>;

    /// Queue a PRIVMSG.
    fn privmsg(&self, target: &str, text: &str) -> Result<(), ClientError>;

    /// Current nick of the connection.
    fn nick(&self) -> String;

    /// Channel roster lookup.
    fn is_user_in_channel(&self, channel: &str, nick: &str) -> bool;

    /// Send QUIT and drop the connection.
    async fn quit(&self);
}

/// The bridge's Discord session.
#[async_trait]
pub trait DiscordClient: Send + Sync + 'static {
    async fn open(&self) -> Result<(), ClientError>;

    async fn close(&self) -> Result<(), ClientError>;

    /// Post as the bot itself.
    async fn send_message(&self, channel_id: &str, content: &str) -> Result<(), ClientError>;

    /// Post under another display name and avatar (webhook).
    async fn send_as(&self, channel_id: &str, message: SendAs) -> Result<(), ClientError>;

    /// Avatar of a guild member whose name matches `username`, from the
    /// session's member cache.
    fn avatar_for(&self, username: &str) -> Option<String>;
}
