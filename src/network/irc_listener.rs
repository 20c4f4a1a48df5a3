//! IRC side: typed events and the listener that turns them into bridge input.
//!
//! The IRC collaborator decodes protocol lines into [`IrcEvent`]s and hands
//! each to [`IrcEventHandler::handle`]. The listener applies the IRC-side
//! admission rules (channel targets only, ignores, filters), converts IRC
//! formatting to markdown and forwards to the dispatcher.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use slirc_text::{eq_folded, irc_to_markdown, is_channel_target};
use tracing::{Instrument, debug, info, warn};

use super::IrcClient;
use crate::bridge::BridgeHandle;
use crate::config::FiltersConfig;
use crate::error::BridgeError;
use crate::router::{InboundIrcMessage, PresenceEvent};
use crate::telemetry::spans;

/// Origin of an IRC event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hostmask {
    pub nick: String,
    pub user: String,
    pub host: String,
}

impl Hostmask {
    pub fn new(nick: impl Into<String>, user: impl Into<String>, host: impl Into<String>) -> Self {
        Self {
            nick: nick.into(),
            user: user.into(),
            host: host.into(),
        }
    }

    /// Parse a `nick!user@host` prefix. Missing parts are left empty.
    pub fn parse(prefix: &str) -> Self {
        let (nick, rest) = prefix.split_once('!').unwrap_or((prefix, ""));
        let (user, host) = rest.split_once('@').unwrap_or((rest, ""));
        Self::new(nick, user, host)
    }
}

impl fmt::Display for Hostmask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}!{}@{}", self.nick, self.user, self.host)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Privmsg,
    Notice,
    /// CTCP ACTION (`/me`).
    Action,
}

/// Events the IRC collaborator reports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IrcEvent {
    /// RPL_WELCOME (001).
    Welcome { nick: String },
    /// RPL_LOGGEDIN (900).
    LoggedIn,
    /// RPL_ENDOFNAMES (366) for a channel the listener joined.
    ChannelJoined { channel: String },
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
    /// PRIVMSG, NOTICE or ACTION, to a channel or to the bridge.
    PrivateMessage {
        kind: MessageKind,
        target: String,
        source: Hostmask,
        text: String,
    },
}

impl IrcEvent {
    fn kind(&self) -> &'static str {
        match self {
            Self::Welcome { .. } => "welcome",
            Self::LoggedIn => "logged_in",
            Self::ChannelJoined { .. } => "channel_joined",
            Self::Join { .. } => "join",
            Self::Part { .. } => "part",
            Self::Quit { .. } => "quit",
            Self::Kick { .. } => "kick",
            Self::Nick { .. } => "nick",
            Self::PrivateMessage { .. } => "message",
        }
    }
}

/// Typed handler for IRC events.
#[async_trait]
pub trait IrcEventHandler: Send + Sync {
    async fn handle(&self, event: IrcEvent);
}

/// Substitute `${NICK}` in each prejoin command.
pub fn expand_prejoin(commands: &[String], nick: &str) -> Vec<String> {
    commands
        .iter()
        .map(|command| command.replace("${NICK}", nick))
        .collect()
}

/// Feeds IRC events into the bridge.
pub struct IrcListener {
    bridge: BridgeHandle,
    irc: Arc<dyn IrcClient>,
    filters: Arc<FiltersConfig>,
    prejoin_commands: Vec<String>,
    show_join_quit: bool,
}

impl IrcListener {
    pub fn new(
        bridge: BridgeHandle,
        irc: Arc<dyn IrcClient>,
        filters: Arc<FiltersConfig>,
        prejoin_commands: Vec<String>,
        show_join_quit: bool,
    ) -> Self {
        Self {
            bridge,
            irc,
            filters,
            prejoin_commands,
            show_join_quit,
        }
    }

    async fn on_welcome(&self, nick: &str) -> Result<(), BridgeError> {
        for line in expand_prejoin(&self.prejoin_commands, nick) {
            if let Err(e) = self.irc.send_raw(&line) {
                warn!(error = %e, command = %line, "prejoin command failed");
            }
        }
        self.bridge.join_all().await
    }

    async fn on_message(
        &self,
        kind: MessageKind,
        target: String,
        source: Hostmask,
        text: String,
    ) -> Result<(), BridgeError> {
        if !is_channel_target(&target) {
            return Ok(());
        }
        if eq_folded(&source.nick, &self.irc.nick()) {
            return Ok(());
        }
        if self.filters.irc_ignores.is_match(&source.to_string()) {
            debug!(source = %source, "ignored hostmask");
            return Ok(());
        }
        if self.filters.irc_filtered_messages.is_match(&text) {
            debug!(source = %source, "filtered message");
            return Ok(());
        }

        self.bridge
            .submit_irc_message(InboundIrcMessage {
                irc_channel: target,
                username: source.nick,
                text: irc_to_markdown(&text),
                is_action: kind == MessageKind::Action,
            })
            .await
    }

    async fn on_presence(&self, source: &Hostmask, event: PresenceEvent) -> Result<(), BridgeError> {
        if !self.show_join_quit || self.filters.irc_ignores.is_match(&source.to_string()) {
            return Ok(());
        }
        self.bridge.presence(event).await
    }

    async fn dispatch(&self, event: IrcEvent) -> Result<(), BridgeError> {
        match event {
            IrcEvent::Welcome { nick } => self.on_welcome(&nick).await,
            IrcEvent::LoggedIn => self.bridge.join_all().await,
            IrcEvent::ChannelJoined { channel } => {
                info!(channel = %channel, "listener joined IRC channel");
                Ok(())
            }
            IrcEvent::Kick {
                channel, target, ..
            } if eq_folded(&target, &self.irc.nick()) => {
                warn!(channel = %channel, "listener was kicked, rejoining");
                self.bridge.rejoin(channel).await
            }
            IrcEvent::Kick {
                channel,
                source,
                target,
                reason,
            } => {
                let presence = PresenceEvent::Kick {
                    channel,
                    source: source.clone(),
                    target,
                    reason,
                };
                self.on_presence(&source, presence).await
            }
            IrcEvent::Join { channel, source } => {
                let presence = PresenceEvent::Join {
                    channel,
                    source: source.clone(),
                };
                self.on_presence(&source, presence).await
            }
            IrcEvent::Part {
                channel,
                source,
                reason,
            } => {
                let presence = PresenceEvent::Part {
                    channel,
                    source: source.clone(),
                    reason,
                };
                self.on_presence(&source, presence).await
            }
            IrcEvent::Quit { source, reason } => {
                let presence = PresenceEvent::Quit {
                    source: source.clone(),
                    reason,
                };
                self.on_presence(&source, presence).await
            }
            IrcEvent::Nick { source, new_nick } => {
                let presence = PresenceEvent::Nick {
                    source: source.clone(),
                    new_nick,
                };
                self.on_presence(&source, presence).await
            }
            IrcEvent::PrivateMessage {
                kind,
                target,
                source,
                text,
            } => self.on_message(kind, target, source, text).await,
        }
    }
}

#[async_trait]
impl IrcEventHandler for IrcListener {
    async fn handle(&self, event: IrcEvent) {
        let span = spans::irc_event(event.kind());
        async {
            if let Err(e) = self.dispatch(event).await {
                warn!(error = %e, "dropping irc event");
            }
        }
        .instrument(span)
        .await
    }
}
