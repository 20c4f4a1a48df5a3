//! Identity resolution for Discord users on IRC.
//!
//! With `draft/relaymsg` acknowledged, each Discord author gets a spoofed
//! nick: the sanitized username plus a decoration the server accepts for
//! relayed nicks (`Bob/d` when `/` is reserved, `Bob[d]` otherwise). Without
//! it, lines go out from the bridge's own nick as `<Bob> text`.
//!
//! The decoration is set once per connection from the negotiated
//! [`RelayCapability`] and read for every outbound line after that.

use std::sync::Arc;

use slirc_text::{eq_folded, sanitize_nickname};
use tracing::{debug, info};

use crate::caps::RelayCapability;
use crate::error::ClientError;
use crate::network::IrcClient;
use crate::router::{DiscordUser, InboundDiscordEvent};

/// Fixed tag appended to relayed nicks.
const TAG: &str = "d";

/// How one Discord user is represented on IRC.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentityDecision {
    /// Lines are spoofed from this nick with `RELAYMSG`.
    RelaySpoof(String),
    /// Lines are prefixed with this nick and sent by the bridge.
    ClassicPuppet(String),
}

impl IdentityDecision {
    pub fn nickname(&self) -> &str {
        match self {
            Self::RelaySpoof(nick) | Self::ClassicPuppet(nick) => nick,
        }
    }
}

/// Decides and performs IRC delivery for Discord authors.
pub struct IdentityResolver {
    irc: Arc<dyn IrcClient>,
    decoration: String,
    closed: bool,
}

impl IdentityResolver {
    /// Starts in classic mode until a capability is applied.
    pub fn new(irc: Arc<dyn IrcClient>) -> Self {
        Self {
            irc,
            decoration: String::new(),
            closed: false,
        }
    }

    /// Adopt the outcome of a handshake. Called again after every reconnect.
    pub fn apply(&mut self, capability: &RelayCapability) {
        self.decoration = match capability {
            RelayCapability::Unavailable => String::new(),
            RelayCapability::Available { .. } => match capability.separator() {
                Some(separator) => format!("{separator}{TAG}"),
                None => format!("[{TAG}]"),
            },
        };
        self.closed = false;
        info!(
            relaying = self.is_relaying(),
            decoration = %self.decoration,
            "identity mode resolved"
        );
    }

    /// Suffix of every relayed nick; empty in classic mode.
    pub fn decoration(&self) -> &str {
        &self.decoration
    }

    pub fn is_relaying(&self) -> bool {
        !self.decoration.is_empty()
    }

    /// Sanitized username plus decoration.
    pub fn generate_nickname(&self, user: &DiscordUser) -> String {
        let mut nick = sanitize_nickname(&user.username);
        nick.push_str(&self.decoration);
        nick
    }

    pub fn resolve(&self, user: &DiscordUser) -> IdentityDecision {
        let nick = self.generate_nickname(user);
        if self.is_relaying() {
            IdentityDecision::RelaySpoof(nick)
        } else {
            IdentityDecision::ClassicPuppet(nick)
        }
    }

    /// True for the bridge's own nick and for nicks it relays under.
    pub fn is_puppet_nick(&self, nick: &str) -> bool {
        eq_folded(nick, &self.irc.nick())
            || (self.is_relaying() && nick.ends_with(self.decoration.as_str()))
    }

    /// Deliver a Discord message to `channel`, one IRC line per content line.
    ///
    /// `channel` may be a `"#channel key"` entry; only the channel is used.
    /// Empty lines are skipped.
    pub fn send_message(&self, channel: &str, msg: &InboundDiscordEvent) -> Result<(), ClientError> {
        if self.closed {
            debug!(channel = %channel, "identity resolver closed, dropping message");
            return Ok(());
        }

        let channel = channel.split(' ').next().unwrap_or(channel);
        let decision = self.resolve(&msg.author());
        let content = msg.content.replace('\r', "");

        for line in content.split('\n').filter(|line| !line.is_empty()) {
            match &decision {
                IdentityDecision::RelaySpoof(nick) if msg.is_action => self
                    .irc
                    .send_raw(&format!("RELAYMSG {channel} {nick} :\x01ACTION {line}\x01"))?,
                IdentityDecision::RelaySpoof(nick) => self
                    .irc
                    .send_raw(&format!("RELAYMSG {channel} {nick} :{line}"))?,
                IdentityDecision::ClassicPuppet(nick) => {
                    self.irc.privmsg(channel, &format!("<{nick}> {line}"))?
                }
            }
        }
        Ok(())
    }

    /// Stop delivering. Later sends are dropped until the next [`apply`](Self::apply).
    pub fn close(&mut self) {
        self.closed = true;
        debug!("identity resolver closed");
    }
}
