//! The dispatcher: sole owner of mapping state and the only place outbound
//! actions are decided.
//!
//! # Architecture
//!
//! - **State Ownership**: The [`Dispatcher`] owns the [`MappingStore`] and the
//!   [`IdentityResolver`]. Reconfiguration and capability changes are events
//!   like any other, so a diff is always computed against the table that was
//!   actually live.
//! - **Message Passing**: Listeners hand [`BridgeEvent`]s into a bounded inbox.
//!   Within one source, order is preserved; the two sources interleave freely.
//! - **No network waits**: IRC lines are queued on the collaborator, Discord
//!   sends go through the [`Outbox`]. Only teardown awaits the collaborators.

use std::sync::Arc;

use slirc_text::{EmojiCache, preserve_whitespace};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{Instrument, debug, error, info, trace, warn};

use crate::caps::CapabilityNegotiator;
use crate::config::{BridgeOptions, FiltersConfig};
use crate::identity::IdentityResolver;
use crate::mapping::{MappingDiff, MappingStore, join_line};
use crate::network::{AllowedMentions, DiscordClient, IrcClient, SendAs};
use crate::telemetry::spans;

mod outbox;
mod presence;
mod types;

pub use outbox::Outbox;
pub use types::*;

/// The dispatcher task state.
pub struct Dispatcher {
    mappings: MappingStore,
    identity: IdentityResolver,
    filters: Arc<FiltersConfig>,
    emoji: Arc<EmojiCache>,
    irc: Arc<dyn IrcClient>,
    discord: Arc<dyn DiscordClient>,
    outbox: Outbox,
    options: BridgeOptions,
    avatar_template: String,
}

impl Dispatcher {
    pub fn new(
        mappings: MappingStore,
        irc: Arc<dyn IrcClient>,
        discord: Arc<dyn DiscordClient>,
        filters: Arc<FiltersConfig>,
        emoji: Arc<EmojiCache>,
        options: BridgeOptions,
        avatar_template: String,
    ) -> Self {
        Self {
            mappings,
            identity: IdentityResolver::new(Arc::clone(&irc)),
            filters,
            emoji,
            outbox: Outbox::new(Arc::clone(&discord), options.max_inflight_sends),
            irc,
            discord,
            options,
            avatar_template,
        }
    }

    /// Spawn the dispatcher loop on the current runtime.
    pub fn spawn(self, rx: mpsc::Receiver<BridgeEvent>) -> JoinHandle<()> {
        tokio::spawn(self.run(rx).instrument(spans::dispatcher()))
    }

    /// The main dispatcher loop.
    pub async fn run(mut self, mut rx: mpsc::Receiver<BridgeEvent>) {
        while let Some(event) = rx.recv().await {
            match event {
                BridgeEvent::Shutdown { reply_tx } => {
                    rx.close();
                    self.shutdown().await;
                    let _ = reply_tx.send(());
                    return;
                }
                event => self.handle_event(event),
            }
        }
        info!("all bridge handles dropped, dispatcher stopping");
    }

    fn handle_event(&mut self, event: BridgeEvent) {
        match event {
            BridgeEvent::IrcMessage(msg) => self.relay_to_discord(msg),
            BridgeEvent::DiscordMessage(msg) => self.relay_to_irc(msg),
            BridgeEvent::Presence(event) => self.handle_presence(event),
            BridgeEvent::JoinAll => {
                if let Some(line) = self.mappings.snapshot().join_command() {
                    self.send_raw(&line);
                }
            }
            BridgeEvent::Rejoin { channel } => match self.mappings.lookup_by_irc(&channel) {
                Some(mapping) => {
                    if let Some(line) = join_line(std::iter::once(mapping)) {
                        self.send_raw(&line);
                    }
                }
                None => debug!(channel = %channel, "not rejoining unmapped channel"),
            },
            BridgeEvent::SetMappings { entries, reply_tx } => {
                let result = self.mappings.set_mappings(entries);
                match &result {
                    Ok(diff) => self.apply_diff(diff),
                    Err(e) => warn!(error = %e, code = e.error_code(), "mapping reconfiguration rejected"),
                }
                let _ = reply_tx.send(result);
            }
            BridgeEvent::Capabilities { tables, reply_tx } => {
                let capability = CapabilityNegotiator::negotiate(&tables);
                self.identity.apply(&capability);
                let _ = reply_tx.send(capability);
            }
            // Handled by the loop before reaching here.
            BridgeEvent::Shutdown { reply_tx } => {
                let _ = reply_tx.send(());
            }
        }
    }

    /// IRC → Discord.
    fn relay_to_discord(&self, msg: InboundIrcMessage) {
        let Some(mapping) = self.mappings.lookup_by_irc(&msg.irc_channel) else {
            warn!(channel = %msg.irc_channel, "ignoring message from an unmapped IRC channel");
            return;
        };
        if !msg.is_system() && self.identity.is_puppet_nick(&msg.username) {
            trace!(nick = %msg.username, "ignoring puppet echo");
            return;
        }

        let channel_id = mapping.discord_channel_id.clone();
        let text = if msg.is_action {
            format!("_{}_", msg.text)
        } else {
            msg.text
        };
        let content = self
            .emoji
            .substitute(&preserve_whitespace(&text))
            .into_owned();

        if msg.username.is_empty() {
            self.outbox.send_message(channel_id, content);
            return;
        }

        let avatar_url = self.discord.avatar_for(&msg.username).unwrap_or_else(|| {
            self.avatar_template
                .replace("${USERNAME}", &msg.username)
        });
        let mut username = msg.username;
        if username.chars().count() == 1 {
            // Discord rejects single-character webhook names.
            username.push('.');
        }

        self.outbox.send_as(
            channel_id,
            SendAs {
                username,
                avatar_url,
                content,
                allowed_mentions: AllowedMentions::default(),
            },
        );
    }

    /// Discord → IRC.
    fn relay_to_irc(&self, msg: InboundDiscordEvent) {
        let Some(mapping) = self.mappings.lookup_by_discord(&msg.discord_channel_id) else {
            warn!(channel = %msg.discord_channel_id, "ignoring message from an unmapped Discord channel");
            return;
        };
        if self.filters.discord_ignores.contains(&msg.author_id) {
            debug!(author = %msg.author_id, "ignored discord user");
            return;
        }
        if !self.filters.discord_allowed.is_empty()
            && !self.filters.discord_allowed.contains(&msg.author_id)
        {
            debug!(author = %msg.author_id, "discord user not in allow list");
            return;
        }
        if self.filters.discord_filtered_messages.is_match(&msg.content) {
            debug!(author = %msg.author_id, "filtered discord message");
            return;
        }

        if let Err(e) = self.identity.send_message(&mapping.irc_channel, &msg) {
            error!(
                error = %e,
                channel = %mapping.irc_channel,
                author = %msg.author_username,
                content = %msg.content,
                "could not transmit message to IRC"
            );
        }
    }

    fn handle_presence(&self, event: PresenceEvent) {
        if self.options.debug_presence {
            debug!(event = ?event, "presence");
        }

        let from_puppet = match &event {
            PresenceEvent::Kick { source, target, .. } => {
                self.identity.is_puppet_nick(&source.nick) || self.identity.is_puppet_nick(target)
            }
            PresenceEvent::Nick { source, new_nick } => {
                self.identity.is_puppet_nick(&source.nick) || self.identity.is_puppet_nick(new_nick)
            }
            PresenceEvent::Join { source, .. }
            | PresenceEvent::Part { source, .. }
            | PresenceEvent::Quit { source, .. } => self.identity.is_puppet_nick(&source.nick),
        };
        if from_puppet {
            return;
        }

        let text = presence::render(&event);
        let channels: Vec<String> = match &event {
            PresenceEvent::Join { channel, .. }
            | PresenceEvent::Part { channel, .. }
            | PresenceEvent::Kick { channel, .. } => vec![channel.clone()],
            PresenceEvent::Quit { source, .. } => self.channels_with(&source.nick),
            PresenceEvent::Nick { new_nick, .. } => self.channels_with(new_nick),
        };

        for channel in channels {
            self.relay_to_discord(InboundIrcMessage::system(channel, text.clone()));
        }
    }

    /// Mapped IRC channels whose roster contains `nick`.
    fn channels_with(&self, nick: &str) -> Vec<String> {
        self.mappings
            .snapshot()
            .iter()
            .filter(|m| self.irc.is_user_in_channel(&m.irc_channel, nick))
            .map(|m| m.irc_channel.clone())
            .collect()
    }

    fn apply_diff(&self, diff: &MappingDiff) {
        if let Some(line) = diff.part_command() {
            self.send_raw(&line);
        }
        if let Some(line) = diff.join_command() {
            self.send_raw(&line);
        }
    }

    fn send_raw(&self, line: &str) {
        if let Err(e) = self.irc.send_raw(line) {
            error!(error = %e, line = %line, "could not send to IRC");
        }
    }

    async fn shutdown(&mut self) {
        info!("bridge shutting down");
        if let Err(e) = self.discord.close().await {
            warn!(error = %e, "error closing discord session");
        }
        self.irc.quit().await;
        self.identity.close();
    }
}
