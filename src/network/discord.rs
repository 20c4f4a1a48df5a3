//! Discord side: outbound message shape and the gateway event listener.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use slirc_text::{Emoji, EmojiCache};
use tracing::{Instrument, debug, warn};

use crate::bridge::BridgeHandle;
use crate::router::InboundDiscordEvent;
use crate::telemetry::spans;

/// Mention kinds Discord may resolve in a relayed message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MentionType {
    Roles,
    Users,
}

/// `allowed_mentions` of a webhook execution. Never `@everyone`/`@here`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AllowedMentions {
    pub parse: Vec<MentionType>,
}

impl Default for AllowedMentions {
    fn default() -> Self {
        Self {
            parse: vec![MentionType::Roles, MentionType::Users],
        }
    }
}

/// A message posted under an IRC user's identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SendAs {
    pub username: String,
    pub avatar_url: String,
    pub content: String,
    pub allowed_mentions: AllowedMentions,
}

/// Gateway events the bridge consumes.
///
/// Frontends forward only messages from guild members: the bot's own
/// messages and webhook posts must not be turned into `MessageCreate`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiscordEvent {
    MessageCreate(InboundDiscordEvent),
    /// Full emoji roster (guild create, guild emojis update).
    EmojisUpdate { emojis: Vec<Emoji> },
    /// A single emoji created or renamed.
    EmojiUpsert(Emoji),
}

impl DiscordEvent {
    fn kind(&self) -> &'static str {
        match self {
            Self::MessageCreate(_) => "message_create",
            Self::EmojisUpdate { .. } => "emojis_update",
            Self::EmojiUpsert(_) => "emoji_upsert",
        }
    }
}

/// Typed handler for Discord gateway events.
#[async_trait]
pub trait DiscordEventHandler: Send + Sync {
    async fn handle(&self, event: DiscordEvent);
}

/// Feeds gateway events into the bridge.
pub struct DiscordListener {
    bridge: BridgeHandle,
    emoji: Arc<EmojiCache>,
}

impl DiscordListener {
    pub fn new(bridge: BridgeHandle) -> Self {
        let emoji = bridge.emoji();
        Self { bridge, emoji }
    }
}

#[async_trait]
impl DiscordEventHandler for DiscordListener {
    async fn handle(&self, event: DiscordEvent) {
        let span = spans::discord_event(event.kind());
        async {
            match event {
                DiscordEvent::MessageCreate(message) => {
                    if let Err(e) = self.bridge.submit_discord_event(message).await {
                        warn!(error = %e, "dropping discord message");
                    }
                }
                DiscordEvent::EmojisUpdate { emojis } => {
                    self.emoji.replace_all(emojis);
                    debug!(count = self.emoji.len(), "emoji roster replaced");
                }
                DiscordEvent::EmojiUpsert(emoji) => {
                    debug!(name = %emoji.name, "emoji updated");
                    self.emoji.upsert(emoji);
                }
            }
        }
        .instrument(span)
        .await
    }
}
