//! Configuration validation.
//!
//! Validates configuration at startup to catch common errors early.

use super::Config;
use thiserror::Error;
use tracing::warn;

/// Validation errors for configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("irc.server is required")]
    MissingIrcServer,
    #[error("irc.nick is required")]
    MissingIrcNick,
    #[error("discord.bot_token is required")]
    MissingBotToken,
    #[error("discord.guild_id is required")]
    MissingGuildId,
    #[error("discord.avatar_url must be an http(s) URL, got '{0}'")]
    InvalidAvatarTemplate(String),
    #[error("bridge.inbox_capacity must be at least 1")]
    ZeroInboxCapacity,
    #[error("bridge.max_inflight_sends must be at least 1")]
    ZeroInflightSends,
}

/// Validate a configuration, returning all errors found.
pub fn validate(config: &Config) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    // Required fields
    if config.irc.server.trim().is_empty() {
        errors.push(ValidationError::MissingIrcServer);
    }
    if config.irc.nick.trim().is_empty() {
        errors.push(ValidationError::MissingIrcNick);
    }
    if config.discord.bot_token.trim().is_empty() {
        errors.push(ValidationError::MissingBotToken);
    }
    if config.discord.guild_id.trim().is_empty() {
        errors.push(ValidationError::MissingGuildId);
    }

    let avatar = &config.discord.avatar_url;
    if !(avatar.starts_with("https://") || avatar.starts_with("http://")) {
        errors.push(ValidationError::InvalidAvatarTemplate(avatar.clone()));
    }

    // Dispatcher sizing
    if config.bridge.inbox_capacity == 0 {
        errors.push(ValidationError::ZeroInboxCapacity);
    }
    if config.bridge.max_inflight_sends == Some(0) {
        errors.push(ValidationError::ZeroInflightSends);
    }

    if config.mappings.is_empty() {
        warn!("no channel mappings configured, nothing will be relayed");
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
