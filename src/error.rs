//! Unified error handling for slirc-bridge.
//!
//! Each concern has its own enum; [`BridgeError`] wraps them for the public
//! entry points. Delivery failures are never surfaced to the originating side,
//! they are logged where they happen.

use thiserror::Error;

use crate::config::ConfigError;

// ============================================================================
// Mapping Errors
// ============================================================================

/// A mapping table names the same channel twice.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MappingError {
    #[error("IRC channel {0} is mapped more than once")]
    DuplicateIrcChannel(String),

    #[error("Discord channel {0} is mapped more than once")]
    DuplicateDiscordChannel(String),
}

impl MappingError {
    /// Get a static error code string for log labeling.
    #[inline]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::DuplicateIrcChannel(_) => "duplicate_irc_channel",
            Self::DuplicateDiscordChannel(_) => "duplicate_discord_channel",
        }
    }
}

// ============================================================================
// Collaborator Errors
// ============================================================================

/// Failures reported by the protocol collaborators.
#[derive(Debug, Clone, Error)]
pub enum ClientError {
    #[error("irc: {0}")]
    Irc(String),

    #[error("discord: {0}")]
    Discord(String),

    #[error("connection closed")]
    Disconnected,
}

impl ClientError {
    #[inline]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Irc(_) => "irc",
            Self::Discord(_) => "discord",
            Self::Disconnected => "disconnected",
        }
    }
}

// ============================================================================
// Bridge Errors (public entry points)
// ============================================================================

#[derive(Debug, Error)]
pub enum BridgeError {
    /// The dispatcher has shut down; nothing more can be submitted.
    #[error("bridge is closed")]
    Closed,

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Mapping(#[from] MappingError),

    #[error(transparent)]
    Client(#[from] ClientError),
}

impl BridgeError {
    #[inline]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Closed => "closed",
            Self::Config(_) => "config",
            Self::Mapping(e) => e.error_code(),
            Self::Client(e) => e.error_code(),
        }
    }
}

impl<T> From<tokio::sync::mpsc::error::SendError<T>> for BridgeError {
    fn from(_: tokio::sync::mpsc::error::SendError<T>) -> Self {
        Self::Closed
    }
}

impl From<tokio::sync::oneshot::error::RecvError> for BridgeError {
    fn from(_: tokio::sync::oneshot::error::RecvError) -> Self {
        Self::Closed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(
            MappingError::DuplicateIrcChannel("#a".into()).error_code(),
            "duplicate_irc_channel"
        );
        assert_eq!(BridgeError::Closed.error_code(), "closed");
        let wrapped: BridgeError = ClientError::Disconnected.into();
        assert_eq!(wrapped.error_code(), "disconnected");
    }

    #[test]
    fn test_display_names_channel() {
        let err = MappingError::DuplicateDiscordChannel("123".into());
        assert_eq!(err.to_string(), "Discord channel 123 is mapped more than once");
    }
}
