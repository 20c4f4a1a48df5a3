//! slirc-bridge - Straylight IRC/Discord bridge engine.
//!
//! Relays messages and presence between mapped IRC and Discord channels.
//! Protocol transports are supplied by the embedding frontend through the
//! [`IrcClient`] and [`DiscordClient`] traits; decoded protocol events go in
//! through [`IrcListener`] and [`DiscordListener`].
//!
//! ```no_run
//! # use std::sync::Arc;
//! # async fn run(
//! #     irc: Arc<dyn slirc_bridge::IrcClient>,
//! #     discord: Arc<dyn slirc_bridge::DiscordClient>,
//! # ) -> Result<(), Box<dyn std::error::Error>> {
//! use slirc_bridge::{Bridge, Config};
//!
//! let config = Config::load("bridge.toml")?;
//! slirc_bridge::telemetry::init(&config.options());
//!
//! let bridge = Bridge::new(config, irc, discord)?;
//! let _irc_events = bridge.irc_listener();
//! let _discord_events = bridge.discord_listener();
//! bridge.open().await?;
//! // ... feed events until shutdown ...
//! bridge.close().await?;
//! # Ok(())
//! # }
//! ```

pub mod bridge;
pub mod caps;
pub mod config;
pub mod error;
pub mod identity;
pub mod mapping;
pub mod network;
pub mod router;
pub mod telemetry;

pub use bridge::{Bridge, BridgeHandle};
pub use caps::{CapTables, CapabilityNegotiator, RelayCapability};
pub use config::{BridgeOptions, Config};
pub use error::{BridgeError, ClientError, MappingError};
pub use identity::{IdentityDecision, IdentityResolver};
pub use mapping::{ChannelMapping, MappingDiff, MappingSet, MappingStore};
pub use network::{
    DiscordClient, DiscordEvent, DiscordEventHandler, DiscordListener, IrcClient, IrcEvent,
    IrcEventHandler, IrcListener,
};
pub use router::{InboundDiscordEvent, InboundIrcMessage};
