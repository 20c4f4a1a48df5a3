//! Configuration loading and management.
//!
//! This module is split into logical submodules:
//! - [`types`]: Config struct definitions and loading (Config, IrcConfig, DiscordConfig, ...)
//! - [`defaults`]: serde default functions
//! - [`validation`]: Startup validation that reports every problem at once

mod defaults;
mod types;
mod validation;

pub use types::{
    BridgeConfig, BridgeOptions, Config, ConfigError, DiscordConfig, FiltersConfig, IrcConfig,
};
pub use validation::{ValidationError, validate};
