//! Core configuration types and loading.

use serde::Deserialize;
use slirc_text::GlobList;
use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

use super::defaults::{
    default_avatar_url, default_inbox_capacity, default_irc_nick, default_puppet_prejoin_commands,
};
use super::validation::ValidationError;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config: {}", join_errors(.0))]
    Invalid(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Bridge configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// IRC connection settings.
    pub irc: IrcConfig,
    /// Discord connection settings.
    pub discord: DiscordConfig,
    /// Relay behaviour.
    #[serde(default)]
    pub bridge: BridgeConfig,
    /// Ignore/allow lists and message filters.
    #[serde(default)]
    pub filters: FiltersConfig,
    /// `"#irc-channel[ key]" = "discord-channel-id"`.
    #[serde(default)]
    pub mappings: BTreeMap<String, String>,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        content.parse()
    }

    /// Construction-time options for the dispatcher.
    pub fn options(&self) -> BridgeOptions {
        BridgeOptions::from(&self.bridge)
    }
}

impl FromStr for Config {
    type Err = ConfigError;

    fn from_str(content: &str) -> Result<Self, Self::Err> {
        Ok(toml::from_str(content)?)
    }
}

/// IRC connection settings, consumed by the IRC collaborator and the listener.
#[derive(Debug, Clone, Deserialize)]
pub struct IrcConfig {
    /// `host:port` of the IRC server.
    #[serde(default)]
    pub server: String,
    /// Server password (PASS).
    pub password: Option<String>,
    /// Nick of the listener connection.
    #[serde(default = "default_irc_nick")]
    pub nick: String,
    pub sasl_login: Option<String>,
    pub sasl_password: Option<String>,
    /// Connect without TLS.
    #[serde(default)]
    pub no_tls: bool,
    /// Accept any certificate.
    #[serde(default)]
    pub insecure_skip_verify: bool,
    /// Raw lines sent by the listener after RPL_WELCOME. `${NICK}` is replaced.
    #[serde(default)]
    pub listener_prejoin_commands: Vec<String>,
    /// Raw lines a frontend sends on each puppet connection after RPL_WELCOME.
    /// `${NICK}` is replaced; see [`crate::Bridge::puppet_prejoin_commands`].
    #[serde(default = "default_puppet_prejoin_commands")]
    pub puppet_prejoin_commands: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DiscordConfig {
    #[serde(default)]
    pub bot_token: String,
    #[serde(default)]
    pub guild_id: String,
    /// Avatar template for IRC users. `${USERNAME}` is replaced.
    #[serde(default = "default_avatar_url")]
    pub avatar_url: String,
}

/// Relay behaviour.
#[derive(Debug, Clone, Deserialize)]
pub struct BridgeConfig {
    /// Relay joins, parts, quits, kicks and nick changes to Discord.
    #[serde(default)]
    pub show_join_quit: bool,
    /// Log every presence event at debug level.
    #[serde(default)]
    pub debug_presence: bool,
    /// Debug-level logging with targets; see [`crate::telemetry::directives`].
    #[serde(default)]
    pub dev_mode: bool,
    /// Capacity of the dispatcher inbox.
    #[serde(default = "default_inbox_capacity")]
    pub inbox_capacity: usize,
    /// Upper bound on concurrent Discord sends. Unbounded when unset.
    pub max_inflight_sends: Option<usize>,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            show_join_quit: false,
            debug_presence: false,
            dev_mode: false,
            inbox_capacity: default_inbox_capacity(),
            max_inflight_sends: None,
        }
    }
}

/// Ignore/allow lists and message filters.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FiltersConfig {
    /// Hostmasks (`nick!user@host`) whose messages never reach Discord.
    #[serde(default)]
    pub irc_ignores: GlobList,
    /// IRC message texts that never reach Discord.
    #[serde(default)]
    pub irc_filtered_messages: GlobList,
    /// Discord message texts that never reach IRC.
    #[serde(default)]
    pub discord_filtered_messages: GlobList,
    /// Discord user ids whose messages never reach IRC.
    #[serde(default)]
    pub discord_ignores: HashSet<String>,
    /// When non-empty, only these Discord user ids reach IRC.
    #[serde(default)]
    pub discord_allowed: HashSet<String>,
}

/// Options fixed at construction. Replaces any process-global switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BridgeOptions {
    pub show_join_quit: bool,
    pub debug_presence: bool,
    pub dev_mode: bool,
    pub inbox_capacity: usize,
    pub max_inflight_sends: Option<usize>,
}

impl Default for BridgeOptions {
    fn default() -> Self {
        Self::from(&BridgeConfig::default())
    }
}

impl From<&BridgeConfig> for BridgeOptions {
    fn from(config: &BridgeConfig) -> Self {
        Self {
            show_join_quit: config.show_join_quit,
            debug_presence: config.debug_presence,
            dev_mode: config.dev_mode,
            inbox_capacity: config.inbox_capacity,
            max_inflight_sends: config.max_inflight_sends,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
        [irc]
        server = "irc.example.net:6697"

        [discord]
        bot_token = "token"
        guild_id = "1"
    "#;

    #[test]
    fn test_defaults() {
        let config: Config = MINIMAL.parse().unwrap();
        assert_eq!(config.irc.nick, "~d");
        assert_eq!(config.irc.puppet_prejoin_commands, vec!["MODE ${NICK} +D"]);
        assert!(config.irc.listener_prejoin_commands.is_empty());
        assert_eq!(
            config.discord.avatar_url,
            "https://robohash.org/${USERNAME}.png?set=set4"
        );
        assert!(!config.bridge.show_join_quit);
        assert_eq!(config.bridge.inbox_capacity, 256);
        assert_eq!(config.bridge.max_inflight_sends, None);
        assert!(config.mappings.is_empty());
        assert!(config.filters.irc_ignores.is_empty());
    }

    #[test]
    fn test_full_config() {
        let config: Config = r##"
            [irc]
            server = "irc.example.net:6697"
            nick = "bridge"
            listener_prejoin_commands = ["PRIVMSG NickServ :IDENTIFY ${NICK} hunter2"]

            [discord]
            bot_token = "token"
            guild_id = "1"

            [bridge]
            show_join_quit = true
            max_inflight_sends = 8

            [filters]
            irc_ignores = ["*!*@spam.example"]
            discord_filtered_messages = ["*http*"]
            discord_ignores = ["99"]

            [mappings]
            "#general" = "100"
            "#secret hunter2" = "200"
        "##
        .parse()
        .unwrap();

        assert_eq!(config.irc.nick, "bridge");
        assert!(config.bridge.show_join_quit);
        assert_eq!(config.options().max_inflight_sends, Some(8));
        assert!(config.filters.irc_ignores.is_match("troll!x@spam.example"));
        assert!(config.filters.discord_filtered_messages.is_match("see http://x"));
        assert!(config.filters.discord_ignores.contains("99"));
        assert_eq!(config.mappings.get("#secret hunter2").map(String::as_str), Some("200"));
    }

    #[test]
    fn test_invalid_glob_fails_parse() {
        let raw = format!("{MINIMAL}\n[filters]\nirc_ignores = [\"[\"]\n");
        assert!(matches!(raw.parse::<Config>(), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bridge.toml");
        std::fs::write(&path, MINIMAL).unwrap();
        let config = Config::load(&path).unwrap();
        assert_eq!(config.irc.server, "irc.example.net:6697");

        let missing = Config::load(dir.path().join("missing.toml"));
        assert!(matches!(missing, Err(ConfigError::Io(_))));
    }
}
