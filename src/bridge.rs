//! Bridge lifecycle and the entry points frontends call.

use std::sync::Arc;

use slirc_text::EmojiCache;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::info;

use crate::caps::{CapTables, RelayCapability};
use crate::config::{self, BridgeOptions, Config, ConfigError, FiltersConfig};
use crate::error::BridgeError;
use crate::mapping::{MappingDiff, MappingStore};
use crate::network::{DiscordClient, DiscordListener, IrcClient, IrcListener, expand_prejoin};
use crate::router::{BridgeEvent, Dispatcher, InboundDiscordEvent, InboundIrcMessage, PresenceEvent};

/// Cloneable sender side of the dispatcher inbox.
///
/// Every method that hands off an event suspends only until the inbox has
/// room. `BridgeError::Closed` means the dispatcher is gone.
#[derive(Clone)]
pub struct BridgeHandle {
    tx: mpsc::Sender<BridgeEvent>,
    emoji: Arc<EmojiCache>,
}

impl BridgeHandle {
    #[cfg(test)]
    pub(crate) fn from_sender(tx: mpsc::Sender<BridgeEvent>) -> Self {
        Self {
            tx,
            emoji: Arc::new(EmojiCache::new()),
        }
    }

    /// Relay a line from an IRC channel to its Discord channel.
    /// An empty `username` makes it a system message.
    pub async fn submit_irc_message(&self, msg: InboundIrcMessage) -> Result<(), BridgeError> {
        Ok(self.tx.send(BridgeEvent::IrcMessage(msg)).await?)
    }

    /// Relay a Discord message to its IRC channel.
    pub async fn submit_discord_event(&self, msg: InboundDiscordEvent) -> Result<(), BridgeError> {
        Ok(self.tx.send(BridgeEvent::DiscordMessage(msg)).await?)
    }

    pub async fn presence(&self, event: PresenceEvent) -> Result<(), BridgeError> {
        Ok(self.tx.send(BridgeEvent::Presence(event)).await?)
    }

    /// Join every mapped IRC channel.
    pub async fn join_all(&self) -> Result<(), BridgeError> {
        Ok(self.tx.send(BridgeEvent::JoinAll).await?)
    }

    /// Join one mapped IRC channel again, with its key.
    pub async fn rejoin(&self, channel: impl Into<String>) -> Result<(), BridgeError> {
        let channel = channel.into();
        Ok(self.tx.send(BridgeEvent::Rejoin { channel }).await?)
    }

    /// Replace the mapping table. On error the previous table stays live.
    pub async fn set_mappings<I, K, V>(&self, entries: I) -> Result<MappingDiff, BridgeError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let entries = entries
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(BridgeEvent::SetMappings { entries, reply_tx })
            .await?;
        Ok(reply_rx.await??)
    }

    /// Apply the capability tables of a fresh (re)connection.
    pub async fn capabilities_negotiated(
        &self,
        tables: CapTables,
    ) -> Result<RelayCapability, BridgeError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(BridgeEvent::Capabilities { tables, reply_tx })
            .await?;
        Ok(reply_rx.await?)
    }

    /// Tear the bridge down and wait until it is done.
    pub async fn close(&self) -> Result<(), BridgeError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx.send(BridgeEvent::Shutdown { reply_tx }).await?;
        Ok(reply_rx.await?)
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    /// The emoji cache fed by the Discord listener.
    pub fn emoji(&self) -> Arc<EmojiCache> {
        Arc::clone(&self.emoji)
    }
}

/// A running bridge.
pub struct Bridge {
    handle: BridgeHandle,
    irc: Arc<dyn IrcClient>,
    discord: Arc<dyn DiscordClient>,
    filters: Arc<FiltersConfig>,
    listener_prejoin_commands: Vec<String>,
    puppet_prejoin_commands: Vec<String>,
    options: BridgeOptions,
    dispatcher: JoinHandle<()>,
}

impl Bridge {
    /// Validate `config`, build the mapping table and spawn the dispatcher.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn new(
        config: Config,
        irc: Arc<dyn IrcClient>,
        discord: Arc<dyn DiscordClient>,
    ) -> Result<Self, BridgeError> {
        config::validate(&config).map_err(ConfigError::Invalid)?;

        let mappings = MappingStore::from_entries(&config.mappings)?;
        let options = config.options();
        let filters = Arc::new(config.filters);
        let emoji = Arc::new(EmojiCache::new());

        info!(
            mappings = mappings.snapshot().len(),
            server = %config.irc.server,
            dev_mode = options.dev_mode,
            "starting bridge"
        );

        let (tx, rx) = mpsc::channel(options.inbox_capacity);
        let dispatcher = Dispatcher::new(
            mappings,
            Arc::clone(&irc),
            Arc::clone(&discord),
            Arc::clone(&filters),
            Arc::clone(&emoji),
            options,
            config.discord.avatar_url,
        )
        .spawn(rx);

        Ok(Self {
            handle: BridgeHandle { tx, emoji },
            irc,
            discord,
            filters,
            listener_prejoin_commands: config.irc.listener_prejoin_commands,
            puppet_prejoin_commands: config.irc.puppet_prejoin_commands,
            options,
            dispatcher,
        })
    }

    pub fn handle(&self) -> BridgeHandle {
        self.handle.clone()
    }

    pub fn options(&self) -> BridgeOptions {
        self.options
    }

    /// Listener to register with the IRC collaborator.
    pub fn irc_listener(&self) -> IrcListener {
        IrcListener::new(
            self.handle(),
            Arc::clone(&self.irc),
            Arc::clone(&self.filters),
            self.listener_prejoin_commands.clone(),
            self.options.show_join_quit,
        )
    }

    /// Lines a frontend sends on a puppet connection for `nick` after RPL_WELCOME.
    pub fn puppet_prejoin_commands(&self, nick: &str) -> Vec<String> {
        expand_prejoin(&self.puppet_prejoin_commands, nick)
    }

    /// Listener to register with the Discord collaborator.
    pub fn discord_listener(&self) -> DiscordListener {
        DiscordListener::new(self.handle())
    }

    /// Connect IRC, resolve the identity mode, then open Discord.
    pub async fn open(&self) -> Result<RelayCapability, BridgeError> {
        let tables = self.irc.connect().await?;
        let capability = self.handle.capabilities_negotiated(tables).await?;
        self.discord.open().await?;
        info!(relaying = capability.is_available(), "bridge open");
        Ok(capability)
    }

    /// Tear down and wait for the dispatcher task to finish.
    pub async fn close(self) -> Result<(), BridgeError> {
        self.handle.close().await?;
        let _ = self.dispatcher.await;
        Ok(())
    }
}
