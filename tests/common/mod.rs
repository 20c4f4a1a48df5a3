//! Integration test common infrastructure.
//!
//! Mock collaborators that record everything the bridge sends, plus helpers
//! for building configs and awaiting recorded traffic.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use slirc_bridge::network::SendAs;
use slirc_bridge::{CapTables, ClientError, Config, DiscordClient, IrcClient};
use tokio::sync::mpsc;
use tokio::time::timeout;
use tracing::subscriber::DefaultGuard;

pub const RECV_TIMEOUT: Duration = Duration::from_secs(2);

/// Recording IRC connection.
pub struct MockIrc {
    nick: String,
    caps: Mutex<CapTables>,
    rosters: Mutex<HashMap<String, HashSet<String>>>,
    lines: mpsc::UnboundedSender<String>,
    pub connected: AtomicBool,
    pub quit: AtomicBool,
}

impl MockIrc {
    pub fn new(nick: &str) -> (Arc<Self>, mpsc::UnboundedReceiver<String>) {
        let (lines, rx) = mpsc::unbounded_channel();
        let irc = Arc::new(Self {
            nick: nick.to_string(),
            caps: Mutex::new(CapTables::default()),
            rosters: Mutex::new(HashMap::new()),
            lines,
            connected: AtomicBool::new(false),
            quit: AtomicBool::new(false),
        });
        (irc, rx)
    }

    /// Tables the next `connect` reports.
    pub fn offer_caps(&self, ls: &str, ack: &str) {
        let mut tables = CapTables::default();
        tables.record_ls(ls);
        tables.record_ack(ack);
        *self.caps.lock() = tables;
    }

    pub fn add_to_roster(&self, channel: &str, nick: &str) {
        self.rosters
            .lock()
            .entry(channel.to_lowercase())
            .or_default()
            .insert(nick.to_lowercase());
    }
}

#[async_trait]
impl IrcClient for MockIrc {
    async fn connect(&self) -> Result<CapTables, ClientError> {
        self.connected.store(true, Ordering::SeqCst);
        Ok(self.caps.lock().clone())
    }

    fn send_raw(&self, line: &str) -> Result<(), ClientError> {
        self.lines
            .send(line.to_string())
            .map_err(|_| ClientError::Disconnected)
    }

    fn privmsg(&self, target: &str, text: &str) -> Result<(), ClientError> {
        self.send_raw(&format!("PRIVMSG {target} :{text}"))
    }

    fn nick(&self) -> String {
        self.nick.clone()
    }

    fn is_user_in_channel(&self, channel: &str, nick: &str) -> bool {
        self.rosters
            .lock()
            .get(&channel.to_lowercase())
            .is_some_and(|members| members.contains(&nick.to_lowercase()))
    }

    async fn quit(&self) {
        self.quit.store(true, Ordering::SeqCst);
    }
}

/// What the bridge posted to Discord.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sent {
    Message { channel: String, content: String },
    As { channel: String, message: SendAs },
}

impl Sent {
    pub fn channel(&self) -> &str {
        match self {
            Self::Message { channel, .. } | Self::As { channel, .. } => channel,
        }
    }

    pub fn content(&self) -> &str {
        match self {
            Self::Message { content, .. } => content,
            Self::As { message, .. } => &message.content,
        }
    }
}

/// Recording Discord session.
pub struct MockDiscord {
    avatars: Mutex<HashMap<String, String>>,
    sent: mpsc::UnboundedSender<Sent>,
    pub opened: AtomicBool,
    pub closed: AtomicBool,
}

impl MockDiscord {
    pub fn new() -> (Arc<Self>, mpsc::UnboundedReceiver<Sent>) {
        let (sent, rx) = mpsc::unbounded_channel();
        let discord = Arc::new(Self {
            avatars: Mutex::new(HashMap::new()),
            sent,
            opened: AtomicBool::new(false),
            closed: AtomicBool::new(false),
        });
        (discord, rx)
    }

    pub fn set_avatar(&self, username: &str, url: &str) {
        self.avatars
            .lock()
            .insert(username.to_string(), url.to_string());
    }
}

#[async_trait]
impl DiscordClient for MockDiscord {
    async fn open(&self) -> Result<(), ClientError> {
        self.opened.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn close(&self) -> Result<(), ClientError> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn send_message(&self, channel_id: &str, content: &str) -> Result<(), ClientError> {
        self.sent
            .send(Sent::Message {
                channel: channel_id.to_string(),
                content: content.to_string(),
            })
            .map_err(|_| ClientError::Disconnected)
    }

    async fn send_as(&self, channel_id: &str, message: SendAs) -> Result<(), ClientError> {
        self.sent
            .send(Sent::As {
                channel: channel_id.to_string(),
                message,
            })
            .map_err(|_| ClientError::Disconnected)
    }

    fn avatar_for(&self, username: &str) -> Option<String> {
        self.avatars.lock().get(username).cloned()
    }
}

/// Minimal valid config with the given mappings and extra TOML sections.
pub fn config(mappings: &[(&str, &str)], extra: &str) -> Config {
    let mut raw = String::from(
        "[irc]\nserver = \"irc.example.net:6697\"\n\
         [discord]\nbot_token = \"token\"\nguild_id = \"1\"\n",
    );
    raw.push_str(extra);
    raw.push_str("\n[mappings]\n");
    for (irc, discord) in mappings {
        raw.push_str(&format!("\"{irc}\" = \"{discord}\"\n"));
    }
    raw.parse().expect("test config parses")
}

/// Next recorded item, failing after [`RECV_TIMEOUT`].
pub async fn next<T>(rx: &mut mpsc::UnboundedReceiver<T>) -> anyhow::Result<T> {
    timeout(RECV_TIMEOUT, rx.recv())
        .await?
        .ok_or_else(|| anyhow::anyhow!("recorder closed"))
}

/// Formatted log output captured for the current thread.
#[derive(Clone, Default)]
pub struct LogCapture {
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl LogCapture {
    /// Route debug-and-above events on this thread into the capture.
    ///
    /// `#[tokio::test]` runs spawned tasks on the test thread, so the
    /// dispatcher's events land here too.
    pub fn install() -> (Self, DefaultGuard) {
        let capture = Self::default();
        let writer = capture.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        let guard = tracing::subscriber::set_default(subscriber);
        (capture, guard)
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.buffer.lock()).into_owned()
    }
}

impl io::Write for LogCapture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
