//! Fire-and-forget Discord deliveries.
//!
//! Every send runs in its own task so the dispatcher never waits on Discord.
//! Failures are logged with the full message and never retried. When a limit
//! is configured, the permit is taken inside the task: a burst queues tasks,
//! not dispatcher events.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tracing::error;

use crate::network::{DiscordClient, SendAs};

#[derive(Clone)]
pub struct Outbox {
    discord: Arc<dyn DiscordClient>,
    limit: Option<Arc<Semaphore>>,
}

impl Outbox {
    pub fn new(discord: Arc<dyn DiscordClient>, max_inflight: Option<usize>) -> Self {
        Self {
            discord,
            limit: max_inflight.map(|permits| Arc::new(Semaphore::new(permits))),
        }
    }

    /// Post under the IRC user's name and avatar.
    pub fn send_as(&self, channel_id: String, message: SendAs) {
        let discord = Arc::clone(&self.discord);
        self.spawn(async move {
            let username = message.username.clone();
            let avatar = message.avatar_url.clone();
            let content = message.content.clone();
            if let Err(e) = discord.send_as(&channel_id, message).await {
                error!(
                    error = %e,
                    channel = %channel_id,
                    username = %username,
                    avatar = %avatar,
                    content = %content,
                    "could not transmit message to discord"
                );
            }
        });
    }

    /// Post as the bot itself (system messages).
    pub fn send_message(&self, channel_id: String, content: String) {
        let discord = Arc::clone(&self.discord);
        self.spawn(async move {
            if let Err(e) = discord.send_message(&channel_id, &content).await {
                error!(
                    error = %e,
                    channel = %channel_id,
                    content = %content,
                    "could not transmit system message to discord"
                );
            }
        });
    }

    fn spawn<F>(&self, send: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let limit = self.limit.clone();
        tokio::spawn(async move {
            let _permit = match limit {
                Some(limit) => match limit.acquire_owned().await {
                    Ok(permit) => Some(permit),
                    Err(_) => return,
                },
                None => None,
            };
            send.await;
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ClientError;
    use crate::network::AllowedMentions;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::sync::mpsc;

    struct SlowDiscord {
        inflight: AtomicUsize,
        peak: AtomicUsize,
        rejected: AtomicUsize,
        done: mpsc::UnboundedSender<String>,
    }

    #[async_trait]
    impl DiscordClient for SlowDiscord {
        async fn open(&self) -> Result<(), ClientError> {
            Ok(())
        }
        async fn close(&self) -> Result<(), ClientError> {
            Ok(())
        }
        async fn send_message(&self, _channel_id: &str, content: &str) -> Result<(), ClientError> {
            let now = self.inflight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            self.inflight.fetch_sub(1, Ordering::SeqCst);
            let _ = self.done.send(content.to_owned());
            Ok(())
        }
        async fn send_as(&self, _channel_id: &str, _message: SendAs) -> Result<(), ClientError> {
            self.rejected.fetch_add(1, Ordering::SeqCst);
            Err(ClientError::Discord("webhook missing".into()))
        }
        fn avatar_for(&self, _username: &str) -> Option<String> {
            None
        }
    }

    fn discord() -> (Arc<SlowDiscord>, mpsc::UnboundedReceiver<String>) {
        let (done, rx) = mpsc::unbounded_channel();
        let discord = Arc::new(SlowDiscord {
            inflight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
            rejected: AtomicUsize::new(0),
            done,
        });
        (discord, rx)
    }

    #[tokio::test]
    async fn test_limit_bounds_concurrency() {
        let (discord, mut rx) = discord();
        let outbox = Outbox::new(discord.clone(), Some(2));
        for i in 0..6 {
            outbox.send_message("1".into(), i.to_string());
        }
        for _ in 0..6 {
            tokio::time::timeout(Duration::from_secs(2), rx.recv())
                .await
                .unwrap()
                .unwrap();
        }
        assert!(discord.peak.load(Ordering::SeqCst) <= 2);
    }

    #[tokio::test]
    async fn test_unbounded_by_default() {
        let (discord, mut rx) = discord();
        let outbox = Outbox::new(discord.clone(), None);
        for i in 0..4 {
            outbox.send_message("1".into(), i.to_string());
        }
        for _ in 0..4 {
            tokio::time::timeout(Duration::from_secs(2), rx.recv())
                .await
                .unwrap()
                .unwrap();
        }
        assert!(discord.peak.load(Ordering::SeqCst) >= 1);
    }

    #[tokio::test]
    async fn test_failure_does_not_stop_later_sends() {
        let (discord, mut rx) = discord();
        let outbox = Outbox::new(discord.clone(), Some(1));
        outbox.send_as(
            "1".into(),
            SendAs {
                username: "bob".into(),
                avatar_url: String::new(),
                content: "hi".into(),
                allowed_mentions: AllowedMentions::default(),
            },
        );
        outbox.send_message("1".into(), "after".into());

        let delivered = tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(delivered, "after");
        assert_eq!(discord.rejected.load(Ordering::SeqCst), 1);
    }
}
