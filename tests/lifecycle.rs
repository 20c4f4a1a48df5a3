//! Integration tests for bridge lifecycle: joining, reconfiguration, teardown.

mod common;

use std::sync::atomic::Ordering;

use common::{MockDiscord, MockIrc, Sent, config, next};
use slirc_bridge::network::Hostmask;
use slirc_bridge::{
    Bridge, BridgeError, ChannelMapping, InboundIrcMessage, IrcEvent, IrcEventHandler,
    MappingError,
};

#[tokio::test]
async fn test_open_connects_irc_then_discord() -> anyhow::Result<()> {
    let (irc, _lines) = MockIrc::new("~d");
    let (discord, _sent) = MockDiscord::new();
    let bridge = Bridge::new(config(&[("#a", "1")], ""), irc.clone(), discord.clone())?;

    assert!(!irc.connected.load(Ordering::SeqCst));
    assert!(!discord.opened.load(Ordering::SeqCst));
    bridge.open().await?;
    assert!(irc.connected.load(Ordering::SeqCst));
    assert!(discord.opened.load(Ordering::SeqCst));
    Ok(())
}

#[tokio::test]
async fn test_welcome_runs_prejoin_and_joins() -> anyhow::Result<()> {
    let (irc, mut lines) = MockIrc::new("~d");
    let (discord, _sent) = MockDiscord::new();
    let mut cfg = config(&[("#open", "1"), ("#secret hunter2", "2")], "");
    cfg.irc.listener_prejoin_commands = vec!["PRIVMSG NickServ :IDENTIFY ${NICK} pw".into()];
    let bridge = Bridge::new(cfg, irc, discord)?;

    bridge
        .irc_listener()
        .handle(IrcEvent::Welcome { nick: "~d".into() })
        .await;

    assert_eq!(
        next(&mut lines).await?,
        "PRIVMSG NickServ :IDENTIFY ~d pw"
    );
    assert_eq!(next(&mut lines).await?, "JOIN #secret,#open hunter2");
    Ok(())
}

#[tokio::test]
async fn test_kick_of_self_rejoins_with_key() -> anyhow::Result<()> {
    let (irc, mut lines) = MockIrc::new("~d");
    let (discord, _sent) = MockDiscord::new();
    let bridge = Bridge::new(config(&[("#secret hunter2", "2")], ""), irc, discord)?;

    bridge
        .irc_listener()
        .handle(IrcEvent::Kick {
            channel: "#secret".into(),
            source: Hostmask::new("op", "o", "example.org"),
            target: "~d".into(),
            reason: Some("out".into()),
        })
        .await;

    assert_eq!(next(&mut lines).await?, "JOIN #secret hunter2");
    Ok(())
}

#[tokio::test]
async fn test_reconfiguration_parts_and_joins_only_the_difference() -> anyhow::Result<()> {
    let (irc, mut lines) = MockIrc::new("~d");
    let (discord, mut sent) = MockDiscord::new();
    let bridge = Bridge::new(config(&[("#A", "X"), ("#B", "Y")], ""), irc, discord)?;
    let handle = bridge.handle();

    let diff = handle.set_mappings([("#B", "Y"), ("#C", "Z")]).await?;
    assert_eq!(diff.parted, vec!["#A".to_string()]);
    assert_eq!(diff.joined, vec![ChannelMapping::new("#C", "Z", None)]);
    assert_eq!(next(&mut lines).await?, "PART #A");
    assert_eq!(next(&mut lines).await?, "JOIN #C");

    handle
        .submit_irc_message(InboundIrcMessage::system("#A", "gone"))
        .await?;
    handle
        .submit_irc_message(InboundIrcMessage::system("#C", "new"))
        .await?;
    assert_eq!(
        next(&mut sent).await?,
        Sent::Message {
            channel: "Z".into(),
            content: "new".into(),
        }
    );
    Ok(())
}

#[tokio::test]
async fn test_duplicate_reconfiguration_keeps_previous_table() -> anyhow::Result<()> {
    let (irc, mut lines) = MockIrc::new("~d");
    let (discord, mut sent) = MockDiscord::new();
    let bridge = Bridge::new(config(&[("#A", "X")], ""), irc, discord)?;
    let handle = bridge.handle();

    let err = handle
        .set_mappings([("#B", "Y"), ("#C", "Y")])
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        BridgeError::Mapping(MappingError::DuplicateDiscordChannel(ref id)) if id == "Y"
    ));

    handle
        .submit_irc_message(InboundIrcMessage::system("#a", "still here"))
        .await?;
    assert_eq!(next(&mut sent).await?.channel(), "X");
    assert!(lines.try_recv().is_err());
    Ok(())
}

#[tokio::test]
async fn test_duplicate_mapping_fails_construction() {
    let (irc, _lines) = MockIrc::new("~d");
    let (discord, _sent) = MockDiscord::new();
    let result = Bridge::new(config(&[("#a", "1"), ("#b", "1")], ""), irc, discord);
    assert!(matches!(
        result,
        Err(BridgeError::Mapping(MappingError::DuplicateDiscordChannel(_)))
    ));
}

#[tokio::test]
async fn test_invalid_config_fails_construction() {
    let (irc, _lines) = MockIrc::new("~d");
    let (discord, _sent) = MockDiscord::new();
    let mut cfg = config(&[("#a", "1")], "");
    cfg.discord.bot_token.clear();
    let result = Bridge::new(cfg, irc, discord);
    assert!(matches!(result, Err(BridgeError::Config(_))));
}

#[tokio::test]
async fn test_close_is_a_rendezvous() -> anyhow::Result<()> {
    let (irc, _lines) = MockIrc::new("~d");
    let (discord, _sent) = MockDiscord::new();
    let bridge = Bridge::new(config(&[("#a", "1")], ""), irc.clone(), discord.clone())?;
    let handle = bridge.handle();

    bridge.close().await?;

    assert!(discord.closed.load(Ordering::SeqCst));
    assert!(irc.quit.load(Ordering::SeqCst));
    assert!(handle.is_closed());
    let after = handle
        .submit_irc_message(InboundIrcMessage::system("#a", "late"))
        .await;
    assert!(matches!(after, Err(BridgeError::Closed)));
    assert!(matches!(handle.close().await, Err(BridgeError::Closed)));
    Ok(())
}

#[tokio::test]
async fn test_puppet_prejoin_commands_substitute_nick() -> anyhow::Result<()> {
    let (irc, _lines) = MockIrc::new("~d");
    let (discord, _sent) = MockDiscord::new();
    let bridge = Bridge::new(config(&[("#a", "1")], ""), irc, discord)?;
    assert_eq!(bridge.puppet_prejoin_commands("Bob/d"), vec!["MODE Bob/d +D"]);

    let (irc, _lines) = MockIrc::new("~d");
    let (discord, _sent) = MockDiscord::new();
    let mut cfg = config(&[("#a", "1")], "");
    cfg.irc.puppet_prejoin_commands = vec!["MODE ${NICK} +B".into(), "AWAY :relay".into()];
    let bridge = Bridge::new(cfg, irc, discord)?;
    assert_eq!(
        bridge.puppet_prejoin_commands("Zoe"),
        vec!["MODE Zoe +B", "AWAY :relay"]
    );
    Ok(())
}
