//! System message text for presence events.

use super::PresenceEvent;

pub(super) fn render(event: &PresenceEvent) -> String {
    match event {
        PresenceEvent::Join { source, .. } => {
            format!("{} joined ({}@{})", source.nick, source.user, source.host)
        }
        PresenceEvent::Part { source, reason, .. } => {
            let mut text = format!("{} left ({}@{})", source.nick, source.user, source.host);
            if let Some(reason) = reason.as_deref().filter(|r| !r.is_empty()) {
                text.push_str(": ");
                text.push_str(reason);
            }
            text
        }
        PresenceEvent::Quit { source, reason } => format!(
            "{} quit ({}@{}) Quit: {}",
            source.nick,
            source.user,
            source.host,
            reason.as_deref().unwrap_or(&source.nick)
        ),
        PresenceEvent::Kick {
            source,
            target,
            reason,
            ..
        } => format!(
            "{} was kicked by {}: {}",
            target,
            source.nick,
            reason.as_deref().unwrap_or(&source.nick)
        ),
        PresenceEvent::Nick { source, new_nick } => {
            format!("_{} changed their nick to {}_", source.nick, new_nick)
        }
    }
}
