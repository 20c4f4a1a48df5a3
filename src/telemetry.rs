//! Logging setup and span constructors.

use tracing_subscriber::EnvFilter;

use crate::config::BridgeOptions;

/// Install the global `fmt` subscriber.
///
/// `RUST_LOG` wins when set; otherwise the level follows [`directives`].
/// Returns false if a subscriber was already installed.
pub fn init(options: &BridgeOptions) -> bool {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directives(options)));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(options.dev_mode)
        .try_init()
        .is_ok()
}

/// Default filter directives.
///
/// `dev_mode` turns on debug everywhere. `debug_presence` alone opens debug
/// for the dispatcher so its presence trace is not filtered out.
pub fn directives(options: &BridgeOptions) -> String {
    if options.dev_mode {
        "debug".to_string()
    } else if options.debug_presence {
        "info,slirc_bridge::router=debug".to_string()
    } else {
        "info".to_string()
    }
}

/// Standardized span constructors for bridge observability.
pub mod spans {
    use tracing::{Span, info_span};

    /// Span for one event from the IRC connection.
    pub fn irc_event(kind: &str) -> Span {
        info_span!("irc_event", kind = %kind)
    }

    /// Span for one event from the Discord gateway.
    pub fn discord_event(kind: &str) -> Span {
        info_span!("discord_event", kind = %kind)
    }

    /// Span wrapping the dispatcher task.
    pub fn dispatcher() -> Span {
        info_span!("dispatcher")
    }
}
