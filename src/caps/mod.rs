//! Relay capability negotiation.
//!
//! The IRC collaborator owns the CAP handshake itself; this module decides
//! what to request and reads the outcome. The outcome is consumed once per
//! connection by the [`IdentityResolver`](crate::identity::IdentityResolver),
//! after registration and before any puppeted line is sent.
//!
//! `draft/relaymsg` may carry a value: the characters the server reserves as
//! nickname separators for spoofed nicks (`draft/relaymsg=/`).

use std::collections::HashMap;

use tracing::{debug, info};

/// Identity relay extension.
pub const RELAYMSG_CAP: &str = "draft/relaymsg";

/// Capabilities the bridge asks for when the server offers them.
const REQUESTED: &[&str] = &[RELAYMSG_CAP];

/// Capability state as left by the handshake.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CapTables {
    /// `CAP LS` advertisement: name → optional value.
    pub available: HashMap<String, Option<String>>,
    /// Names the server ACKed, in order.
    pub acknowledged: Vec<String>,
}

impl CapTables {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one `CAP LS` payload. Multi-line listings call this per line.
    pub fn record_ls(&mut self, caps: &str) {
        for token in caps.split_whitespace() {
            let (name, value) = match token.split_once('=') {
                Some((name, value)) => (name, Some(value.to_owned())),
                None => (token, None),
            };
            self.available.insert(name.to_owned(), value);
        }
    }

    /// Record one `CAP ACK` payload. `-name` entries withdraw an earlier ACK.
    pub fn record_ack(&mut self, caps: &str) {
        for token in caps.split_whitespace() {
            // Some servers echo the value in the ACK.
            let token = token.split('=').next().unwrap_or(token);
            if let Some(removed) = token.strip_prefix('-') {
                self.acknowledged.retain(|cap| cap != removed);
            } else if !self.is_acknowledged(token) {
                self.acknowledged.push(token.to_owned());
            }
        }
    }

    pub fn is_acknowledged(&self, cap: &str) -> bool {
        self.acknowledged.iter().any(|acked| acked == cap)
    }

    /// Advertised value of `cap`, if it had one.
    pub fn value(&self, cap: &str) -> Option<&str> {
        self.available.get(cap).and_then(|v| v.as_deref())
    }
}

/// Negotiated relay-spoofing outcome.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum RelayCapability {
    /// Not acknowledged; classic puppeting only.
    #[default]
    Unavailable,
    /// Acknowledged, with the reserved separator characters (possibly none).
    Available { separators: String },
}

impl RelayCapability {
    pub fn is_available(&self) -> bool {
        matches!(self, Self::Available { .. })
    }

    /// First reserved separator, if the server named any.
    pub fn separator(&self) -> Option<char> {
        match self {
            Self::Available { separators } => separators.chars().next(),
            Self::Unavailable => None,
        }
    }
}

/// Stateless reader of the handshake.
#[derive(Debug, Clone, Copy, Default)]
pub struct CapabilityNegotiator;

impl CapabilityNegotiator {
    /// Everything the bridge may request.
    pub fn requested() -> &'static [&'static str] {
        REQUESTED
    }

    /// `CAP REQ` line for the wanted capabilities the server advertised.
    pub fn request_line(tables: &CapTables) -> Option<String> {
        let wanted: Vec<&str> = REQUESTED
            .iter()
            .copied()
            .filter(|cap| tables.available.contains_key(*cap))
            .collect();
        if wanted.is_empty() {
            return None;
        }
        Some(format!("CAP REQ :{}", wanted.join(" ")))
    }

    /// Read the relay outcome. Absence is not an error.
    pub fn negotiate(tables: &CapTables) -> RelayCapability {
        if !tables.is_acknowledged(RELAYMSG_CAP) {
            debug!("{} not acknowledged, using classic puppets", RELAYMSG_CAP);
            return RelayCapability::Unavailable;
        }
        let separators = tables.value(RELAYMSG_CAP).unwrap_or_default().to_owned();
        info!(separators = %separators, "{} acknowledged", RELAYMSG_CAP);
        RelayCapability::Available { separators }
    }
}
