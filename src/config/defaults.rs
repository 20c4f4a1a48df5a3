//! Default value functions for configuration.

/// Nick used by the listener connection.
pub fn default_irc_nick() -> String {
    "~d".to_string()
}

/// Sent by every puppet connection after it registers. Marks puppets as deaf.
pub fn default_puppet_prejoin_commands() -> Vec<String> {
    vec!["MODE ${NICK} +D".to_string()]
}

pub fn default_avatar_url() -> String {
    "https://robohash.org/${USERNAME}.png?set=set4".to_string()
}

pub fn default_inbox_capacity() -> usize {
    256
}
