//! Inbound messages from push-channel subscribers

use serde::{Deserialize, Serialize};

/// Messages a subscriber may send over the push channel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Heartbeat; answered with a `pong` envelope
    Ping,

    /// Well-formed message of a type the service does not handle
    #[serde(other)]
    Unknown,
}

impl ClientMessage {
    /// Parse a text frame
    pub fn parse(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }
}
