use std::time::Duration;

use serde::Deserialize;
use serde_json::Value;

use crate::errors::SnapshotError;
use crate::snapshot::Snapshot;

/// How often to send the keepalive frame while connected.
pub const KEEPALIVE_INTERVAL: Duration = Duration::from_secs(25);

/// Literal text sent as the keepalive probe.
pub const KEEPALIVE_PAYLOAD: &str = "ping";

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(rename = "type")]
    kind: Option<String>,
    #[serde(default)]
    data: Value,
}

/// An inbound channel message.
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelMessage {
    InitialState(Snapshot),
    StateUpdate(Snapshot),
    /// Any other `type`. Carries the type name for logging only.
    Unknown(String),
}

impl ChannelMessage {
    pub fn parse(raw: &str) -> Result<Self, SnapshotError> {
        let envelope: Envelope = serde_json::from_str(raw).map_err(SnapshotError::InvalidJson)?;
        let kind = envelope.kind.ok_or(SnapshotError::MissingType)?;
        match kind.as_str() {
            "initial_state" => Ok(Self::InitialState(Snapshot::from_value(envelope.data)?)),
            "state_update" => Ok(Self::StateUpdate(Snapshot::from_value(envelope.data)?)),
            _ => Ok(Self::Unknown(kind)),
        }
    }

    /// Both snapshot-carrying types mean the same thing: replace everything.
    pub fn into_snapshot(self) -> Option<Snapshot> {
        match self {
            Self::InitialState(snapshot) | Self::StateUpdate(snapshot) => Some(snapshot),
            Self::Unknown(_) => None,
        }
    }
}
