//! Typed error hierarchy for the dashboard client.
//!
//! Four top-level enums cover the subsystems:
//! - `ConfigError`: configuration file and page URL problems
//! - `SnapshotError`: payloads that cannot be turned into a snapshot at all
//! - `ConnectionError`: WebSocket channel failures
//! - `DocumentError`: plan document list/content failures

use thiserror::Error;

/// Errors from loading or layering configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {source}")]
    ReadFailed {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {path}: {source}")]
    ParseFailed {
        path: std::path::PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid dashboard URL '{url}': {message}")]
    InvalidUrl { url: String, message: String },

    #[error("Unsupported URL scheme '{scheme}' (expected http or https)")]
    UnsupportedScheme { scheme: String },

    #[error("Invalid value '{value}' for {field}")]
    InvalidValue { field: &'static str, value: String },
}

/// Errors from turning an inbound payload into a snapshot.
///
/// Missing fields never produce these; only payloads that are not JSON or
/// not an object do.
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("Payload is not valid JSON: {0}")]
    InvalidJson(#[source] serde_json::Error),

    #[error("Snapshot payload must be a JSON object, got {kind}")]
    NotAnObject { kind: &'static str },

    #[error("Channel message has no 'type' field")]
    MissingType,
}

/// Errors from the backend WebSocket channel.
#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("Failed to connect to {url}: {source}")]
    ConnectFailed {
        url: String,
        #[source]
        source: Box<tokio_tungstenite::tungstenite::Error>,
    },

    #[error("Event receiver dropped")]
    ReceiverDropped,
}

/// Errors from the plan document endpoints.
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Backend reported an error: {0}")]
    Backend(String),

    #[error("Document {id} returned no content")]
    EmptyResponse { id: String },

    #[error("Invalid document URL: {0}")]
    InvalidUrl(String),
}
