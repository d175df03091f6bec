//! Backend channel: endpoint derivation, reconnect policy, keepalive and
//! inbound message parsing.

pub mod client;
pub mod message;
pub mod policy;

use url::Url;

use crate::errors::ConfigError;

pub use client::{ConnectionEvent, ConnectionManager};
pub use message::{ChannelMessage, KEEPALIVE_INTERVAL, KEEPALIVE_PAYLOAD};
pub use policy::{
    ConnectionStatus, ConnectionTracker, DEFAULT_BASE_DELAY, DEFAULT_MAX_ATTEMPTS,
    ReconnectDecision, ReconnectPolicy,
};

/// Path of the channel endpoint on the dashboard origin.
pub const WS_PATH: &str = "/ws";

/// Derive the channel endpoint from the dashboard page URL: same host and
/// port, `http` becomes `ws` and `https` becomes `wss`.
pub fn websocket_url(page: &Url) -> Result<Url, ConfigError> {
    let scheme = match page.scheme() {
        "http" | "ws" => "ws",
        "https" | "wss" => "wss",
        other => {
            return Err(ConfigError::UnsupportedScheme {
                scheme: other.to_string(),
            });
        }
    };
    if page.host_str().is_none() {
        return Err(ConfigError::InvalidUrl {
            url: page.to_string(),
            message: "missing host".to_string(),
        });
    }

    let mut ws = page.clone();
    ws.set_scheme(scheme).map_err(|_| ConfigError::InvalidUrl {
        url: page.to_string(),
        message: format!("cannot switch scheme to {}", scheme),
    })?;
    ws.set_path(WS_PATH);
    ws.set_query(None);
    ws.set_fragment(None);
    Ok(ws)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn derive(page: &str) -> Result<String, ConfigError> {
        websocket_url(&Url::parse(page).unwrap()).map(|u| u.to_string())
    }

    #[test]
    fn test_http_becomes_ws_on_same_origin() {
        assert_eq!(
            derive("http://localhost:8080/?stuck_threshold=45").unwrap(),
            "ws://localhost:8080/ws"
        );
    }

    #[test]
    fn test_https_becomes_wss() {
        assert_eq!(
            derive("https://dash.example.com/plan#top").unwrap(),
            "wss://dash.example.com/ws"
        );
    }

    #[test]
    fn test_other_schemes_rejected() {
        assert!(matches!(
            derive("ftp://example.com/"),
            Err(ConfigError::UnsupportedScheme { .. })
        ));
    }
}
