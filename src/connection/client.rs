use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use url::Url;

use super::message::{ChannelMessage, KEEPALIVE_INTERVAL, KEEPALIVE_PAYLOAD};
use super::policy::{ConnectionStatus, ConnectionTracker, ReconnectDecision, ReconnectPolicy};
use crate::errors::ConnectionError;
use crate::snapshot::Snapshot;

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// What the driver reports to the event loop.
#[derive(Debug, Clone, PartialEq)]
pub enum ConnectionEvent {
    Status(ConnectionStatus),
    Snapshot(Snapshot),
}

/// Owns the single backend channel: connects, pumps messages, keeps the
/// channel alive and reconnects per [`ReconnectPolicy`].
#[derive(Debug, Clone)]
pub struct ConnectionManager {
    url: Url,
    policy: ReconnectPolicy,
    keepalive: Duration,
    events: mpsc::Sender<ConnectionEvent>,
}

impl ConnectionManager {
    pub fn new(url: Url, events: mpsc::Sender<ConnectionEvent>) -> Self {
        Self {
            url,
            policy: ReconnectPolicy::default(),
            keepalive: KEEPALIVE_INTERVAL,
            events,
        }
    }

    pub fn with_policy(mut self, policy: ReconnectPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_keepalive(mut self, interval: Duration) -> Self {
        self.keepalive = interval;
        self
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Run until the reconnect policy gives up or the receiver goes away.
    ///
    /// Returns `Ok(())` after reporting [`ConnectionStatus::Failed`], and
    /// [`ConnectionError::ReceiverDropped`] once nobody is listening.
    pub async fn run(self) -> Result<(), ConnectionError> {
        let mut tracker = ConnectionTracker::new(self.policy);

        while tracker.begin_attempt() {
            self.emit(ConnectionEvent::Status(tracker.status())).await?;

            match connect_async(self.url.as_str()).await {
                Ok((socket, _response)) => {
                    tracker.on_open();
                    tracing::info!(url = %self.url, "connected to backend");
                    self.emit(ConnectionEvent::Status(tracker.status())).await?;
                    self.pump(socket).await?;
                }
                Err(e) => {
                    let err = ConnectionError::ConnectFailed {
                        url: self.url.to_string(),
                        source: Box::new(e),
                    };
                    tracing::warn!(error = %err, attempt = tracker.attempts(), "connection attempt failed");
                }
            }

            self.emit(ConnectionEvent::Status(ConnectionStatus::Disconnected))
                .await?;

            match tracker.on_close() {
                ReconnectDecision::Retry { attempt, delay } => {
                    tracing::info!(
                        attempt,
                        max_attempts = self.policy.max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        "scheduling reconnect"
                    );
                    self.emit(ConnectionEvent::Status(tracker.status())).await?;
                    tokio::time::sleep(delay).await;
                }
                ReconnectDecision::GiveUp => {
                    tracing::warn!(
                        max_attempts = self.policy.max_attempts,
                        "giving up on backend connection"
                    );
                    self.emit(ConnectionEvent::Status(tracker.status())).await?;
                }
            }
        }
        Ok(())
    }

    /// Pump one open channel until it closes.
    async fn pump(&self, socket: Socket) -> Result<(), ConnectionError> {
        let (mut sink, mut stream) = socket.split();

        let mut keepalive = tokio::time::interval(self.keepalive);
        // The first tick completes immediately.
        keepalive.tick().await;

        loop {
            tokio::select! {
                _ = keepalive.tick() => {
                    if let Err(e) = sink.send(Message::text(KEEPALIVE_PAYLOAD)).await {
                        // The read half will observe the close.
                        tracing::warn!(error = %e, "keepalive send failed");
                    }
                }
                msg = stream.next() => {
                    match msg {
                        Some(Ok(Message::Text(text))) => self.handle_text(text.as_str()).await?,
                        Some(Ok(Message::Close(frame))) => {
                            tracing::info!(?frame, "backend closed the channel");
                            break;
                        }
                        Some(Ok(_)) => {}
                        Some(Err(e)) => {
                            tracing::warn!(error = %e, "channel error");
                            break;
                        }
                        None => break,
                    }
                }
            }
        }
        Ok(())
    }

    async fn handle_text(&self, text: &str) -> Result<(), ConnectionError> {
        match ChannelMessage::parse(text) {
            Ok(ChannelMessage::Unknown(kind)) => {
                tracing::debug!(kind = %kind, "ignoring channel message");
                Ok(())
            }
            Ok(message) => match message.into_snapshot() {
                Some(snapshot) => self.emit(ConnectionEvent::Snapshot(snapshot)).await,
                None => Ok(()),
            },
            Err(e) => {
                tracing::warn!(error = %e, "malformed channel message");
                Ok(())
            }
        }
    }

    async fn emit(&self, event: ConnectionEvent) -> Result<(), ConnectionError> {
        self.events
            .send(event)
            .await
            .map_err(|_| ConnectionError::ReceiverDropped)
    }
}
