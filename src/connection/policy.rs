use std::fmt;
use std::time::Duration;

use serde::Serialize;

/// Base reconnect delay.
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(1000);

/// Consecutive reconnect attempts before giving up for good.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 10;

/// Exponential backoff: `base_delay * 2^(attempt - 1)`, at most
/// `max_attempts` consecutive attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    pub base_delay: Duration,
    pub max_attempts: u32,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            base_delay: DEFAULT_BASE_DELAY,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

impl ReconnectPolicy {
    /// Delay before the given 1-based attempt.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 1u32
            .checked_shl(attempt.saturating_sub(1))
            .unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ConnectionStatus {
    Connecting,
    Connected,
    Reconnecting { attempt: u32, max_attempts: u32 },
    Disconnected,
    /// Terminal: no further automatic attempts.
    Failed,
}

impl ConnectionStatus {
    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Connected)
    }
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connecting => write!(f, "Connecting..."),
            Self::Connected => write!(f, "Connected"),
            Self::Reconnecting {
                attempt,
                max_attempts,
            } => write!(f, "Reconnecting ({}/{})", attempt, max_attempts),
            Self::Disconnected => write!(f, "Disconnected"),
            Self::Failed => write!(f, "Connection failed"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconnectDecision {
    Retry { attempt: u32, delay: Duration },
    GiveUp,
}

/// Pure connection state machine. The async driver feeds it open/close
/// events and follows its decisions.
#[derive(Debug, Clone)]
pub struct ConnectionTracker {
    policy: ReconnectPolicy,
    attempts: u32,
    status: ConnectionStatus,
}

impl ConnectionTracker {
    pub fn new(policy: ReconnectPolicy) -> Self {
        Self {
            policy,
            attempts: 0,
            status: ConnectionStatus::Disconnected,
        }
    }

    pub fn status(&self) -> ConnectionStatus {
        self.status
    }

    /// Consecutive reconnect attempts since the last successful open.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn policy(&self) -> &ReconnectPolicy {
        &self.policy
    }

    /// Start a connection attempt. Returns `false`, and changes nothing, when
    /// already connected or after giving up; a late retry timer is a no-op.
    pub fn begin_attempt(&mut self) -> bool {
        match self.status {
            ConnectionStatus::Connected | ConnectionStatus::Failed => {
                tracing::debug!(status = %self.status, "ignoring stray connection attempt");
                false
            }
            ConnectionStatus::Reconnecting { .. } => true,
            ConnectionStatus::Connecting | ConnectionStatus::Disconnected => {
                self.status = ConnectionStatus::Connecting;
                true
            }
        }
    }

    pub fn on_open(&mut self) {
        self.attempts = 0;
        self.status = ConnectionStatus::Connected;
    }

    /// The channel closed, cleanly or not, or an attempt failed.
    pub fn on_close(&mut self) -> ReconnectDecision {
        if self.status == ConnectionStatus::Failed || self.attempts >= self.policy.max_attempts {
            self.status = ConnectionStatus::Failed;
            return ReconnectDecision::GiveUp;
        }
        self.attempts += 1;
        self.status = ConnectionStatus::Reconnecting {
            attempt: self.attempts,
            max_attempts: self.policy.max_attempts,
        };
        ReconnectDecision::Retry {
            attempt: self.attempts,
            delay: self.policy.delay_for(self.attempts),
        }
    }
}
