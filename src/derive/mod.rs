//! Derivation engine.
//!
//! Every value here is a pure function of `(Snapshot, now, DeriveConfig)`.
//! Nothing is cached between calls: the 1-second tick and every inbound
//! snapshot re-run the same functions from scratch, so repeated ticks cannot
//! drift.

pub mod activity;
pub mod agents;
pub mod dependencies;
pub mod progress;
pub mod timing;

use std::time::Duration;

use serde::Serialize;

use crate::snapshot::{Agent, Task, TaskStatus};

pub use activity::{ActivityTag, FormattedActivity, format_activity};
pub use agents::{AgentQueue, AgentTask, group_by_agent};
pub use dependencies::{DependencyGraph, blocked_by, blocking};
pub use progress::{Progress, TaskCounts, feature_counts, progress};
pub use timing::{
    format_activity_time, format_duration, format_elapsed, is_stuck, time_in_state,
};

/// Default stuck threshold: 30 minutes.
pub const DEFAULT_STUCK_THRESHOLD: Duration = Duration::from_secs(30 * 60);

/// Number of activity events the phase view shows.
pub const DEFAULT_ACTIVITY_LIMIT: usize = 20;

/// Number of finished tasks listed per agent before collapsing into "+N more".
pub const DEFAULT_AGENT_DONE_PREVIEW: usize = 5;

/// Tasks report progress as a step out of this many.
pub const TOTAL_STEPS: u8 = 5;

/// Knobs for derivation. Supplied externally on every call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeriveConfig {
    pub stuck_threshold: Duration,
    pub activity_limit: usize,
    pub agent_done_preview: usize,
    pub agents: Vec<Agent>,
}

impl Default for DeriveConfig {
    fn default() -> Self {
        Self {
            stuck_threshold: DEFAULT_STUCK_THRESHOLD,
            activity_limit: DEFAULT_ACTIVITY_LIMIT,
            agent_done_preview: DEFAULT_AGENT_DONE_PREVIEW,
            agents: Agent::ALL.to_vec(),
        }
    }
}

impl DeriveConfig {
    pub fn with_stuck_threshold(mut self, threshold: Duration) -> Self {
        self.stuck_threshold = threshold;
        self
    }
}

/// How loudly a retry count should be flagged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RetrySeverity {
    None,
    Warning,
    Danger,
}

pub fn retry_severity(retry_count: u32) -> RetrySeverity {
    match retry_count {
        0 => RetrySeverity::None,
        1..=2 => RetrySeverity::Warning,
        _ => RetrySeverity::Danger,
    }
}

/// Step progress as a percentage, only meaningful while a task is running.
pub fn step_progress(task: &Task) -> Option<u8> {
    if task.status != TaskStatus::InProgress {
        return None;
    }
    task.current_step
        .map(|step| ((u32::from(step.min(TOTAL_STEPS)) * 100) / u32::from(TOTAL_STEPS)) as u8)
}
