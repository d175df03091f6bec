use serde::Serialize;

use super::ProjectionContext;
use crate::derive::{self, RetrySeverity, TOTAL_STEPS};
use crate::snapshot::{Task, TaskStatus, display_agent_name};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StepProgress {
    pub current: u8,
    pub total: u8,
    pub percent: u8,
}

/// A fully derived task, ready to draw.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskCard {
    pub id: String,
    pub title: String,
    pub status: TaskStatus,
    pub status_label: &'static str,
    pub agent: Option<String>,
    pub agent_name: Option<String>,
    pub retry_count: u32,
    pub retry_severity: RetrySeverity,
    pub review_warning: bool,
    pub time_in_state: String,
    pub stuck: bool,
    pub blocked_by: Vec<String>,
    pub blocking: Vec<String>,
    pub error: Option<String>,
    pub step: Option<StepProgress>,
    /// Set when the card is shown outside its feature, e.g. in the agent view.
    pub feature_name: Option<String>,
}

impl TaskCard {
    pub(crate) fn build(ctx: &ProjectionContext<'_>, task: &Task, feature_name: Option<&str>) -> Self {
        let step = derive::step_progress(task).zip(task.current_step).map(|(percent, current)| {
            StepProgress {
                current,
                total: TOTAL_STEPS,
                percent,
            }
        });

        Self {
            id: task.id.clone(),
            title: task.title.clone(),
            status: task.status,
            status_label: task.status.label(),
            agent: task.agent.clone(),
            agent_name: task.agent.as_deref().map(display_agent_name),
            retry_count: task.retry_count,
            retry_severity: derive::retry_severity(task.retry_count),
            review_warning: task.has_review_warnings(),
            time_in_state: derive::time_in_state(task, ctx.now),
            stuck: derive::is_stuck(task, ctx.now, ctx.config.stuck_threshold),
            blocked_by: ctx.graph.blocked_by(&task.id).to_vec(),
            blocking: ctx.graph.blocking(&task.id).to_vec(),
            error: task.error.clone(),
            step,
            feature_name: feature_name.map(String::from),
        }
    }
}
