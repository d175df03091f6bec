use serde::Serialize;

use super::ProjectionContext;
use crate::derive::{self, ActivityTag, TaskCounts};
use crate::snapshot::{Feature, FeatureStatus, TaskStatus};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PhaseCard {
    pub id: String,
    pub name: String,
    pub status: FeatureStatus,
    pub counts: TaskCounts,
    pub expanded: bool,
    pub stuck_tasks: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskMini {
    pub id: String,
    pub title: String,
    pub status: TaskStatus,
    pub duration: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExpandedPhase {
    pub id: String,
    pub name: String,
    pub counts: TaskCounts,
    pub tasks: Vec<TaskMini>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActivityItem {
    pub time: String,
    pub text: String,
    pub tag: ActivityTag,
    pub phase: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PhaseView {
    pub cards: Vec<PhaseCard>,
    pub expanded: Option<ExpandedPhase>,
    pub activity: Vec<ActivityItem>,
}

fn expand(ctx: &ProjectionContext<'_>, phase: &Feature) -> ExpandedPhase {
    ExpandedPhase {
        id: phase.id.clone(),
        name: phase.display_name().to_string(),
        counts: derive::feature_counts(phase),
        tasks: phase
            .tasks
            .iter()
            .map(|task| TaskMini {
                id: task.id.clone(),
                title: task.title.clone(),
                status: task.status,
                duration: ctx.snapshot.duration_of(&task.id).map(derive::format_duration),
            })
            .collect(),
    }
}

pub(super) fn project(ctx: &ProjectionContext<'_>, expanded_phase: Option<&str>) -> PhaseView {
    let snapshot = ctx.snapshot;

    let cards = snapshot
        .features
        .iter()
        .map(|phase| PhaseCard {
            id: phase.id.clone(),
            name: phase.display_name().to_string(),
            status: phase.status,
            counts: derive::feature_counts(phase),
            expanded: expanded_phase == Some(phase.id.as_str()),
            stuck_tasks: phase
                .tasks
                .iter()
                .filter(|t| derive::is_stuck(t, ctx.now, ctx.config.stuck_threshold))
                .count(),
        })
        .collect();

    // A selection that points at a phase the latest snapshot no longer has
    // collapses instead of failing.
    let expanded = expanded_phase
        .and_then(|id| snapshot.find_feature(id))
        .map(|phase| expand(ctx, phase));

    let activity = snapshot
        .activity
        .iter()
        .take(ctx.config.activity_limit)
        .map(|event| {
            let formatted = derive::format_activity(&event.event, &snapshot.task_durations);
            ActivityItem {
                time: derive::format_activity_time(event.timestamp),
                text: formatted.text,
                tag: formatted.tag,
                phase: event.phase.clone(),
            }
        })
        .collect();

    PhaseView {
        cards,
        expanded,
        activity,
    }
}
