use serde::Serialize;

use super::ProjectionContext;
use super::card::TaskCard;
use crate::derive::{self, TaskCounts};
use crate::snapshot::{FeatureStatus, TaskStatus};

/// The five status buckets of a feature lane, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    Queued,
    Active,
    InReview,
    Done,
    Failed,
}

impl ColumnKind {
    pub const ALL: [ColumnKind; 5] = [
        Self::Queued,
        Self::Active,
        Self::InReview,
        Self::Done,
        Self::Failed,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            Self::Queued => "Queued",
            Self::Active => "Active",
            Self::InReview => "In Review",
            Self::Done => "Done",
            Self::Failed => "Failed",
        }
    }

    pub fn for_status(status: TaskStatus) -> Self {
        match status {
            TaskStatus::Queued => Self::Queued,
            TaskStatus::Assigned | TaskStatus::InProgress => Self::Active,
            TaskStatus::InReview => Self::InReview,
            TaskStatus::Done | TaskStatus::Completed => Self::Done,
            TaskStatus::Failed => Self::Failed,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusColumn {
    pub kind: ColumnKind,
    pub title: &'static str,
    pub tasks: Vec<TaskCard>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeatureLane {
    pub id: String,
    pub name: String,
    pub status: FeatureStatus,
    pub counts: TaskCounts,
    pub columns: Vec<StatusColumn>,
}

impl FeatureLane {
    pub fn column(&self, kind: ColumnKind) -> Option<&StatusColumn> {
        self.columns.iter().find(|c| c.kind == kind)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeatureView {
    pub lanes: Vec<FeatureLane>,
}

pub(super) fn project(ctx: &ProjectionContext<'_>) -> FeatureView {
    let lanes = ctx
        .snapshot
        .features
        .iter()
        .map(|feature| {
            let columns = ColumnKind::ALL
                .into_iter()
                .map(|kind| StatusColumn {
                    kind,
                    title: kind.title(),
                    tasks: feature
                        .tasks
                        .iter()
                        .filter(|t| ColumnKind::for_status(t.status) == kind)
                        .map(|t| TaskCard::build(ctx, t, None))
                        .collect(),
                })
                .collect();
            FeatureLane {
                id: feature.id.clone(),
                name: feature.display_name().to_string(),
                status: feature.status,
                counts: derive::feature_counts(feature),
                columns,
            }
        })
        .collect();
    FeatureView { lanes }
}
