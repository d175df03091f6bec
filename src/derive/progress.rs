use serde::Serialize;

use crate::snapshot::{Feature, Snapshot};

/// Overall completion across every feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Progress {
    pub completed: usize,
    pub total: usize,
    /// `None` means there are no tasks at all.
    pub percent: Option<u8>,
}

impl Progress {
    pub fn new(completed: usize, total: usize) -> Self {
        let percent = if total == 0 {
            None
        } else {
            Some(((completed as f64 / total as f64) * 100.0).round() as u8)
        };
        Self {
            completed,
            total,
            percent,
        }
    }

    pub fn percent_or_zero(&self) -> u8 {
        self.percent.unwrap_or(0)
    }

    /// "3/8 tasks (38%)", or "No tasks".
    pub fn summary(&self) -> String {
        match self.percent {
            Some(pct) => format!("{}/{} tasks ({}%)", self.completed, self.total, pct),
            None => "No tasks".to_string(),
        }
    }
}

/// Done/total for a single feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct TaskCounts {
    pub done: usize,
    pub total: usize,
}

pub fn feature_counts(feature: &Feature) -> TaskCounts {
    TaskCounts {
        done: feature.tasks.iter().filter(|t| t.status.is_done()).count(),
        total: feature.tasks.len(),
    }
}

pub fn progress(snapshot: &Snapshot) -> Progress {
    let (completed, total) = snapshot
        .features
        .iter()
        .map(feature_counts)
        .fold((0, 0), |(done, total), c| (done + c.done, total + c.total));
    Progress::new(completed, total)
}
