//! View model projection.
//!
//! Turns a [`Snapshot`] plus the clock into the plain-data structures a
//! renderer consumes. Projection reads only the snapshot, the derivation
//! functions and the caller's [`ViewSelection`]; it never touches renderer
//! state, and the same inputs always give the same [`DashboardView`].

mod agent;
mod card;
mod feature;
mod phase;

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::derive::{self, DependencyGraph, DeriveConfig, Progress};
use crate::snapshot::Snapshot;

pub use agent::{AgentColumn, AgentView, DoneEntry};
pub use card::{StepProgress, TaskCard};
pub use feature::{ColumnKind, FeatureLane, FeatureView, StatusColumn};
pub use phase::{ActivityItem, ExpandedPhase, PhaseCard, PhaseView, TaskMini};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewMode {
    #[default]
    Phase,
    Feature,
    Agent,
}

impl ViewMode {
    pub const ALL: [ViewMode; 3] = [Self::Phase, Self::Feature, Self::Agent];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Phase => "phase",
            Self::Feature => "feature",
            Self::Agent => "agent",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Phase => "Phases",
            Self::Feature => "Features",
            Self::Agent => "Agents",
        }
    }
}

impl fmt::Display for ViewMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ViewMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "phase" | "phases" | "p" => Ok(Self::Phase),
            "feature" | "features" | "f" => Ok(Self::Feature),
            "agent" | "agents" | "a" => Ok(Self::Agent),
            _ => Err(format!(
                "Invalid view: {}. Expected one of: phase, feature, agent",
                s
            )),
        }
    }
}

/// What the presentation layer is currently looking at. Read-only input to
/// projection; the renderer owns and mutates it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewSelection {
    pub mode: ViewMode,
    pub expanded_phase: Option<String>,
}

impl ViewSelection {
    pub fn new(mode: ViewMode) -> Self {
        Self {
            mode,
            expanded_phase: None,
        }
    }

    pub fn with_expanded(mut self, phase_id: impl Into<String>) -> Self {
        self.expanded_phase = Some(phase_id.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildHeader {
    pub session_id: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub elapsed: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ViewBody {
    Phase(PhaseView),
    Feature(FeatureView),
    Agent(AgentView),
}

impl ViewBody {
    pub fn mode(&self) -> ViewMode {
        match self {
            Self::Phase(_) => ViewMode::Phase,
            Self::Feature(_) => ViewMode::Feature,
            Self::Agent(_) => ViewMode::Agent,
        }
    }
}

/// Everything a renderer needs for one frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardView {
    /// Snapshot revision this view was derived from; zero before the first
    /// message.
    pub revision: u64,
    pub generated_at: DateTime<Utc>,
    /// When the snapshot behind this view arrived.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub received_at: Option<DateTime<Utc>>,
    pub is_empty: bool,
    pub build: Option<BuildHeader>,
    pub progress: Progress,
    pub load_errors: Vec<String>,
    pub body: ViewBody,
}

/// Shared inputs for the per-mode projections.
pub(crate) struct ProjectionContext<'a> {
    pub snapshot: &'a Snapshot,
    pub now: DateTime<Utc>,
    pub config: &'a DeriveConfig,
    pub graph: DependencyGraph,
}

pub fn project(
    snapshot: &Snapshot,
    now: DateTime<Utc>,
    config: &DeriveConfig,
    selection: &ViewSelection,
) -> DashboardView {
    let ctx = ProjectionContext {
        snapshot,
        now,
        config,
        graph: DependencyGraph::build(snapshot),
    };

    let body = match selection.mode {
        ViewMode::Phase => ViewBody::Phase(phase::project(&ctx, selection.expanded_phase.as_deref())),
        ViewMode::Feature => ViewBody::Feature(feature::project(&ctx)),
        ViewMode::Agent => ViewBody::Agent(agent::project(&ctx)),
    };

    let build = snapshot.build().map(|info| BuildHeader {
        session_id: info.session_id.clone(),
        started_at: info.started_at,
        elapsed: info.started_at.map(|start| derive::format_elapsed(start, now)),
    });

    DashboardView {
        revision: 0,
        generated_at: now,
        received_at: None,
        is_empty: snapshot.is_empty(),
        build,
        progress: derive::progress(snapshot),
        load_errors: snapshot.load_errors.clone(),
        body,
    }
}
