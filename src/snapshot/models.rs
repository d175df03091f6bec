use std::collections::HashMap;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::lenient;

// ── Status vocabularies ──────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "Value", into = "&'static str")]
pub enum TaskStatus {
    #[default]
    Queued,
    Assigned,
    InProgress,
    InReview,
    Done,
    Completed,
    Failed,
}

impl TaskStatus {
    pub const ALL: [TaskStatus; 7] = [
        Self::Queued,
        Self::Assigned,
        Self::InProgress,
        Self::InReview,
        Self::Done,
        Self::Completed,
        Self::Failed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Assigned => "assigned",
            Self::InProgress => "in_progress",
            Self::InReview => "in_review",
            Self::Done => "done",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Queued => "Queued",
            Self::Assigned => "Assigned",
            Self::InProgress => "In Progress",
            Self::InReview => "In Review",
            Self::Done => "Done",
            Self::Completed => "Completed",
            Self::Failed => "Failed",
        }
    }

    /// `done` and `completed` are the same state under two spellings.
    pub fn is_done(&self) -> bool {
        matches!(self, Self::Done | Self::Completed)
    }

    /// Statuses that can never count as stuck: finished, not started, or
    /// waiting on a reviewer.
    pub fn is_exempt_from_stuck(&self) -> bool {
        matches!(
            self,
            Self::Done | Self::Completed | Self::Queued | Self::InReview
        )
    }
}

impl FromStr for TaskStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "queued" => Ok(Self::Queued),
            "assigned" => Ok(Self::Assigned),
            "in_progress" => Ok(Self::InProgress),
            // Older builds wrote `review`.
            "in_review" | "review" => Ok(Self::InReview),
            "done" => Ok(Self::Done),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            _ => Err(format!("Invalid task status: {}", s)),
        }
    }
}

impl From<Value> for TaskStatus {
    fn from(value: Value) -> Self {
        match value.as_str() {
            None | Some("") => Self::Queued,
            Some(raw) => raw.parse().unwrap_or_else(|_| {
                tracing::debug!(status = raw, "unknown task status, treating as queued");
                Self::Queued
            }),
        }
    }
}

impl From<TaskStatus> for &'static str {
    fn from(status: TaskStatus) -> Self {
        status.as_str()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "Value", into = "&'static str")]
pub enum FeatureStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
    Failed,
}

impl FeatureStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::InProgress => "In Progress",
            Self::Completed => "Completed",
            Self::Failed => "Failed",
        }
    }
}

impl FromStr for FeatureStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "in_progress" => Ok(Self::InProgress),
            "completed" | "done" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            _ => Err(format!("Invalid feature status: {}", s)),
        }
    }
}

impl From<Value> for FeatureStatus {
    fn from(value: Value) -> Self {
        value
            .as_str()
            .and_then(|raw| raw.parse().ok())
            .unwrap_or_default()
    }
}

impl From<FeatureStatus> for &'static str {
    fn from(status: FeatureStatus) -> Self {
        status.as_str()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Value", into = "String")]
pub enum ReviewStatus {
    Pending,
    Passed,
    HasWarnings,
    Failed,
    Other(String),
}

impl ReviewStatus {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Pending => "pending",
            Self::Passed => "passed",
            Self::HasWarnings => "has-warnings",
            Self::Failed => "failed",
            Self::Other(raw) => raw,
        }
    }
}

impl From<Value> for ReviewStatus {
    fn from(value: Value) -> Self {
        match value.as_str().unwrap_or_default() {
            "pending" => Self::Pending,
            "passed" | "approved" => Self::Passed,
            "has-warnings" | "has_warnings" => Self::HasWarnings,
            "failed" => Self::Failed,
            other => Self::Other(other.to_string()),
        }
    }
}

impl From<ReviewStatus> for String {
    fn from(status: ReviewStatus) -> Self {
        status.as_str().to_string()
    }
}

// ── Agents ───────────────────────────────────────────────────────────

/// The fixed set of worker roles a task can be assigned to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Agent {
    BackendEngineer,
    FrontendEngineer,
    UiUxExpert,
    DataEngineer,
    AutomationDeveloper,
    Devops,
}

impl Agent {
    pub const ALL: [Agent; 6] = [
        Self::BackendEngineer,
        Self::FrontendEngineer,
        Self::UiUxExpert,
        Self::DataEngineer,
        Self::AutomationDeveloper,
        Self::Devops,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BackendEngineer => "backend-engineer",
            Self::FrontendEngineer => "frontend-engineer",
            Self::UiUxExpert => "ui-ux-expert",
            Self::DataEngineer => "data-engineer",
            Self::AutomationDeveloper => "automation-developer",
            Self::Devops => "devops",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|a| a.as_str() == name)
    }

    pub fn display_name(&self) -> String {
        display_agent_name(self.as_str())
    }
}

/// "backend-engineer" → "Backend Engineer". Works for names outside the
/// fixed set too, so unknown agents still get a readable badge.
pub fn display_agent_name(name: &str) -> String {
    name.split('-')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

// ── Snapshot entities ────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Task {
    #[serde(deserialize_with = "lenient::identifier")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub title: String,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(default, deserialize_with = "lenient::optional_string")]
    pub agent: Option<String>,
    #[serde(default, deserialize_with = "lenient::timestamp")]
    pub status_changed_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient::timestamp")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient::count")]
    pub retry_count: u32,
    #[serde(default)]
    pub review_status: Option<ReviewStatus>,
    #[serde(default, deserialize_with = "lenient::string_list")]
    pub depends_on: Vec<String>,
    #[serde(default, deserialize_with = "lenient::step")]
    pub current_step: Option<u8>,
    #[serde(default, deserialize_with = "lenient::optional_string")]
    pub error: Option<String>,
}

impl Task {
    /// The assigned agent, if it belongs to the fixed set.
    pub fn known_agent(&self) -> Option<Agent> {
        self.agent.as_deref().and_then(Agent::from_name)
    }

    pub fn has_review_warnings(&self) -> bool {
        matches!(self.review_status, Some(ReviewStatus::HasWarnings))
    }
}

/// A named grouping of tasks, shown as a "phase" or a "feature" depending on
/// the view.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    #[serde(deserialize_with = "lenient::identifier")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient::optional_string")]
    pub name: Option<String>,
    #[serde(default)]
    pub status: FeatureStatus,
    #[serde(default, deserialize_with = "lenient::vec")]
    pub tasks: Vec<Task>,
    #[serde(default, deserialize_with = "lenient::optional_string")]
    pub branch: Option<String>,
    #[serde(default, deserialize_with = "lenient::string_list")]
    pub depends_on: Vec<String>,
    #[serde(default, deserialize_with = "lenient::timestamp")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient::timestamp")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl Feature {
    /// Falls back to the id, the same way the backend merge does.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.id)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActivityEvent {
    #[serde(default, deserialize_with = "lenient::timestamp")]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub phase: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub event: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BuildInfo {
    #[serde(default, deserialize_with = "lenient::optional_string")]
    pub session_id: Option<String>,
    #[serde(default, deserialize_with = "lenient::timestamp")]
    pub started_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BuildState {
    #[serde(default, deserialize_with = "lenient::option")]
    pub build: Option<BuildInfo>,
}

/// One complete, authoritative state push from the backend.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Snapshot {
    pub features: Vec<Feature>,
    pub build_state: Option<BuildState>,
    pub activity: Vec<ActivityEvent>,
    pub task_durations: HashMap<String, f64>,
    /// Problems the backend hit while loading its own state files.
    pub load_errors: Vec<String>,
}

impl Snapshot {
    /// Every task across every feature, in snapshot order.
    pub fn all_tasks(&self) -> Vec<&Task> {
        self.features.iter().flat_map(|f| f.tasks.iter()).collect()
    }

    pub fn find_feature(&self, id: &str) -> Option<&Feature> {
        self.features.iter().find(|f| f.id == id)
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn build(&self) -> Option<&BuildInfo> {
        self.build_state.as_ref().and_then(|b| b.build.as_ref())
    }

    /// Recorded duration for a task; zero counts as unknown.
    pub fn duration_of(&self, task_id: &str) -> Option<f64> {
        self.task_durations
            .get(task_id)
            .copied()
            .filter(|secs| *secs > 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_task_status_done_and_completed_are_synonyms() {
        assert!(TaskStatus::Done.is_done());
        assert!(TaskStatus::Completed.is_done());
        for status in [
            TaskStatus::Queued,
            TaskStatus::Assigned,
            TaskStatus::InProgress,
            TaskStatus::InReview,
            TaskStatus::Failed,
        ] {
            assert!(!status.is_done(), "{:?} must not count as done", status);
        }
    }

    #[test]
    fn test_task_status_accepts_legacy_review_spelling() {
        assert_eq!("review".parse::<TaskStatus>(), Ok(TaskStatus::InReview));
        assert_eq!(TaskStatus::from(json!("in_review")), TaskStatus::InReview);
    }

    #[test]
    fn test_task_status_unknown_and_missing_default_to_queued() {
        assert_eq!(TaskStatus::from(json!("exploded")), TaskStatus::Queued);
        assert_eq!(TaskStatus::from(json!(null)), TaskStatus::Queued);
        assert_eq!(TaskStatus::from(json!(7)), TaskStatus::Queued);
    }

    #[test]
    fn test_task_status_roundtrips_through_as_str() {
        for status in TaskStatus::ALL {
            assert_eq!(status.as_str().parse::<TaskStatus>(), Ok(status));
        }
    }

    #[test]
    fn test_task_status_serializes_snake_case() {
        let json = serde_json::to_string(&TaskStatus::InProgress).unwrap();
        assert_eq!(json, "\"in_progress\"");
    }

    #[test]
    fn test_feature_status_unknown_defaults_to_pending() {
        assert_eq!(FeatureStatus::from(json!("blocked")), FeatureStatus::Pending);
        assert_eq!(
            FeatureStatus::from(json!("in_progress")),
            FeatureStatus::InProgress
        );
    }

    #[test]
    fn test_review_status_variants() {
        assert_eq!(ReviewStatus::from(json!("has-warnings")), ReviewStatus::HasWarnings);
        assert_eq!(
            ReviewStatus::from(json!("needs-human")),
            ReviewStatus::Other("needs-human".to_string())
        );
        assert_eq!(ReviewStatus::HasWarnings.as_str(), "has-warnings");
    }

    #[test]
    fn test_agent_lookup_and_display_name() {
        assert_eq!(Agent::from_name("ui-ux-expert"), Some(Agent::UiUxExpert));
        assert_eq!(Agent::from_name("qa-engineer"), None);
        assert_eq!(Agent::BackendEngineer.display_name(), "Backend Engineer");
        assert_eq!(Agent::UiUxExpert.display_name(), "Ui Ux Expert");
        assert_eq!(display_agent_name("qa-engineer"), "Qa Engineer");
    }

    #[test]
    fn test_task_deserializes_with_only_id() {
        let task: Task = serde_json::from_value(json!({"id": "T1"})).unwrap();
        assert_eq!(task.id, "T1");
        assert_eq!(task.status, TaskStatus::Queued);
        assert_eq!(task.retry_count, 0);
        assert!(task.depends_on.is_empty());
        assert!(task.status_changed_at.is_none());
    }

    #[test]
    fn test_task_tolerates_nulls_and_odd_types() {
        let task: Task = serde_json::from_value(json!({
            "id": 12,
            "title": null,
            "status": null,
            "agent": "",
            "retry_count": null,
            "depends_on": "T0",
            "current_step": 9,
            "status_changed_at": "not a time",
            "review_status": null,
        }))
        .unwrap();
        assert_eq!(task.id, "12");
        assert_eq!(task.title, "");
        assert_eq!(task.agent, None);
        assert_eq!(task.retry_count, 0);
        assert_eq!(task.depends_on, vec!["T0".to_string()]);
        assert_eq!(task.current_step, Some(5));
        assert!(task.status_changed_at.is_none());
        assert!(task.review_status.is_none());
    }

    #[test]
    fn test_task_without_id_is_rejected() {
        assert!(serde_json::from_value::<Task>(json!({"title": "orphan"})).is_err());
    }

    #[test]
    fn test_task_known_agent() {
        let mut task = Task {
            id: "T1".into(),
            agent: Some("devops".into()),
            ..Default::default()
        };
        assert_eq!(task.known_agent(), Some(Agent::Devops));
        task.agent = Some("wizard".into());
        assert_eq!(task.known_agent(), None);
    }

    #[test]
    fn test_feature_display_name_falls_back_to_id() {
        let feature: Feature = serde_json::from_value(json!({"id": "F1"})).unwrap();
        assert_eq!(feature.display_name(), "F1");
        assert_eq!(feature.status, FeatureStatus::Pending);
    }

    #[test]
    fn test_feature_drops_malformed_tasks() {
        let feature: Feature = serde_json::from_value(json!({
            "id": "F1",
            "tasks": [{"id": "T1"}, {"title": "no id"}, "junk", {"id": "T2"}]
        }))
        .unwrap();
        let ids: Vec<&str> = feature.tasks.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["T1", "T2"]);
    }

    #[test]
    fn test_snapshot_duration_of_ignores_zero() {
        let mut snapshot = Snapshot::default();
        snapshot.task_durations.insert("T1".into(), 0.0);
        snapshot.task_durations.insert("T2".into(), 42.0);
        assert_eq!(snapshot.duration_of("T1"), None);
        assert_eq!(snapshot.duration_of("T2"), Some(42.0));
        assert_eq!(snapshot.duration_of("T3"), None);
    }
}
