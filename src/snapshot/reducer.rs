//! Snapshot reducer: raw payload in, authoritative [`Snapshot`] out.
//!
//! Every inbound payload is a full replacement. Nothing from the previous
//! snapshot survives into the next one.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

use super::lenient;
use super::models::{ActivityEvent, BuildState, Feature, Snapshot};
use crate::derive::DeriveConfig;
use crate::errors::SnapshotError;
use crate::view::{self, DashboardView, ViewSelection};

/// Wire shape of a snapshot as the backend sends it.
#[derive(Debug, Default, Deserialize)]
struct SnapshotPayload {
    #[serde(default, deserialize_with = "lenient::vec")]
    merged: Vec<Feature>,
    #[serde(default, deserialize_with = "lenient::option")]
    build_state: Option<BuildState>,
    #[serde(default, deserialize_with = "lenient::vec")]
    activity: Vec<ActivityEvent>,
    #[serde(default, deserialize_with = "lenient::durations")]
    task_durations: HashMap<String, f64>,
    #[serde(default, deserialize_with = "lenient::optional_string")]
    error: Option<String>,
    #[serde(default, deserialize_with = "lenient::optional_string")]
    tasks_error: Option<String>,
    #[serde(default, deserialize_with = "lenient::optional_string")]
    build_state_error: Option<String>,
}

impl From<SnapshotPayload> for Snapshot {
    fn from(payload: SnapshotPayload) -> Self {
        let load_errors = [
            payload.error,
            payload.tasks_error.map(|e| format!("tasks.yaml: {}", e)),
            payload
                .build_state_error
                .map(|e| format!("build-state.yaml: {}", e)),
        ]
        .into_iter()
        .flatten()
        .collect();

        Self {
            features: payload.merged,
            build_state: payload.build_state,
            activity: payload.activity,
            task_durations: payload.task_durations,
            load_errors,
        }
    }
}

impl Snapshot {
    /// Build a snapshot from a decoded payload, defaulting every missing field.
    pub fn from_value(value: Value) -> Result<Self, SnapshotError> {
        match &value {
            Value::Object(_) => {}
            Value::Null => return Ok(Self::default()),
            other => {
                return Err(SnapshotError::NotAnObject {
                    kind: json_kind(other),
                });
            }
        }
        // Every field deserializer is infallible, so this only fails on a
        // non-object, which was ruled out above.
        let payload: SnapshotPayload =
            serde_json::from_value(value).map_err(SnapshotError::InvalidJson)?;
        Ok(payload.into())
    }

    pub fn from_json(raw: &str) -> Result<Self, SnapshotError> {
        let value: Value = serde_json::from_str(raw).map_err(SnapshotError::InvalidJson)?;
        Self::from_value(value)
    }
}

pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// The single owned state container.
///
/// Holds exactly one snapshot at a time. `replace` swaps it wholesale;
/// `derive_views` is a pure read that recomputes everything from the current
/// snapshot and the supplied clock.
#[derive(Debug, Default)]
pub struct DashboardState {
    snapshot: Snapshot,
    revision: u64,
    received_at: Option<DateTime<Utc>>,
}

impl DashboardState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the current snapshot. Returns the new revision number.
    pub fn replace(&mut self, snapshot: Snapshot, received_at: DateTime<Utc>) -> u64 {
        self.snapshot = snapshot;
        self.revision += 1;
        self.received_at = Some(received_at);
        tracing::debug!(
            revision = self.revision,
            features = self.snapshot.features.len(),
            "snapshot replaced"
        );
        self.revision
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    /// Number of snapshots applied so far; zero before the first message.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn received_at(&self) -> Option<DateTime<Utc>> {
        self.received_at
    }

    pub fn derive_views(
        &self,
        now: DateTime<Utc>,
        config: &DeriveConfig,
        selection: &ViewSelection,
    ) -> DashboardView {
        let mut view = view::project(&self.snapshot, now, config, selection);
        view.revision = self.revision;
        view.received_at = self.received_at;
        view
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::TaskStatus;
    use crate::view::{ViewBody, ViewMode};
    use serde_json::json;

    #[test]
    fn test_from_value_defaults_everything() {
        let snapshot = Snapshot::from_value(json!({})).unwrap();
        assert!(snapshot.features.is_empty());
        assert!(snapshot.activity.is_empty());
        assert!(snapshot.task_durations.is_empty());
        assert!(snapshot.build_state.is_none());
        assert!(snapshot.load_errors.is_empty());
    }

    #[test]
    fn test_from_value_null_fields_become_empty() {
        let snapshot = Snapshot::from_value(json!({
            "merged": null,
            "activity": null,
            "task_durations": null,
            "build_state": null,
            "tasks": null,
        }))
        .unwrap();
        assert_eq!(snapshot, Snapshot::default());
    }

    #[test]
    fn test_from_value_null_payload_is_empty_snapshot() {
        assert_eq!(Snapshot::from_value(Value::Null).unwrap(), Snapshot::default());
    }

    #[test]
    fn test_from_value_rejects_non_object() {
        let err = Snapshot::from_value(json!([1, 2, 3])).unwrap_err();
        assert!(matches!(err, SnapshotError::NotAnObject { kind: "array" }));
    }

    #[test]
    fn test_from_json_rejects_invalid_json() {
        let err = Snapshot::from_json("{not json").unwrap_err();
        assert!(matches!(err, SnapshotError::InvalidJson(_)));
    }

    #[test]
    fn test_from_value_maps_backend_fields() {
        let snapshot = Snapshot::from_value(json!({
            "merged": [{
                "id": "F1",
                "name": "Auth",
                "status": "in_progress",
                "tasks": [
                    {"id": "T1", "title": "Schema", "status": "done"},
                    {"id": "T2", "title": "API", "status": "in_progress", "depends_on": ["T1"]}
                ]
            }],
            "build_state": {"build": {"session_id": "abc123", "started_at": "2024-05-01T08:00:00Z"}},
            "tasks": {"features": []},
            "activity": [{"timestamp": "2024-05-01T08:01:00Z", "phase": 1, "event": "PHASE_START"}],
            "task_durations": {"T1": 93.5, "T2": "n/a"},
            "tasks_error": "bad indent"
        }))
        .unwrap();

        assert_eq!(snapshot.features.len(), 1);
        assert_eq!(snapshot.features[0].display_name(), "Auth");
        assert_eq!(snapshot.features[0].tasks[1].status, TaskStatus::InProgress);
        assert_eq!(snapshot.features[0].tasks[1].depends_on, vec!["T1"]);
        assert_eq!(
            snapshot.build().and_then(|b| b.session_id.as_deref()),
            Some("abc123")
        );
        assert_eq!(snapshot.activity[0].phase, "1");
        assert_eq!(snapshot.task_durations.get("T1"), Some(&93.5));
        assert!(!snapshot.task_durations.contains_key("T2"));
        assert_eq!(snapshot.load_errors, vec!["tasks.yaml: bad indent".to_string()]);
    }

    #[test]
    fn test_from_value_drops_malformed_features_only() {
        let snapshot = Snapshot::from_value(json!({
            "merged": [{"id": "F1"}, {"name": "missing id"}, 42, {"id": "F2"}],
            "build_state": "corrupted"
        }))
        .unwrap();
        let ids: Vec<&str> = snapshot.features.iter().map(|f| f.id.as_str()).collect();
        assert_eq!(ids, vec!["F1", "F2"]);
        assert!(snapshot.build_state.is_none());
    }

    #[test]
    fn test_replace_discards_previous_snapshot() {
        let mut state = DashboardState::new();
        let first = Snapshot::from_value(json!({
            "merged": [{"id": "F1", "tasks": [{"id": "T1"}]}],
            "activity": [{"event": "PHASE_START"}]
        }))
        .unwrap();
        let second = Snapshot::from_value(json!({
            "merged": [{"id": "F2", "tasks": []}]
        }))
        .unwrap();

        assert_eq!(state.revision(), 0);
        state.replace(first, Utc::now());
        let revision = state.replace(second, Utc::now());

        assert_eq!(revision, 2);
        assert!(state.snapshot().find_feature("F1").is_none());
        assert!(state.snapshot().find_feature("F2").is_some());
        assert!(state.snapshot().activity.is_empty());
        assert!(state.received_at().is_some());
    }

    #[test]
    fn test_view_carries_receive_time() {
        let mut state = DashboardState::new();
        let config = DeriveConfig::default();
        let selection = ViewSelection::default();
        assert_eq!(state.derive_views(Utc::now(), &config, &selection).received_at, None);

        let received = Utc::now();
        state.replace(Snapshot::default(), received);
        let view = state.derive_views(received + chrono::Duration::seconds(5), &config, &selection);
        assert_eq!(view.received_at, Some(received));
    }

    fn blockers_of(view: &DashboardView, task_id: &str) -> Vec<String> {
        let ViewBody::Feature(feature) = &view.body else {
            panic!("expected the feature view");
        };
        feature
            .lanes
            .iter()
            .flat_map(|lane| lane.columns.iter())
            .flat_map(|column| column.tasks.iter())
            .find(|card| card.id == task_id)
            .map(|card| card.blocked_by.clone())
            .unwrap()
    }

    #[test]
    fn test_blockers_recomputed_after_replace() {
        let with_t1 = |status: &str| {
            Snapshot::from_value(json!({
                "merged": [{"id": "F1", "tasks": [
                    {"id": "T1", "status": status},
                    {"id": "T2", "status": "queued", "depends_on": ["T1"]}
                ]}]
            }))
            .unwrap()
        };
        let config = DeriveConfig::default();
        let selection = ViewSelection::new(ViewMode::Feature);
        let mut state = DashboardState::new();

        state.replace(with_t1("queued"), Utc::now());
        let view = state.derive_views(Utc::now(), &config, &selection);
        assert_eq!(blockers_of(&view, "T2"), vec!["T1"]);

        state.replace(with_t1("completed"), Utc::now());
        let view = state.derive_views(Utc::now(), &config, &selection);
        assert!(blockers_of(&view, "T2").is_empty());
    }
}
