//! One-shot rendering of a saved snapshot: `office-dash render`.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use chrono::{DateTime, Utc};
use serde_json::Value;

use office_dash::connection::ChannelMessage;
use office_dash::derive::DeriveConfig;
use office_dash::snapshot::{DashboardState, Snapshot};
use office_dash::ui::{Frame, UiMode, render_frame};
use office_dash::view::{ViewMode, ViewSelection};

pub struct RenderArgs {
    pub file: PathBuf,
    pub view: String,
    pub expand: Option<String>,
    pub ui: String,
    pub now: Option<String>,
    pub stuck_threshold_minutes: u64,
    pub width: usize,
}

pub fn cmd_render(args: &RenderArgs) -> Result<()> {
    let raw = std::fs::read_to_string(&args.file)
        .with_context(|| format!("Failed to read {}", args.file.display()))?;
    let snapshot =
        load_snapshot(&raw).with_context(|| format!("Invalid snapshot in {}", args.file.display()))?;

    let mode: ViewMode = args.view.parse().map_err(anyhow::Error::msg)?;
    let mut selection = ViewSelection::new(mode);
    selection.expanded_phase = args.expand.clone();

    let now = match &args.now {
        Some(raw) => DateTime::parse_from_rfc3339(raw)
            .with_context(|| format!("Invalid --now timestamp: {}", raw))?
            .with_timezone(&Utc),
        None => Utc::now(),
    };
    let derive = DeriveConfig::default().with_stuck_threshold(Duration::from_secs(
        args.stuck_threshold_minutes.saturating_mul(60),
    ));

    let mut state = DashboardState::new();
    state.replace(snapshot, now);
    let view = state.derive_views(now, &derive, &selection);

    let output = render_frame(&Frame::new(&view), UiMode::parse(&args.ui), args.width)
        .context("Failed to serialize frame")?;
    println!("{}", output.trim_end());
    Ok(())
}

/// Accept either a bare snapshot payload or a full channel message.
fn load_snapshot(raw: &str) -> Result<Snapshot> {
    let value: Value = serde_json::from_str(raw).context("File is not valid JSON")?;
    let is_envelope = value.get("type").is_some_and(Value::is_string);
    if !is_envelope {
        return Ok(Snapshot::from_value(value)?);
    }
    match ChannelMessage::parse(raw)? {
        ChannelMessage::Unknown(kind) => bail!("Message type '{}' carries no snapshot", kind),
        message => Ok(message.into_snapshot().unwrap_or_default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_bare_payload() {
        let snapshot = load_snapshot(r#"{"merged": [{"id": "F1", "tasks": []}]}"#).unwrap();
        assert_eq!(snapshot.features.len(), 1);
    }

    #[test]
    fn test_load_channel_envelope() {
        let snapshot =
            load_snapshot(r#"{"type": "state_update", "data": {"merged": [{"id": "F1"}]}}"#)
                .unwrap();
        assert_eq!(snapshot.features[0].id, "F1");
    }

    #[test]
    fn test_load_rejects_non_snapshot_messages() {
        let err = load_snapshot(r#"{"type": "ping_ack"}"#).unwrap_err();
        assert!(err.to_string().contains("ping_ack"));
        assert!(load_snapshot("[1, 2]").is_err());
        assert!(load_snapshot("nope").is_err());
    }
}
