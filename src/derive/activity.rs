use std::collections::HashMap;

use serde::Serialize;

use super::timing::format_duration;

/// Styling class for an activity row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(into = "&'static str")]
pub enum ActivityTag {
    PhaseStart,
    PhaseComplete,
    TaskStart,
    TaskDone,
    Other,
}

impl ActivityTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PhaseStart => "phase-start",
            Self::PhaseComplete => "phase-complete",
            Self::TaskStart => "task-start",
            Self::TaskDone => "task-done",
            Self::Other => "",
        }
    }
}

impl From<ActivityTag> for &'static str {
    fn from(tag: ActivityTag) -> Self {
        tag.as_str()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormattedActivity {
    pub text: String,
    pub tag: ActivityTag,
}

impl FormattedActivity {
    fn new(text: impl Into<String>, tag: ActivityTag) -> Self {
        Self {
            text: text.into(),
            tag,
        }
    }
}

/// Second `:`-separated segment of an event code, e.g. `T1` in `TASK_DONE:T1`.
fn event_subject(code: &str) -> &str {
    code.split(':').nth(1).unwrap_or_default()
}

/// Turn a raw event code into display text and a tag.
///
/// | code              | text                      |
/// |-------------------|---------------------------|
/// | `PHASE_START`     | Phase started             |
/// | `PHASE_COMPLETE`  | Phase completed           |
/// | `TASK_START:<id>` | Task `<id>` started       |
/// | `TASK_DONE:<id>`  | Task `<id>` done (`<dur>`) |
///
/// Anything else passes through verbatim with no tag.
pub fn format_activity(code: &str, durations: &HashMap<String, f64>) -> FormattedActivity {
    match code {
        "PHASE_START" => FormattedActivity::new("Phase started", ActivityTag::PhaseStart),
        "PHASE_COMPLETE" => FormattedActivity::new("Phase completed", ActivityTag::PhaseComplete),
        _ if code.starts_with("TASK_START:") => FormattedActivity::new(
            format!("Task {} started", event_subject(code)),
            ActivityTag::TaskStart,
        ),
        _ if code.starts_with("TASK_DONE:") => {
            let id = event_subject(code);
            let text = match durations.get(id).copied().filter(|secs| *secs > 0.0) {
                Some(secs) => format!("Task {} done ({})", id, format_duration(secs)),
                None => format!("Task {} done", id),
            };
            FormattedActivity::new(text, ActivityTag::TaskDone)
        }
        _ => FormattedActivity::new(code, ActivityTag::Other),
    }
}
