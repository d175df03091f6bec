use std::time::Duration;

use chrono::{DateTime, Local, Utc};

use crate::snapshot::Task;

/// A task is stuck when it has sat in a non-exempt status for longer than
/// `threshold`. Tasks without a `status_changed_at` are never stuck.
pub fn is_stuck(task: &Task, now: DateTime<Utc>, threshold: Duration) -> bool {
    if task.status.is_exempt_from_stuck() {
        return false;
    }
    let Some(changed_at) = task.status_changed_at else {
        return false;
    };
    let elapsed_ms = now.signed_duration_since(changed_at).num_milliseconds();
    let threshold_ms = i64::try_from(threshold.as_millis()).unwrap_or(i64::MAX);
    elapsed_ms > threshold_ms
}

/// "45m" under an hour, "2h 5m" beyond. Empty when there is no timestamp.
/// Timestamps in the future read as "0m".
pub fn time_in_state(task: &Task, now: DateTime<Utc>) -> String {
    let Some(changed_at) = task.status_changed_at else {
        return String::new();
    };
    let minutes = now.signed_duration_since(changed_at).num_minutes().max(0);
    if minutes < 60 {
        format!("{}m", minutes)
    } else {
        format!("{}h {}m", minutes / 60, minutes % 60)
    }
}

/// Render a task duration in seconds: "42s", "3m 7s", "1h 15m".
pub fn format_duration(seconds: f64) -> String {
    let total = seconds.max(0.0).round() as u64;
    if total < 60 {
        return format!("{}s", total);
    }
    let minutes = total / 60;
    if minutes < 60 {
        return format!("{}m {}s", minutes, total % 60);
    }
    format!("{}h {}m", minutes / 60, minutes % 60)
}

/// Build elapsed time for the header: "1h 2m 3s", "4m 0s", "9s".
/// Hours and minutes are omitted while they are zero.
pub fn format_elapsed(started_at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let total = now.signed_duration_since(started_at).num_seconds().max(0);
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let seconds = total % 60;

    let mut out = String::new();
    if hours > 0 {
        out.push_str(&format!("{}h ", hours));
    }
    if hours > 0 || minutes > 0 {
        out.push_str(&format!("{}m ", minutes));
    }
    out.push_str(&format!("{}s", seconds));
    out
}

/// Local wall-clock "HH:MM" for an activity row, or "--:--".
pub fn format_activity_time(timestamp: Option<DateTime<Utc>>) -> String {
    match timestamp {
        Some(ts) => ts.with_timezone(&Local).format("%H:%M").to_string(),
        None => "--:--".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::TaskStatus;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    fn task_changed(status: TaskStatus, minutes_ago: i64) -> Task {
        Task {
            id: "T1".into(),
            status,
            status_changed_at: Some(now() - chrono::Duration::minutes(minutes_ago)),
            ..Default::default()
        }
    }

    const THIRTY_MIN: Duration = Duration::from_secs(30 * 60);

    #[test]
    fn test_is_stuck_in_progress_past_threshold() {
        assert!(is_stuck(
            &task_changed(TaskStatus::InProgress, 45),
            now(),
            THIRTY_MIN
        ));
        assert!(!is_stuck(
            &task_changed(TaskStatus::InProgress, 10),
            now(),
            THIRTY_MIN
        ));
    }

    #[test]
    fn test_is_stuck_boundary_is_strict() {
        assert!(!is_stuck(
            &task_changed(TaskStatus::Assigned, 30),
            now(),
            THIRTY_MIN
        ));
        let mut task = task_changed(TaskStatus::Assigned, 30);
        task.status_changed_at = task
            .status_changed_at
            .map(|t| t - chrono::Duration::milliseconds(1));
        assert!(is_stuck(&task, now(), THIRTY_MIN));
    }

    #[test]
    fn test_is_stuck_exempt_statuses() {
        for status in [
            TaskStatus::Done,
            TaskStatus::Completed,
            TaskStatus::Queued,
            TaskStatus::InReview,
        ] {
            assert!(
                !is_stuck(&task_changed(status, 600), now(), THIRTY_MIN),
                "{:?} must never be stuck",
                status
            );
        }
        assert!(is_stuck(
            &task_changed(TaskStatus::Failed, 600),
            now(),
            THIRTY_MIN
        ));
    }

    #[test]
    fn test_is_stuck_without_timestamp() {
        let task = Task {
            id: "T1".into(),
            status: TaskStatus::InProgress,
            ..Default::default()
        };
        assert!(!is_stuck(&task, now(), Duration::ZERO));
    }

    #[test]
    fn test_time_in_state_formats() {
        assert_eq!(
            time_in_state(&task_changed(TaskStatus::InProgress, 45), now()),
            "45m"
        );
        assert_eq!(
            time_in_state(&task_changed(TaskStatus::InProgress, 125), now()),
            "2h 5m"
        );
        assert_eq!(
            time_in_state(&task_changed(TaskStatus::InProgress, -5), now()),
            "0m"
        );
        assert_eq!(time_in_state(&Task::default(), now()), "");
    }

    #[test]
    fn test_format_duration_ranges() {
        assert_eq!(format_duration(42.0), "42s");
        assert_eq!(format_duration(41.6), "42s");
        assert_eq!(format_duration(187.0), "3m 7s");
        assert_eq!(format_duration(4500.0), "1h 15m");
        assert_eq!(format_duration(3600.0), "1h 0m");
    }

    #[test]
    fn test_format_duration_carries_rounded_seconds() {
        assert_eq!(format_duration(119.6), "2m 0s");
        assert_eq!(format_duration(59.7), "1m 0s");
        assert_eq!(format_duration(3599.5), "1h 0m");
        assert_eq!(format_duration(-3.0), "0s");
    }

    #[test]
    fn test_format_elapsed_omits_leading_zero_units() {
        let start = now();
        assert_eq!(format_elapsed(start, start + chrono::Duration::seconds(9)), "9s");
        assert_eq!(
            format_elapsed(start, start + chrono::Duration::seconds(240)),
            "4m 0s"
        );
        assert_eq!(
            format_elapsed(start, start + chrono::Duration::seconds(3723)),
            "1h 2m 3s"
        );
        assert_eq!(
            format_elapsed(start, start + chrono::Duration::seconds(3605)),
            "1h 0m 5s"
        );
        assert_eq!(format_elapsed(start, start - chrono::Duration::seconds(5)), "0s");
    }

    #[test]
    fn test_format_activity_time() {
        assert_eq!(format_activity_time(None), "--:--");
        let rendered = format_activity_time(Some(now()));
        assert_eq!(rendered.len(), 5);
        assert_eq!(rendered.chars().nth(2), Some(':'));
    }
}
