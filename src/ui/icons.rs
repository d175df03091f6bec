//! Shared UI icons and emojis.
//!
//! Every icon has a plain-text fallback for terminals without emoji support.

use console::Emoji;

use crate::snapshot::{FeatureStatus, TaskStatus};

// Status indicators
pub static CHECK: Emoji<'_, '_> = Emoji("✅ ", "[OK]");
pub static CROSS: Emoji<'_, '_> = Emoji("❌ ", "[ERR]");
pub static HOURGLASS: Emoji<'_, '_> = Emoji("⏳ ", "[..]");
pub static SPINNER: Emoji<'_, '_> = Emoji("🔄 ", "[>>]");

// Task states
pub static CLOCK: Emoji<'_, '_> = Emoji("🕑 ", "[Q]");
pub static PERSON: Emoji<'_, '_> = Emoji("👤 ", "[A]");
pub static GEAR: Emoji<'_, '_> = Emoji("⚙️  ", "[>]");
pub static REVIEW: Emoji<'_, '_> = Emoji("🔍 ", "[R]");

// Badges
pub static WARNING: Emoji<'_, '_> = Emoji("⚠️  ", "!");
pub static RETRY: Emoji<'_, '_> = Emoji("↻ ", "retry ");
pub static LINK: Emoji<'_, '_> = Emoji("🔗 ", "");
pub static ARROW: Emoji<'_, '_> = Emoji("→ ", "-> ");

// Connection
pub static DOT: Emoji<'_, '_> = Emoji("● ", "* ");

pub fn task_status_icon(status: TaskStatus) -> &'static Emoji<'static, 'static> {
    match status {
        TaskStatus::Queued => &CLOCK,
        TaskStatus::Assigned => &PERSON,
        TaskStatus::InProgress => &GEAR,
        TaskStatus::InReview => &REVIEW,
        TaskStatus::Done | TaskStatus::Completed => &CHECK,
        TaskStatus::Failed => &CROSS,
    }
}

pub fn feature_status_icon(status: FeatureStatus) -> &'static Emoji<'static, 'static> {
    match status {
        FeatureStatus::Pending => &HOURGLASS,
        FeatureStatus::InProgress => &SPINNER,
        FeatureStatus::Completed => &CHECK,
        FeatureStatus::Failed => &CROSS,
    }
}
