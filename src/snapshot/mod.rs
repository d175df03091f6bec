//! Build-state snapshot model and reducer.
//!
//! A [`Snapshot`] is the whole world as the backend last described it.
//! [`DashboardState`] owns exactly one and swaps it on every inbound message.

pub mod lenient;
pub mod models;
pub mod reducer;

pub use models::{
    ActivityEvent, Agent, BuildInfo, BuildState, Feature, FeatureStatus, ReviewStatus, Snapshot,
    Task, TaskStatus, display_agent_name,
};
pub use reducer::DashboardState;
