//! Terminal presentation layer.
//!
//! Consumes the plain-data [`DashboardView`](crate::view::DashboardView) and
//! owns all presentation-only state. Output modes:
//! - `full`: redrawn screen with colors and icons
//! - `minimal`: one status line per frame
//! - `json`: one JSON document per frame for machine consumption

pub mod icons;
pub mod render;
pub mod state;

pub use render::{Frame, PlanFrame, Renderer, TerminalRenderer, render_frame};
pub use state::{Page, UiCommand, UiEffect, UiState};

/// Output mode for the terminal renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UiMode {
    /// Full-screen dashboard with colors and icons
    #[default]
    Full,
    /// Single-line status updates
    Minimal,
    /// JSON-formatted frames
    Json,
}

impl std::str::FromStr for UiMode {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_lowercase().as_str() {
            "json" => Self::Json,
            "minimal" => Self::Minimal,
            _ => Self::Full,
        })
    }
}

impl UiMode {
    /// Parse UI mode from string; unknown values fall back to `Full`.
    pub fn parse(s: &str) -> Self {
        s.parse().unwrap_or_default()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Minimal => "minimal",
            Self::Json => "json",
        }
    }
}
