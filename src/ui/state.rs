//! Presentation-only state and the interactive command set.
//!
//! Nothing here touches the snapshot. Commands only move the selection the
//! projection reads and tell the app loop what to do next.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::view::{ViewMode, ViewSelection};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Page {
    #[default]
    Dashboard,
    Plan,
}

impl Page {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Dashboard => "dashboard",
            Self::Plan => "plan",
        }
    }
}

impl fmt::Display for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Page {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "dashboard" => Ok(Self::Dashboard),
            "plan" => Ok(Self::Plan),
            _ => Err(format!(
                "Invalid page: {}. Expected one of: dashboard, plan",
                s
            )),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UiState {
    pub selection: ViewSelection,
    pub page: Page,
    pub show_help: bool,
}

impl UiState {
    pub fn new(mode: ViewMode, page: Page) -> Self {
        Self {
            selection: ViewSelection::new(mode),
            page,
            show_help: false,
        }
    }

    pub fn apply(&mut self, command: UiCommand) -> UiEffect {
        match command {
            UiCommand::Redraw => UiEffect::Render,
            UiCommand::SwitchView(mode) => {
                self.page = Page::Dashboard;
                self.selection = ViewSelection::new(mode);
                UiEffect::Render
            }
            UiCommand::TogglePhase(id) => {
                self.page = Page::Dashboard;
                self.selection.mode = ViewMode::Phase;
                self.selection.expanded_phase = match self.selection.expanded_phase.take() {
                    Some(current) if current == id => None,
                    _ => Some(id),
                };
                UiEffect::Render
            }
            UiCommand::SwitchPage(Page::Dashboard) => {
                self.page = Page::Dashboard;
                UiEffect::Render
            }
            UiCommand::SwitchPage(Page::Plan) => {
                self.page = Page::Plan;
                UiEffect::EnterPlan
            }
            UiCommand::OpenDocument(id) => {
                self.page = Page::Plan;
                UiEffect::OpenDocument(id)
            }
            UiCommand::RetryDocument => match self.page {
                Page::Plan => UiEffect::RetryDocument,
                Page::Dashboard => UiEffect::None,
            },
            UiCommand::Help => {
                self.show_help = !self.show_help;
                UiEffect::Render
            }
            UiCommand::Quit => UiEffect::Quit,
        }
    }
}

/// One line typed on stdin during `watch`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiCommand {
    Redraw,
    SwitchView(ViewMode),
    TogglePhase(String),
    SwitchPage(Page),
    OpenDocument(String),
    RetryDocument,
    Help,
    Quit,
}

impl UiCommand {
    pub fn parse(line: &str) -> Result<Self, String> {
        let mut parts = line.split_whitespace();
        let Some(head) = parts.next() else {
            return Ok(Self::Redraw);
        };
        let arg = parts.next();

        match (head.to_lowercase().as_str(), arg) {
            ("e" | "expand", Some(id)) => Ok(Self::TogglePhase(id.to_string())),
            ("e" | "expand", None) => Err("usage: e <phase-id>".to_string()),
            ("o" | "open", Some(id)) => Ok(Self::OpenDocument(id.to_string())),
            ("o" | "open", None) => Err("usage: o <document-id>".to_string()),
            ("r" | "retry", _) => Ok(Self::RetryDocument),
            ("q" | "quit" | "exit", _) => Ok(Self::Quit),
            ("h" | "?" | "help", _) => Ok(Self::Help),
            ("d" | "dashboard", _) => Ok(Self::SwitchPage(Page::Dashboard)),
            ("plan", _) => Ok(Self::SwitchPage(Page::Plan)),
            (other, _) => other
                .parse::<ViewMode>()
                .map(Self::SwitchView)
                .map_err(|_| format!("unknown command: {} (type h for help)", other)),
        }
    }
}

/// What the app loop has to do after a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiEffect {
    Render,
    /// Switch to the plan page; load the first document if none is selected.
    EnterPlan,
    OpenDocument(String),
    RetryDocument,
    Quit,
    None,
}

pub const HELP_TEXT: &[(&str, &str)] = &[
    ("p / f / a", "phase, feature or agent view"),
    ("e <id>", "expand or collapse a phase"),
    ("dashboard / plan", "switch page"),
    ("o <id>", "open a plan document"),
    ("r", "retry a failed document"),
    ("h", "toggle this help"),
    ("q", "quit"),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_from_str() {
        assert_eq!("plan".parse::<Page>(), Ok(Page::Plan));
        assert_eq!("Dashboard".parse::<Page>(), Ok(Page::Dashboard));
        assert!("settings".parse::<Page>().is_err());
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(UiCommand::parse(""), Ok(UiCommand::Redraw));
        assert_eq!(UiCommand::parse("f"), Ok(UiCommand::SwitchView(ViewMode::Feature)));
        assert_eq!(UiCommand::parse("agents"), Ok(UiCommand::SwitchView(ViewMode::Agent)));
        assert_eq!(UiCommand::parse("e F1"), Ok(UiCommand::TogglePhase("F1".into())));
        assert_eq!(UiCommand::parse("o plan"), Ok(UiCommand::OpenDocument("plan".into())));
        assert_eq!(UiCommand::parse("plan"), Ok(UiCommand::SwitchPage(Page::Plan)));
        assert_eq!(UiCommand::parse("  q  "), Ok(UiCommand::Quit));
        assert!(UiCommand::parse("e").is_err());
        assert!(UiCommand::parse("zoom").is_err());
    }

    #[test]
    fn test_toggle_phase_expands_then_collapses() {
        let mut state = UiState::default();
        assert_eq!(state.apply(UiCommand::TogglePhase("F1".into())), UiEffect::Render);
        assert_eq!(state.selection.expanded_phase.as_deref(), Some("F1"));

        state.apply(UiCommand::TogglePhase("F2".into()));
        assert_eq!(state.selection.expanded_phase.as_deref(), Some("F2"));

        state.apply(UiCommand::TogglePhase("F2".into()));
        assert_eq!(state.selection.expanded_phase, None);
    }

    #[test]
    fn test_switching_view_collapses_expanded_phase() {
        let mut state = UiState::default();
        state.apply(UiCommand::TogglePhase("F1".into()));
        state.apply(UiCommand::SwitchView(ViewMode::Agent));
        assert_eq!(state.selection, ViewSelection::new(ViewMode::Agent));
    }

    #[test]
    fn test_plan_page_effects() {
        let mut state = UiState::default();
        assert_eq!(state.apply(UiCommand::RetryDocument), UiEffect::None);
        assert_eq!(state.apply(UiCommand::SwitchPage(Page::Plan)), UiEffect::EnterPlan);
        assert_eq!(state.page, Page::Plan);
        assert_eq!(state.apply(UiCommand::RetryDocument), UiEffect::RetryDocument);

        let mut state = UiState::default();
        assert_eq!(
            state.apply(UiCommand::OpenDocument("notes".into())),
            UiEffect::OpenDocument("notes".into())
        );
        assert_eq!(state.page, Page::Plan);

        state.apply(UiCommand::SwitchView(ViewMode::Phase));
        assert_eq!(state.page, Page::Dashboard);
    }

    #[test]
    fn test_help_toggles() {
        let mut state = UiState::default();
        state.apply(UiCommand::Help);
        assert!(state.show_help);
        state.apply(UiCommand::Help);
        assert!(!state.show_help);
        assert_eq!(state.apply(UiCommand::Quit), UiEffect::Quit);
    }
}
