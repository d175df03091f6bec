//! Frame rendering for the three output modes.
//!
//! Rendering is a pure function of a [`Frame`]; [`TerminalRenderer`] only
//! decides where the text goes.

use std::fmt::Write as _;
use std::io::Write as _;

use chrono::{DateTime, Local, Utc};
use console::{Term, style};
use serde::Serialize;

use super::icons::{
    ARROW, CROSS, DOT, HOURGLASS, LINK, RETRY, WARNING, feature_status_icon, task_status_icon,
};
use super::state::{HELP_TEXT, Page};
use super::UiMode;
use crate::connection::ConnectionStatus;
use crate::derive::RetrySeverity;
use crate::documents::{DocumentRef, DocumentState};
use crate::view::{
    AgentView, ColumnKind, DashboardView, FeatureView, PhaseView, TaskCard, ViewBody, ViewMode,
};

const DEFAULT_WIDTH: usize = 100;
const MIN_WIDTH: usize = 40;
const BAR_WIDTH: usize = 30;

/// What the plan page shows.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct PlanFrame<'a> {
    pub documents: &'a [DocumentRef],
    pub current: Option<&'a str>,
    pub state: Option<&'a DocumentState>,
}

/// Everything drawn in one refresh.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Frame<'a> {
    pub connection: Option<ConnectionStatus>,
    pub page: Page,
    pub view: &'a DashboardView,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plan: Option<PlanFrame<'a>>,
    #[serde(skip)]
    pub show_help: bool,
    /// One-off message such as a rejected command.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<&'a str>,
}

impl<'a> Frame<'a> {
    pub fn new(view: &'a DashboardView) -> Self {
        Self {
            connection: None,
            page: Page::Dashboard,
            view,
            plan: None,
            show_help: false,
            notice: None,
        }
    }
}

/// Output sink for frames. The terminal is the only real implementation.
pub trait Renderer {
    fn render(&mut self, frame: &Frame<'_>) -> std::io::Result<()>;

    /// Whether every one-second tick redraws. Otherwise a tick draws only
    /// when the re-derived view changed.
    fn redraw_on_tick(&self) -> bool {
        true
    }
}

pub struct TerminalRenderer {
    mode: UiMode,
    term: Term,
}

impl TerminalRenderer {
    pub fn new(mode: UiMode) -> Self {
        Self {
            mode,
            term: Term::stdout(),
        }
    }

    pub fn mode(&self) -> UiMode {
        self.mode
    }

    fn width(&self) -> usize {
        if self.term.is_term() {
            (self.term.size().1 as usize).max(MIN_WIDTH)
        } else {
            DEFAULT_WIDTH
        }
    }
}

impl Renderer for TerminalRenderer {
    fn render(&mut self, frame: &Frame<'_>) -> std::io::Result<()> {
        let output = render_frame(frame, self.mode, self.width()).map_err(std::io::Error::other)?;
        if self.mode == UiMode::Full && self.term.is_term() {
            self.term.clear_screen()?;
        }
        writeln!(&self.term, "{}", output.trim_end())?;
        self.term.flush()
    }

    fn redraw_on_tick(&self) -> bool {
        self.mode == UiMode::Full
    }
}

/// Render one frame as text. Only the JSON mode can fail.
pub fn render_frame(frame: &Frame<'_>, mode: UiMode, width: usize) -> serde_json::Result<String> {
    match mode {
        UiMode::Json => serde_json::to_string(frame),
        UiMode::Minimal => Ok(render_minimal(frame)),
        UiMode::Full => Ok(render_full(frame, width.max(MIN_WIDTH))),
    }
}

fn render_minimal(frame: &Frame<'_>) -> String {
    let view = frame.view;
    let mut parts = Vec::new();
    if let Some(status) = frame.connection {
        parts.push(format!("[{}]", status));
    }
    parts.push(view.progress.summary());
    if let Some(elapsed) = view.build.as_ref().and_then(|b| b.elapsed.as_deref()) {
        parts.push(format!("elapsed {}", elapsed));
    }
    let stuck = stuck_count(&view.body);
    if stuck > 0 {
        parts.push(format!("{} stuck", stuck));
    }
    if !view.load_errors.is_empty() {
        parts.push(format!("{} load errors", view.load_errors.len()));
    }
    if let (Page::Plan, Some(plan)) = (frame.page, frame.plan) {
        let doc = plan.current.unwrap_or("-");
        let state = match plan.state {
            Some(DocumentState::Loading) => "loading",
            Some(DocumentState::Loaded(_)) => "loaded",
            Some(DocumentState::Failed(_)) => "failed",
            None => "none",
        };
        parts.push(format!("plan {} ({})", doc, state));
    }
    if let Some(notice) = frame.notice {
        parts.push(notice.to_string());
    }
    parts.join(" | ")
}

fn stuck_count(body: &ViewBody) -> usize {
    match body {
        ViewBody::Phase(view) => view.cards.iter().map(|c| c.stuck_tasks).sum(),
        ViewBody::Feature(view) => view
            .lanes
            .iter()
            .flat_map(|lane| lane.columns.iter())
            .flat_map(|column| column.tasks.iter())
            .filter(|card| card.stuck)
            .count(),
        ViewBody::Agent(view) => view
            .columns
            .iter()
            .flat_map(|column| column.active.iter())
            .filter(|card| card.stuck)
            .count(),
    }
}

fn render_full(frame: &Frame<'_>, width: usize) -> String {
    let mut out = String::new();
    let view = frame.view;

    write_header(&mut out, frame, width);
    write_tabs(&mut out, frame);
    let _ = writeln!(out, "{}", style("─".repeat(width)).dim());

    for error in &view.load_errors {
        for line in textwrap::wrap(error, width.saturating_sub(4)) {
            let _ = writeln!(out, "{}{}", WARNING, style(line).red());
        }
    }

    match frame.page {
        Page::Plan => write_plan(&mut out, frame.plan, width),
        Page::Dashboard if view.is_empty => {
            let _ = writeln!(
                out,
                "\n  {}{}",
                HOURGLASS,
                style("Waiting for build data...").dim()
            );
        }
        Page::Dashboard => match &view.body {
            ViewBody::Phase(body) => write_phase_view(&mut out, body, width),
            ViewBody::Feature(body) => write_feature_view(&mut out, body, width),
            ViewBody::Agent(body) => write_agent_view(&mut out, body, width),
        },
    }

    if let Some(notice) = frame.notice {
        let _ = writeln!(out, "\n{}", style(notice).yellow());
    }
    if frame.show_help {
        let _ = writeln!(out, "\n{}", style("Commands").underlined());
        for (keys, what) in HELP_TEXT {
            let _ = writeln!(out, "  {:<18} {}", style(keys).cyan(), what);
        }
    }
    out
}

fn write_header(out: &mut String, frame: &Frame<'_>, width: usize) {
    let view = frame.view;
    let connection = match frame.connection {
        Some(status) if status.is_connected() => style(format!("{}{}", DOT, status)).green(),
        Some(status @ ConnectionStatus::Failed) => {
            style(format!("{}{}", DOT, status)).red().bold()
        }
        Some(status) => style(format!("{}{}", DOT, status)).yellow(),
        None => style(String::new()),
    };
    let _ = write!(out, "{}  {}", style("Office Dash").bold().cyan(), connection);
    if let Some(build) = &view.build {
        if let Some(session) = &build.session_id {
            let _ = write!(out, "  {} {}", style("session").dim(), session);
        }
        if let Some(elapsed) = &build.elapsed {
            let _ = write!(out, "  {} {}", style("elapsed").dim(), style(elapsed).cyan());
        }
    }
    if let Some(received_at) = view.received_at {
        let _ = write!(out, "  {} {}", style("updated").dim(), clock_time(received_at));
    }
    out.push('\n');

    let bar_width = BAR_WIDTH.min(width.saturating_sub(30));
    let filled = (view.progress.percent_or_zero() as usize * bar_width / 100).min(bar_width);
    let _ = writeln!(
        out,
        "[{}{}] {}",
        style("█".repeat(filled)).green(),
        style("░".repeat(bar_width - filled)).dim(),
        view.progress.summary()
    );
}

fn clock_time(at: DateTime<Utc>) -> String {
    at.with_timezone(&Local).format("%H:%M:%S").to_string()
}

fn write_tabs(out: &mut String, frame: &Frame<'_>) {
    let mode = frame.view.body.mode();
    let mut tabs: Vec<String> = ViewMode::ALL
        .iter()
        .map(|m| tab(m.label(), frame.page == Page::Dashboard && *m == mode))
        .collect();
    tabs.push(tab("Plan", frame.page == Page::Plan));
    let _ = writeln!(out, "{}", tabs.join("  "));
}

fn tab(label: &str, active: bool) -> String {
    if active {
        style(format!("[{}]", label)).bold().yellow().to_string()
    } else {
        style(format!(" {} ", label)).dim().to_string()
    }
}

fn write_phase_view(out: &mut String, view: &PhaseView, width: usize) {
    for card in &view.cards {
        let marker = if card.expanded { "▼" } else { "▶" };
        let _ = write!(
            out,
            "{} {}{} {}  {}/{} done",
            style(marker).dim(),
            feature_status_icon(card.status),
            style(&card.name).bold(),
            style(format!("({})", card.id)).dim(),
            card.counts.done,
            card.counts.total
        );
        if card.stuck_tasks > 0 {
            let _ = write!(
                out,
                "  {}",
                style(format!("{}{} stuck", WARNING, card.stuck_tasks)).red()
            );
        }
        out.push('\n');
    }

    if let Some(expanded) = &view.expanded {
        let _ = writeln!(
            out,
            "\n{} {}/{} done",
            style(&expanded.name).underlined(),
            expanded.counts.done,
            expanded.counts.total
        );
        if expanded.tasks.is_empty() {
            let _ = writeln!(out, "  {}", style("No tasks").dim());
        }
        for task in &expanded.tasks {
            let _ = write!(
                out,
                "  {}{} {}",
                task_status_icon(task.status),
                style(&task.id).dim(),
                task.title
            );
            if let Some(duration) = &task.duration {
                let _ = write!(out, "  {}", style(duration).cyan());
            }
            out.push('\n');
        }
    }

    let _ = writeln!(out, "\n{}", style("Activity").underlined());
    if view.activity.is_empty() {
        let _ = writeln!(out, "  {}", style("No activity yet").dim());
    }
    for item in &view.activity {
        let text = truncate(&item.text, width.saturating_sub(20));
        let text = match item.tag.as_str() {
            "phase-complete" | "task-done" => style(text).green(),
            "phase-start" | "task-start" => style(text).cyan(),
            _ => style(text),
        };
        let _ = write!(out, "  {}  {}", style(&item.time).dim(), text);
        if !item.phase.is_empty() {
            let _ = write!(out, "  {}", style(format!("[{}]", item.phase)).dim());
        }
        out.push('\n');
    }
}

fn write_feature_view(out: &mut String, view: &FeatureView, width: usize) {
    for lane in &view.lanes {
        let _ = writeln!(
            out,
            "\n{}{}  {}/{} done",
            feature_status_icon(lane.status),
            style(&lane.name).bold(),
            lane.counts.done,
            lane.counts.total
        );
        for kind in ColumnKind::ALL {
            let Some(column) = lane.column(kind) else {
                continue;
            };
            let _ = writeln!(
                out,
                "  {}",
                style(format!("{} ({})", column.title, column.tasks.len())).underlined()
            );
            if column.tasks.is_empty() {
                let _ = writeln!(out, "    {}", style("No tasks").dim());
            }
            for card in &column.tasks {
                write_card(out, card, 4, width);
            }
        }
    }
}

fn write_agent_view(out: &mut String, view: &AgentView, width: usize) {
    for column in &view.columns {
        let _ = writeln!(
            out,
            "\n{}  {}",
            style(&column.name).bold(),
            style(format!("{} active", column.active.len())).dim()
        );
        if column.is_idle() {
            let _ = writeln!(out, "  {}", style("Idle").dim());
        }
        for card in &column.active {
            write_card(out, card, 2, width);
        }
        if column.done_total > 0 {
            let _ = writeln!(out, "  {}", style(format!("Done ({})", column.done_total)).green());
            for entry in &column.done_preview {
                let _ = writeln!(
                    out,
                    "    {} {} {}",
                    style(&entry.id).dim(),
                    entry.title,
                    style(format!("[{}]", entry.feature_name)).dim()
                );
            }
            if column.done_overflow > 0 {
                let _ = writeln!(
                    out,
                    "    {}",
                    style(format!("+{} more", column.done_overflow)).dim()
                );
            }
        }
    }
}

fn write_card(out: &mut String, card: &TaskCard, indent: usize, width: usize) {
    let pad = " ".repeat(indent);
    let _ = write!(
        out,
        "{}{}{} {}",
        pad,
        task_status_icon(card.status),
        style(&card.id).dim(),
        style(&card.title).bold()
    );
    if let Some(feature) = &card.feature_name {
        let _ = write!(out, " {}", style(format!("[{}]", feature)).dim());
    }
    out.push('\n');

    let mut details = Vec::new();
    if let Some(agent) = &card.agent_name {
        details.push(style(agent.clone()).magenta().to_string());
    }
    if !card.time_in_state.is_empty() {
        details.push(card.time_in_state.clone());
    }
    if let Some(step) = card.step {
        details.push(format!("step {}/{} ({}%)", step.current, step.total, step.percent));
    }
    match card.retry_severity {
        RetrySeverity::None => {}
        RetrySeverity::Warning => {
            details.push(style(format!("{}{}", RETRY, card.retry_count)).yellow().to_string())
        }
        RetrySeverity::Danger => {
            details.push(style(format!("{}{}", RETRY, card.retry_count)).red().to_string())
        }
    }
    if card.stuck {
        details.push(style("STUCK").red().bold().to_string());
    }
    if card.review_warning {
        details.push(style(format!("{}review warnings", WARNING)).yellow().to_string());
    }
    if !card.blocked_by.is_empty() {
        details.push(format!("{}blocked by {}", LINK, card.blocked_by.join(", ")));
    }
    if !card.blocking.is_empty() {
        details.push(format!("{}blocks {}", ARROW, card.blocking.join(", ")));
    }
    if !details.is_empty() {
        let _ = writeln!(out, "{}  {}", pad, details.join(" · "));
    }

    if let Some(error) = &card.error {
        let wrap_width = width.saturating_sub(indent + 4).max(20);
        for line in textwrap::wrap(error, wrap_width) {
            let _ = writeln!(out, "{}  {}", pad, style(line).red());
        }
    }
}

fn write_plan(out: &mut String, plan: Option<PlanFrame<'_>>, width: usize) {
    let Some(plan) = plan.filter(|p| !p.documents.is_empty()) else {
        let _ = writeln!(out, "\n  {}", style("No documents available").dim());
        return;
    };

    let tabs: Vec<String> = plan
        .documents
        .iter()
        .map(|doc| tab(&doc.label, plan.current == Some(doc.id.as_str())))
        .collect();
    let _ = writeln!(out, "{}", tabs.join("  "));
    let ids: Vec<&str> = plan.documents.iter().map(|d| d.id.as_str()).collect();
    let _ = writeln!(out, "{}", style(format!("open with: o <{}>", ids.join("|"))).dim());
    let _ = writeln!(out);

    match plan.state {
        None => {
            let _ = writeln!(out, "  {}", style("No document selected").dim());
        }
        Some(DocumentState::Loading) => {
            let _ = writeln!(out, "  {}{}", HOURGLASS, style("Loading...").dim());
        }
        Some(DocumentState::Loaded(content)) => {
            for line in content.lines() {
                if line.is_empty() {
                    out.push('\n');
                    continue;
                }
                for wrapped in textwrap::wrap(line, width) {
                    let _ = writeln!(out, "{}", wrapped);
                }
            }
        }
        Some(DocumentState::Failed(message)) => {
            let _ = writeln!(out, "  {}{}", CROSS, style("Failed to load document").red().bold());
            for line in textwrap::wrap(message, width.saturating_sub(4)) {
                let _ = writeln!(out, "    {}", style(line).red());
            }
            let _ = writeln!(out, "  {}", style("Type r to retry").yellow());
        }
    }
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max || max < 4 {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(max - 3).collect();
    cut.push_str("...");
    cut
}
