//! The `watch` event loop.
//!
//! One current-thread task selects over connection events, a one-second
//! tick, stdin commands and document fetch results. [`App`] holds all state
//! and is driven synchronously; the loop only performs the I/O it asks for.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;

use crate::config::DashboardConfig;
use crate::connection::{ConnectionEvent, ConnectionManager, ConnectionStatus, websocket_url};
use crate::derive::DeriveConfig;
use crate::documents::{DocumentRef, DocumentSource, DocumentStore, HttpDocumentSource};
use crate::errors::DocumentError;
use crate::snapshot::DashboardState;
use crate::ui::{Frame, Page, PlanFrame, Renderer, UiCommand, UiEffect, UiState};
use crate::view::DashboardView;

const TICK_INTERVAL: Duration = Duration::from_secs(1);
const EVENT_BUFFER: usize = 64;

/// Follow-up work the loop performs for [`App`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppAction {
    Render,
    ListDocuments,
    FetchDocument(String),
    Quit,
    Idle,
}

/// Results of off-loop document requests.
#[derive(Debug)]
pub enum DocumentEvent {
    Listed(Result<Vec<DocumentRef>, DocumentError>),
    Fetched {
        id: String,
        result: Result<String, DocumentError>,
    },
}

pub struct App {
    derive: DeriveConfig,
    state: DashboardState,
    ui: UiState,
    connection: Option<ConnectionStatus>,
    documents: DocumentStore,
    documents_listed: bool,
    notice: Option<String>,
    /// Last drawn view with its per-second clock fields cleared.
    drawn: Option<DashboardView>,
}

impl App {
    pub fn new(config: &DashboardConfig, documents: DocumentStore) -> Self {
        Self {
            derive: config.derive_config(),
            state: DashboardState::new(),
            ui: UiState::new(config.view, config.page),
            connection: None,
            documents,
            documents_listed: false,
            notice: None,
            drawn: None,
        }
    }

    /// Work to do before the first event arrives.
    pub fn start(&mut self) -> AppAction {
        match self.ui.page {
            Page::Plan => self.enter_plan(),
            Page::Dashboard => AppAction::Render,
        }
    }

    pub fn ui(&self) -> &UiState {
        &self.ui
    }

    pub fn connection(&self) -> Option<ConnectionStatus> {
        self.connection
    }

    pub fn documents(&self) -> &DocumentStore {
        &self.documents
    }

    pub fn document_source(&self) -> Arc<dyn DocumentSource> {
        self.documents.source()
    }

    pub fn on_connection(&mut self, event: ConnectionEvent, now: DateTime<Utc>) -> AppAction {
        match event {
            ConnectionEvent::Status(status) => {
                tracing::debug!(%status, "connection status");
                self.connection = Some(status);
            }
            ConnectionEvent::Snapshot(snapshot) => {
                self.state.replace(snapshot, now);
            }
        }
        AppAction::Render
    }

    /// Re-derive against the clock. Unless every tick redraws, only a change
    /// in derived content (a task turning stuck, a minute passing in state)
    /// asks for a frame.
    pub fn on_tick(&mut self, now: DateTime<Utc>, redraw_every_tick: bool) -> AppAction {
        if redraw_every_tick {
            return AppAction::Render;
        }
        if self.drawn.as_ref() == Some(&settled(&self.view(now))) {
            AppAction::Idle
        } else {
            AppAction::Render
        }
    }

    pub fn mark_drawn(&mut self, view: &DashboardView) {
        self.drawn = Some(settled(view));
    }

    pub fn on_command(&mut self, line: &str) -> AppAction {
        self.notice = None;
        let command = match UiCommand::parse(line) {
            Ok(command) => command,
            Err(message) => {
                self.notice = Some(message);
                return AppAction::Render;
            }
        };
        match self.ui.apply(command) {
            UiEffect::Render => AppAction::Render,
            UiEffect::EnterPlan => self.enter_plan(),
            UiEffect::OpenDocument(id) => self.open(&id),
            UiEffect::RetryDocument => match self.documents.retry() {
                Some(id) => AppAction::FetchDocument(id),
                None => AppAction::Render,
            },
            UiEffect::Quit => AppAction::Quit,
            UiEffect::None => AppAction::Idle,
        }
    }

    pub fn on_document(&mut self, event: DocumentEvent) -> AppAction {
        match event {
            DocumentEvent::Listed(Ok(documents)) => {
                self.documents.set_documents(documents);
                self.documents_listed = true;
                if self.ui.page == Page::Plan {
                    return self.enter_plan();
                }
            }
            DocumentEvent::Listed(Err(e)) => {
                tracing::warn!(error = %e, "failed to list documents");
                self.notice = Some(format!("Failed to load document list: {}", e));
            }
            DocumentEvent::Fetched { id, result } => self.documents.complete(&id, result),
        }
        AppAction::Render
    }

    /// Entering the plan page loads the first document when none is selected.
    fn enter_plan(&mut self) -> AppAction {
        if !self.documents_listed {
            return AppAction::ListDocuments;
        }
        match self.documents.default_document().map(String::from) {
            Some(id) => self.open(&id),
            None => AppAction::Render,
        }
    }

    fn open(&mut self, id: &str) -> AppAction {
        if self.documents.select(id) {
            AppAction::FetchDocument(id.to_string())
        } else {
            AppAction::Render
        }
    }

    pub fn view(&self, now: DateTime<Utc>) -> DashboardView {
        self.state.derive_views(now, &self.derive, &self.ui.selection)
    }

    pub fn frame<'a>(&'a self, view: &'a DashboardView) -> Frame<'a> {
        let plan = (self.ui.page == Page::Plan).then(|| PlanFrame {
            documents: self.documents.documents(),
            current: self.documents.current(),
            state: self.documents.state(),
        });
        Frame {
            connection: self.connection,
            page: self.ui.page,
            view,
            plan,
            show_help: self.ui.show_help,
            notice: self.notice.as_deref(),
        }
    }
}

/// `view` without the fields that move every second.
fn settled(view: &DashboardView) -> DashboardView {
    let mut view = view.clone();
    view.generated_at = DateTime::default();
    if let Some(build) = view.build.as_mut() {
        build.elapsed = None;
    }
    view
}

fn draw(app: &mut App, renderer: &mut dyn Renderer) {
    let view = app.view(Utc::now());
    if let Err(e) = renderer.render(&app.frame(&view)) {
        tracing::warn!(error = %e, "failed to render frame");
    }
    app.mark_drawn(&view);
}

fn spawn_document_task(
    action: &AppAction,
    source: Arc<dyn DocumentSource>,
    tx: &mpsc::Sender<DocumentEvent>,
) {
    let tx = tx.clone();
    match action {
        AppAction::ListDocuments => {
            tokio::spawn(async move {
                let result = source.list().await;
                let _ = tx.send(DocumentEvent::Listed(result)).await;
            });
        }
        AppAction::FetchDocument(id) => {
            let id = id.clone();
            tokio::spawn(async move {
                let result = source.fetch(&id).await;
                let _ = tx.send(DocumentEvent::Fetched { id, result }).await;
            });
        }
        _ => {}
    }
}

/// Connect, render and react to commands until the user quits.
pub async fn run(config: DashboardConfig, renderer: &mut dyn Renderer) -> Result<()> {
    let ws_url = websocket_url(&config.page_url).context("Failed to derive WebSocket URL")?;
    let source =
        HttpDocumentSource::new(&config.page_url).context("Failed to set up document client")?;
    let mut app = App::new(&config, DocumentStore::new(Arc::new(source)));

    let (conn_tx, mut conn_rx) = mpsc::channel(EVENT_BUFFER);
    let (doc_tx, mut doc_rx) = mpsc::channel(EVENT_BUFFER);

    tracing::info!(url = %ws_url, "starting dashboard");
    let driver = tokio::spawn(
        ConnectionManager::new(ws_url, conn_tx)
            .with_policy(config.reconnect)
            .with_keepalive(config.keepalive)
            .run(),
    );

    let mut tick = tokio::time::interval(TICK_INTERVAL);
    tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut stdin = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;
    let mut connection_open = true;

    let mut pending = Some(app.start());

    loop {
        if let Some(action) = pending.take() {
            match action {
                AppAction::Quit => break,
                AppAction::Idle => {}
                AppAction::Render => draw(&mut app, renderer),
                other => {
                    spawn_document_task(&other, app.document_source(), &doc_tx);
                    draw(&mut app, renderer);
                }
            }
        }

        pending = tokio::select! {
            event = conn_rx.recv(), if connection_open => match event {
                Some(event) => Some(app.on_connection(event, Utc::now())),
                None => {
                    connection_open = false;
                    None
                }
            },
            Some(event) = doc_rx.recv() => Some(app.on_document(event)),
            line = stdin.next_line(), if stdin_open => match line {
                Ok(Some(line)) => Some(app.on_command(&line)),
                Ok(None) => {
                    tracing::debug!("stdin closed; commands disabled");
                    stdin_open = false;
                    None
                }
                Err(e) => {
                    tracing::warn!(error = %e, "failed to read command");
                    stdin_open = false;
                    None
                }
            },
            _ = tick.tick() => Some(app.on_tick(Utc::now(), renderer.redraw_on_tick())),
            _ = tokio::signal::ctrl_c() => Some(AppAction::Quit),
        };
    }

    driver.abort();
    Ok(())
}
