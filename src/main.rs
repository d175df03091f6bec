use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use office_dash::logging::{LogOptions, init_logging};

mod cmd;

#[derive(Parser)]
#[command(name = "office-dash")]
#[command(version, about = "Live terminal dashboard for multi-agent build progress")]
pub struct Cli {
    /// Debug-level logging for this crate
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Write logs to office-dash.log in this directory instead of stderr
    #[arg(long, global = true)]
    pub log_dir: Option<PathBuf>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Connect to a dashboard backend and render live updates
    Watch {
        /// Dashboard page URL; the channel and document endpoints share its origin
        page_url: Option<String>,

        /// Initial view: phase, feature, agent
        #[arg(long)]
        view: Option<String>,

        /// UI output mode: full, minimal, json
        #[arg(long)]
        ui: Option<String>,

        /// Minutes without a status change before a task counts as stuck
        #[arg(long)]
        stuck_threshold: Option<u64>,

        /// Initial page: dashboard, plan
        #[arg(long)]
        page: Option<String>,

        /// Config file (defaults to the user config directory)
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Render a saved snapshot once and exit
    Render {
        /// JSON file holding a snapshot or a channel message
        file: PathBuf,

        /// View to render: phase, feature, agent
        #[arg(long, default_value = "phase")]
        view: String,

        /// Phase id to expand in the phase view
        #[arg(long)]
        expand: Option<String>,

        /// UI output mode: full, minimal, json
        #[arg(long, default_value = "full")]
        ui: String,

        /// Clock to derive against (RFC 3339); defaults to now
        #[arg(long)]
        now: Option<String>,

        /// Minutes without a status change before a task counts as stuck
        #[arg(long, default_value = "30")]
        stuck_threshold: u64,

        /// Output width for the full renderer
        #[arg(long, default_value = "100")]
        width: usize,
    },
    /// Browse plan documents served by the backend
    Docs {
        #[command(subcommand)]
        command: DocsCommands,
    },
    /// View or create configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

#[derive(Subcommand, Clone)]
pub enum DocsCommands {
    /// List available documents
    List {
        /// Dashboard page URL
        page_url: Option<String>,
    },
    /// Print one document
    Show {
        id: String,
        /// Dashboard page URL
        page_url: Option<String>,
    },
}

#[derive(Subcommand, Clone)]
pub enum ConfigCommands {
    /// Show the effective configuration after all layers are applied
    Show {
        /// Dashboard page URL
        page_url: Option<String>,
        /// Config file (defaults to the user config directory)
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Write a default config file
    Init {
        /// Where to write it (defaults to the user config directory)
        #[arg(long)]
        path: Option<PathBuf>,
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let _log_guard = init_logging(&LogOptions {
        verbose: cli.verbose,
        log_dir: cli.log_dir.clone(),
        json: cli.log_json,
    });

    match &cli.command {
        Commands::Watch {
            page_url,
            view,
            ui,
            stuck_threshold,
            page,
            config,
        } => {
            let overrides = cmd::watch::overrides(
                page_url.clone(),
                config.clone(),
                view.as_deref(),
                ui.as_deref(),
                page.as_deref(),
                *stuck_threshold,
            )?;
            cmd::cmd_watch(&overrides).await?;
        }
        Commands::Render {
            file,
            view,
            expand,
            ui,
            now,
            stuck_threshold,
            width,
        } => cmd::cmd_render(&cmd::render::RenderArgs {
            file: file.clone(),
            view: view.clone(),
            expand: expand.clone(),
            ui: ui.clone(),
            now: now.clone(),
            stuck_threshold_minutes: *stuck_threshold,
            width: *width,
        })?,
        Commands::Docs { command } => cmd::cmd_docs(command.clone()).await?,
        Commands::Config { command } => cmd::cmd_config(command.clone())?,
    }

    Ok(())
}
