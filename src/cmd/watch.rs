//! Live dashboard: `office-dash watch`.

use std::path::PathBuf;

use anyhow::{Context, Result};

use office_dash::app;
use office_dash::config::{CliOverrides, DashboardConfig};
use office_dash::ui::{TerminalRenderer, UiMode};

/// Turn raw flag values into typed overrides. Bad `--view`/`--page` values
/// are rejected here; `--ui` falls back to `full` like the config file does.
pub fn overrides(
    page_url: Option<String>,
    config_path: Option<PathBuf>,
    view: Option<&str>,
    ui: Option<&str>,
    page: Option<&str>,
    stuck_threshold_minutes: Option<u64>,
) -> Result<CliOverrides> {
    Ok(CliOverrides {
        page_url,
        config_path,
        view: view.map(str::parse).transpose().map_err(anyhow::Error::msg)?,
        ui_mode: ui.map(UiMode::parse),
        page: page.map(str::parse).transpose().map_err(anyhow::Error::msg)?,
        stuck_threshold_minutes,
    })
}

pub async fn cmd_watch(overrides: &CliOverrides) -> Result<()> {
    let config = DashboardConfig::resolve(overrides).context("Failed to load configuration")?;
    if let Some(path) = &config.source {
        tracing::info!(path = %path.display(), "loaded config file");
    }

    let mut renderer = TerminalRenderer::new(config.ui_mode);
    app::run(config, &mut renderer).await
}
