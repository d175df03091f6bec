//! Layered configuration for the dashboard client.
//!
//! Values are resolved in order, later layers winning:
//! 1. built-in defaults
//! 2. `config.toml` (`--config`, else `<config dir>/office-dash/config.toml`)
//! 3. the dashboard page URL's query string (`stuck_threshold`, `page`)
//! 4. explicit CLI flags
//!
//! # Configuration File Format
//!
//! ```toml
//! [connection]
//! url = "http://localhost:8080/"
//! base_delay_ms = 1000
//! max_attempts = 10
//! keepalive_secs = 25
//!
//! [display]
//! stuck_threshold_minutes = 30
//! view = "phase"
//! page = "dashboard"
//! ui = "full"
//! activity_limit = 20
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::connection::{
    DEFAULT_BASE_DELAY, DEFAULT_MAX_ATTEMPTS, KEEPALIVE_INTERVAL, ReconnectPolicy,
};
use crate::derive::{DEFAULT_ACTIVITY_LIMIT, DEFAULT_STUCK_THRESHOLD, DeriveConfig};
use crate::errors::ConfigError;
use crate::ui::{Page, UiMode};
use crate::view::ViewMode;

/// Dashboard URL used when nothing else names one.
pub const DEFAULT_PAGE_URL: &str = "http://localhost:8080/";

/// Environment variable that can name the dashboard URL.
pub const URL_ENV_VAR: &str = "OFFICE_DASH_URL";

const CONFIG_DIR_NAME: &str = "office-dash";
const CONFIG_FILE_NAME: &str = "config.toml";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionSection {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_keepalive_secs")]
    pub keepalive_secs: u64,
}

fn default_base_delay_ms() -> u64 {
    DEFAULT_BASE_DELAY.as_millis() as u64
}

fn default_max_attempts() -> u32 {
    DEFAULT_MAX_ATTEMPTS
}

fn default_keepalive_secs() -> u64 {
    KEEPALIVE_INTERVAL.as_secs()
}

impl Default for ConnectionSection {
    fn default() -> Self {
        Self {
            url: None,
            base_delay_ms: default_base_delay_ms(),
            max_attempts: default_max_attempts(),
            keepalive_secs: default_keepalive_secs(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplaySection {
    #[serde(default = "default_stuck_threshold_minutes")]
    pub stuck_threshold_minutes: u64,
    #[serde(default)]
    pub view: Option<String>,
    #[serde(default)]
    pub page: Option<String>,
    #[serde(default)]
    pub ui: Option<String>,
    #[serde(default = "default_activity_limit")]
    pub activity_limit: usize,
}

fn default_stuck_threshold_minutes() -> u64 {
    DEFAULT_STUCK_THRESHOLD.as_secs() / 60
}

fn default_activity_limit() -> usize {
    DEFAULT_ACTIVITY_LIMIT
}

impl Default for DisplaySection {
    fn default() -> Self {
        Self {
            stuck_threshold_minutes: default_stuck_threshold_minutes(),
            view: None,
            page: None,
            ui: None,
            activity_limit: default_activity_limit(),
        }
    }
}

/// The complete config.toml structure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardToml {
    #[serde(default)]
    pub connection: ConnectionSection,
    #[serde(default)]
    pub display: DisplaySection,
}

impl DashboardToml {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadFailed {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content, path)
    }

    pub fn parse(content: &str, path: &Path) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|source| ConfigError::ParseFailed {
            path: path.to_path_buf(),
            source,
        })
    }

    /// `<config dir>/office-dash/config.toml`, if the platform has a config dir.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }
}

/// Values given explicitly on the command line. `None` means "not given".
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub page_url: Option<String>,
    pub config_path: Option<PathBuf>,
    pub view: Option<ViewMode>,
    pub ui_mode: Option<UiMode>,
    pub page: Option<Page>,
    pub stuck_threshold_minutes: Option<u64>,
}

/// Fully resolved configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardConfig {
    pub page_url: Url,
    pub stuck_threshold: Duration,
    pub view: ViewMode,
    pub page: Page,
    pub ui_mode: UiMode,
    pub activity_limit: usize,
    pub reconnect: ReconnectPolicy,
    pub keepalive: Duration,
    /// The config file that was read, if any.
    pub source: Option<PathBuf>,
}

impl DashboardConfig {
    /// Resolve every layer: file (explicit or default location), page URL
    /// query and CLI flags.
    pub fn resolve(cli: &CliOverrides) -> Result<Self, ConfigError> {
        let (file, source) = match &cli.config_path {
            Some(path) => (DashboardToml::load(path)?, Some(path.clone())),
            None => match DashboardToml::default_path().filter(|p| p.exists()) {
                Some(path) => (DashboardToml::load(&path)?, Some(path)),
                None => (DashboardToml::default(), None),
            },
        };
        let env_url = std::env::var(URL_ENV_VAR).ok().filter(|v| !v.is_empty());
        Self::layer(file, source, env_url, cli)
    }

    /// Combine already-loaded layers. Pure apart from logging.
    pub fn layer(
        file: DashboardToml,
        source: Option<PathBuf>,
        env_url: Option<String>,
        cli: &CliOverrides,
    ) -> Result<Self, ConfigError> {
        let raw_url = cli
            .page_url
            .clone()
            .or(env_url)
            .or(file.connection.url.clone())
            .unwrap_or_else(|| DEFAULT_PAGE_URL.to_string());
        let page_url = parse_page_url(&raw_url)?;

        let mut config = Self {
            page_url,
            stuck_threshold: minutes(file.display.stuck_threshold_minutes),
            view: parse_file_value("display.view", file.display.view.as_deref())?
                .unwrap_or_default(),
            page: parse_file_value("display.page", file.display.page.as_deref())?
                .unwrap_or_default(),
            ui_mode: file
                .display
                .ui
                .as_deref()
                .map(UiMode::parse)
                .unwrap_or_default(),
            activity_limit: file.display.activity_limit,
            reconnect: ReconnectPolicy {
                base_delay: Duration::from_millis(file.connection.base_delay_ms),
                max_attempts: file.connection.max_attempts,
            },
            keepalive: Duration::from_secs(file.connection.keepalive_secs.max(1)),
            source,
        };

        config.apply_query();

        if let Some(view) = cli.view {
            config.view = view;
        }
        if let Some(ui_mode) = cli.ui_mode {
            config.ui_mode = ui_mode;
        }
        if let Some(page) = cli.page {
            config.page = page;
        }
        if let Some(mins) = cli.stuck_threshold_minutes {
            config.stuck_threshold = minutes(mins);
        }
        Ok(config)
    }

    /// Read `stuck_threshold` and `page` from the page URL. Unparseable
    /// values are ignored with a warning.
    fn apply_query(&mut self) {
        let pairs: Vec<(String, String)> = self
            .page_url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        for (key, value) in pairs {
            match key.as_str() {
                "stuck_threshold" => match value.trim().parse::<u64>() {
                    Ok(mins) => self.stuck_threshold = minutes(mins),
                    Err(_) => {
                        tracing::warn!(value = %value, "ignoring invalid stuck_threshold query parameter")
                    }
                },
                "page" => match value.parse::<Page>() {
                    Ok(page) => self.page = page,
                    Err(_) => tracing::warn!(value = %value, "ignoring invalid page query parameter"),
                },
                _ => {}
            }
        }
    }

    pub fn derive_config(&self) -> DeriveConfig {
        DeriveConfig {
            stuck_threshold: self.stuck_threshold,
            activity_limit: self.activity_limit,
            ..DeriveConfig::default()
        }
    }

    /// Render the effective configuration as TOML, for `config show`.
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        let effective = DashboardToml {
            connection: ConnectionSection {
                url: Some(self.page_url.to_string()),
                base_delay_ms: self.reconnect.base_delay.as_millis() as u64,
                max_attempts: self.reconnect.max_attempts,
                keepalive_secs: self.keepalive.as_secs(),
            },
            display: DisplaySection {
                stuck_threshold_minutes: self.stuck_threshold.as_secs() / 60,
                view: Some(self.view.as_str().to_string()),
                page: Some(self.page.as_str().to_string()),
                ui: Some(self.ui_mode.as_str().to_string()),
                activity_limit: self.activity_limit,
            },
        };
        toml::to_string_pretty(&effective)
    }
}

fn minutes(mins: u64) -> Duration {
    Duration::from_secs(mins.saturating_mul(60))
}

fn parse_page_url(raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw).map_err(|e| ConfigError::InvalidUrl {
        url: raw.to_string(),
        message: e.to_string(),
    })?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ConfigError::UnsupportedScheme {
            scheme: other.to_string(),
        }),
    }
}

fn parse_file_value<T: std::str::FromStr>(
    field: &'static str,
    raw: Option<&str>,
) -> Result<Option<T>, ConfigError> {
    raw.map(|value| {
        value.parse().map_err(|_| ConfigError::InvalidValue {
            field,
            value: value.to_string(),
        })
    })
    .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn layer(file: DashboardToml, cli: &CliOverrides) -> DashboardConfig {
        DashboardConfig::layer(file, None, None, cli).unwrap()
    }

    #[test]
    fn test_defaults() {
        let config = layer(DashboardToml::default(), &CliOverrides::default());
        assert_eq!(config.page_url.as_str(), DEFAULT_PAGE_URL);
        assert_eq!(config.stuck_threshold, Duration::from_secs(30 * 60));
        assert_eq!(config.view, ViewMode::Phase);
        assert_eq!(config.page, Page::Dashboard);
        assert_eq!(config.ui_mode, UiMode::Full);
        assert_eq!(config.reconnect, ReconnectPolicy::default());
        assert_eq!(config.keepalive, Duration::from_secs(25));
        assert_eq!(config.activity_limit, 20);
    }

    #[test]
    fn test_parse_partial_file() {
        let file = DashboardToml::parse(
            "[display]\nstuck_threshold_minutes = 45\nview = \"agent\"\n",
            Path::new("config.toml"),
        )
        .unwrap();
        assert_eq!(file.connection, ConnectionSection::default());
        let config = layer(file, &CliOverrides::default());
        assert_eq!(config.stuck_threshold, Duration::from_secs(45 * 60));
        assert_eq!(config.view, ViewMode::Agent);
    }

    #[test]
    fn test_parse_invalid_file() {
        let err = DashboardToml::parse("[display\nview = ", Path::new("bad.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::ParseFailed { .. }));
    }

    #[test]
    fn test_invalid_file_value_is_an_error() {
        let mut file = DashboardToml::default();
        file.display.view = Some("kanban".to_string());
        let err = DashboardConfig::layer(file, None, None, &CliOverrides::default()).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue {
                field: "display.view",
                ..
            }
        ));
    }

    #[test]
    fn test_query_overrides_file() {
        let mut file = DashboardToml::default();
        file.display.stuck_threshold_minutes = 45;
        let cli = CliOverrides {
            page_url: Some("http://dash:9000/?stuck_threshold=60&page=plan".to_string()),
            ..Default::default()
        };
        let config = layer(file, &cli);
        assert_eq!(config.stuck_threshold, Duration::from_secs(60 * 60));
        assert_eq!(config.page, Page::Plan);
    }

    #[test]
    fn test_invalid_query_values_are_ignored() {
        let cli = CliOverrides {
            page_url: Some("http://dash/?stuck_threshold=soon&page=settings".to_string()),
            ..Default::default()
        };
        let config = layer(DashboardToml::default(), &cli);
        assert_eq!(config.stuck_threshold, Duration::from_secs(30 * 60));
        assert_eq!(config.page, Page::Dashboard);
    }

    #[test]
    fn test_cli_overrides_query() {
        let cli = CliOverrides {
            page_url: Some("http://dash/?stuck_threshold=60".to_string()),
            stuck_threshold_minutes: Some(5),
            view: Some(ViewMode::Feature),
            ui_mode: Some(UiMode::Json),
            ..Default::default()
        };
        let config = layer(DashboardToml::default(), &cli);
        assert_eq!(config.stuck_threshold, Duration::from_secs(5 * 60));
        assert_eq!(config.view, ViewMode::Feature);
        assert_eq!(config.ui_mode, UiMode::Json);
    }

    #[test]
    fn test_url_precedence() {
        let mut file = DashboardToml::default();
        file.connection.url = Some("http://from-file/".to_string());
        let from_env = DashboardConfig::layer(
            file.clone(),
            None,
            Some("http://from-env/".to_string()),
            &CliOverrides::default(),
        )
        .unwrap();
        assert_eq!(from_env.page_url.as_str(), "http://from-env/");

        let from_file = layer(file, &CliOverrides::default());
        assert_eq!(from_file.page_url.as_str(), "http://from-file/");
    }

    #[test]
    fn test_rejects_bad_urls() {
        let cli = CliOverrides {
            page_url: Some("not a url".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            DashboardConfig::layer(DashboardToml::default(), None, None, &cli),
            Err(ConfigError::InvalidUrl { .. })
        ));
        let cli = CliOverrides {
            page_url: Some("ftp://dash/".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            DashboardConfig::layer(DashboardToml::default(), None, None, &cli),
            Err(ConfigError::UnsupportedScheme { .. })
        ));
    }

    #[test]
    fn test_resolve_reads_explicit_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[connection]\nurl = \"http://127.0.0.1:7000/\"\nmax_attempts = 3\n",
        )
        .unwrap();
        let cli = CliOverrides {
            config_path: Some(path.clone()),
            page_url: Some("http://127.0.0.1:7000/".to_string()),
            ..Default::default()
        };
        let config = DashboardConfig::resolve(&cli).unwrap();
        assert_eq!(config.reconnect.max_attempts, 3);
        assert_eq!(config.source, Some(path));
    }

    #[test]
    fn test_resolve_missing_explicit_file() {
        let dir = tempdir().unwrap();
        let cli = CliOverrides {
            config_path: Some(dir.path().join("nope.toml")),
            ..Default::default()
        };
        assert!(matches!(
            DashboardConfig::resolve(&cli),
            Err(ConfigError::ReadFailed { .. })
        ));
    }

    #[test]
    fn test_to_toml_roundtrips() {
        let config = layer(DashboardToml::default(), &CliOverrides::default());
        let rendered = config.to_toml().unwrap();
        let parsed = DashboardToml::parse(&rendered, Path::new("effective.toml")).unwrap();
        assert_eq!(
            layer(parsed, &CliOverrides::default()),
            config
        );
    }

    #[test]
    fn test_derive_config_carries_threshold() {
        let cli = CliOverrides {
            stuck_threshold_minutes: Some(60),
            ..Default::default()
        };
        let derive = layer(DashboardToml::default(), &cli).derive_config();
        assert_eq!(derive.stuck_threshold, Duration::from_secs(3600));
        assert_eq!(derive.agent_done_preview, 5);
    }
}
