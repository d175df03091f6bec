use std::path::{Path, PathBuf};

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt};

/// Log file written under `--log-dir`.
pub const LOG_FILE_NAME: &str = "office-dash.log";

#[derive(Debug, Clone, Default)]
pub struct LogOptions {
    pub verbose: bool,
    /// Write to a file here instead of stderr, so the full-screen renderer
    /// is not interleaved with log lines.
    pub log_dir: Option<PathBuf>,
    pub json: bool,
}

impl LogOptions {
    fn default_level(&self) -> &'static str {
        if self.verbose {
            "office_dash=debug,warn"
        } else {
            "warn"
        }
    }
}

/// Install the global subscriber.
///
/// `RUST_LOG` wins over the built-in level. Safe to call more than once;
/// later calls are no-ops. Keep the returned guard alive for as long as
/// file logging should flush.
pub fn init_logging(options: &LogOptions) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(options.default_level()));

    match options.log_dir.as_deref() {
        Some(dir) => init_file_logging(dir, filter, options.json),
        None => {
            let builder = fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_level(true);
            if options.json {
                builder.json().try_init().ok();
            } else {
                builder.try_init().ok();
            }
            None
        }
    }
}

fn init_file_logging(dir: &Path, filter: EnvFilter, json: bool) -> Option<WorkerGuard> {
    if let Err(e) = std::fs::create_dir_all(dir) {
        eprintln!("Failed to create log directory {}: {}", dir.display(), e);
        return None;
    }
    let appender = tracing_appender::rolling::never(dir, LOG_FILE_NAME);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let builder = fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .with_target(true)
        .with_file(true)
        .with_line_number(true);
    if json {
        builder.json().try_init().ok();
    } else {
        builder.try_init().ok();
    }
    tracing::info!(dir = %dir.display(), "logging initialised");
    Some(guard)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_level_follows_verbose() {
        assert_eq!(LogOptions::default().default_level(), "warn");
        let verbose = LogOptions {
            verbose: true,
            ..Default::default()
        };
        assert_eq!(verbose.default_level(), "office_dash=debug,warn");
    }

    #[test]
    fn test_file_logging_creates_directory() {
        let dir = tempdir().unwrap();
        let log_dir = dir.path().join("logs");
        let guard = init_logging(&LogOptions {
            log_dir: Some(log_dir.clone()),
            ..Default::default()
        });
        assert!(guard.is_some());
        assert!(log_dir.is_dir());
    }

    #[test]
    fn test_init_twice_is_harmless() {
        init_logging(&LogOptions::default());
        init_logging(&LogOptions::default());
    }
}
