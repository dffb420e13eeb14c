use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

/// Environment variable holding a tracing filter directive
pub const LOG_ENV: &str = "TASKFOCUS_LOG";

pub const LOG_FILE_NAME: &str = "taskfocus.log";

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("Failed to create log directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to install log subscriber: {0}")]
    Install(String),
}

/// Build the filter: `TASKFOCUS_LOG` first, then the configured level
pub fn build_filter(env_directive: Option<&str>, config_level: &str) -> EnvFilter {
    env_directive
        .and_then(|directive| EnvFilter::try_new(directive).ok())
        .or_else(|| EnvFilter::try_new(config_level).ok())
        .unwrap_or_else(|| EnvFilter::new("info"))
}

/// Route tracing output to `taskfocus.log` in `dir`; the terminal belongs to
/// the UI. Keep the returned guard alive until exit so buffered lines are flushed.
pub fn init(dir: &Path, config_level: &str) -> Result<WorkerGuard, LoggingError> {
    fs::create_dir_all(dir).map_err(|source| LoggingError::CreateDir {
        path: dir.to_path_buf(),
        source,
    })?;

    let appender = tracing_appender::rolling::never(dir, LOG_FILE_NAME);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let env_directive = std::env::var(LOG_ENV).ok();
    let filter = build_filter(env_directive.as_deref(), config_level);

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(true)
                .with_line_number(true),
        )
        .try_init()
        .map_err(|e| LoggingError::Install(e.to_string()))?;

    Ok(guard)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_directive_wins_over_config() {
        let filter = build_filter(Some("debug"), "warn");
        assert_eq!(filter.to_string(), "debug");
    }

    #[test]
    fn invalid_directives_fall_back() {
        let filter = build_filter(Some("taskfocus=notalevel"), "warn");
        assert_eq!(filter.to_string(), "warn");
        let filter = build_filter(None, "taskfocus=notalevel");
        assert_eq!(filter.to_string(), "info");
    }
}
