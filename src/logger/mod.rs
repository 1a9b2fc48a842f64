//! Logging setup with daily rotation and retention cleanup
//!
//! Long-running commands (`mcp`, `serve`) log to stderr and to
//! `<cache dir>/docsearch/logs/docsearch.log`; short CLI commands log to
//! stderr only. stdout is never used for logs since MCP owns it.

use anyhow::Result;
use chrono::{Duration, Utc};
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::constants::{
    DEFAULT_LOG_MAX_FILES, DEFAULT_LOG_RETENTION_DAYS, ENV_LOG_CLEANUP_INTERVAL_HOURS,
    ENV_LOG_MAX_FILES, ENV_LOG_RETENTION_DAYS, LOG_DIR_NAME, LOG_FILE_NAME,
};

/// Log level configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// Parse from string (case-insensitive)
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "error" => Some(LogLevel::Error),
            "warn" | "warning" => Some(LogLevel::Warn),
            "info" => Some(LogLevel::Info),
            "debug" => Some(LogLevel::Debug),
            "trace" => Some(LogLevel::Trace),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }

    /// Filter directive: our crate at this level, noisy HTTP internals at warn
    fn filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "docsearch={},tower_http={},hyper=warn,reqwest=warn,rmcp=warn",
                self.as_str(),
                self.as_str()
            ))
        })
    }
}

/// Log retention configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRetentionConfig {
    /// Maximum number of rotated log files to keep
    pub max_files: usize,
    /// Remove rotated logs older than this
    pub retention_days: u64,
}

impl Default for LogRetentionConfig {
    fn default() -> Self {
        Self {
            max_files: DEFAULT_LOG_MAX_FILES,
            retention_days: DEFAULT_LOG_RETENTION_DAYS,
        }
    }
}

impl LogRetentionConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self {
            max_files: std::env::var(ENV_LOG_MAX_FILES)
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_LOG_MAX_FILES),
            retention_days: std::env::var(ENV_LOG_RETENTION_DAYS)
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_LOG_RETENTION_DAYS),
        }
    }
}

/// `<base>/logs`
pub fn get_log_dir(base_dir: &Path) -> PathBuf {
    base_dir.join(LOG_DIR_NAME)
}

/// `<base>/logs/docsearch.log`
pub fn get_log_file(base_dir: &Path) -> PathBuf {
    get_log_dir(base_dir).join(LOG_FILE_NAME)
}

pub fn ensure_log_dir(base_dir: &Path) -> Result<()> {
    let log_dir = get_log_dir(base_dir);
    if !log_dir.exists() {
        std::fs::create_dir_all(&log_dir)?;
    }
    Ok(())
}

/// Console (stderr) logging only, for short-lived commands
pub fn init_console_logger(log_level: LogLevel) -> Result<()> {
    tracing_subscriber::registry()
        .with(log_level.filter())
        .with(fmt::layer().with_writer(std::io::stderr))
        .try_init()?;
    Ok(())
}

/// Console and rolling-file logging under `base_dir`
///
/// With `quiet`, console output is suppressed and only the file is written.
/// Returns the log file path and the retention config in effect.
pub fn init_logger(
    base_dir: &Path,
    log_level: LogLevel,
    quiet: bool,
) -> Result<(PathBuf, LogRetentionConfig)> {
    let retention = LogRetentionConfig::from_env();

    ensure_log_dir(base_dir)?;
    let log_dir = get_log_dir(base_dir);

    // tracing-appender only rotates by time; file count is handled by cleanup
    let file_appender = RollingFileAppender::new(Rotation::DAILY, log_dir.clone(), LOG_FILE_NAME);

    if quiet {
        tracing_subscriber::registry()
            .with(log_level.filter())
            .with(fmt::layer().with_ansi(false).with_writer(file_appender))
            .try_init()?;
    } else {
        tracing_subscriber::registry()
            .with(log_level.filter())
            .with(fmt::layer().with_writer(std::io::stderr))
            .with(fmt::layer().with_ansi(false).with_writer(file_appender))
            .try_init()?;
    }

    tracing::info!(
        "Logger initialized: level={}, dir={:?}, retention={:?}",
        log_level.as_str(),
        log_dir,
        retention
    );

    Ok((get_log_file(base_dir), retention))
}

/// Remove rotated log files past the retention period, then trim the rest
/// down to `max_files` (newest kept). Returns how many files were removed.
pub fn cleanup_old_logs(base_dir: &Path, retention: &LogRetentionConfig) -> Result<usize> {
    let log_dir = get_log_dir(base_dir);
    if !log_dir.exists() {
        return Ok(0);
    }

    let cutoff = Utc::now() - Duration::days(retention.retention_days as i64);
    let mut kept: Vec<(chrono::DateTime<Utc>, PathBuf)> = Vec::new();
    let mut removed = 0;

    for entry in std::fs::read_dir(&log_dir)? {
        let entry = entry?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        // Rotated files are `docsearch.log.YYYY-MM-DD`; anything else is not ours
        if name == LOG_FILE_NAME || !name.starts_with(LOG_FILE_NAME) {
            continue;
        }
        let Ok(modified) = entry.metadata().and_then(|m| m.modified()) else {
            continue;
        };
        let modified: chrono::DateTime<Utc> = modified.into();

        if modified < cutoff {
            if remove_log(&path) {
                removed += 1;
            }
        } else {
            kept.push((modified, path));
        }
    }

    if kept.len() > retention.max_files {
        kept.sort_by(|a, b| b.0.cmp(&a.0));
        for (_, path) in kept.drain(retention.max_files..) {
            if remove_log(&path) {
                removed += 1;
            }
        }
    }

    if removed > 0 {
        tracing::info!("Cleaned up {} old log files from {:?}", removed, log_dir);
    }
    Ok(removed)
}

fn remove_log(path: &Path) -> bool {
    match std::fs::remove_file(path) {
        Ok(()) => {
            tracing::debug!("Removed old log file: {:?}", path);
            true
        }
        Err(e) => {
            tracing::warn!("Failed to remove old log file {:?}: {}", path, e);
            false
        }
    }
}

/// Periodic log cleanup until `shutdown_token` fires (default every 24h)
pub fn start_cleanup_task(
    base_dir: PathBuf,
    retention: LogRetentionConfig,
    shutdown_token: CancellationToken,
) -> tokio::task::JoinHandle<()> {
    let cleanup_interval_hours: u64 = std::env::var(ENV_LOG_CLEANUP_INTERVAL_HOURS)
        .ok()
        .and_then(|s| s.parse().ok())
        .filter(|h| *h > 0)
        .unwrap_or(24);

    tokio::spawn(async move {
        let mut interval =
            tokio::time::interval(std::time::Duration::from_secs(cleanup_interval_hours * 3600));

        tracing::debug!(
            "Log cleanup task started: interval={}h, retention={}days, max_files={}",
            cleanup_interval_hours,
            retention.retention_days,
            retention.max_files
        );

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    if let Err(e) = cleanup_old_logs(&base_dir, &retention) {
                        tracing::error!("Log cleanup failed: {}", e);
                    }
                }
                _ = shutdown_token.cancelled() => {
                    tracing::debug!("Log cleanup task shutting down");
                    break;
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_log_level_parse() {
        assert_eq!(LogLevel::parse("error"), Some(LogLevel::Error));
        assert_eq!(LogLevel::parse("ERROR"), Some(LogLevel::Error));
        assert_eq!(LogLevel::parse("warning"), Some(LogLevel::Warn));
        assert_eq!(LogLevel::parse("Debug"), Some(LogLevel::Debug));
        assert_eq!(LogLevel::parse("loud"), None);
        assert_eq!(LogLevel::default(), LogLevel::Info);
    }

    #[test]
    fn test_log_paths() {
        let base = PathBuf::from("/home/u/.cache/docsearch");
        assert_eq!(get_log_dir(&base), PathBuf::from("/home/u/.cache/docsearch/logs"));
        assert_eq!(
            get_log_file(&base),
            PathBuf::from("/home/u/.cache/docsearch/logs/docsearch.log")
        );
    }

    #[test]
    fn test_ensure_log_dir() {
        let temp_dir = TempDir::new().unwrap();
        let base = temp_dir.path().join("docsearch");
        assert!(!get_log_dir(&base).exists());
        ensure_log_dir(&base).unwrap();
        assert!(get_log_dir(&base).exists());
    }

    #[test]
    fn test_cleanup_trims_to_max_files() {
        let temp_dir = TempDir::new().unwrap();
        let base = temp_dir.path();
        ensure_log_dir(base).unwrap();
        let log_dir = get_log_dir(base);

        std::fs::write(log_dir.join(LOG_FILE_NAME), "current").unwrap();
        for day in 1..=5 {
            std::fs::write(log_dir.join(format!("{}.2026-01-0{}", LOG_FILE_NAME, day)), "x").unwrap();
        }
        std::fs::write(log_dir.join("unrelated.txt"), "keep").unwrap();

        let retention = LogRetentionConfig {
            max_files: 2,
            retention_days: 30,
        };
        assert_eq!(cleanup_old_logs(base, &retention).unwrap(), 3);

        let remaining = std::fs::read_dir(&log_dir).unwrap().count();
        // current log + 2 rotated + unrelated file
        assert_eq!(remaining, 4);
        assert!(log_dir.join(LOG_FILE_NAME).exists());
        assert!(log_dir.join("unrelated.txt").exists());
    }

    #[test]
    fn test_cleanup_missing_dir_is_noop() {
        let temp_dir = TempDir::new().unwrap();
        let retention = LogRetentionConfig::default();
        assert_eq!(cleanup_old_logs(&temp_dir.path().join("nope"), &retention).unwrap(), 0);
    }
}
