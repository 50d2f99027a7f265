//! Structured logging setup with tracing

use std::path::Path;
use std::time::{Duration, SystemTime};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Flushes the file log when dropped
pub struct LogGuard {
    _file: WorkerGuard,
}

/// Initialize the logging system.
///
/// Console output goes to stderr so stdout stays free for the host protocol.
pub fn init_logging() -> anyhow::Result<LogGuard> {
    let log_dir = super::log_dir();
    std::fs::create_dir_all(&log_dir)?;

    let file_appender = RollingFileAppender::new(Rotation::DAILY, &log_dir, "imagesack.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"));

    #[cfg(debug_assertions)]
    let console = fmt::layer().pretty().with_writer(std::io::stderr);

    #[cfg(not(debug_assertions))]
    let console = fmt::layer().compact().with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console)
        .with(fmt::layer().json().with_writer(non_blocking))
        .try_init()?;

    tracing::info!("Logging initialized in {:?}", log_dir);
    Ok(LogGuard { _file: guard })
}

/// Clean up log files older than specified days
pub fn cleanup_old_logs(days: u32) -> anyhow::Result<usize> {
    cleanup_logs_in(&super::log_dir(), days)
}

/// Remove `*.log*` files in `log_dir` last modified more than `days` ago
pub fn cleanup_logs_in(log_dir: &Path, days: u32) -> anyhow::Result<usize> {
    if !log_dir.exists() {
        return Ok(0);
    }

    let threshold = SystemTime::now() - Duration::from_secs(days as u64 * 24 * 60 * 60);
    let mut deleted = 0;

    for entry in std::fs::read_dir(log_dir)? {
        let entry = entry?;
        let path = entry.path();

        // Rolled files are named imagesack.log.YYYY-MM-DD
        let is_log = path
            .file_name()
            .map_or(false, |n| n.to_string_lossy().contains(".log"));
        if !is_log {
            continue;
        }

        let modified = match entry.metadata().and_then(|m| m.modified()) {
            Ok(t) => t,
            Err(_) => continue,
        };

        if modified < threshold && std::fs::remove_file(&path).is_ok() {
            deleted += 1;
            tracing::debug!("Deleted old log: {:?}", path);
        }
    }

    tracing::info!("Cleaned up {} old log files", deleted);
    Ok(deleted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;

    fn write_aged(path: &Path, age_days: u64) {
        let file = File::create(path).unwrap();
        let mtime = SystemTime::now() - Duration::from_secs(age_days * 24 * 60 * 60);
        file.set_modified(mtime).unwrap();
    }

    #[test]
    fn test_cleanup_removes_only_old_logs() {
        let dir = tempfile::TempDir::new().unwrap();
        write_aged(&dir.path().join("imagesack.log.2024-01-01"), 30);
        write_aged(&dir.path().join("imagesack.log.2024-02-01"), 1);
        write_aged(&dir.path().join("notes.txt"), 30);

        let deleted = cleanup_logs_in(dir.path(), 7).unwrap();

        assert_eq!(deleted, 1);
        assert!(!dir.path().join("imagesack.log.2024-01-01").exists());
        assert!(dir.path().join("imagesack.log.2024-02-01").exists());
        assert!(dir.path().join("notes.txt").exists());
    }

    #[test]
    fn test_cleanup_missing_dir() {
        let dir = tempfile::TempDir::new().unwrap();
        assert_eq!(cleanup_logs_in(&dir.path().join("none"), 7).unwrap(), 0);
    }
}
