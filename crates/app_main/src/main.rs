//! ImageSack - keyboard-driven image filer
//!
//! Headless host: raw key events arrive on stdin, reports leave on stdout.

mod app;

use anyhow::Result;
use app_core::{AppConfig, DispatchEngine, LogObserver};
use std::path::PathBuf;

fn main() -> Result<()> {
    // Initialize logging and panic hook first
    let _log_guard = app_log::init()?;

    // Clean up old logs (7 days)
    if let Err(e) = app_log::cleanup_old_logs(7) {
        tracing::warn!("Failed to cleanup old logs: {}", e);
    }

    tracing::info!("ImageSack starting...");

    let config_path = std::env::var_os("IMAGESACK_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(AppConfig::config_path);
    // A missing file means defaults; anything unreadable stops here
    let config = AppConfig::load_from(&config_path).map_err(|e| {
        tracing::error!("Failed to load configuration from {:?}: {}", config_path, e);
        e.context(format!("Invalid configuration file {}", config_path.display()))
    })?;

    let engine = DispatchEngine::from_app_config(&config, Box::new(LogObserver)).map_err(|e| {
        tracing::error!("Session could not start: {}", e);
        anyhow::anyhow!(e.user_message())
    })?;

    app::run(engine)
}
