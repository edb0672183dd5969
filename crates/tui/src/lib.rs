//! # rf-tui
//!
//! Terminal user interface for ragflow.
//!
//! The TUI never touches run state directly. It sends [`Op`]s to an
//! [`Orchestrator`] serving on a background task and redraws from the
//! [`Event`](rf_protocol::Event)s it receives back.

pub mod app;
pub mod event;
pub mod event_handler;
pub mod tui;
pub mod widgets;

pub use app::App;
pub use tui::Tui;

use anyhow::{Context, Result};
use rf_core::agents::AgentFactory;
use rf_core::config::models::AppConfig;
use rf_core::state::manager::Orchestrator;
use rf_protocol::Op;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

/// Route `tracing` output to `.ragflow/ragflow.log` so it never draws over
/// the terminal UI. Returns the log file path.
pub fn init_file_logging(config: &AppConfig) -> Result<PathBuf> {
    let dir = config.ragflow_dir();
    std::fs::create_dir_all(&dir).with_context(|| format!("creating {}", dir.display()))?;
    let path = dir.join("ragflow.log");
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("opening log file {}", path.display()))?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!(e))?;
    Ok(path)
}

/// Run the TUI until the user quits.
///
/// # Arguments
///
/// * `config` - Loaded project configuration
/// * `offline` - Force the offline model even when an API key is set
pub async fn run_app(config: AppConfig, offline: bool) -> Result<()> {
    let engine = AgentFactory::build_engine(&config, offline)?;
    let mode = config.initial_research_mode();

    let (events_tx, events_rx) = mpsc::channel(256);
    let (op_tx, op_rx) = mpsc::unbounded_channel();
    let orchestrator = Arc::new(Orchestrator::new(engine, mode, events_tx));
    let server = tokio::spawn(Arc::clone(&orchestrator).serve(op_rx));
    tracing::info!(%mode, offline, "tui started");

    let mut tui = Tui::init()?;
    let mut app = App::new(op_tx.clone(), events_rx, mode);
    let result = app.run(&mut tui).await;
    tui.restore()?;

    // Dropping the app closes the event channel so a pending send cannot
    // block the shutdown.
    drop(app);
    let _ = op_tx.send(Op::Shutdown);
    drop(op_tx);
    if let Err(e) = server.await {
        tracing::warn!(error = %e, "orchestrator task ended abnormally");
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_logging_creates_log_under_ragflow_dir() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig {
            root: dir.path().to_path_buf(),
            ..AppConfig::default()
        };

        let path = init_file_logging(&config).unwrap();
        assert_eq!(path, dir.path().join(".ragflow/ragflow.log"));
        assert!(path.exists());
    }
}
