//! Standalone `rf-tui` binary: the TUI for the project in the current
//! directory.

use color_eyre::eyre::eyre;
use rf_core::config::loader::load_config;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let root = std::env::current_dir()?;
    let config = load_config(&root).await?;
    rf_tui::init_file_logging(&config).map_err(|e| eyre!(e))?;

    rf_tui::run_app(config, false).await.map_err(|e| eyre!(e))
}
