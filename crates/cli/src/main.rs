//! `ragflow` command line entry point.
//!
//! Without a subcommand the TUI is launched for the project in the current
//! directory. The subcommands run the same core headlessly.

use clap::{Parser, Subcommand};
use color_eyre::eyre::{bail, eyre, Result, WrapErr};
use colored::Colorize;
use rf_core::agents::{AgentFactory, ResearchProvider};
use rf_core::config::loader::load_config;
use rf_core::config::models::AppConfig;
use rf_core::index::{LocalIndex, RecursiveSplitter};
use rf_core::init::{generate_ragflow_structure, InitOptions};
use rf_core::state::manager::Orchestrator;
use rf_protocol::{AgentId, Event, PipelineRun, ResearchMode, RunStatus};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

/// Research output longer than this is truncated by `ragflow research`.
const RESEARCH_PREVIEW_CHARS: usize = 500;

#[derive(Parser)]
#[command(name = "ragflow", version, about = "Multi-agent RAG pipeline orchestrator")]
struct Cli {
    /// Project root containing `.ragflow/`
    #[arg(long, global = true, default_value = ".")]
    root: PathBuf,

    /// Use the offline model even when an API key is set
    #[arg(long, global = true)]
    offline: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one query headlessly and print stage events
    Run {
        query: String,
        /// Research mode for this run
        #[arg(long)]
        mode: Option<ResearchMode>,
        /// Print events as JSON lines
        #[arg(long)]
        json: bool,
    },
    /// Create `.ragflow/` with the default config and prompts
    Init {
        /// Overwrite existing files
        #[arg(long)]
        force: bool,
        /// Only write config.toml
        #[arg(long)]
        minimal: bool,
    },
    /// Add a text document to the local index
    Ingest { file: PathBuf },
    /// Rewrite a prompt for better retrieval
    Optimize { prompt: String },
    /// Smoke-test a research provider
    Research {
        query: String,
        #[arg(long)]
        mode: Option<ResearchMode>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();

    if let Some(Commands::Init { force, minimal }) = &cli.command {
        return init(cli.root.clone(), *force, *minimal).await;
    }

    let config = load_config(&cli.root)
        .await
        .wrap_err_with(|| format!("loading configuration from {}", cli.root.display()))?;

    let Some(command) = cli.command else {
        let log_path = rf_tui::init_file_logging(&config).map_err(|e| eyre!(e))?;
        let result = rf_tui::run_app(config, cli.offline).await;
        return result.map_err(|e| eyre!("{e:#} (see {})", log_path.display()));
    };

    init_stderr_logging();
    match command {
        Commands::Run { query, mode, json } => run(config, &query, mode, cli.offline, json).await,
        Commands::Ingest { file } => ingest(&config, &file),
        Commands::Optimize { prompt } => optimize(&config, &prompt, cli.offline).await,
        Commands::Research { query, mode } => research(&config, &query, mode, cli.offline).await,
        Commands::Init { .. } => Ok(()),
    }
}

fn init_stderr_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .try_init();
}

async fn init(root: PathBuf, force: bool, minimal: bool) -> Result<()> {
    let written = generate_ragflow_structure(InitOptions {
        target_dir: root,
        force,
        minimal,
    })
    .await?;

    for path in &written {
        println!("{} {}", "created".green(), path.display());
    }
    Ok(())
}

async fn run(
    config: AppConfig,
    query: &str,
    mode: Option<ResearchMode>,
    offline: bool,
    json: bool,
) -> Result<()> {
    let engine = AgentFactory::build_engine(&config, offline).map_err(|e| eyre!(e))?;
    let mode = mode.unwrap_or_else(|| config.initial_research_mode());
    let (events_tx, mut events_rx) = mpsc::channel(256);
    let orchestrator = Arc::new(Orchestrator::new(engine, mode, events_tx));

    let started = Instant::now();
    orchestrator.submit(query).await?;

    while let Some(event) = events_rx.recv().await {
        if json {
            println!("{}", serde_json::to_string(&event)?);
        } else {
            print_event(&event);
        }
        if event.is_terminal() {
            break;
        }
    }

    let run = orchestrator.snapshot().await;
    if !json {
        print_summary(&run, started.elapsed().as_secs_f64());
    }
    if run.status == RunStatus::Failed {
        bail!("run failed");
    }
    Ok(())
}

fn print_event(event: &Event) {
    match event {
        Event::RunStarted {
            query,
            research_mode,
            ..
        } => println!("{} {query} {}", "query".bold(), format!("[{research_mode}]").dimmed()),
        Event::RouterDecided { decision, .. } => {
            println!("{} {}", "path".bold(), format!("{decision:?}").to_lowercase().cyan())
        }
        Event::StageStarted { agent, .. } => println!("  {} {}", "▶".yellow(), agent.label()),
        Event::StageCompleted { agent, output, .. } => {
            println!("  {} {} {}", "✓".green(), agent.label(), preview(output).dimmed())
        }
        Event::StageFailed { marker, .. } => println!("  {} {}", "✗".red(), marker.red()),
        Event::RunStopped { .. } => println!("{}", "stopped".magenta()),
        Event::RunFailed { error, .. } => println!("{} {error}", "failed".red().bold()),
        _ => {}
    }
}

fn print_summary(run: &PipelineRun, seconds: f64) {
    if let Some(answer) = run.output(AgentId::ResponseDelivery) {
        println!("\n{}\n{answer}", "Response".bold().underline());
    }
    println!(
        "\n{} {:?} in {seconds:.1}s",
        "status".bold(),
        run.status
    );
}

/// First line of `text`, cut at 80 chars.
fn preview(text: &str) -> String {
    let line = text.lines().find(|l| !l.trim().is_empty()).unwrap_or_default().trim();
    if line.chars().count() > 80 {
        format!("{}...", line.chars().take(80).collect::<String>())
    } else {
        line.to_string()
    }
}

fn ingest(config: &AppConfig, file: &Path) -> Result<()> {
    let settings = &config.global.index;
    let splitter = RecursiveSplitter::new(settings.chunk_size, settings.chunk_overlap);
    let mut index = LocalIndex::load_or_empty(&config.index_path())?;
    let added = index.ingest(file, &splitter)?;

    println!(
        "{} {added} chunks from {} ({} total)",
        "indexed".green(),
        file.display(),
        index.len()
    );
    Ok(())
}

async fn optimize(config: &AppConfig, prompt: &str, offline: bool) -> Result<()> {
    let invoker = AgentFactory::build(config, offline).map_err(|e| eyre!(e))?;
    let optimized = invoker.optimize_prompt(prompt).await?;
    println!("{optimized}");
    Ok(())
}

async fn research(
    config: &AppConfig,
    query: &str,
    mode: Option<ResearchMode>,
    offline: bool,
) -> Result<()> {
    let mode = mode.unwrap_or_else(|| config.initial_research_mode());
    let index = LocalIndex::load_or_empty(&config.index_path())?;
    let researcher = AgentFactory::researcher(config, Arc::new(index), offline);

    let started = Instant::now();
    let output = researcher.research(query, mode).await?;
    println!(
        "{} {mode} research took {:.2}s",
        "done".green(),
        started.elapsed().as_secs_f64()
    );
    println!("{}", truncate(&output, RESEARCH_PREVIEW_CHARS));
    Ok(())
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let head: String = text.chars().take(max_chars).collect();
    format!("{head}...[truncated]")
}
