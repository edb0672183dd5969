//! Test fixtures for wiring orchestrators and sample projects.

use super::mock_collaborators::{RecordingResearch, ScriptedModel};
use rf_core::agents::base::{DocumentRetriever, LanguageModel, ResearchProvider};
use rf_core::agents::{AgentInvoker, PromptBook};
use rf_core::engine::PipelineEngine;
use rf_core::index::{Chunk, LocalIndex};
use rf_core::state::manager::Orchestrator;
use rf_protocol::{Event, ResearchMode};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::mpsc;

/// Grace interval used instead of the 3 s default.
pub const SHORT_GRACE: Duration = Duration::from_millis(20);

/// Documents served to `direct-generation`.
pub fn sample_index() -> LocalIndex {
    LocalIndex::from_chunks(vec![
        Chunk {
            source: "math.md".to_string(),
            text: "2+2 equals 4 in ordinary arithmetic.".to_string(),
        },
        Chunk {
            source: "rust.md".to_string(),
            text: "Rust guarantees memory safety without a garbage collector.".to_string(),
        },
    ])
}

pub struct Harness {
    pub orchestrator: Arc<Orchestrator>,
    pub events_rx: mpsc::Receiver<Event>,
}

/// Orchestrator over `model`, recording research and the sample index.
#[allow(dead_code)]
pub fn harness(model: Arc<ScriptedModel>) -> Harness {
    harness_with(model, Arc::new(RecordingResearch::default()))
}

pub fn harness_with(
    model: Arc<dyn LanguageModel>,
    research: Arc<dyn ResearchProvider>,
) -> Harness {
    let retriever: Arc<dyn DocumentRetriever> = Arc::new(sample_index());
    let invoker = AgentInvoker::new(model, research, retriever, PromptBook::embedded());
    let engine = PipelineEngine::new(Arc::new(invoker)).with_completion_grace(SHORT_GRACE);

    let (events_tx, events_rx) = mpsc::channel(256);
    let orchestrator = Arc::new(Orchestrator::new(engine, ResearchMode::Local, events_tx));
    Harness {
        orchestrator,
        events_rx,
    }
}

/// A project with `.ragflow/config.toml`, one prompt override and an
/// ingestible document.
///
/// Returns a TempDir that must be kept alive for the test duration.
#[allow(dead_code)]
pub fn create_test_project() -> std::io::Result<TempDir> {
    let temp_dir = tempfile::tempdir()?;
    let root = temp_dir.path();

    std::fs::create_dir_all(root.join(".ragflow/prompts"))?;
    std::fs::write(
        root.join(".ragflow/config.toml"),
        "completion_grace_ms = 20\n\n[index]\ntop_k = 1\nchunk_size = 120\nchunk_overlap = 20\n",
    )?;
    std::fs::write(
        root.join(".ragflow/prompts/evaluator-agent.md"),
        "---\nagent: evaluator-agent\ndescription: Always approves\n---\n\nReply with Decision: PASS.",
    )?;

    std::fs::create_dir_all(root.join("docs"))?;
    std::fs::write(
        root.join("docs/tokio.md"),
        "Tokio is an asynchronous runtime for Rust.\n\nIt provides a scheduler, timers and async IO.\n\nRatatui is unrelated: it draws terminal interfaces.",
    )?;

    Ok(temp_dir)
}
