//! Front-end/core communication protocol.
//!
//! This module defines the message types exchanged between a front-end
//! (the TUI or the headless CLI runner) and the core orchestrator.
//!
//! The protocol follows an Operation/Event pattern:
//! - `Op`: Commands sent from the front-end to the core
//! - `Event`: State changes sent from the core to the front-end
//!
//! Front-ends are pure observers: everything they display is derived from
//! the event stream or from a `PipelineRun` snapshot.

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::agent_models::{AgentId, ResearchMode};
use crate::run_models::{PipelineRun, RouterDecision, RunStatus};

/// Operations sent from a front-end to the core.
///
/// Uses tagged enum serialization for TypeScript compatibility:
/// ```json
/// {
///   "type": "submitQuery",
///   "payload": { "query": "Compare X and Y" }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(tag = "type", content = "payload", rename_all = "camelCase")]
pub enum Op {
    /// Start a new run. Rejected while another run is Running.
    SubmitQuery { query: String },

    /// Cooperatively cancel the current run.
    StopRun,

    /// Abort any run and discard all state.
    ResetRun,

    /// Research mode for subsequent runs.
    SetResearchMode { mode: ResearchMode },

    /// Rewrite a prompt for better retrieval.
    OptimizePrompt { prompt: String },

    /// Ask the core for a `Snapshot` event.
    GetRunSnapshot,

    /// Shut down the core loop. The current run is aborted.
    Shutdown,
}

/// Events sent from the core to a front-end.
///
/// Uses tagged enum serialization for TypeScript compatibility:
/// ```json
/// {
///   "type": "stageCompleted",
///   "payload": {
///     "run_id": "uuid-here",
///     "agent": "worker-research",
///     "output": "..."
///   }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(tag = "type", content = "payload", rename_all = "camelCase")]
pub enum Event {
    /// A new run has started. Outputs of any previous run are gone.
    RunStarted {
        #[ts(type = "string")]
        run_id: Uuid,
        query: String,
        research_mode: ResearchMode,
    },

    RunStatusUpdate {
        #[ts(type = "string")]
        run_id: Uuid,
        status: RunStatus,
    },

    /// The router resolved and the path is chosen.
    RouterDecided {
        #[ts(type = "string")]
        run_id: Uuid,
        decision: RouterDecision,
    },

    StageStarted {
        #[ts(type = "string")]
        run_id: Uuid,
        agent: AgentId,
    },

    StageCompleted {
        #[ts(type = "string")]
        run_id: Uuid,
        agent: AgentId,
        output: String,
    },

    /// The stage failed; `marker` is the error marker recorded as its output.
    StageFailed {
        #[ts(type = "string")]
        run_id: Uuid,
        agent: AgentId,
        marker: String,
    },

    HighlightChanged {
        #[ts(type = "string")]
        run_id: Uuid,
        agent: Option<AgentId>,
    },

    RunCompleted {
        #[ts(type = "string")]
        run_id: Uuid,
    },

    /// Cancelled by the user or superseded. Never reported as an error.
    RunStopped {
        #[ts(type = "string")]
        run_id: Uuid,
    },

    RunFailed {
        #[ts(type = "string")]
        run_id: Uuid,
        error: String,
    },

    /// All run state was discarded.
    RunReset,

    /// A submission was refused (a run is in progress, or the query is empty).
    SubmissionRejected { reason: String },

    ResearchModeChanged { mode: ResearchMode },

    PromptOptimized { original: String, optimized: String },

    PromptOptimizationFailed { error: String },

    /// Reply to `Op::GetRunSnapshot`.
    Snapshot { run: PipelineRun },
}

impl Event {
    /// The run this event belongs to, if any.
    pub fn run_id(&self) -> Option<Uuid> {
        match self {
            Event::RunStarted { run_id, .. }
            | Event::RunStatusUpdate { run_id, .. }
            | Event::RouterDecided { run_id, .. }
            | Event::StageStarted { run_id, .. }
            | Event::StageCompleted { run_id, .. }
            | Event::StageFailed { run_id, .. }
            | Event::HighlightChanged { run_id, .. }
            | Event::RunCompleted { run_id }
            | Event::RunStopped { run_id }
            | Event::RunFailed { run_id, .. } => Some(*run_id),
            Event::Snapshot { run } => run.run_id,
            Event::RunReset
            | Event::SubmissionRejected { .. }
            | Event::ResearchModeChanged { .. }
            | Event::PromptOptimized { .. }
            | Event::PromptOptimizationFailed { .. } => None,
        }
    }

    /// Whether this event ends a run.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Event::RunCompleted { .. } | Event::RunStopped { .. } | Event::RunFailed { .. }
        )
    }
}
