//! Pipeline run state models.
//!
//! This module defines the observable state of a single pipeline run. The
//! core owns the live state; everything in here is a value that can be
//! handed to observers as a read-only snapshot.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use ts_rs::TS;
use uuid::Uuid;

use crate::agent_models::{AgentId, ResearchMode};

/// Lifecycle status of a pipeline run.
///
/// Idle -> Running -> {Completed | Stopped | Failed}. Only an explicit
/// reset goes back to Idle; a new submission from any terminal status
/// starts a fresh Running phase.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default, TS)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunStatus {
    /// No run has been submitted since start-up or the last reset.
    #[default]
    Idle,

    /// Stages are executing.
    Running,

    /// Cancelled by the user or superseded. Outputs produced so far are kept.
    Stopped,

    /// The selected path finished.
    Completed,

    /// A stage failed with an upstream error.
    Failed,
}

impl RunStatus {
    /// Completed, Stopped and Failed end a run.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            RunStatus::Completed | RunStatus::Stopped | RunStatus::Failed
        )
    }
}

/// Classification of a query, parsed from the router's raw text.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, TS)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RouterDecision {
    Simple,
    Complex,
    /// Neither keyword was found. Executes the complex path.
    Unknown,
}

impl RouterDecision {
    /// Case-insensitive substring match. Any mention of "complex" takes the
    /// complex path, so `Simple` requires "simple" without "complex".
    ///
    /// ```
    /// use rf_protocol::RouterDecision;
    ///
    /// assert_eq!(RouterDecision::parse("SIMPLE query"), RouterDecision::Simple);
    /// assert_eq!(RouterDecision::parse("It is complex."), RouterDecision::Complex);
    /// assert_eq!(RouterDecision::parse("not simple, complex"), RouterDecision::Complex);
    /// assert_eq!(RouterDecision::parse("no idea"), RouterDecision::Unknown);
    /// ```
    pub fn parse(router_output: &str) -> Self {
        let lower = router_output.to_lowercase();
        if lower.contains("complex") {
            RouterDecision::Complex
        } else if lower.contains("simple") {
            RouterDecision::Simple
        } else {
            RouterDecision::Unknown
        }
    }

    /// Whether the complex stage set runs for this decision.
    pub fn takes_complex_path(self) -> bool {
        !matches!(self, RouterDecision::Simple)
    }
}

/// Read-only snapshot of one pipeline run.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, TS)]
pub struct PipelineRun {
    /// Unique per run. `None` while Idle.
    #[ts(type = "string | null")]
    pub run_id: Option<Uuid>,

    /// The submitted query.
    pub query: String,

    pub status: RunStatus,

    /// Output or error marker per stage that has resolved in this run.
    pub stage_outputs: BTreeMap<AgentId, String>,

    /// Stages with an outstanding invocation.
    pub active_agents: BTreeSet<AgentId>,

    /// Stage emphasized as "currently working".
    pub highlighted: Option<AgentId>,

    /// Set once the router resolves.
    pub decision: Option<RouterDecision>,

    /// Research mode captured when the run started.
    pub research_mode: ResearchMode,

    pub started_at: Option<DateTime<Utc>>,

    pub finished_at: Option<DateTime<Utc>>,
}

impl PipelineRun {
    /// The empty Idle state.
    pub fn idle(research_mode: ResearchMode) -> Self {
        Self {
            run_id: None,
            query: String::new(),
            status: RunStatus::Idle,
            stage_outputs: BTreeMap::new(),
            active_agents: BTreeSet::new(),
            highlighted: None,
            decision: None,
            research_mode,
            started_at: None,
            finished_at: None,
        }
    }

    /// Output recorded for a stage, if it has resolved.
    pub fn output(&self, agent: AgentId) -> Option<&str> {
        self.stage_outputs.get(&agent).map(String::as_str)
    }
}

impl Default for PipelineRun {
    fn default() -> Self {
        Self::idle(ResearchMode::default())
    }
}
