//! Orchestrator for the single current pipeline run.
//!
//! The Orchestrator is the only entry point front-ends use. It owns the
//! shared [`RunState`], spawns one engine task per accepted submission and
//! translates [`Op`]s into state transitions and [`Event`]s.

use crate::agents::invoker::AgentInvoker;
use crate::engine::PipelineEngine;
use crate::state::run::{emit, halt_events, RunHandle, RunState, SharedRun};
use crate::state::token::RunToken;
use rf_protocol::{Event, Op, PipelineRun, ResearchMode, RunStatus};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{info, warn};
use uuid::Uuid;

/// Why a submission was not accepted.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SubmitError {
    #[error("a run is already in progress")]
    RunInProgress,
    #[error("query must not be empty")]
    EmptyQuery,
}

/// Coordinates the current run.
pub struct Orchestrator {
    shared: SharedRun,
    engine: Arc<PipelineEngine>,
    events_tx: mpsc::Sender<Event>,
    task: Mutex<Option<JoinHandle<RunStatus>>>,
}

impl Orchestrator {
    /// Create a new Orchestrator.
    ///
    /// # Arguments
    ///
    /// * `engine` - The engine each run executes on
    /// * `mode` - Initially selected research mode
    /// * `events_tx` - Channel for sending events to the front-end
    pub fn new(engine: PipelineEngine, mode: ResearchMode, events_tx: mpsc::Sender<Event>) -> Self {
        Self {
            shared: Arc::new(Mutex::new(RunState::new(mode))),
            engine: Arc::new(engine),
            events_tx,
            task: Mutex::new(None),
        }
    }

    fn invoker(&self) -> &Arc<AgentInvoker> {
        self.engine.invoker()
    }

    /// Start a new run in the background.
    ///
    /// The previous run's token is aborted and its outputs are discarded
    /// before the new run becomes visible.
    ///
    /// # Errors
    ///
    /// * `SubmitError::EmptyQuery` for a blank query
    /// * `SubmitError::RunInProgress` while a run is Running
    pub async fn submit(&self, query: &str) -> Result<Uuid, SubmitError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(SubmitError::EmptyQuery);
        }

        let token = RunToken::new();
        let run_id = token.run_id();
        let mode = {
            let mut state = self.shared.lock().await;
            if state.status() == RunStatus::Running {
                return Err(SubmitError::RunInProgress);
            }
            state.begin(token.clone(), query.to_string());
            let mode = state.selected_mode();
            emit(
                &self.events_tx,
                [
                    Event::RunStarted {
                        run_id,
                        query: query.to_string(),
                        research_mode: mode,
                    },
                    Event::RunStatusUpdate {
                        run_id,
                        status: RunStatus::Running,
                    },
                ],
            )
            .await;
            mode
        };
        info!(%run_id, %mode, "query submitted");

        let engine = Arc::clone(&self.engine);
        let handle = RunHandle::new(run_id, Arc::clone(&self.shared), self.events_tx.clone());
        let query = query.to_string();
        let task = tokio::spawn(async move { engine.run(&query, mode, &token, &handle).await });

        // The previous task has already been aborted through its token.
        *self.task.lock().await = Some(task);
        Ok(run_id)
    }

    /// Cooperatively stop the current run. Outputs so far are kept.
    ///
    /// Returns `true` if a Running run was stopped.
    pub async fn stop(&self) -> bool {
        let mut state = self.shared.lock().await;
        let Some(run_id) = state.stop() else {
            return false;
        };
        emit(
            &self.events_tx,
            halt_events(run_id, RunStatus::Stopped, None),
        )
        .await;
        info!(%run_id, "run stopped by request");
        true
    }

    /// Abort any run and return to Idle. The selected research mode survives.
    pub async fn reset(&self) {
        let mut state = self.shared.lock().await;
        state.reset();
        emit(&self.events_tx, [Event::RunReset]).await;
        info!("run state reset");
    }

    /// Change the research mode for subsequent runs.
    pub async fn set_research_mode(&self, mode: ResearchMode) {
        let mut state = self.shared.lock().await;
        state.set_selected_mode(mode);
        emit(&self.events_tx, [Event::ResearchModeChanged { mode }]).await;
    }

    pub async fn research_mode(&self) -> ResearchMode {
        self.shared.lock().await.selected_mode()
    }

    pub async fn snapshot(&self) -> PipelineRun {
        self.shared.lock().await.snapshot()
    }

    /// Wait for the most recent engine task, including its highlight grace.
    pub async fn join(&self) -> Option<RunStatus> {
        let task = self.task.lock().await.take()?;
        match task.await {
            Ok(status) => Some(status),
            Err(e) => {
                warn!(error = %e, "pipeline task panicked");
                None
            }
        }
    }

    /// Rewrite `prompt` and report the outcome as an event.
    pub async fn optimize_prompt(&self, prompt: &str) {
        let event = match self.invoker().optimize_prompt(prompt).await {
            Ok(optimized) => Event::PromptOptimized {
                original: prompt.to_string(),
                optimized,
            },
            Err(e) => {
                warn!(error = %e, "prompt optimization failed");
                Event::PromptOptimizationFailed {
                    error: e.to_string(),
                }
            }
        };
        emit(&self.events_tx, [event]).await;
    }

    /// Apply one operation.
    ///
    /// Returns `false` once the loop should exit.
    pub async fn handle_op(self: &Arc<Self>, op: Op) -> bool {
        match op {
            Op::SubmitQuery { query } => {
                if let Err(e) = self.submit(&query).await {
                    emit(
                        &self.events_tx,
                        [Event::SubmissionRejected {
                            reason: e.to_string(),
                        }],
                    )
                    .await;
                }
            }
            Op::StopRun => {
                self.stop().await;
            }
            Op::ResetRun => self.reset().await,
            Op::SetResearchMode { mode } => self.set_research_mode(mode).await,
            Op::OptimizePrompt { prompt } => {
                let this = Arc::clone(self);
                tokio::spawn(async move { this.optimize_prompt(&prompt).await });
            }
            Op::GetRunSnapshot => {
                let run = self.snapshot().await;
                emit(&self.events_tx, [Event::Snapshot { run }]).await;
            }
            Op::Shutdown => {
                self.stop().await;
                return false;
            }
        }
        true
    }

    /// Process operations until `Shutdown` or the sender is dropped.
    pub async fn serve(self: Arc<Self>, mut ops_rx: mpsc::UnboundedReceiver<Op>) {
        while let Some(op) = ops_rx.recv().await {
            if !self.handle_op(op).await {
                break;
            }
        }
        self.shared.lock().await.reset();
        info!("orchestrator loop exited");
    }
}
