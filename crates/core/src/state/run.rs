//! Run state and its guarded mutation handle.
//!
//! [`RunState`] is the single source of truth for the current run. It lives
//! behind one mutex ([`SharedRun`]); every mutation takes the lock, changes
//! the state and emits the matching events before releasing it, so the
//! event stream is ordered exactly like the state transitions.
//!
//! The engine never touches `RunState` directly. It holds a [`RunHandle`]
//! bound to one run id, and every handle method is a no-op once that run
//! is no longer the live one (stopped, superseded or reset).

use chrono::{DateTime, Utc};
use rf_protocol::{AgentId, Event, PipelineRun, ResearchMode, RouterDecision, RunStatus};
use std::collections::BTreeMap;
use std::fmt::Display;
use std::sync::Arc;
use tokio::sync::mpsc::Sender;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::state::token::RunToken;
use crate::state::tracker::ActivityTracker;

/// The run state shared between the orchestrator and its engine task.
pub type SharedRun = Arc<Mutex<RunState>>;

/// Error marker recorded as a failed stage's output.
pub fn error_marker(agent: AgentId, error: &impl Display) -> String {
    format!("[ERROR in {agent}]: {error}")
}

/// Whether a stage output is an error marker.
pub fn is_error_marker(output: &str) -> bool {
    output.starts_with("[ERROR in ")
}

/// Mutable state of the current run.
#[derive(Debug)]
pub struct RunState {
    run_id: Option<Uuid>,
    query: String,
    status: RunStatus,
    outputs: BTreeMap<AgentId, String>,
    tracker: ActivityTracker,
    decision: Option<RouterDecision>,
    run_mode: ResearchMode,
    selected_mode: ResearchMode,
    token: Option<RunToken>,
    started_at: Option<DateTime<Utc>>,
    finished_at: Option<DateTime<Utc>>,
}

impl RunState {
    pub fn new(selected_mode: ResearchMode) -> Self {
        Self {
            run_id: None,
            query: String::new(),
            status: RunStatus::Idle,
            outputs: BTreeMap::new(),
            tracker: ActivityTracker::default(),
            decision: None,
            run_mode: selected_mode,
            selected_mode,
            token: None,
            started_at: None,
            finished_at: None,
        }
    }

    /// Read-only copy for observers.
    pub fn snapshot(&self) -> PipelineRun {
        PipelineRun {
            run_id: self.run_id,
            query: self.query.clone(),
            status: self.status,
            stage_outputs: self.outputs.clone(),
            active_agents: self.tracker.active().clone(),
            highlighted: self.tracker.highlighted(),
            decision: self.decision,
            research_mode: self.run_mode,
            started_at: self.started_at,
            finished_at: self.finished_at,
        }
    }

    pub fn status(&self) -> RunStatus {
        self.status
    }

    pub fn run_id(&self) -> Option<Uuid> {
        self.run_id
    }

    /// Research mode the next submission will use.
    pub fn selected_mode(&self) -> ResearchMode {
        self.selected_mode
    }

    pub(crate) fn set_selected_mode(&mut self, mode: ResearchMode) {
        self.selected_mode = mode;
    }

    /// Abort the previous token and start a fresh Running phase.
    pub(crate) fn begin(&mut self, token: RunToken, query: String) {
        if let Some(previous) = self.token.take() {
            previous.abort();
        }
        self.run_id = Some(token.run_id());
        self.query = query;
        self.status = RunStatus::Running;
        self.outputs.clear();
        self.tracker = ActivityTracker::default();
        self.decision = None;
        self.run_mode = self.selected_mode;
        self.token = Some(token);
        self.started_at = Some(Utc::now());
        self.finished_at = None;
    }

    /// Abort any run and return to Idle, discarding outputs.
    pub(crate) fn reset(&mut self) {
        if let Some(token) = self.token.take() {
            token.abort();
        }
        *self = Self::new(self.selected_mode);
    }

    /// Request a cooperative stop of the running run.
    ///
    /// Returns the run id if a Running run was stopped.
    pub(crate) fn stop(&mut self) -> Option<Uuid> {
        if let Some(token) = &self.token {
            token.request_stop();
        }
        if self.status != RunStatus::Running {
            return None;
        }
        self.halt(RunStatus::Stopped);
        self.run_id
    }

    fn is_live(&self, run_id: Uuid) -> bool {
        self.run_id == Some(run_id) && self.status == RunStatus::Running
    }

    fn halt(&mut self, status: RunStatus) {
        self.status = status;
        self.finished_at = Some(Utc::now());
        self.tracker.clear_all();
        self.tracker.set_highlighted(None);
    }
}

impl Default for RunState {
    fn default() -> Self {
        Self::new(ResearchMode::default())
    }
}

/// Send every event in order. A closed channel means nobody is observing.
pub(crate) async fn emit(events_tx: &Sender<Event>, events: impl IntoIterator<Item = Event>) {
    for event in events {
        let _ = events_tx.send(event).await;
    }
}

/// Events announcing a halt to `status`.
pub(crate) fn halt_events(run_id: Uuid, status: RunStatus, error: Option<String>) -> Vec<Event> {
    let terminal = match (status, error) {
        (RunStatus::Failed, Some(error)) => Event::RunFailed { run_id, error },
        (RunStatus::Failed, None) => Event::RunFailed {
            run_id,
            error: "run failed".to_string(),
        },
        (RunStatus::Completed, _) => Event::RunCompleted { run_id },
        _ => Event::RunStopped { run_id },
    };
    vec![
        Event::HighlightChanged {
            run_id,
            agent: None,
        },
        Event::RunStatusUpdate { run_id, status },
        terminal,
    ]
}

/// Mutation handle bound to a single run.
#[derive(Debug, Clone)]
pub struct RunHandle {
    run_id: Uuid,
    shared: SharedRun,
    events_tx: Sender<Event>,
}

impl RunHandle {
    pub fn new(run_id: Uuid, shared: SharedRun, events_tx: Sender<Event>) -> Self {
        Self {
            run_id,
            shared,
            events_tx,
        }
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// Mark `agent` in flight and highlight it.
    ///
    /// Returns `false` if the run is no longer live; the stage must not run.
    pub async fn stage_started(&self, agent: AgentId) -> bool {
        let mut state = self.shared.lock().await;
        if !state.is_live(self.run_id) {
            return false;
        }
        state.tracker.mark_started(agent);
        state.tracker.set_highlighted(Some(agent));

        emit(
            &self.events_tx,
            [
                Event::StageStarted {
                    run_id: self.run_id,
                    agent,
                },
                Event::HighlightChanged {
                    run_id: self.run_id,
                    agent: Some(agent),
                },
            ],
        )
        .await;
        true
    }

    /// Record a stage output. Outputs are write-once within a run.
    ///
    /// The highlight is cleared unless `agent` is `response-delivery`.
    pub async fn stage_completed(&self, agent: AgentId, output: String) -> bool {
        let mut state = self.shared.lock().await;
        if !state.is_live(self.run_id) {
            return false;
        }
        state.outputs.entry(agent).or_insert_with(|| output.clone());
        state.tracker.mark_finished(agent);

        let mut events = vec![Event::StageCompleted {
            run_id: self.run_id,
            agent,
            output,
        }];
        if agent != AgentId::ResponseDelivery && state.tracker.highlighted() == Some(agent) {
            state.tracker.set_highlighted(None);
            events.push(Event::HighlightChanged {
                run_id: self.run_id,
                agent: None,
            });
        }

        emit(&self.events_tx, events).await;
        true
    }

    pub async fn record_decision(&self, decision: RouterDecision) -> bool {
        let mut state = self.shared.lock().await;
        if !state.is_live(self.run_id) {
            return false;
        }
        state.decision = Some(decision);
        emit(
            &self.events_tx,
            [Event::RouterDecided {
                run_id: self.run_id,
                decision,
            }],
        )
        .await;
        true
    }

    /// Record the error marker for `agent` and transition to Failed.
    pub async fn fail_stage(&self, agent: AgentId, error: &impl Display) -> bool {
        let mut state = self.shared.lock().await;
        if !state.is_live(self.run_id) {
            return false;
        }
        let marker = error_marker(agent, error);
        state.outputs.entry(agent).or_insert_with(|| marker.clone());
        state.tracker.mark_finished(agent);
        state.halt(RunStatus::Failed);

        let mut events = vec![Event::StageFailed {
            run_id: self.run_id,
            agent,
            marker: marker.clone(),
        }];
        events.extend(halt_events(self.run_id, RunStatus::Failed, Some(marker)));
        emit(&self.events_tx, events).await;
        true
    }

    /// Transition to Stopped, keeping every output recorded so far.
    pub async fn finish_stopped(&self) -> bool {
        let mut state = self.shared.lock().await;
        if !state.is_live(self.run_id) {
            return false;
        }
        state.halt(RunStatus::Stopped);
        emit(
            &self.events_tx,
            halt_events(self.run_id, RunStatus::Stopped, None),
        )
        .await;
        true
    }

    /// Transition to Completed. `response-delivery` stays highlighted until
    /// [`RunHandle::clear_highlight`].
    pub async fn finish_completed(&self) -> bool {
        let mut state = self.shared.lock().await;
        if !state.is_live(self.run_id) {
            return false;
        }
        state.status = RunStatus::Completed;
        state.finished_at = Some(Utc::now());
        state.tracker.clear_all();
        state.tracker.set_highlighted(Some(AgentId::ResponseDelivery));

        emit(
            &self.events_tx,
            [
                Event::HighlightChanged {
                    run_id: self.run_id,
                    agent: Some(AgentId::ResponseDelivery),
                },
                Event::RunStatusUpdate {
                    run_id: self.run_id,
                    status: RunStatus::Completed,
                },
                Event::RunCompleted {
                    run_id: self.run_id,
                },
            ],
        )
        .await;
        true
    }

    /// Drop the lingering highlight, unless another run has taken over.
    pub async fn clear_highlight(&self) -> bool {
        let mut state = self.shared.lock().await;
        if state.run_id != Some(self.run_id) || state.tracker.highlighted().is_none() {
            return false;
        }
        state.tracker.set_highlighted(None);
        emit(
            &self.events_tx,
            [Event::HighlightChanged {
                run_id: self.run_id,
                agent: None,
            }],
        )
        .await;
        true
    }
}
