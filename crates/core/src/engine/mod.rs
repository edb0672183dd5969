//! Pipeline execution engine.
//!
//! The PipelineEngine drives one run: it asks the router for a decision,
//! picks the simple or complex plan and executes the plan's stages strictly
//! in order. Every state change goes through the run's [`RunHandle`], so a
//! run that has been stopped, reset or superseded can no longer mutate the
//! shared state.

use crate::agents::base::InvokeError;
use crate::agents::invoker::AgentInvoker;
use crate::agents::stage::stage;
use crate::state::run::RunHandle;
use crate::state::token::RunToken;
use rf_protocol::{AgentId, ResearchMode, RouterDecision, RunStatus};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Stages after the router when the query is simple.
pub const SIMPLE_PLAN: &[AgentId] = &[
    AgentId::DirectGeneration,
    AgentId::ResponseDelivery,
    AgentId::LangsmithLogging,
];

/// Stages after the router when the query is complex.
pub const COMPLEX_PLAN: &[AgentId] = &[
    AgentId::OrchestratorAgent,
    AgentId::DecomposeQuery,
    AgentId::WorkerRetrieval,
    AgentId::WorkerResearch,
    AgentId::WorkerAnalysis,
    AgentId::SharedState,
    AgentId::SynthesisAgent,
    AgentId::EvaluatorAgent,
    AgentId::ResponseDelivery,
    AgentId::LangsmithLogging,
];

/// Default time `response-delivery` stays highlighted after completion.
pub const DEFAULT_COMPLETION_GRACE: Duration = Duration::from_millis(3000);

/// Stage list for a router decision. An unrecognized decision takes the
/// complex path.
pub fn plan_for(decision: RouterDecision) -> &'static [AgentId] {
    if decision.takes_complex_path() {
        COMPLEX_PLAN
    } else {
        SIMPLE_PLAN
    }
}

/// The main pipeline execution engine.
pub struct PipelineEngine {
    invoker: Arc<AgentInvoker>,
    completion_grace: Duration,
}

impl PipelineEngine {
    /// Create a new PipelineEngine over the given invoker.
    pub fn new(invoker: Arc<AgentInvoker>) -> Self {
        Self {
            invoker,
            completion_grace: DEFAULT_COMPLETION_GRACE,
        }
    }

    pub fn with_completion_grace(mut self, grace: Duration) -> Self {
        self.completion_grace = grace;
        self
    }

    pub fn invoker(&self) -> &Arc<AgentInvoker> {
        &self.invoker
    }

    /// Execute one run to a terminal state.
    ///
    /// # Arguments
    ///
    /// * `query` - The submitted query
    /// * `mode` - Research mode captured at submission
    /// * `token` - The run's cancellation token
    /// * `handle` - Mutation handle bound to this run
    ///
    /// # Returns
    ///
    /// The status the run ended in. `Stopped` is also returned when the run
    /// was superseded or reset, since the engine halts the same way.
    pub async fn run(
        &self,
        query: &str,
        mode: ResearchMode,
        token: &RunToken,
        handle: &RunHandle,
    ) -> RunStatus {
        let run_id = handle.run_id();
        info!(%run_id, %mode, "pipeline run started");

        let mut outputs = BTreeMap::new();
        let status = match self
            .execute(query, mode, token, handle, &mut outputs)
            .await
        {
            Ok(()) => {
                if !handle.finish_completed().await {
                    return RunStatus::Stopped;
                }
                info!(%run_id, stages = outputs.len(), "pipeline run completed");
                self.hold_delivery_highlight(token, handle).await;
                RunStatus::Completed
            }
            Err(status) => status,
        };

        debug!(%run_id, ?status, "pipeline task finished");
        status
    }

    async fn execute(
        &self,
        query: &str,
        mode: ResearchMode,
        token: &RunToken,
        handle: &RunHandle,
        outputs: &mut BTreeMap<AgentId, String>,
    ) -> Result<(), RunStatus> {
        let route = self
            .run_stage(AgentId::RouterAgent, query, mode, token, handle, outputs)
            .await?;

        let decision = RouterDecision::parse(&route);
        if decision == RouterDecision::Unknown {
            warn!(output = %route.trim(), "router output unrecognized, taking complex path");
        }
        if !handle.record_decision(decision).await {
            return Err(self.halt(token, handle).await);
        }

        for &agent in plan_for(decision) {
            self.run_stage(agent, query, mode, token, handle, outputs)
                .await?;
        }
        Ok(())
    }

    /// Run one stage and record its output.
    ///
    /// Returns the terminal status if the run must not continue.
    async fn run_stage(
        &self,
        agent: AgentId,
        query: &str,
        mode: ResearchMode,
        token: &RunToken,
        handle: &RunHandle,
        outputs: &mut BTreeMap<AgentId, String>,
    ) -> Result<String, RunStatus> {
        if token.should_halt() {
            return Err(self.halt(token, handle).await);
        }
        if !handle.stage_started(agent).await {
            return Err(RunStatus::Stopped);
        }

        let context = stage(agent).context_source.resolve(outputs);
        match self
            .invoker
            .invoke(agent, query, &context, mode, token)
            .await
        {
            Ok(output) => {
                outputs.insert(agent, output.clone());
                if !handle.stage_completed(agent, output.clone()).await {
                    return Err(RunStatus::Stopped);
                }
                debug!(%agent, chars = output.len(), "stage completed");
                Ok(output)
            }
            Err(InvokeError::Cancelled) => {
                debug!(%agent, "stage cancelled");
                Err(self.halt(token, handle).await)
            }
            Err(InvokeError::Upstream(_)) if token.should_halt() => {
                Err(self.halt(token, handle).await)
            }
            Err(InvokeError::Upstream(e)) => {
                warn!(%agent, error = %e, "stage failed");
                handle.fail_stage(agent, &e).await;
                Err(RunStatus::Failed)
            }
        }
    }

    async fn halt(&self, token: &RunToken, handle: &RunHandle) -> RunStatus {
        if handle.finish_stopped().await {
            info!(run_id = %handle.run_id(), stop_requested = token.stop_requested(), "pipeline run stopped");
        }
        RunStatus::Stopped
    }

    async fn hold_delivery_highlight(&self, token: &RunToken, handle: &RunHandle) {
        tokio::select! {
            _ = tokio::time::sleep(self.completion_grace) => {}
            _ = token.cancelled() => {}
        }
        handle.clear_highlight().await;
    }
}
