//! Scripted collaborators for deterministic testing.

use async_trait::async_trait;
use rf_core::agents::base::{
    AgentError, CompletionPurpose, CompletionRequest, LanguageModel, ResearchProvider,
};
use rf_protocol::{AgentId, ResearchMode};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

/// A language model with per-stage replies, failures and a blocking stage.
///
/// Every request is recorded before it is answered, so a blocked or failed
/// stage still shows up in [`ScriptedModel::invoked`].
#[derive(Default)]
pub struct ScriptedModel {
    replies: HashMap<AgentId, String>,
    failures: HashMap<AgentId, AgentError>,
    block_on: Option<AgentId>,
    /// Notified once the blocking stage has been entered.
    pub entered: Arc<Notify>,
    calls: Mutex<Vec<CompletionRequest>>,
}

#[allow(dead_code)]
impl ScriptedModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// A model whose router answers `decision`.
    pub fn routing(decision: &str) -> Self {
        Self::new().reply(AgentId::RouterAgent, decision)
    }

    pub fn reply(mut self, agent: AgentId, text: &str) -> Self {
        self.replies.insert(agent, text.to_string());
        self
    }

    pub fn fail_on(mut self, agent: AgentId, error: AgentError) -> Self {
        self.failures.insert(agent, error);
        self
    }

    /// Never answer `agent`; the call only ends when cancelled.
    pub fn block_on(mut self, agent: AgentId) -> Self {
        self.block_on = Some(agent);
        self
    }

    /// Stage of every request, in call order.
    pub fn invoked(&self) -> Vec<AgentId> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter_map(CompletionRequest::agent)
            .collect()
    }

    pub fn was_invoked(&self, agent: AgentId) -> bool {
        self.invoked().contains(&agent)
    }

    pub fn request(&self, agent: AgentId) -> Option<CompletionRequest> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .find(|request| request.agent() == Some(agent))
            .cloned()
    }

    pub fn optimizer_requests(&self) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|request| request.purpose == CompletionPurpose::PromptOptimization)
            .count()
    }

    /// Default reply for stages without a scripted one.
    pub fn default_reply(agent: AgentId) -> String {
        format!("{agent} output")
    }
}

#[async_trait]
impl LanguageModel for ScriptedModel {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, AgentError> {
        self.calls.lock().unwrap().push(request.clone());

        let Some(agent) = request.agent() else {
            return Ok(format!("\"optimized: {}\"", request.query));
        };
        if let Some(error) = self.failures.get(&agent) {
            return Err(error.clone());
        }
        if self.block_on == Some(agent) {
            self.entered.notify_one();
            std::future::pending::<()>().await;
        }
        Ok(self
            .replies
            .get(&agent)
            .cloned()
            .unwrap_or_else(|| Self::default_reply(agent)))
    }
}

/// A research provider that records the mode of every call.
#[derive(Default)]
pub struct RecordingResearch {
    modes: Mutex<Vec<ResearchMode>>,
}

#[allow(dead_code)]
impl RecordingResearch {
    pub fn modes(&self) -> Vec<ResearchMode> {
        self.modes.lock().unwrap().clone()
    }
}

#[async_trait]
impl ResearchProvider for RecordingResearch {
    async fn research(&self, query: &str, mode: ResearchMode) -> Result<String, AgentError> {
        self.modes.lock().unwrap().push(mode);
        Ok(format!("{mode} research on {query}"))
    }
}
