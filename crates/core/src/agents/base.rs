//! Collaborator traits and supporting types.
//!
//! The orchestrator never talks to a network service directly. Every unit of
//! external work goes through one of three traits:
//! - [`LanguageModel`]: system instruction + user message in, text out
//! - [`ResearchProvider`]: web research keyed by [`ResearchMode`]
//! - [`DocumentRetriever`]: local index lookup, never networked

use async_trait::async_trait;
use rf_protocol::{AgentId, ResearchMode};
use thiserror::Error;

/// What a completion request is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionPurpose {
    /// A pipeline stage.
    Stage(AgentId),
    /// The stand-alone prompt optimizer.
    PromptOptimization,
}

/// A single language-model call.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub purpose: CompletionPurpose,

    /// The original user query, for collaborators that route or log on it.
    pub query: String,

    pub system_instruction: String,

    pub user_message: String,

    /// Overrides the model's configured temperature.
    pub temperature: Option<f32>,

    /// Overrides the model's configured token limit.
    pub max_tokens: Option<u32>,
}

impl CompletionRequest {
    /// Create a request for a pipeline stage with default sampling.
    pub fn for_stage(
        agent: AgentId,
        query: impl Into<String>,
        system_instruction: impl Into<String>,
        user_message: impl Into<String>,
    ) -> Self {
        Self {
            purpose: CompletionPurpose::Stage(agent),
            query: query.into(),
            system_instruction: system_instruction.into(),
            user_message: user_message.into(),
            temperature: None,
            max_tokens: None,
        }
    }

    /// Set sampling overrides.
    pub fn with_sampling(mut self, temperature: Option<f32>, max_tokens: Option<u32>) -> Self {
        self.temperature = temperature;
        self.max_tokens = max_tokens;
        self
    }

    /// The stage this request belongs to, if any.
    pub fn agent(&self) -> Option<AgentId> {
        match self.purpose {
            CompletionPurpose::Stage(agent) => Some(agent),
            CompletionPurpose::PromptOptimization => None,
        }
    }
}

/// Failure reported by a collaborator.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AgentError {
    #[error("API call failed: {0}")]
    Api(String),
    #[error("Request timed out: {0}")]
    Timeout(String),
    #[error("Malformed response: {0}")]
    MalformedResponse(String),
    #[error("Not configured: {0}")]
    NotConfigured(String),
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

/// Failure of one agent invocation.
///
/// Cancellation is kept apart from upstream failures at every layer so a
/// user-initiated stop is never reported as an error.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InvokeError {
    #[error("invocation cancelled")]
    Cancelled,
    #[error(transparent)]
    Upstream(#[from] AgentError),
}

#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, AgentError>;
}

#[async_trait]
pub trait ResearchProvider: Send + Sync {
    /// Best-effort source text for `query`. `ResearchMode::Local` must not
    /// perform network I/O.
    async fn research(&self, query: &str, mode: ResearchMode) -> Result<String, AgentError>;
}

#[async_trait]
pub trait DocumentRetriever: Send + Sync {
    /// Formatted passages for `query`, or a fixed notice when nothing matches.
    async fn retrieve(&self, query: &str, top_k: usize) -> Result<String, AgentError>;

    /// Whether the retriever holds any documents at all.
    fn is_empty(&self) -> bool;
}
