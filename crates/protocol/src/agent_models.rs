//! Agent stage identifiers and research modes.
//!
//! Every pipeline node is named by a closed [`AgentId`] variant. The
//! kebab-case string form (`router-agent`, `worker-retrieval`, ...) is the
//! one used on the wire, in prompt template front matter and in error
//! markers.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

/// Identifier of one of the twelve pipeline stages.
///
/// Variants are declared in pipeline layout order, so the derived `Ord`
/// sorts stages the way the UI lists them.
#[derive(
    Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, TS,
)]
#[serde(rename_all = "kebab-case")]
pub enum AgentId {
    RouterAgent,
    DirectGeneration,
    OrchestratorAgent,
    DecomposeQuery,
    WorkerRetrieval,
    WorkerResearch,
    WorkerAnalysis,
    SharedState,
    SynthesisAgent,
    EvaluatorAgent,
    ResponseDelivery,
    LangsmithLogging,
}

impl AgentId {
    /// All stages in layout order.
    pub const ALL: [AgentId; 12] = [
        AgentId::RouterAgent,
        AgentId::DirectGeneration,
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

    /// The kebab-case identifier.
    pub fn as_str(self) -> &'static str {
        match self {
            AgentId::RouterAgent => "router-agent",
            AgentId::DirectGeneration => "direct-generation",
            AgentId::OrchestratorAgent => "orchestrator-agent",
            AgentId::DecomposeQuery => "decompose-query",
            AgentId::WorkerRetrieval => "worker-retrieval",
            AgentId::WorkerResearch => "worker-research",
            AgentId::WorkerAnalysis => "worker-analysis",
            AgentId::SharedState => "shared-state",
            AgentId::SynthesisAgent => "synthesis-agent",
            AgentId::EvaluatorAgent => "evaluator-agent",
            AgentId::ResponseDelivery => "response-delivery",
            AgentId::LangsmithLogging => "langsmith-logging",
        }
    }

    /// Human-readable label for display.
    pub fn label(self) -> &'static str {
        match self {
            AgentId::RouterAgent => "Router",
            AgentId::DirectGeneration => "Direct Generation",
            AgentId::OrchestratorAgent => "Orchestrator",
            AgentId::DecomposeQuery => "Decompose Query",
            AgentId::WorkerRetrieval => "Retrieval Worker",
            AgentId::WorkerResearch => "Research Worker",
            AgentId::WorkerAnalysis => "Analysis Worker",
            AgentId::SharedState => "Shared State",
            AgentId::SynthesisAgent => "Synthesis",
            AgentId::EvaluatorAgent => "Evaluator",
            AgentId::ResponseDelivery => "Response Delivery",
            AgentId::LangsmithLogging => "Logging",
        }
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a string does not name a known stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownAgentId(pub String);

impl fmt::Display for UnknownAgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown agent id: {}", self.0)
    }
}

impl std::error::Error for UnknownAgentId {}

impl FromStr for AgentId {
    type Err = UnknownAgentId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        AgentId::ALL
            .into_iter()
            .find(|id| id.as_str() == needle)
            .ok_or_else(|| UnknownAgentId(needle.to_string()))
    }
}

/// Which external collaborator a stage delegates to.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, TS)]
#[serde(rename_all = "kebab-case")]
pub enum InvocationKind {
    /// A single language-model completion.
    LanguageModel,
    /// Research provider first, then a language-model completion.
    Research,
    /// Local index lookup first, then a language-model completion.
    Retrieval,
}

/// Source selector for the retrieval worker.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default, TS)]
#[serde(rename_all = "lowercase")]
pub enum ResearchMode {
    Exa,
    Perplexity,
    /// Local index only. Never performs network I/O.
    #[default]
    Local,
}

impl ResearchMode {
    /// Cycle exa -> perplexity -> local -> exa.
    pub fn next(self) -> Self {
        match self {
            ResearchMode::Exa => ResearchMode::Perplexity,
            ResearchMode::Perplexity => ResearchMode::Local,
            ResearchMode::Local => ResearchMode::Exa,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ResearchMode::Exa => "exa",
            ResearchMode::Perplexity => "perplexity",
            ResearchMode::Local => "local",
        }
    }
}

impl fmt::Display for ResearchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResearchMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "exa" => Ok(ResearchMode::Exa),
            "perplexity" => Ok(ResearchMode::Perplexity),
            "local" => Ok(ResearchMode::Local),
            other => Err(format!(
                "unknown research mode '{other}' (expected exa, perplexity or local)"
            )),
        }
    }
}
