//! Static stage descriptors and the per-stage input composition table.
//!
//! Both mappings are total matches over [`AgentId`], so adding a stage is a
//! compile error until it has a kind, a context source and a message shape.

use rf_protocol::{AgentId, InvocationKind};
use std::collections::BTreeMap;

/// Where a stage's `context` input comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextSource {
    /// The stage receives an empty context.
    None,
    /// The output of one earlier stage.
    Stage(AgentId),
    /// The three worker outputs under labelled headers.
    WorkerDigest,
    /// The first of these stages that has produced output in this run.
    FirstAvailable(&'static [AgentId]),
}

impl ContextSource {
    /// Resolve against the outputs recorded so far. Missing inputs resolve
    /// to the empty string.
    pub fn resolve(&self, outputs: &BTreeMap<AgentId, String>) -> String {
        match self {
            ContextSource::None => String::new(),
            ContextSource::Stage(agent) => outputs.get(agent).cloned().unwrap_or_default(),
            ContextSource::WorkerDigest => worker_digest(
                outputs.get(&AgentId::WorkerRetrieval).map_or("", String::as_str),
                outputs.get(&AgentId::WorkerResearch).map_or("", String::as_str),
                outputs.get(&AgentId::WorkerAnalysis).map_or("", String::as_str),
            ),
            ContextSource::FirstAvailable(candidates) => candidates
                .iter()
                .find_map(|agent| outputs.get(agent))
                .cloned()
                .unwrap_or_default(),
        }
    }
}

/// Immutable descriptor of one pipeline node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AgentStage {
    pub id: AgentId,
    pub kind: InvocationKind,
    pub context_source: ContextSource,
    /// Sampling overrides for this stage's completion.
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

const DELIVERY_SOURCES: &[AgentId] = &[AgentId::SynthesisAgent, AgentId::DirectGeneration];

/// Descriptor for `id`.
pub fn stage(id: AgentId) -> AgentStage {
    let (kind, context_source) = match id {
        AgentId::RouterAgent => (InvocationKind::LanguageModel, ContextSource::None),
        AgentId::DirectGeneration => (InvocationKind::Retrieval, ContextSource::None),
        AgentId::OrchestratorAgent => (InvocationKind::LanguageModel, ContextSource::None),
        AgentId::DecomposeQuery => (InvocationKind::LanguageModel, ContextSource::None),
        AgentId::WorkerRetrieval => (InvocationKind::Research, ContextSource::None),
        AgentId::WorkerResearch => (
            InvocationKind::LanguageModel,
            ContextSource::Stage(AgentId::WorkerRetrieval),
        ),
        AgentId::WorkerAnalysis => (
            InvocationKind::LanguageModel,
            ContextSource::Stage(AgentId::WorkerResearch),
        ),
        AgentId::SharedState => (InvocationKind::LanguageModel, ContextSource::WorkerDigest),
        AgentId::SynthesisAgent => (
            InvocationKind::LanguageModel,
            ContextSource::Stage(AgentId::SharedState),
        ),
        AgentId::EvaluatorAgent => (
            InvocationKind::LanguageModel,
            ContextSource::Stage(AgentId::SynthesisAgent),
        ),
        // The evaluator verdict never reaches delivery.
        AgentId::ResponseDelivery => (
            InvocationKind::LanguageModel,
            ContextSource::FirstAvailable(DELIVERY_SOURCES),
        ),
        AgentId::LangsmithLogging => (
            InvocationKind::LanguageModel,
            ContextSource::Stage(AgentId::ResponseDelivery),
        ),
    };

    let (temperature, max_tokens) = match id {
        AgentId::DirectGeneration => (Some(0.2), Some(1000)),
        _ => (None, None),
    };

    AgentStage {
        id,
        kind,
        context_source,
        temperature,
        max_tokens,
    }
}

/// Labelled concatenation of the worker outputs fed to `shared-state`.
pub fn worker_digest(retrieval: &str, research: &str, analysis: &str) -> String {
    format!(
        "RETRIEVAL WORKER OUTPUT:\n{retrieval}\n\nRESEARCH WORKER OUTPUT:\n{research}\n\nANALYSIS WORKER OUTPUT:\n{analysis}"
    )
    .trim()
    .to_string()
}

/// Build the user message for `agent`.
///
/// `source` is the text fetched from the research or retrieval collaborator
/// for stages of those kinds; language-model stages pass `None`.
pub fn compose_user_message(
    agent: AgentId,
    query: &str,
    context: &str,
    source: Option<&str>,
) -> String {
    let source = source.unwrap_or_default();
    match agent {
        AgentId::DirectGeneration => {
            format!("<query>{query}</query>\n\n<context>\n{source}\n</context>")
        }
        AgentId::WorkerRetrieval => {
            format!("<sub_query>{query}</sub_query>\n\n<source_document>{source}</source_document>")
        }
        AgentId::WorkerResearch => format!("<retrieved_passages>{context}</retrieved_passages>"),
        AgentId::WorkerAnalysis => format!(
            "<original_query>{query}</original_query>\n\n<research_summary>{context}</research_summary>"
        ),
        AgentId::SharedState => format!("<worker_outputs>{context}</worker_outputs>"),
        AgentId::SynthesisAgent => format!(
            "<user_query>{query}</user_query>\n\n<analysis_conclusions>{context}</analysis_conclusions>"
        ),
        AgentId::EvaluatorAgent => format!("<final_answer>{context}</final_answer>"),
        AgentId::ResponseDelivery => format!("<approved_answer>{context}</approved_answer>"),
        AgentId::LangsmithLogging => format!(
            "The interaction to log is:\nQuery: \"{query}\"\nFinal Response: \"{context}\""
        ),
        AgentId::RouterAgent | AgentId::OrchestratorAgent | AgentId::DecomposeQuery => {
            let extra = if context.is_empty() {
                String::new()
            } else {
                format!("<additional_context>{context}</additional_context>")
            };
            format!("<user_query>{query}</user_query>\n\n{extra}")
        }
    }
}
