//! The agent invoker.
//!
//! One `invoke` call performs one unit of stage work: it optionally fetches
//! source text from the research or retrieval collaborator, composes the
//! stage's user message and asks the language model for a completion. The
//! whole call races the run token, so an abort drops the in-flight request
//! instead of waiting for it.

use crate::agents::base::{
    AgentError, CompletionPurpose, CompletionRequest, DocumentRetriever, InvokeError,
    LanguageModel, ResearchProvider,
};
use crate::agents::prompts::PromptBook;
use crate::agents::stage::{compose_user_message, stage};
use crate::state::token::RunToken;
use rf_protocol::{AgentId, InvocationKind, ResearchMode};
use std::sync::Arc;

const OPTIMIZER_TEMPERATURE: f32 = 0.3;
const OPTIMIZER_MAX_TOKENS: u32 = 1000;

/// Dispatches stage work to the collaborators.
pub struct AgentInvoker {
    model: Arc<dyn LanguageModel>,
    researcher: Arc<dyn ResearchProvider>,
    retriever: Arc<dyn DocumentRetriever>,
    prompts: PromptBook,
    retrieval_top_k: usize,
}

impl AgentInvoker {
    /// Create an invoker over the three collaborators.
    ///
    /// # Arguments
    ///
    /// * `model` - Language model used by every stage
    /// * `researcher` - Source text for `worker-retrieval`
    /// * `retriever` - Local index used by `direct-generation`
    /// * `prompts` - System instruction per stage
    pub fn new(
        model: Arc<dyn LanguageModel>,
        researcher: Arc<dyn ResearchProvider>,
        retriever: Arc<dyn DocumentRetriever>,
        prompts: PromptBook,
    ) -> Self {
        Self {
            model,
            researcher,
            retriever,
            prompts,
            retrieval_top_k: 2,
        }
    }

    /// Number of passages `direct-generation` retrieves.
    pub fn with_retrieval_top_k(mut self, top_k: usize) -> Self {
        self.retrieval_top_k = top_k.max(1);
        self
    }

    pub fn prompts(&self) -> &PromptBook {
        &self.prompts
    }

    /// Run one stage.
    ///
    /// # Arguments
    ///
    /// * `agent` - The stage to run
    /// * `query` - The original user query
    /// * `context` - Output of the stage's context source, possibly empty
    /// * `mode` - Research mode for `worker-retrieval`
    /// * `token` - The run's cancellation token
    ///
    /// # Errors
    ///
    /// * `InvokeError::Cancelled` if the token is aborted before or during
    ///   the call. No collaborator is contacted when it was already aborted.
    /// * `InvokeError::Upstream` for any collaborator failure.
    pub async fn invoke(
        &self,
        agent: AgentId,
        query: &str,
        context: &str,
        mode: ResearchMode,
        token: &RunToken,
    ) -> Result<String, InvokeError> {
        if token.is_aborted() {
            return Err(InvokeError::Cancelled);
        }

        tokio::select! {
            biased;
            _ = token.cancelled() => Err(InvokeError::Cancelled),
            result = self.dispatch(agent, query, context, mode) => match result {
                Ok(text) => Ok(text),
                // A transport error raised by the teardown itself.
                Err(_) if token.is_aborted() => Err(InvokeError::Cancelled),
                Err(e) => Err(InvokeError::Upstream(e)),
            },
        }
    }

    async fn dispatch(
        &self,
        agent: AgentId,
        query: &str,
        context: &str,
        mode: ResearchMode,
    ) -> Result<String, AgentError> {
        let descriptor = stage(agent);

        let source = match descriptor.kind {
            InvocationKind::LanguageModel => None,
            InvocationKind::Research => Some(self.researcher.research(query, mode).await?),
            InvocationKind::Retrieval => Some(
                self.retriever
                    .retrieve(query, self.retrieval_top_k)
                    .await?,
            ),
        };

        let request = CompletionRequest::for_stage(
            agent,
            query,
            self.prompts.instruction(agent),
            compose_user_message(agent, query, context, source.as_deref()),
        )
        .with_sampling(descriptor.temperature, descriptor.max_tokens);

        tracing::debug!(%agent, kind = ?descriptor.kind, "invoking language model");
        self.model.complete(&request).await
    }

    /// Rewrite `prompt` into a retrieval-friendly prompt.
    ///
    /// # Errors
    ///
    /// `AgentError::InvalidRequest` for a blank prompt, otherwise whatever the
    /// language model reports.
    pub async fn optimize_prompt(&self, prompt: &str) -> Result<String, AgentError> {
        if prompt.trim().is_empty() {
            return Err(AgentError::InvalidRequest(
                "prompt must not be empty".to_string(),
            ));
        }

        let request = CompletionRequest {
            purpose: CompletionPurpose::PromptOptimization,
            query: prompt.to_string(),
            system_instruction: self.prompts.optimizer_instruction().to_string(),
            user_message: format!("Optimize this prompt for better RAG processing: \"{prompt}\""),
            temperature: Some(OPTIMIZER_TEMPERATURE),
            max_tokens: Some(OPTIMIZER_MAX_TOKENS),
        };

        let raw = self.model.complete(&request).await?;
        Ok(strip_wrapping_quotes(&raw))
    }
}

/// Trim, then drop at most one leading and one trailing quote character.
pub fn strip_wrapping_quotes(text: &str) -> String {
    let trimmed = text.trim();
    let trimmed = trimmed
        .strip_prefix(['"', '\''])
        .unwrap_or(trimmed);
    let trimmed = trimmed
        .strip_suffix(['"', '\''])
        .unwrap_or(trimmed);
    trimmed.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    #[derive(Default)]
    struct EchoModel {
        requests: Mutex<Vec<CompletionRequest>>,
    }

    #[async_trait]
    impl LanguageModel for EchoModel {
        async fn complete(&self, request: &CompletionRequest) -> Result<String, AgentError> {
            self.requests.lock().unwrap().push(request.clone());
            Ok(format!("\"{}\"", request.user_message))
        }
    }

    struct PendingModel;

    #[async_trait]
    impl LanguageModel for PendingModel {
        async fn complete(&self, _request: &CompletionRequest) -> Result<String, AgentError> {
            std::future::pending().await
        }
    }

    #[derive(Default)]
    struct CountingResearch {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ResearchProvider for CountingResearch {
        async fn research(&self, query: &str, mode: ResearchMode) -> Result<String, AgentError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(format!("{mode} source for {query}"))
        }
    }

    struct FixedRetriever;

    #[async_trait]
    impl DocumentRetriever for FixedRetriever {
        async fn retrieve(&self, _query: &str, top_k: usize) -> Result<String, AgentError> {
            Ok(format!("[Source 1]: top {top_k}"))
        }

        fn is_empty(&self) -> bool {
            false
        }
    }

    fn invoker(model: Arc<dyn LanguageModel>, research: Arc<CountingResearch>) -> AgentInvoker {
        let mut prompts = PromptBook::default();
        prompts.set(AgentId::WorkerRetrieval, "extract");
        AgentInvoker::new(model, research, Arc::new(FixedRetriever), prompts)
    }

    #[tokio::test]
    async fn test_aborted_token_fails_fast_without_collaborators() {
        let model = Arc::new(EchoModel::default());
        let research = Arc::new(CountingResearch::default());
        let invoker = invoker(model.clone(), research.clone());

        let token = RunToken::new();
        token.abort();

        let result = invoker
            .invoke(AgentId::WorkerRetrieval, "q", "", ResearchMode::Exa, &token)
            .await;

        assert_eq!(result, Err(InvokeError::Cancelled));
        assert!(model.requests.lock().unwrap().is_empty());
        assert_eq!(research.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_worker_retrieval_feeds_research_into_model() {
        let model = Arc::new(EchoModel::default());
        let research = Arc::new(CountingResearch::default());
        let invoker = invoker(model.clone(), research.clone());

        invoker
            .invoke(
                AgentId::WorkerRetrieval,
                "rust async",
                "",
                ResearchMode::Perplexity,
                &RunToken::new(),
            )
            .await
            .unwrap();

        let requests = model.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].system_instruction, "extract");
        assert_eq!(
            requests[0].user_message,
            "<sub_query>rust async</sub_query>\n\n<source_document>perplexity source for rust async</source_document>"
        );
        assert_eq!(research.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_direct_generation_uses_retriever_and_low_temperature() {
        let model = Arc::new(EchoModel::default());
        let research = Arc::new(CountingResearch::default());
        let invoker = invoker(model.clone(), research.clone()).with_retrieval_top_k(3);

        invoker
            .invoke(
                AgentId::DirectGeneration,
                "What is 2+2?",
                "",
                ResearchMode::Exa,
                &RunToken::new(),
            )
            .await
            .unwrap();

        let requests = model.requests.lock().unwrap();
        assert_eq!(
            requests[0].user_message,
            "<query>What is 2+2?</query>\n\n<context>\n[Source 1]: top 3\n</context>"
        );
        assert_eq!(requests[0].temperature, Some(0.2));
        assert_eq!(requests[0].max_tokens, Some(1000));
        assert_eq!(research.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_abort_during_call_cancels_promptly() {
        let invoker = invoker(
            Arc::new(PendingModel),
            Arc::new(CountingResearch::default()),
        );
        let token = RunToken::new();
        let aborter = token.clone();

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            aborter.abort();
        });

        let result = tokio::time::timeout(
            Duration::from_secs(2),
            invoker.invoke(AgentId::RouterAgent, "q", "", ResearchMode::Local, &token),
        )
        .await
        .expect("invoke should resolve once the token is aborted");

        assert_eq!(result, Err(InvokeError::Cancelled));
    }

    #[tokio::test]
    async fn test_optimize_prompt_strips_quotes() {
        let model = Arc::new(EchoModel::default());
        let invoker = invoker(model.clone(), Arc::new(CountingResearch::default()));

        let optimized = invoker.optimize_prompt("how does ml work?").await.unwrap();

        assert_eq!(
            optimized,
            "Optimize this prompt for better RAG processing: \"how does ml work?\""
        );
        let requests = model.requests.lock().unwrap();
        assert_eq!(requests[0].purpose, CompletionPurpose::PromptOptimization);
        assert_eq!(requests[0].temperature, Some(0.3));
    }

    #[tokio::test]
    async fn test_optimize_prompt_rejects_blank() {
        let invoker = invoker(
            Arc::new(EchoModel::default()),
            Arc::new(CountingResearch::default()),
        );
        let err = invoker.optimize_prompt("   ").await.unwrap_err();
        assert!(matches!(err, AgentError::InvalidRequest(_)));
    }

    #[test]
    fn test_strip_wrapping_quotes() {
        assert_eq!(strip_wrapping_quotes("  \"hello\"  "), "hello");
        assert_eq!(strip_wrapping_quotes("'single'"), "single");
        assert_eq!(strip_wrapping_quotes("\"\"double\"\""), "\"double\"");
        assert_eq!(strip_wrapping_quotes("plain"), "plain");
    }
}
