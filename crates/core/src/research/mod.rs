//! Research collaborators for `worker-retrieval`.
//!
//! [`Researcher`] dispatches on [`ResearchMode`]: Exa and Perplexity go to
//! the network, Local reads the document index. An external failure, or a
//! mode whose key is not configured, degrades to Local.

pub mod exa;
pub mod perplexity;

use crate::agents::base::{AgentError, DocumentRetriever, ResearchProvider};
use async_trait::async_trait;
pub use exa::ExaClient;
pub use perplexity::PerplexityClient;
use rf_protocol::ResearchMode;
use std::sync::Arc;
use tracing::{debug, warn};

/// Local mode output when the index holds no documents.
pub fn local_placeholder(query: &str) -> String {
    format!(
        "[Local Processing Only]\nQuery: {query}\nMode: No external API calls\nStatus: Processing with local knowledge base only\n\nThis query will be processed using only the local vector database and internal knowledge, without making any external API calls to preserve budget."
    )
}

pub struct Researcher {
    exa: Option<ExaClient>,
    perplexity: Option<PerplexityClient>,
    local: Arc<dyn DocumentRetriever>,
    top_k: usize,
}

impl Researcher {
    /// A researcher with no external providers.
    pub fn local_only(local: Arc<dyn DocumentRetriever>, top_k: usize) -> Self {
        Self {
            exa: None,
            perplexity: None,
            local,
            top_k: top_k.max(1),
        }
    }

    pub fn with_exa(mut self, client: ExaClient) -> Self {
        self.exa = Some(client);
        self
    }

    pub fn with_perplexity(mut self, client: PerplexityClient) -> Self {
        self.perplexity = Some(client);
        self
    }

    async fn local(&self, query: &str) -> Result<String, AgentError> {
        if self.local.is_empty() {
            return Ok(local_placeholder(query));
        }
        self.local.retrieve(query, self.top_k).await
    }

    async fn external(&self, query: &str, mode: ResearchMode) -> Option<Result<String, AgentError>> {
        match mode {
            ResearchMode::Exa => Some(self.exa.as_ref()?.search(query).await),
            ResearchMode::Perplexity => Some(self.perplexity.as_ref()?.research(query).await),
            ResearchMode::Local => None,
        }
    }
}

#[async_trait]
impl ResearchProvider for Researcher {
    async fn research(&self, query: &str, mode: ResearchMode) -> Result<String, AgentError> {
        match self.external(query, mode).await {
            Some(Ok(text)) => {
                debug!(%mode, chars = text.len(), "research completed");
                Ok(text)
            }
            Some(Err(e)) => {
                warn!(%mode, error = %e, "research provider failed, using local index");
                self.local(query).await
            }
            None if mode != ResearchMode::Local => {
                warn!(%mode, "research provider not configured, using local index");
                self.local(query).await
            }
            None => self.local(query).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::adapters::testing::serve_once;
    use crate::index::{Chunk, LocalIndex};
    use std::time::Duration;

    fn indexed() -> Arc<LocalIndex> {
        Arc::new(LocalIndex::from_chunks(vec![Chunk {
            source: "doc.md".to_string(),
            text: "Exa is a neural search engine.".to_string(),
        }]))
    }

    #[tokio::test]
    async fn test_local_mode_with_empty_index_returns_placeholder() {
        let researcher = Researcher::local_only(Arc::new(LocalIndex::default()), 2);

        let text = researcher.research("rust", ResearchMode::Local).await.unwrap();

        assert_eq!(text, local_placeholder("rust"));
        assert!(text.starts_with("[Local Processing Only]\nQuery: rust\n"));
    }

    #[tokio::test]
    async fn test_local_mode_reads_index() {
        let researcher = Researcher::local_only(indexed(), 2);

        let text = researcher
            .research("neural search", ResearchMode::Local)
            .await
            .unwrap();

        assert_eq!(text, "[Source 1]: Exa is a neural search engine.");
    }

    #[tokio::test]
    async fn test_unconfigured_provider_falls_back_to_local() {
        let researcher = Researcher::local_only(indexed(), 2);

        for mode in [ResearchMode::Exa, ResearchMode::Perplexity] {
            let text = researcher.research("neural search", mode).await.unwrap();
            assert!(text.starts_with("[Source 1]"), "{mode} should fall back");
        }
    }

    #[tokio::test]
    async fn test_failing_exa_falls_back_to_local() {
        let endpoint = serve_once("500 Internal Server Error", "text/plain", "exa is down").await;
        let exa = ExaClient::new("exa-key", 5, Duration::from_secs(5)).with_endpoint(endpoint);
        let researcher = Researcher::local_only(indexed(), 2).with_exa(exa);

        let text = researcher
            .research("neural search", ResearchMode::Exa)
            .await
            .unwrap();

        assert_eq!(text, "[Source 1]: Exa is a neural search engine.");
    }

    #[tokio::test]
    async fn test_unreachable_perplexity_falls_back_to_local() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let endpoint = format!("http://{}", listener.local_addr().unwrap());
        drop(listener);

        let perplexity =
            PerplexityClient::new("pplx-key", "sonar", Duration::from_secs(5)).with_endpoint(endpoint);
        let researcher = Researcher::local_only(indexed(), 2).with_perplexity(perplexity);

        let text = researcher
            .research("neural search", ResearchMode::Perplexity)
            .await
            .unwrap();

        assert_eq!(text, "[Source 1]: Exa is a neural search engine.");
    }
}
