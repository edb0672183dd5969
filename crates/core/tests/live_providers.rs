//! Integration tests against the real providers.
//!
//! Run with: `cargo test --features integration-tests -- --ignored`
//!
//! Prerequisites:
//! - `OPENAI_API_KEY` for the language model
//! - `EXA_API_KEY` for Exa search
//! - `PERPLEXITY_API_KEY` for Perplexity research
//!
//! A test whose key is missing is skipped.

#[cfg(feature = "integration-tests")]
mod live {
    use rf_core::agents::adapters::OpenAiModel;
    use rf_core::agents::base::{CompletionRequest, LanguageModel};
    use rf_core::research::{ExaClient, PerplexityClient};
    use rf_protocol::{AgentId, LlmSettings};
    use std::time::Duration;

    fn key(name: &str) -> Option<String> {
        let value = std::env::var(name).ok().filter(|v| !v.trim().is_empty());
        if value.is_none() {
            eprintln!("Skipping test: {name} not set");
        }
        value
    }

    #[tokio::test]
    #[ignore]
    async fn test_openai_router_answers() {
        let Some(api_key) = key("OPENAI_API_KEY") else {
            return;
        };
        let model = OpenAiModel::new(LlmSettings::default(), api_key);
        let request = CompletionRequest::for_stage(
            AgentId::RouterAgent,
            "What is 2+2?",
            "Reply with exactly one word: simple or complex.",
            "<query>What is 2+2?</query>",
        );

        let reply = model.complete(&request).await.expect("completion failed");
        assert!(!reply.trim().is_empty());
    }

    #[tokio::test]
    #[ignore]
    async fn test_exa_search_formats_results() {
        let Some(api_key) = key("EXA_API_KEY") else {
            return;
        };
        let client = ExaClient::new(api_key, 2, Duration::from_secs(30));

        let text = client.search("Rust async runtime").await.expect("search failed");
        assert!(!text.is_empty());
    }

    #[tokio::test]
    #[ignore]
    async fn test_perplexity_research_reports_model() {
        let Some(api_key) = key("PERPLEXITY_API_KEY") else {
            return;
        };
        let client = PerplexityClient::new(api_key, "sonar", Duration::from_secs(60));

        let text = client
            .research("What is the Tokio runtime?")
            .await
            .expect("research failed");
        assert!(text.contains("sonar"));
    }
}
