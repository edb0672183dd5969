//! Builds the collaborators and the invoker from configuration.

use crate::agents::adapters::{OfflineModel, OpenAiModel};
use crate::agents::base::{DocumentRetriever, LanguageModel, ResearchProvider};
use crate::agents::invoker::AgentInvoker;
use crate::agents::prompts::PromptBook;
use crate::config::models::AppConfig;
use crate::engine::PipelineEngine;
use crate::index::LocalIndex;
use crate::research::{ExaClient, PerplexityClient, Researcher};
use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Factory for wiring an [`AgentInvoker`] from an [`AppConfig`].
pub struct AgentFactory;

impl AgentFactory {
    /// Build the language model.
    ///
    /// Uses the OpenAI-compatible client when a key is configured and
    /// `offline` is false, otherwise the deterministic [`OfflineModel`].
    pub fn language_model(config: &AppConfig, offline: bool) -> Arc<dyn LanguageModel> {
        match (&config.secrets.openai_api_key, offline) {
            (Some(key), false) => {
                info!(model = %config.global.llm.model, base_url = %config.global.llm.base_url, "using OpenAI-compatible model");
                Arc::new(OpenAiModel::new(config.global.llm.clone(), key.clone()))
            }
            _ => {
                info!("running in offline development mode");
                Arc::new(OfflineModel)
            }
        }
    }

    /// Build the research provider. External providers are only attached
    /// when their key is set and `offline` is false.
    pub fn researcher(
        config: &AppConfig,
        local: Arc<dyn DocumentRetriever>,
        offline: bool,
    ) -> Arc<dyn ResearchProvider> {
        let settings = &config.global.research;
        let mut researcher = Researcher::local_only(local, config.global.index.top_k);

        if offline {
            return Arc::new(researcher);
        }
        if let Some(key) = &config.secrets.exa_api_key {
            researcher = researcher.with_exa(ExaClient::new(
                key.clone(),
                settings.exa_results,
                Duration::from_secs(settings.exa_timeout_secs),
            ));
        }
        if let Some(key) = &config.secrets.perplexity_api_key {
            researcher = researcher.with_perplexity(PerplexityClient::new(
                key.clone(),
                settings.perplexity_model.clone(),
                Duration::from_secs(settings.perplexity_timeout_secs),
            ));
        }
        Arc::new(researcher)
    }

    /// Build the invoker with every collaborator.
    ///
    /// # Errors
    ///
    /// Fails if the local index file exists but cannot be read.
    pub fn build(config: &AppConfig, offline: bool) -> Result<AgentInvoker> {
        let index_path = config.index_path();
        let index = LocalIndex::load_or_empty(&index_path)
            .with_context(|| format!("loading local index {}", index_path.display()))?;
        info!(chunks = index.len(), path = %index_path.display(), "local index loaded");
        let index: Arc<dyn DocumentRetriever> = Arc::new(index);

        let prompts = PromptBook::embedded().with_overrides(&config.prompts);

        Ok(AgentInvoker::new(
            Self::language_model(config, offline),
            Self::researcher(config, Arc::clone(&index), offline),
            index,
            prompts,
        )
        .with_retrieval_top_k(config.global.index.top_k))
    }

    /// Build a pipeline engine with the configured completion grace.
    pub fn build_engine(config: &AppConfig, offline: bool) -> Result<PipelineEngine> {
        let invoker = Self::build(config, offline)?;
        Ok(PipelineEngine::new(Arc::new(invoker)).with_completion_grace(Duration::from_millis(
            config.global.completion_grace_ms,
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::token::RunToken;
    use rf_protocol::{AgentId, ResearchMode};
    use tempfile::tempdir;

    fn config_in(root: &std::path::Path) -> AppConfig {
        AppConfig {
            root: root.to_path_buf(),
            ..AppConfig::default()
        }
    }

    #[tokio::test]
    async fn test_build_without_key_is_offline() {
        let dir = tempdir().unwrap();
        let invoker = AgentFactory::build(&config_in(dir.path()), false).unwrap();

        let route = invoker
            .invoke(AgentId::RouterAgent, "What is 2+2?", "", ResearchMode::Local, &RunToken::new())
            .await
            .unwrap();

        assert_eq!(route, "simple");
    }

    #[tokio::test]
    async fn test_build_applies_prompt_overrides() {
        let dir = tempdir().unwrap();
        let mut config = config_in(dir.path());
        config.prompts.push(crate::config::models::PromptTemplate {
            agent: "router-agent".to_string(),
            description: String::new(),
            instruction: "custom".to_string(),
        });

        let invoker = AgentFactory::build(&config, true).unwrap();

        assert_eq!(invoker.prompts().instruction(AgentId::RouterAgent), "custom");
    }

    #[test]
    fn test_build_reports_corrupt_index() {
        let dir = tempdir().unwrap();
        let rf_dir = dir.path().join(".ragflow");
        std::fs::create_dir_all(&rf_dir).unwrap();
        std::fs::write(rf_dir.join("index.json"), "{ nope").unwrap();

        let err = AgentFactory::build(&config_in(dir.path()), true)
            .err()
            .expect("corrupt index should fail");
        assert!(format!("{err:#}").contains("index.json"));
    }
}
