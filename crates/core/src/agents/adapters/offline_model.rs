//! Deterministic language model for running without network access.

use crate::agents::base::{AgentError, CompletionPurpose, CompletionRequest, LanguageModel};
use async_trait::async_trait;
use rf_protocol::AgentId;

/// Queries longer than this are routed down the complex path.
pub const COMPLEX_QUERY_CHARS: usize = 50;

/// Answers every request locally and immediately.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineModel;

#[async_trait]
impl LanguageModel for OfflineModel {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, AgentError> {
        let reply = match request.purpose {
            CompletionPurpose::PromptOptimization => request.query.trim().to_string(),
            CompletionPurpose::Stage(AgentId::RouterAgent) => {
                if request.query.chars().count() > COMPLEX_QUERY_CHARS {
                    "complex".to_string()
                } else {
                    "simple".to_string()
                }
            }
            CompletionPurpose::Stage(AgentId::LangsmithLogging) => {
                "✅ Query processed and logged successfully".to_string()
            }
            CompletionPurpose::Stage(agent) => {
                let first_line = request
                    .user_message
                    .lines()
                    .find(|line| !line.trim().is_empty())
                    .unwrap_or_default();
                format!("[DEV MODE] {agent}: {first_line}")
            }
        };
        Ok(reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stage_request(agent: AgentId, query: &str, message: &str) -> CompletionRequest {
        CompletionRequest::for_stage(agent, query, "sys", message)
    }

    #[tokio::test]
    async fn test_router_splits_on_length() {
        let short = stage_request(AgentId::RouterAgent, "What is 2+2?", "");
        let long = stage_request(
            AgentId::RouterAgent,
            "Compare three approaches to distributed consensus and their tradeoffs",
            "",
        );

        assert_eq!(OfflineModel.complete(&short).await.unwrap(), "simple");
        assert_eq!(OfflineModel.complete(&long).await.unwrap(), "complex");
    }

    #[tokio::test]
    async fn test_stage_echoes_first_line() {
        let request = stage_request(
            AgentId::SynthesisAgent,
            "q",
            "<user_query>q</user_query>\n\n<analysis_conclusions>x</analysis_conclusions>",
        );
        assert_eq!(
            OfflineModel.complete(&request).await.unwrap(),
            "[DEV MODE] synthesis-agent: <user_query>q</user_query>"
        );
    }
}
