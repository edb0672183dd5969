//! Perplexity research client.

use crate::agents::adapters::openai::{map_transport_error, parse_chat_content};
use crate::agents::base::AgentError;
use chrono::Utc;
use serde_json::Value;
use std::time::Duration;

const PERPLEXITY_URL: &str = "https://api.perplexity.ai/chat/completions";

const RESEARCH_SYSTEM_PROMPT: &str = "You are a research assistant that provides comprehensive, well-sourced information. Always include relevant citations and sources in your response. Structure your response with clear sections and provide accurate, up-to-date information.";

pub struct PerplexityClient {
    api_key: String,
    endpoint: String,
    model: String,
    timeout: Duration,
    http: reqwest::Client,
}

impl PerplexityClient {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>, timeout: Duration) -> Self {
        Self {
            api_key: api_key.into(),
            endpoint: PERPLEXITY_URL.to_string(),
            model: model.into(),
            timeout,
            http: reqwest::Client::new(),
        }
    }

    /// Send requests to `endpoint` instead of the public API, e.g. a proxy.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub async fn research(&self, query: &str) -> Result<String, AgentError> {
        let body = serde_json::json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": RESEARCH_SYSTEM_PROMPT },
                { "role": "user", "content": research_request(query) },
            ],
            "max_tokens": 4000,
            "temperature": 0.2,
            "top_p": 0.9,
            "return_citations": true,
            "search_recency_filter": "month",
            "stream": false,
        });

        let resp = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .timeout(self.timeout)
            .json(&body)
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(AgentError::Api(format!(
                "Perplexity API error {status}: {text}"
            )));
        }

        let data: Value = resp.json().await.map_err(map_transport_error)?;
        format_research(query, &self.model, &data)
    }
}

fn research_request(query: &str) -> String {
    format!(
        "Research and provide comprehensive information about: {query}. Include relevant examples, current developments, and cite your sources."
    )
}

pub(crate) fn format_research(query: &str, requested_model: &str, data: &Value) -> Result<String, AgentError> {
    let content = parse_chat_content(data)?;
    let model = data
        .get("model")
        .and_then(Value::as_str)
        .unwrap_or(requested_model);
    let usage = match data.get("usage") {
        Some(usage) => format!(
            "{} tokens ({} prompt + {} completion)",
            usage["total_tokens"], usage["prompt_tokens"], usage["completion_tokens"]
        ),
        None => "N/A".to_string(),
    };

    Ok(format!(
        "[Perplexity Research Results]\nQuery: {query}\nResearch Date: {}\nModel: {model}\n\n{content}\n\n---\nToken Usage: {usage}",
        Utc::now().to_rfc3339()
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_research_with_usage() {
        let data = serde_json::json!({
            "model": "sonar",
            "choices": [{ "message": { "content": "Findings." } }],
            "usage": { "prompt_tokens": 10, "completion_tokens": 20, "total_tokens": 30 }
        });

        let text = format_research("rust", "fallback", &data).unwrap();

        assert!(text.starts_with("[Perplexity Research Results]\nQuery: rust\nResearch Date: "));
        assert!(text.contains("\nModel: sonar\n\nFindings.\n\n---\n"));
        assert!(text.ends_with("Token Usage: 30 tokens (10 prompt + 20 completion)"));
    }

    #[test]
    fn test_format_research_without_usage() {
        let data = serde_json::json!({
            "choices": [{ "message": { "content": "Findings." } }]
        });

        let text = format_research("rust", "llama", &data).unwrap();

        assert!(text.contains("Model: llama"));
        assert!(text.ends_with("Token Usage: N/A"));
    }

    #[test]
    fn test_missing_choices_is_malformed() {
        let data = serde_json::json!({ "choices": [] });
        assert!(matches!(
            format_research("q", "m", &data),
            Err(AgentError::MalformedResponse(_))
        ));
    }

    #[test]
    fn test_research_request_wording() {
        assert_eq!(
            research_request("tokio"),
            "Research and provide comprehensive information about: tokio. Include relevant examples, current developments, and cite your sources."
        );
    }
}
