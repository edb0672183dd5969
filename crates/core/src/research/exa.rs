//! Exa web search client.

use crate::agents::adapters::openai::map_transport_error;
use crate::agents::base::AgentError;
use chrono::DateTime;
use serde::Deserialize;
use std::time::Duration;

const EXA_SEARCH_URL: &str = "https://api.exa.ai/search";

/// Returned when the search succeeds with no results.
pub const EXA_NO_RESULTS: &str = "No relevant content found via Exa search";

#[derive(Debug, Deserialize)]
pub(crate) struct ExaResponse {
    #[serde(default)]
    pub results: Vec<ExaResult>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ExaResult {
    pub url: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub published_date: Option<String>,
    #[serde(default)]
    pub score: Option<f64>,
}

pub struct ExaClient {
    api_key: String,
    endpoint: String,
    num_results: u32,
    timeout: Duration,
    http: reqwest::Client,
}

impl ExaClient {
    pub fn new(api_key: impl Into<String>, num_results: u32, timeout: Duration) -> Self {
        Self {
            api_key: api_key.into(),
            endpoint: EXA_SEARCH_URL.to_string(),
            num_results,
            timeout,
            http: reqwest::Client::new(),
        }
    }

    /// Send requests to `endpoint` instead of the public API, e.g. a proxy.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub async fn search(&self, query: &str) -> Result<String, AgentError> {
        let body = serde_json::json!({
            "query": query,
            "type": "auto",
            "useAutoprompt": true,
            "numResults": self.num_results,
            "contents": {
                "text": true,
                "highlights": { "numSentences": 3, "highlightsPerUrl": 2 },
            },
            "summary": {
                "query": format!("Summarize the following information about: {query}"),
            },
        });

        let resp = self
            .http
            .post(&self.endpoint)
            .header("x-api-key", &self.api_key)
            .timeout(self.timeout)
            .json(&body)
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(AgentError::Api(format!("Exa API error {status}: {text}")));
        }

        let data: ExaResponse = resp.json().await.map_err(map_transport_error)?;
        tracing::debug!(results = data.results.len(), "exa search finished");
        Ok(format_results(&data.results))
    }
}

pub(crate) fn format_results(results: &[ExaResult]) -> String {
    if results.is_empty() {
        return EXA_NO_RESULTS.to_string();
    }

    results
        .iter()
        .enumerate()
        .map(|(i, result)| {
            let author = result
                .author
                .as_deref()
                .filter(|a| !a.is_empty())
                .map(|a| format!(" by {a}"))
                .unwrap_or_default();
            let published = result
                .published_date
                .as_deref()
                .map(|date| {
                    let day = DateTime::parse_from_rfc3339(date)
                        .map(|d| d.format("%Y-%m-%d").to_string())
                        .unwrap_or_else(|_| date.to_string());
                    format!(" (Published: {day})")
                })
                .unwrap_or_default();
            let score = result
                .score
                .map(|s| format!(" (Score: {s:.3})"))
                .unwrap_or_default();

            format!(
                "[Exa Result {}] {}{author}{published}{score}\nURL: {}\nContent: {}",
                i + 1,
                result.title.as_deref().unwrap_or("Untitled"),
                result.url,
                result
                    .text
                    .as_deref()
                    .filter(|t| !t.is_empty())
                    .unwrap_or("No content available"),
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n---\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_results() {
        let data: ExaResponse = serde_json::from_value(serde_json::json!({
            "results": [
                {
                    "url": "https://tokio.rs",
                    "title": "Tokio",
                    "text": "An async runtime.",
                    "author": "Carl",
                    "publishedDate": "2024-03-01T00:00:00.000Z",
                    "score": 0.91234
                },
                { "url": "https://example.com", "title": "Bare" }
            ],
            "requestId": "abc"
        }))
        .unwrap();

        let formatted = format_results(&data.results);

        assert_eq!(
            formatted,
            "[Exa Result 1] Tokio by Carl (Published: 2024-03-01) (Score: 0.912)\nURL: https://tokio.rs\nContent: An async runtime.\
             \n\n---\n\n\
             [Exa Result 2] Bare\nURL: https://example.com\nContent: No content available"
        );
    }

    #[test]
    fn test_empty_results_notice() {
        assert_eq!(format_results(&[]), EXA_NO_RESULTS);
    }
}
