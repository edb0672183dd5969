//! OpenAI-compatible chat completions client.

use crate::agents::base::{AgentError, CompletionRequest, LanguageModel};
use async_trait::async_trait;
use rf_protocol::LlmSettings;
use serde_json::Value;
use std::time::Duration;

/// Language model backed by any OpenAI-compatible `/chat/completions` API.
pub struct OpenAiModel {
    settings: LlmSettings,
    api_key: String,
    http: reqwest::Client,
}

impl OpenAiModel {
    pub fn new(settings: LlmSettings, api_key: impl Into<String>) -> Self {
        Self {
            settings,
            api_key: api_key.into(),
            http: reqwest::Client::new(),
        }
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/chat/completions",
            self.settings.base_url.trim_end_matches('/')
        )
    }

    fn build_body(&self, request: &CompletionRequest) -> Value {
        serde_json::json!({
            "model": self.settings.model,
            "temperature": request.temperature.unwrap_or(self.settings.temperature),
            "max_tokens": request.max_tokens.unwrap_or(self.settings.max_tokens),
            "messages": [
                { "role": "system", "content": request.system_instruction },
                { "role": "user", "content": request.user_message },
            ],
        })
    }
}

#[async_trait]
impl LanguageModel for OpenAiModel {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, AgentError> {
        let resp = self
            .http
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .timeout(Duration::from_secs(self.settings.timeout_secs))
            .json(&self.build_body(request))
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(AgentError::Api(format!("{status}: {}", api_error_message(&text))));
        }

        let body: Value = resp.json().await.map_err(map_transport_error)?;
        parse_chat_content(&body)
    }
}

pub(crate) fn map_transport_error(e: reqwest::Error) -> AgentError {
    if e.is_timeout() {
        AgentError::Timeout(e.to_string())
    } else if e.is_decode() {
        AgentError::MalformedResponse(e.to_string())
    } else {
        AgentError::Api(e.to_string())
    }
}

/// `error.message` from a JSON error body, or the raw body otherwise.
fn api_error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|json| json.pointer("/error/message")?.as_str().map(str::to_string))
        .unwrap_or_else(|| body.trim().to_string())
}

/// Text of the first choice. An empty string is a valid completion.
pub(crate) fn parse_chat_content(body: &Value) -> Result<String, AgentError> {
    body.pointer("/choices/0/message/content")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| {
            AgentError::MalformedResponse("missing choices[0].message.content".to_string())
        })
}
