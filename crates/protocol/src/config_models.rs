//! Global configuration models for `.ragflow/config.toml`.
//!
//! Every key is optional. Secrets (API keys) are never read from this file;
//! they come from the environment.

use serde::Deserialize;
use serde::Serialize;
use ts_rs::TS;

use crate::agent_models::ResearchMode;

/// Represents global settings from `.ragflow/config.toml`.
///
/// # Example
///
/// ```toml
/// # .ragflow/config.toml
/// completion_grace_ms = 3000
///
/// [llm]
/// model = "gpt-4o-mini"
///
/// [research]
/// mode = "exa"
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, TS)]
pub struct GlobalConfig {
    #[serde(default)]
    pub llm: LlmSettings,

    #[serde(default)]
    pub research: ResearchSettings,

    #[serde(default)]
    pub index: IndexSettings,

    /// How long `response-delivery` stays highlighted after a completed run.
    #[serde(default = "default_completion_grace_ms")]
    pub completion_grace_ms: u64,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            llm: LlmSettings::default(),
            research: ResearchSettings::default(),
            index: IndexSettings::default(),
            completion_grace_ms: default_completion_grace_ms(),
        }
    }
}

/// OpenAI-compatible chat completion settings.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, TS)]
pub struct LlmSettings {
    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Per-request timeout. Expiry is reported as an upstream error.
    #[serde(default = "default_llm_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            model: default_model(),
            base_url: default_base_url(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            timeout_secs: default_llm_timeout_secs(),
        }
    }
}

/// Research provider settings.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, TS)]
pub struct ResearchSettings {
    /// Initial research mode for new runs.
    #[serde(default)]
    pub mode: ResearchMode,

    #[serde(default = "default_exa_results")]
    pub exa_results: u32,

    #[serde(default = "default_exa_timeout_secs")]
    pub exa_timeout_secs: u64,

    #[serde(default = "default_perplexity_model")]
    pub perplexity_model: String,

    #[serde(default = "default_perplexity_timeout_secs")]
    pub perplexity_timeout_secs: u64,
}

impl Default for ResearchSettings {
    fn default() -> Self {
        Self {
            mode: ResearchMode::default(),
            exa_results: default_exa_results(),
            exa_timeout_secs: default_exa_timeout_secs(),
            perplexity_model: default_perplexity_model(),
            perplexity_timeout_secs: default_perplexity_timeout_secs(),
        }
    }
}

/// Local document index settings.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, TS)]
pub struct IndexSettings {
    /// Index file, relative to the project root.
    #[serde(default = "default_index_path")]
    pub path: String,

    /// Chunks returned to `direct-generation`.
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,
}

impl Default for IndexSettings {
    fn default() -> Self {
        Self {
            path: default_index_path(),
            top_k: default_top_k(),
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
        }
    }
}

fn default_completion_grace_ms() -> u64 {
    3000
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_temperature() -> f32 {
    0.7
}

fn default_max_tokens() -> u32 {
    5000
}

fn default_llm_timeout_secs() -> u64 {
    60
}

fn default_exa_results() -> u32 {
    5
}

fn default_exa_timeout_secs() -> u64 {
    30
}

fn default_perplexity_model() -> String {
    "llama-3.1-sonar-small-128k-online".to_string()
}

fn default_perplexity_timeout_secs() -> u64 {
    45
}

fn default_index_path() -> String {
    ".ragflow/index.json".to_string()
}

fn default_top_k() -> usize {
    2
}

fn default_chunk_size() -> usize {
    1000
}

fn default_chunk_overlap() -> usize {
    200
}
