//! Configuration models that aggregate all settings.
//!
//! `AppConfig` combines the project root, global settings from
//! `config.toml`, prompt overrides from `prompts/*.md` and the API keys
//! taken from the environment.

use rf_protocol::config_models::GlobalConfig;
use rf_protocol::ResearchMode;
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};

/// Environment variable holding the language model key.
pub const OPENAI_API_KEY: &str = "OPENAI_API_KEY";
/// Overrides `llm.base_url` when set.
pub const OPENAI_BASE_URL: &str = "OPENAI_BASE_URL";
pub const EXA_API_KEY: &str = "EXA_API_KEY";
pub const PERPLEXITY_API_KEY: &str = "PERPLEXITY_API_KEY";

/// Unified application configuration loaded from the `.ragflow/` directory.
///
/// # Example
///
/// ```rust,no_run
/// use rf_core::config::loader::load_config;
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config(Path::new(".")).await?;
/// println!("model {} with {} prompt overrides",
///          config.global.llm.model,
///          config.prompts.len());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    /// Project root that contains `.ragflow/`.
    pub root: PathBuf,

    /// Global settings from `config.toml`.
    pub global: GlobalConfig,

    /// Prompt overrides loaded from `prompts/*.md`.
    pub prompts: Vec<PromptTemplate>,

    pub secrets: Secrets,
}

impl AppConfig {
    /// Absolute path of the local document index.
    pub fn index_path(&self) -> PathBuf {
        self.root.join(&self.global.index.path)
    }

    /// Research mode for the first run.
    ///
    /// The configured mode, downgraded to `local` when its key is missing.
    pub fn initial_research_mode(&self) -> ResearchMode {
        match self.global.research.mode {
            ResearchMode::Exa if self.secrets.exa_api_key.is_none() => ResearchMode::Local,
            ResearchMode::Perplexity if self.secrets.perplexity_api_key.is_none() => {
                ResearchMode::Local
            }
            mode => mode,
        }
    }

    pub fn ragflow_dir(&self) -> PathBuf {
        ragflow_dir(&self.root)
    }
}

/// The `.ragflow/` directory under `root`.
pub fn ragflow_dir(root: &Path) -> PathBuf {
    root.join(".ragflow")
}

/// API keys. Never read from or written to disk.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Secrets {
    pub openai_api_key: Option<String>,
    pub exa_api_key: Option<String>,
    pub perplexity_api_key: Option<String>,
}

impl fmt::Debug for Secrets {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mask = |key: &Option<String>| if key.is_some() { "<set>" } else { "<unset>" };
        f.debug_struct("Secrets")
            .field("openai_api_key", &mask(&self.openai_api_key))
            .field("exa_api_key", &mask(&self.exa_api_key))
            .field("perplexity_api_key", &mask(&self.perplexity_api_key))
            .finish()
    }
}

/// A system instruction loaded from a Markdown file.
///
/// The front matter names the stage; the body is the instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    /// Stage id, or `prompt-optimizer`.
    pub agent: String,
    pub description: String,
    pub instruction: String,
}

/// Front matter of a prompt template.
#[derive(Debug, Deserialize)]
pub(crate) struct PromptFrontMatter {
    pub agent: String,
    #[serde(default)]
    pub description: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secrets_debug_hides_values() {
        let secrets = Secrets {
            openai_api_key: Some("sk-very-secret".to_string()),
            ..Secrets::default()
        };
        let rendered = format!("{secrets:?}");
        assert!(!rendered.contains("sk-very-secret"));
        assert!(rendered.contains("<set>"));
        assert!(rendered.contains("<unset>"));
    }

    #[test]
    fn test_initial_mode_downgrades_without_key() {
        let mut config = AppConfig::default();
        config.global.research.mode = ResearchMode::Exa;
        assert_eq!(config.initial_research_mode(), ResearchMode::Local);

        config.secrets.exa_api_key = Some("exa".to_string());
        assert_eq!(config.initial_research_mode(), ResearchMode::Exa);
    }

    #[test]
    fn test_index_path_is_under_root() {
        let config = AppConfig {
            root: PathBuf::from("/project"),
            ..AppConfig::default()
        };
        assert_eq!(config.index_path(), PathBuf::from("/project/.ragflow/index.json"));
    }
}
