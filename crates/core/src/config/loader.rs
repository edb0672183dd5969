//! Configuration file loader for the `.ragflow/` directory structure.
//!
//! This module loads:
//! - `config.toml`: Global settings
//! - `prompts/*.md`: Stage instruction overrides with YAML front matter
//!
//! API keys are read from the environment, never from disk.

use crate::config::error::ConfigError;
use crate::config::error::ConfigResult;
use crate::config::models::{
    ragflow_dir, AppConfig, PromptFrontMatter, PromptTemplate, Secrets, EXA_API_KEY,
    OPENAI_API_KEY, OPENAI_BASE_URL, PERPLEXITY_API_KEY,
};
use gray_matter::engine::YAML;
use gray_matter::Matter;
use rf_protocol::config_models::GlobalConfig;
use std::path::Path;
use walkdir::WalkDir;

/// Loads all configuration for the project at `root`.
///
/// # Arguments
///
/// * `root` - Root directory containing the `.ragflow/` folder
///
/// # Returns
///
/// An `AppConfig` with defaults for anything missing. A missing `.ragflow/`
/// directory is not an error.
///
/// # Errors
///
/// Returns `ConfigError` if:
/// - Files exist but cannot be read
/// - `config.toml` or a prompt's front matter has invalid syntax
/// - Settings are out of range
pub async fn load_config(root: &Path) -> ConfigResult<AppConfig> {
    load_config_with_env(root, |key| std::env::var(key).ok())
}

/// Same as [`load_config`], with the environment lookup injected.
pub fn load_config_with_env<F>(root: &Path, env: F) -> ConfigResult<AppConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let rf_dir = ragflow_dir(root);
    let env = |key: &str| env(key).filter(|value| !value.trim().is_empty());

    let (mut global, prompts) = if rf_dir.exists() {
        (load_global_config(&rf_dir)?, load_prompts(&rf_dir)?)
    } else {
        (GlobalConfig::default(), Vec::new())
    };

    if let Some(base_url) = env(OPENAI_BASE_URL) {
        global.llm.base_url = base_url;
    }

    Ok(AppConfig {
        root: root.to_path_buf(),
        global,
        prompts,
        secrets: Secrets {
            openai_api_key: env(OPENAI_API_KEY),
            exa_api_key: env(EXA_API_KEY),
            perplexity_api_key: env(PERPLEXITY_API_KEY),
        },
    })
}

/// Loads global configuration from `config.toml`.
fn load_global_config(rf_dir: &Path) -> ConfigResult<GlobalConfig> {
    let config_path = rf_dir.join("config.toml");

    if !config_path.exists() {
        return Ok(GlobalConfig::default());
    }

    let content =
        std::fs::read_to_string(&config_path).map_err(|source| ConfigError::Read {
            path: config_path.clone(),
            source,
        })?;

    let config: GlobalConfig =
        toml::from_str(&content).map_err(|source| ConfigError::Toml {
            path: config_path.clone(),
            source,
        })?;

    validate(&config, &config_path)?;
    Ok(config)
}

fn validate(config: &GlobalConfig, path: &Path) -> ConfigResult<()> {
    let invalid = |reason: String| ConfigError::Invalid {
        path: path.to_path_buf(),
        reason,
    };

    let index = &config.index;
    if index.chunk_size == 0 {
        return Err(invalid("index.chunk_size must be positive".to_string()));
    }
    if index.chunk_overlap >= index.chunk_size {
        return Err(invalid(format!(
            "index.chunk_overlap ({}) must be smaller than index.chunk_size ({})",
            index.chunk_overlap, index.chunk_size
        )));
    }
    if index.top_k == 0 {
        return Err(invalid("index.top_k must be positive".to_string()));
    }
    if !(0.0..=2.0).contains(&config.llm.temperature) {
        return Err(invalid(format!(
            "llm.temperature ({}) must be between 0 and 2",
            config.llm.temperature
        )));
    }
    Ok(())
}

/// Loads every prompt override from `prompts/*.md`.
fn load_prompts(rf_dir: &Path) -> ConfigResult<Vec<PromptTemplate>> {
    let prompts_dir = rf_dir.join("prompts");

    if !prompts_dir.exists() {
        return Ok(Vec::new());
    }

    let mut prompts = Vec::new();

    for entry in WalkDir::new(&prompts_dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|source| ConfigError::PromptWalk {
            path: prompts_dir.clone(),
            source,
        })?;

        let path = entry.path();
        if path.extension().and_then(|s| s.to_str()) != Some("md") {
            continue;
        }

        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        prompts.push(parse_prompt_template(path, &content)?);
    }

    Ok(prompts)
}

/// Parse one prompt template. `path` is only used for error reporting.
pub fn parse_prompt_template(path: &Path, content: &str) -> ConfigResult<PromptTemplate> {
    let matter = Matter::<YAML>::new();
    let result = matter.parse(content);

    let front: PromptFrontMatter = result
        .data
        .ok_or_else(|| ConfigError::PromptFrontMatter {
            path: path.to_path_buf(),
            reason: "Missing YAML front matter".to_string(),
        })?
        .deserialize()
        .map_err(|e| ConfigError::PromptFrontMatter {
            path: path.to_path_buf(),
            reason: format!("Failed to deserialize front matter: {}", e),
        })?;

    let instruction = result.content.trim().to_string();
    if instruction.is_empty() {
        return Err(ConfigError::PromptFrontMatter {
            path: path.to_path_buf(),
            reason: "Prompt body is empty".to_string(),
        });
    }

    Ok(PromptTemplate {
        agent: front.agent,
        description: front.description,
        instruction,
    })
}
