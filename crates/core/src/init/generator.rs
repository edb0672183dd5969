//! File generation for `.ragflow/` initialization.

use super::error::{InitError, InitResult};
use super::templates::{get_template, list_templates};
use crate::config::models::ragflow_dir;
use std::fs;
use std::path::{Path, PathBuf};

/// Options for initializing a `.ragflow` directory.
#[derive(Debug, Clone)]
pub struct InitOptions {
    /// Project root where `.ragflow` will be created.
    pub target_dir: PathBuf,

    /// Overwrite existing files.
    pub force: bool,

    /// Only write `config.toml`; stages use the embedded prompts.
    pub minimal: bool,
}

/// Generate a `.ragflow` directory with the embedded templates.
///
/// ```text
/// .ragflow/
/// ├── config.toml
/// └── prompts/          (unless minimal)
///     ├── router-agent.md
///     └── ...
/// ```
///
/// Returns the paths written, in order.
///
/// # Errors
/// - `InitError::AlreadyInitialized` if `config.toml` exists and `force` is unset
/// - `InitError::TemplateNotFound` if an embedded asset is missing
/// - File system failures
pub async fn generate_ragflow_structure(options: InitOptions) -> InitResult<Vec<PathBuf>> {
    let rf_dir = ragflow_dir(&options.target_dir);

    if rf_dir.join("config.toml").exists() && !options.force {
        return Err(InitError::AlreadyInitialized(rf_dir));
    }

    let mut templates = vec!["config.toml".to_string()];
    if !options.minimal {
        templates.extend(list_templates("prompts/"));
    }

    templates
        .iter()
        .map(|template| write_template_file(&rf_dir, template))
        .collect()
}

fn write_template_file(rf_dir: &Path, template_path: &str) -> InitResult<PathBuf> {
    let content = get_template(template_path)
        .ok_or_else(|| InitError::TemplateNotFound(template_path.to_string()))?;

    let target_path = rf_dir.join(template_path);

    if let Some(parent) = target_path.parent() {
        fs::create_dir_all(parent).map_err(|source| InitError::DirectoryCreate {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    fs::write(&target_path, content).map_err(|source| InitError::FileWrite {
        path: target_path.clone(),
        source,
    })?;

    Ok(target_path)
}
