//! Embedded template files for `.ragflow/` initialization.
//!
//! The workspace `templates/` directory is embedded at compile time, so both
//! `ragflow init` and the default stage instructions work without any files
//! on disk.

use rust_embed::RustEmbed;

/// Embedded template files from the workspace `templates/` directory.
///
/// With the `debug-embed` feature the files are still compiled in for
/// debug builds, so tests see the same assets as release binaries.
#[derive(RustEmbed)]
#[folder = "$CARGO_MANIFEST_DIR/../../templates"]
pub struct TemplateAssets;

/// Get template file content by path.
///
/// # Arguments
/// * `path` - Relative path from templates root (e.g., "config.toml", "prompts/router-agent.md")
///
/// # Example
/// ```
/// use rf_core::init::templates::get_template;
///
/// let config = get_template("config.toml").expect("config.toml should exist");
/// assert!(config.contains("[llm]"));
/// ```
pub fn get_template(path: &str) -> Option<String> {
    TemplateAssets::get(path).map(|file| String::from_utf8_lossy(file.data.as_ref()).to_string())
}

/// List all template files under `prefix`, sorted.
///
/// # Example
/// ```
/// use rf_core::init::templates::list_templates;
///
/// let prompts = list_templates("prompts/");
/// assert!(prompts.contains(&"prompts/router-agent.md".to_string()));
/// ```
pub fn list_templates(prefix: &str) -> Vec<String> {
    let mut paths: Vec<String> = TemplateAssets::iter()
        .filter(|path| path.starts_with(prefix))
        .map(|path| path.to_string())
        .collect();
    paths.sort();
    paths
}
