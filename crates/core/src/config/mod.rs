//! Configuration loading and management.
//!
//! Loads `.ragflow/config.toml`, prompt overrides from `.ragflow/prompts/`
//! and API keys from the environment.

pub mod error;
pub mod loader;
pub mod models;
