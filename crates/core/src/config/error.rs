//! Configuration errors.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid TOML in {path}: {source}")]
    Toml {
        path: PathBuf,
        source: toml::de::Error,
    },

    /// A prompt override whose front matter is missing or malformed.
    #[error("bad front matter in prompt {path}: {reason}")]
    PromptFrontMatter { path: PathBuf, reason: String },

    #[error("cannot list prompts under {path}: {source}")]
    PromptWalk {
        path: PathBuf,
        source: walkdir::Error,
    },

    /// Settings that parse but cannot be used together, e.g. a chunk
    /// overlap not smaller than the chunk size.
    #[error("{path}: {reason}")]
    Invalid { path: PathBuf, reason: String },
}

pub type ConfigResult<T> = Result<T, ConfigError>;
