//! Errors from `ragflow init`.

use std::path::PathBuf;
use thiserror::Error;

pub type InitResult<T> = Result<T, InitError>;

#[derive(Debug, Error)]
pub enum InitError {
    /// `config.toml` exists and `force` was not given.
    #[error("project already initialized ({}), pass --force to overwrite", .0.display())]
    AlreadyInitialized(PathBuf),

    /// Embedded asset missing from the binary.
    #[error("no embedded template named {0}")]
    TemplateNotFound(String),

    #[error("cannot create {}: {source}", path.display())]
    DirectoryCreate {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("cannot write {}: {source}", path.display())]
    FileWrite {
        path: PathBuf,
        source: std::io::Error,
    },
}
