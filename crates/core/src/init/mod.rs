//! `ragflow init`: scaffolds `.ragflow/` from the templates embedded in the
//! binary.
//!
//! `config.toml` is always written. Unless `minimal` is set, every stage
//! instruction is also copied to `prompts/<agent>.md` for editing.
//!
//! ```no_run
//! use rf_core::init::{generate_ragflow_structure, InitOptions};
//!
//! # async fn scaffold() -> rf_core::init::InitResult<()> {
//! let written = generate_ragflow_structure(InitOptions {
//!     target_dir: ".".into(),
//!     force: false,
//!     minimal: true,
//! })
//! .await?;
//! assert_eq!(written.len(), 1);
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod generator;
pub mod templates;

pub use error::{InitError, InitResult};
pub use generator::{generate_ragflow_structure, InitOptions};
pub use templates::{get_template, list_templates};
