//! Language model implementations.

mod offline_model;
pub mod openai;

pub use offline_model::OfflineModel;
pub use openai::OpenAiModel;
