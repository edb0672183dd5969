//! Agent abstraction and invocation.
//!
//! This module provides the collaborator traits, the static stage table,
//! the system instructions and the `AgentInvoker` that runs one stage.

pub mod adapters;
pub mod base;
pub mod factory;
pub mod invoker;
pub mod prompts;
pub mod stage;

pub use base::{
    AgentError, CompletionPurpose, CompletionRequest, DocumentRetriever, InvokeError,
    LanguageModel, ResearchProvider,
};
pub use factory::AgentFactory;
pub use invoker::AgentInvoker;
pub use prompts::PromptBook;
