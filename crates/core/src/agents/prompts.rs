//! System instructions for every stage.
//!
//! Defaults are the `templates/prompts/*.md` files embedded in the binary.
//! Projects override individual instructions with `.ragflow/prompts/*.md`
//! files using the same front matter.

use crate::config::loader::parse_prompt_template;
use crate::config::models::PromptTemplate;
use crate::init::templates::{get_template, list_templates};
use rf_protocol::AgentId;
use std::collections::HashMap;
use std::path::Path;

/// Used for any stage without an instruction.
pub const DEFAULT_INSTRUCTION: &str = "You are a helpful AI assistant.";

/// Front matter key of the prompt optimizer template.
pub const OPTIMIZER_KEY: &str = "prompt-optimizer";

/// Lookup table from stage to system instruction.
#[derive(Debug, Clone, Default)]
pub struct PromptBook {
    stages: HashMap<AgentId, String>,
    optimizer: Option<String>,
}

impl PromptBook {
    /// Instructions shipped with the binary.
    pub fn embedded() -> Self {
        let mut book = Self::default();
        for path in list_templates("prompts/") {
            let Some(content) = get_template(&path) else {
                continue;
            };
            match parse_prompt_template(Path::new(&path), &content) {
                Ok(template) => {
                    book.insert(&template);
                }
                Err(e) => tracing::warn!(template = %path, error = %e, "skipping embedded prompt"),
            }
        }
        book
    }

    /// Replace instructions with project overrides.
    pub fn with_overrides(mut self, templates: &[PromptTemplate]) -> Self {
        for template in templates {
            if !self.insert(template) {
                tracing::warn!(agent = %template.agent, "prompt override names no known stage");
            }
        }
        self
    }

    /// Set one stage instruction directly.
    pub fn set(&mut self, agent: AgentId, instruction: impl Into<String>) {
        self.stages.insert(agent, instruction.into());
    }

    pub fn instruction(&self, agent: AgentId) -> &str {
        self.stages
            .get(&agent)
            .map_or(DEFAULT_INSTRUCTION, String::as_str)
    }

    pub fn optimizer_instruction(&self) -> &str {
        self.optimizer.as_deref().unwrap_or(DEFAULT_INSTRUCTION)
    }

    fn insert(&mut self, template: &PromptTemplate) -> bool {
        if template.agent == OPTIMIZER_KEY {
            self.optimizer = Some(template.instruction.clone());
            return true;
        }
        match template.agent.parse::<AgentId>() {
            Ok(agent) => {
                self.stages.insert(agent, template.instruction.clone());
                true
            }
            Err(_) => false,
        }
    }
}
