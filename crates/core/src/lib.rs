//! # rf-core
//!
//! Core orchestrator and agent invocation for ragflow.
//!
//! This crate provides:
//! - Configuration loading from the `.ragflow/` directory
//! - Collaborator traits with OpenAI-compatible, Exa, Perplexity and
//!   local-index implementations
//! - The pipeline engine that runs the router and the simple or complex plan
//! - The orchestrator that owns the single current run
//!
//! ## Modules
//!
//! - [`config`]: Configuration loading and management
//! - [`agents`]: Collaborator traits, stage table, prompts and the invoker
//! - [`research`]: Web research providers
//! - [`index`]: Local document index
//! - [`engine`]: Pipeline execution engine
//! - [`state`]: Run state, cancellation and the orchestrator
//! - [`init`]: `.ragflow/` scaffolding from embedded templates

pub mod agents;
pub mod config;
pub mod engine;
pub mod index;
pub mod init;
pub mod research;
pub mod state;
