//! # rf-protocol
//!
//! Core protocol definitions and data models for ragflow.
//!
//! This crate defines all shared data structures used for:
//! - Configuration file parsing (`.ragflow/config.toml`)
//! - Observable pipeline run state
//! - Communication between the TUI/CLI and the core orchestrator
//!
//! ## Modules
//!
//! - [`agent_models`]: Stage identifiers and research modes
//! - [`config_models`]: Global configuration from config.toml
//! - [`run_models`]: Run status, router decision and run snapshots
//! - [`ipc`]: Operations and Events for front-end/core communication
//!
//! ## Design Principles
//!
//! - Minimal dependencies: serde, ts-rs, uuid and chrono
//! - TypeScript generation: all types derive `TS` for client compatibility
//! - Independent compilation: no dependencies on other ragflow crates

pub mod agent_models;
pub mod config_models;
pub mod ipc;
pub mod run_models;

// Re-export all public types for convenience
pub use agent_models::*;
pub use config_models::*;
pub use ipc::*;
pub use run_models::*;
