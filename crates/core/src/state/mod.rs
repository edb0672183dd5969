//! State management for the current pipeline run.
//!
//! This module provides:
//! - The per-run cancellation token
//! - The activity tracker behind loading indicators and the highlight
//! - The guarded run state and its mutation handle
//! - The Orchestrator front-ends drive

pub mod manager;
pub mod run;
pub mod token;
pub mod tracker;
