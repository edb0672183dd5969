//! Common test utilities shared by the integration tests.
//!
//! - Fixtures: orchestrator harness, sample index and project
//! - Scripted collaborators
//! - Assertions over events and snapshots

pub mod assertions;
pub mod fixtures;
pub mod mock_collaborators;

#[allow(unused_imports)]
pub use assertions::*;
#[allow(unused_imports)]
pub use fixtures::*;
#[allow(unused_imports)]
pub use mock_collaborators::*;
