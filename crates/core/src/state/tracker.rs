//! Loading/activity tracker.

use rf_protocol::AgentId;
use std::collections::BTreeSet;

/// Which stages have an outstanding invocation, plus the single stage the
/// front-end should emphasize.
///
/// Only mutated through the run state lock, so interleaved start/finish
/// calls from one run cannot lose updates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActivityTracker {
    active: BTreeSet<AgentId>,
    highlighted: Option<AgentId>,
}

impl ActivityTracker {
    /// Returns `false` if the stage was already active.
    pub fn mark_started(&mut self, agent: AgentId) -> bool {
        self.active.insert(agent)
    }

    /// Idempotent: finishing an inactive stage is a no-op.
    pub fn mark_finished(&mut self, agent: AgentId) -> bool {
        self.active.remove(&agent)
    }

    /// Drop every loading indicator. Highlight is left to the caller.
    pub fn clear_all(&mut self) {
        self.active.clear();
    }

    pub fn set_highlighted(&mut self, agent: Option<AgentId>) {
        self.highlighted = agent;
    }

    pub fn highlighted(&self) -> Option<AgentId> {
        self.highlighted
    }

    pub fn active(&self) -> &BTreeSet<AgentId> {
        &self.active
    }

    pub fn is_active(&self, agent: AgentId) -> bool {
        self.active.contains(&agent)
    }
}
