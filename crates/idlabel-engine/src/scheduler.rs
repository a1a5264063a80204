//! Single-slot debounce scheduler
//!
//! At most one pass is pending. Scheduling while a pass is pending pushes
//! its deadline back by the full window and merges the two plans, so a
//! burst of triggers yields one pass.

use idlabel_core::LabelMap;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::Instant;

/// What caused a pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trigger {
    /// Start-up pass
    Initial,
    /// The store delivered a new mapping
    MappingChanged,
    /// Document addition or text change holding an identifier
    Mutation,
    /// Location changed
    Navigation,
    /// Periodic re-scan
    SafetyTimer,
}

/// Work a pass has to do
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PassPlan {
    /// Replacement mapping; the document is cleared first when set
    pub mapping: Option<LabelMap>,
    /// Re-detect location and drop page labels when no longer eligible
    pub navigated: bool,
    /// Distinct triggers folded into this plan, in arrival order
    pub triggers: Vec<Trigger>,
}

impl PassPlan {
    /// Plan for a single trigger
    #[must_use]
    pub fn from_trigger(trigger: Trigger) -> Self {
        Self {
            mapping: None,
            navigated: matches!(trigger, Trigger::Initial | Trigger::Navigation),
            triggers: vec![trigger],
        }
    }

    /// Plan carrying a new mapping
    #[must_use]
    pub fn mapping_changed(mapping: LabelMap) -> Self {
        Self {
            mapping: Some(mapping),
            navigated: false,
            triggers: vec![Trigger::MappingChanged],
        }
    }

    /// Fold a later plan into this one
    pub fn merge(&mut self, later: PassPlan) {
        if later.mapping.is_some() {
            self.mapping = later.mapping;
        }
        self.navigated |= later.navigated;
        for trigger in later.triggers {
            if !self.triggers.contains(&trigger) {
                self.triggers.push(trigger);
            }
        }
    }
}

#[derive(Debug)]
struct Pending {
    deadline: Instant,
    plan: PassPlan,
}

/// Debounce slot
#[derive(Debug)]
pub struct PendingSlot {
    window: Duration,
    pending: Option<Pending>,
}

impl PendingSlot {
    /// Slot with the given debounce window
    #[must_use]
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            pending: None,
        }
    }

    /// Schedule `plan`, replacing the pending deadline
    pub fn schedule(&mut self, plan: PassPlan) {
        let deadline = Instant::now() + self.window;
        match &mut self.pending {
            Some(pending) => {
                pending.deadline = deadline;
                pending.plan.merge(plan);
            }
            None => self.pending = Some(Pending { deadline, plan }),
        }
    }

    /// Deadline of the pending pass
    #[must_use]
    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|p| p.deadline)
    }

    /// Whether a pass is pending
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Take the pending plan, emptying the slot
    pub fn take(&mut self) -> Option<PassPlan> {
        self.pending.take().map(|p| p.plan)
    }
}
