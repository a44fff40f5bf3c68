//! # Dispatch report.
//!
//! [`Dispatch`] describes what happened to one event: which actions were bound and,
//! for each, whether it was admitted and spawned.
//!
//! [`Engine::send`](crate::Engine::send) reduces this report to "was anything bound";
//! [`Engine::dispatch`](crate::Engine::dispatch) returns it in full.

use crate::keys::{ActionKey, EventKey};

/// Admission outcome of one bound action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Admission {
    /// Every gate admitted; the action was spawned.
    Granted,
    /// A gate refused; the action was skipped.
    Denied {
        /// Name of the denying group (`""` for the global limit, `"engine"` for the engine-wide limit).
        group: String,
        /// Partition key the payload mapped to in that group.
        key: String,
    },
    /// Admitted, but no runtime was available to spawn on; the admission was released.
    SpawnFailed,
}

impl Admission {
    /// Returns `true` if the action was spawned.
    #[inline]
    pub fn is_granted(&self) -> bool {
        matches!(self, Admission::Granted)
    }
}

/// Per-action outcomes of one dispatched event, in registration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dispatch {
    event: EventKey,
    outcomes: Vec<(ActionKey, Admission)>,
}

impl Dispatch {
    pub(crate) fn new(event: EventKey, capacity: usize) -> Self {
        Self {
            event,
            outcomes: Vec::with_capacity(capacity),
        }
    }

    pub(crate) fn push(&mut self, action: ActionKey, admission: Admission) {
        self.outcomes.push((action, admission));
    }

    /// The dispatched event.
    pub fn event(&self) -> &EventKey {
        &self.event
    }

    /// Returns `true` if at least one action is bound to the event,
    /// whether or not any of them was admitted.
    pub fn is_bound(&self) -> bool {
        !self.outcomes.is_empty()
    }

    /// Number of actions that were admitted and spawned.
    pub fn granted(&self) -> usize {
        self.outcomes.iter().filter(|(_, a)| a.is_granted()).count()
    }

    /// All outcomes, in registration order.
    pub fn outcomes(&self) -> &[(ActionKey, Admission)] {
        &self.outcomes
    }

    /// Outcome for `action`, if it is bound to the event.
    pub fn outcome(&self, action: &str) -> Option<&Admission> {
        self.outcomes
            .iter()
            .find(|(key, _)| key.as_str() == action)
            .map(|(_, a)| a)
    }
}
