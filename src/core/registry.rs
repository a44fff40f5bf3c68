//! # Binding registry.
//!
//! Maps event keys to the ordered list of action keys bound to them, and each
//! action key to its action and admission set.
//!
//! ## Architecture
//! ```text
//! triggers: EventKey  ──► [ActionKey, ActionKey, ...]   (insertion order, no duplicates)
//! actions:  ActionKey ──► Binding { action, admission }
//! ```
//!
//! ## Rules
//! - The registry is only mutable through [`EngineBuilder`](crate::EngineBuilder);
//!   `build()` moves it into an immutable [`Engine`](crate::Engine), so registration
//!   can never interleave with dispatch.
//! - `register` validates first and commits only when no violation was found.
//! - An action key owns exactly one action and one admission set; registering it twice is rejected.

use std::collections::HashMap;

use crate::{
    actions::ActionRef,
    admission::AdmissionSet,
    error::{ConfigViolation, RegistrationError},
    keys::{ActionKey, EventKey},
};

/// An action together with the admission set guarding it.
pub(crate) struct Binding<P> {
    pub(crate) action: ActionRef<P>,
    pub(crate) admission: AdmissionSet<P>,
}

/// Event → actions and action → (action, admission set) tables.
pub struct Registry<P> {
    triggers: HashMap<EventKey, Vec<ActionKey>>,
    actions: HashMap<ActionKey, Binding<P>>,
}

impl<P> Registry<P>
where
    P: Send + Sync + 'static,
{
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            triggers: HashMap::new(),
            actions: HashMap::new(),
        }
    }

    /// Binds `action` under `action_key` to every event in `events`.
    ///
    /// Either fully applies or, on any violation, changes nothing and returns all violations.
    pub fn register(
        &mut self,
        events: Vec<EventKey>,
        action_key: ActionKey,
        action: ActionRef<P>,
        admission: AdmissionSet<P>,
    ) -> Result<(), RegistrationError> {
        let violations = self.validate(&events, &action_key);
        if !violations.is_empty() {
            return Err(RegistrationError::Invalid { violations });
        }
        self.commit(events, action_key, action, admission);
        Ok(())
    }

    /// Checks keys and action-key uniqueness without touching the tables.
    pub(crate) fn validate(&self, events: &[EventKey], action_key: &ActionKey) -> Vec<ConfigViolation> {
        let mut violations = Vec::new();

        if action_key.is_empty() {
            violations.push(ConfigViolation::MissingActionKey);
        } else if self.actions.contains_key(action_key) {
            violations.push(ConfigViolation::DuplicateAction {
                action: action_key.to_string(),
            });
        }

        if events.is_empty() {
            violations.push(ConfigViolation::NoEventKeys);
        }
        for (index, event) in events.iter().enumerate() {
            if event.is_empty() {
                violations.push(ConfigViolation::EmptyEventKey { index });
            }
        }

        violations
    }

    /// Applies a validated registration.
    pub(crate) fn commit(
        &mut self,
        events: Vec<EventKey>,
        action_key: ActionKey,
        action: ActionRef<P>,
        admission: AdmissionSet<P>,
    ) {
        for event in events {
            let bound = self.triggers.entry(event).or_default();
            if !bound.contains(&action_key) {
                bound.push(action_key.clone());
            }
        }
        self.actions
            .insert(action_key, Binding { action, admission });
    }

    /// Returns the action keys bound to `event`, in registration order.
    pub fn actions_for(&self, event: &str) -> &[ActionKey] {
        self.triggers.get(event).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Returns the admission set guarding `action`.
    pub fn admission(&self, action: &str) -> Option<&AdmissionSet<P>> {
        self.actions.get(action).map(|b| &b.admission)
    }

    /// Returns `true` if `action` is registered.
    pub fn contains_action(&self, action: &str) -> bool {
        self.actions.contains_key(action)
    }

    /// Returns the number of registered actions.
    pub fn action_count(&self) -> usize {
        self.actions.len()
    }

    /// Returns the number of events with at least one bound action.
    pub fn event_count(&self) -> usize {
        self.triggers.len()
    }

    /// Resolves `event` to its bindings, in registration order.
    pub(crate) fn bindings<'a>(
        &'a self,
        event: &str,
    ) -> impl Iterator<Item = (&'a ActionKey, &'a Binding<P>)> + 'a {
        self.actions_for(event)
            .iter()
            .filter_map(|key| self.actions.get(key).map(|b| (key, b)))
    }

    /// Returns the registry's own copy of `event`, if it is bound.
    pub(crate) fn event_key(&self, event: &str) -> Option<&EventKey> {
        self.triggers.get_key_value(event).map(|(k, _)| k)
    }
}

impl<P> Default for Registry<P>
where
    P: Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<P> std::fmt::Debug for Registry<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("triggers", &self.triggers)
            .field("actions", &self.actions.keys().collect::<Vec<_>>())
            .finish()
    }
}
