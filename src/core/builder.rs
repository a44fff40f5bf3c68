//! # Engine builder.
//!
//! [`EngineBuilder`] collects configuration, operation loggers and bindings, then
//! freezes them into an immutable [`Engine`]. Bindings are declared fluently:
//!
//! ```text
//! builder.on(events)                          → ActionBuilder
//!        .concurrency(n)                      → global gate ("")
//!        .concurrency_group(name, n, key_fn)  → keyed gate (name)
//!        .bind(action_key, action)            → validate all, register or reject
//! ```
//!
//! Configuration mistakes made along the chain (zero capacity, empty group name)
//! are collected and reported by `bind` together with key and duplicate checks.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use super::config::EngineConfig;
use super::engine::Engine;
use super::registry::Registry;
use crate::{
    actions::ActionRef,
    admission::{AdmissionSet, KeyFnRef},
    error::{ConfigViolation, RegistrationError},
    keys::{ActionKey, EventKey},
    loggers::{LoggerSet, OperationLogger},
};

/// Builder for constructing an [`Engine`].
pub struct EngineBuilder<P> {
    cfg: EngineConfig,
    registry: Registry<P>,
    loggers: Vec<Arc<dyn OperationLogger>>,
}

impl<P> EngineBuilder<P>
where
    P: Send + Sync + 'static,
{
    /// Creates a new builder with the given configuration.
    pub fn new(cfg: EngineConfig) -> Self {
        Self {
            cfg,
            registry: Registry::new(),
            loggers: Vec::new(),
        }
    }

    /// Replaces the configuration.
    pub fn with_config(mut self, cfg: EngineConfig) -> Self {
        self.cfg = cfg;
        self
    }

    /// Sets the operation loggers.
    ///
    /// Each logger gets a dedicated worker and bounded queue once the engine is built.
    pub fn with_loggers(mut self, loggers: Vec<Arc<dyn OperationLogger>>) -> Self {
        self.loggers = loggers;
        self
    }

    /// Adds one operation logger.
    pub fn with_logger(mut self, logger: Arc<dyn OperationLogger>) -> Self {
        self.loggers.push(logger);
        self
    }

    /// Starts a binding for `events`.
    ///
    /// Nothing is registered until [`ActionBuilder::bind`] succeeds.
    pub fn on<I, K>(&mut self, events: I) -> ActionBuilder<'_, P>
    where
        I: IntoIterator<Item = K>,
        K: Into<EventKey>,
    {
        ActionBuilder {
            registry: &mut self.registry,
            events: events.into_iter().map(Into::into).collect(),
            admission: AdmissionSet::new(),
            violations: Vec::new(),
        }
    }

    /// Registers a prepared admission set directly.
    pub fn register(
        &mut self,
        events: Vec<EventKey>,
        action_key: ActionKey,
        action: ActionRef<P>,
        admission: AdmissionSet<P>,
    ) -> Result<(), RegistrationError> {
        self.registry.register(events, action_key, action, admission)
    }

    /// Returns the bindings registered so far.
    pub fn registry(&self) -> &Registry<P> {
        &self.registry
    }

    /// Builds and returns the engine.
    ///
    /// Must be called inside a Tokio runtime when loggers are configured, since
    /// their workers are spawned here.
    pub fn build(self) -> Arc<Engine<P>> {
        let loggers = if self.loggers.is_empty() {
            LoggerSet::empty()
        } else {
            LoggerSet::new(self.loggers)
        };

        tracing::debug!(
            actions = self.registry.action_count(),
            events = self.registry.event_count(),
            max_concurrent = self.cfg.max_concurrent,
            "engine built"
        );
        Arc::new(Engine::new(self.cfg, self.registry, Arc::new(loggers)))
    }
}

impl<P> std::fmt::Debug for EngineBuilder<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineBuilder")
            .field("cfg", &self.cfg)
            .field("registry", &self.registry)
            .field("loggers", &self.loggers.len())
            .finish()
    }
}

/// Fluent binding of one action to a set of events.
#[must_use = "nothing is registered until `bind` is called"]
pub struct ActionBuilder<'a, P> {
    registry: &'a mut Registry<P>,
    events: Vec<EventKey>,
    admission: AdmissionSet<P>,
    violations: Vec<ConfigViolation>,
}

impl<P> ActionBuilder<'_, P>
where
    P: Send + Sync + 'static,
{
    /// Caps concurrent runs of this action at `capacity`, across all payloads.
    pub fn concurrency(mut self, capacity: usize) -> Self {
        if capacity == 0 {
            self.violations.push(ConfigViolation::ZeroGlobalCapacity);
        } else {
            self.admission.add_global_limit(capacity);
        }
        self
    }

    /// Caps concurrent runs at `capacity` per key that `key_fn` derives from the payload.
    ///
    /// Several groups may be declared; an action runs only if every group admits it.
    /// Declaring the same `name` twice keeps the last one.
    pub fn concurrency_group<F>(mut self, name: impl Into<String>, capacity: usize, key_fn: F) -> Self
    where
        F: Fn(&CancellationToken, &P) -> String + Send + Sync + 'static,
    {
        let name = name.into();
        let mut valid = true;
        if name.is_empty() {
            self.violations.push(ConfigViolation::EmptyGroupName);
            valid = false;
        }
        if capacity == 0 {
            self.violations
                .push(ConfigViolation::ZeroGroupCapacity { group: name.clone() });
            valid = false;
        }
        if valid {
            let key_fn: KeyFnRef<P> = Arc::new(key_fn);
            self.admission.add_group(name, capacity, Some(key_fn));
        }
        self
    }

    /// Validates the whole binding and registers it under `action_key`.
    ///
    /// On failure nothing is registered and every violation is returned.
    pub fn bind(
        self,
        action_key: impl Into<ActionKey>,
        action: ActionRef<P>,
    ) -> Result<(), RegistrationError> {
        let action_key = action_key.into();
        let mut violations = self.registry.validate(&self.events, &action_key);
        violations.extend(self.violations);

        if !violations.is_empty() {
            tracing::debug!(action = %action_key, count = violations.len(), "binding rejected");
            return Err(RegistrationError::Invalid { violations });
        }

        tracing::trace!(action = %action_key, events = self.events.len(), "binding registered");
        self.registry
            .commit(self.events, action_key, action, self.admission);
        Ok(())
    }
}
