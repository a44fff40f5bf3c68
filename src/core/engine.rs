//! # Dispatch engine.
//!
//! [`Engine`] routes an event to every action bound to it, asks each action's
//! admission set (and the optional engine-wide gate) for a permit, and spawns the
//! admitted actions on the current Tokio runtime.
//!
//! ## Architecture
//! ```text
//! send(ctx, event, payload)
//!     │
//!     ├─► registry.bindings(event)          (registration order)
//!     │       └─ none → no_action_bound, return false
//!     │
//!     └─► per binding:
//!           admission.try_acquire_all(ctx, payload)
//!             ├─ denied → admission_denied, next binding
//!             └─ granted
//!                  engine_gate.try_acquire_all()      (only when max_concurrent > 0)
//!                    ├─ denied → action permit dropped (rollback), admission_denied
//!                    └─ granted → permits merged
//!                         tracker.spawn_on(run_admitted(...), runtime)
//!                           ├─ no runtime → permit released, action_spawn_failed
//!                           └─ action_spawned
//! ```
//!
//! ## Rules
//! - `send` never blocks and never waits for an action.
//! - Denied actions are skipped for this event only; nothing is queued or retried.
//! - Every spawned action is tracked, so [`Engine::drain`] can wait for them.
//! - Drains may overlap: the tracker is closed by the first drain to start and
//!   reopened by the last one to finish.
//! - The engine never cancels an action; cancellation belongs to the caller's context.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::time;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::Instrument;

use super::builder::EngineBuilder;
use super::config::EngineConfig;
use super::dispatch::{Admission, Dispatch};
use super::registry::{Binding, Registry};
use super::runner::{Admitted, run_admitted};
use crate::{
    admission::{AdmissionDenied, AdmissionPermit, AdmissionSet, KeyedSemaphore},
    error::RuntimeError,
    keys::{ActionKey, EventKey},
    loggers::LoggerSet,
    operations::{Operation, OperationKind, meta},
};

/// Group name reported when the engine-wide limit denies an action.
pub const ENGINE_GROUP: &str = "engine";

/// Immutable, shareable event-to-action dispatcher.
///
/// Built once by [`EngineBuilder`]; cheap to share behind the returned `Arc`.
pub struct Engine<P> {
    cfg: EngineConfig,
    registry: Registry<P>,
    engine_gate: AdmissionSet<P>,
    loggers: Arc<LoggerSet>,
    tracker: TaskTracker,
    drains: Mutex<usize>,
}

impl<P> Engine<P>
where
    P: Send + Sync + 'static,
{
    /// Starts building an engine with default configuration.
    pub fn builder() -> EngineBuilder<P> {
        EngineBuilder::new(EngineConfig::default())
    }

    pub(crate) fn new(cfg: EngineConfig, registry: Registry<P>, loggers: Arc<LoggerSet>) -> Self {
        let mut engine_gate = AdmissionSet::new();
        if let Some(limit) = cfg.concurrency_limit() {
            engine_gate.add_group(ENGINE_GROUP, limit, None);
        }

        Self {
            cfg,
            registry,
            engine_gate,
            loggers,
            tracker: TaskTracker::new(),
            drains: Mutex::new(0),
        }
    }

    /// Dispatches `event` and returns `true` if at least one action is bound to it.
    ///
    /// `true` does not mean an action ran: every bound action may have been denied.
    /// Use [`Engine::dispatch`] for per-action outcomes.
    pub fn send(&self, ctx: &CancellationToken, event: &str, payload: impl Into<Arc<P>>) -> bool {
        self.dispatch(ctx, event, payload).is_bound()
    }

    /// Dispatches `event` and reports the admission outcome of every bound action.
    ///
    /// Never blocks: denied actions are skipped, admitted actions are spawned and
    /// run concurrently with the caller. `ctx` is handed to each action unchanged.
    pub fn dispatch(
        &self,
        ctx: &CancellationToken,
        event: &str,
        payload: impl Into<Arc<P>>,
    ) -> Dispatch {
        let payload = payload.into();
        let event_key = self
            .registry
            .event_key(event)
            .cloned()
            .unwrap_or_else(|| EventKey::from(event));

        let bound = self.registry.actions_for(event).len();
        self.loggers.emit_with(|| {
            Operation::new(OperationKind::EventReceived)
                .with_event(&event_key)
                .with(meta::BOUND, bound.to_string())
        });

        let mut report = Dispatch::new(event_key.clone(), bound);

        if bound == 0 {
            tracing::trace!(event = %event_key, "no action bound");
            self.loggers.emit_with(|| {
                Operation::new(OperationKind::NoActionBound).with_event(&event_key)
            });
            return report;
        }

        for (action_key, binding) in self.registry.bindings(event) {
            let admission = match self.admit(ctx, &payload, binding) {
                Ok(permit) => {
                    self.loggers.emit_with(|| {
                        Operation::new(OperationKind::AdmissionGranted)
                            .with_event(&event_key)
                            .with_action(action_key)
                    });
                    self.spawn(ctx, &event_key, action_key, binding, &payload, permit)
                }
                Err(denied) => {
                    tracing::debug!(
                        event = %event_key,
                        action = %action_key,
                        group = %denied.group,
                        key = %denied.key,
                        "admission denied"
                    );
                    self.loggers.emit_with(|| {
                        Operation::new(OperationKind::AdmissionDenied)
                            .with_event(&event_key)
                            .with_action(action_key)
                            .with_group(&denied.group)
                            .with_key(&denied.key)
                    });
                    Admission::Denied {
                        group: denied.group,
                        key: denied.key,
                    }
                }
            };
            report.push(action_key.clone(), admission);
        }

        report
    }

    /// Acquires the action's own gates, then the engine-wide gate.
    ///
    /// If the engine-wide gate denies, the action's permit is dropped, which
    /// releases everything it acquired.
    fn admit(
        &self,
        ctx: &CancellationToken,
        payload: &P,
        binding: &Binding<P>,
    ) -> Result<AdmissionPermit, AdmissionDenied> {
        let mut permit = binding.admission.try_acquire_all(ctx, payload)?;
        if !self.engine_gate.is_unrestricted() {
            permit.absorb(self.engine_gate.try_acquire_all(ctx, payload)?);
        }
        Ok(permit)
    }

    fn spawn(
        &self,
        ctx: &CancellationToken,
        event: &EventKey,
        action_key: &ActionKey,
        binding: &Binding<P>,
        payload: &Arc<P>,
        permit: AdmissionPermit,
    ) -> Admission {
        let handle = match Handle::try_current() {
            Ok(handle) => handle,
            Err(e) => {
                permit.release();
                tracing::warn!(
                    event = %event,
                    action = %action_key,
                    error = %e,
                    "no tokio runtime; action not spawned"
                );
                self.loggers.emit_with(|| {
                    Operation::new(OperationKind::ActionSpawnFailed)
                        .with_event(event)
                        .with_action(action_key)
                        .with_reason(e.to_string())
                });
                return Admission::SpawnFailed;
            }
        };

        let span = tracing::debug_span!("action", event = %event, action = %action_key);
        let job = Admitted {
            event: event.clone(),
            action_key: action_key.clone(),
            action: Arc::clone(&binding.action),
            ctx: ctx.clone(),
            payload: Arc::clone(payload),
            permit,
            loggers: Arc::clone(&self.loggers),
        };
        // Emitted first so it precedes everything the spawned run reports.
        self.loggers.emit_with(|| {
            Operation::new(OperationKind::ActionSpawned)
                .with_event(event)
                .with_action(action_key)
        });
        self.tracker
            .spawn_on(run_admitted(job).instrument(span), &handle);
        Admission::Granted
    }

    /// Number of spawned actions that have not finished yet.
    pub fn in_flight(&self) -> usize {
        self.tracker.len()
    }

    /// Waits until every spawned action has finished, for at most `grace`.
    ///
    /// Actions are not cancelled; on timeout they keep running and
    /// [`RuntimeError::GraceExceeded`] reports how many are left. The engine keeps
    /// accepting events while draining.
    ///
    /// Concurrent drains (including [`Engine::shutdown`]) each wait with their own
    /// grace period.
    pub async fn drain(&self, grace: Duration) -> Result<(), RuntimeError> {
        let waited = {
            let _draining = Draining::enter(&self.tracker, &self.drains);
            time::timeout(grace, self.tracker.wait()).await
        };

        match waited {
            Ok(()) => Ok(()),
            Err(_elapsed) => {
                let in_flight = self.tracker.len();
                tracing::warn!(?grace, in_flight, "drain grace exceeded");
                Err(RuntimeError::GraceExceeded { grace, in_flight })
            }
        }
    }

    /// Drains running actions for the configured grace period, then flushes and
    /// stops the operation loggers.
    ///
    /// Loggers are stopped even when the grace period is exceeded.
    pub async fn shutdown(&self) -> Result<(), RuntimeError> {
        let res = self.drain(self.cfg.grace).await;
        self.loggers.shutdown().await;
        res
    }

    /// Returns the engine configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.cfg
    }

    /// Returns the binding registry.
    pub fn registry(&self) -> &Registry<P> {
        &self.registry
    }

    /// Returns the operation logger set.
    pub fn loggers(&self) -> &LoggerSet {
        &self.loggers
    }

    /// Returns the engine-wide gate, if `max_concurrent` is set.
    pub fn engine_gate(&self) -> Option<&KeyedSemaphore> {
        self.engine_gate.group(ENGINE_GROUP)
    }
}

/// Keeps the tracker closed while at least one drain is waiting.
///
/// Released on drop, so a cancelled drain future still reopens the tracker.
struct Draining<'a> {
    tracker: &'a TaskTracker,
    drains: &'a Mutex<usize>,
}

impl<'a> Draining<'a> {
    fn enter(tracker: &'a TaskTracker, drains: &'a Mutex<usize>) -> Self {
        let mut active = drains.lock().unwrap_or_else(PoisonError::into_inner);
        if *active == 0 {
            tracker.close();
        }
        *active += 1;
        drop(active);
        Self { tracker, drains }
    }
}

impl Drop for Draining<'_> {
    fn drop(&mut self) {
        let mut active = self.drains.lock().unwrap_or_else(PoisonError::into_inner);
        *active = active.saturating_sub(1);
        if *active == 0 {
            self.tracker.reopen();
        }
    }
}

impl<P> std::fmt::Debug for Engine<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("cfg", &self.cfg)
            .field("registry", &self.registry)
            .field("in_flight", &self.tracker.len())
            .finish_non_exhaustive()
    }
}
