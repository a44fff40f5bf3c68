//! # actionvisor
//!
//! **Actionvisor** is an in-process event-to-action dispatcher for Tokio.
//!
//! Actions are bound to named events. Sending an event runs every bound action
//! concurrently with the caller, but only if the action's concurrency gates admit
//! it *right now*: admission never waits, and a denied action is simply skipped
//! for that event.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!  EngineBuilder
//!   ├─ on(["user.created", "user.updated"])
//!   │    .concurrency(8)                                   gate ""     (8 total)
//!   │    .concurrency_group("user", 1, |_, p| p.user())    gate "user" (1 per user)
//!   │    .bind("sync-profile", action)
//!   └─ build() ──► Arc<Engine>  (immutable)
//!
//! ┌──────────────────────────────────────────────────────────────────┐
//! │  Engine                                                          │
//! │  - Registry      (event → actions, action → admission set)       │
//! │  - engine gate   (EngineConfig::max_concurrent, optional)        │
//! │  - TaskTracker   (every spawned action, for drain/shutdown)      │
//! │  - LoggerSet     (fans operations out to operation loggers)      │
//! └──────┬───────────────────────────────────────────────────────────┘
//!        │ send(ctx, event, payload)
//!        ▼
//!   per bound action (registration order):
//!     AdmissionSet::try_acquire_all ──► engine gate ──► spawn run_admitted
//!        │ denied: skip                  │ denied: rollback, skip
//!        ▼
//!   run_admitted: action.run(ctx, payload) ─► outcome ─► permit.release()
//! ```
//!
//! ### Operations
//! Every step is reported to the configured [`OperationLogger`]s as an [`Operation`]:
//! ```text
//! event_received ─┬─ no_action_bound
//!                 └─ admission_denied | admission_granted ─┬─ action_spawn_failed
//!                                                          └─ action_spawned ─► action_started
//!                      ─► action_completed | action_failed | action_panicked ─► admission_released
//! ```
//!
//! ## Features
//! | Area           | Description                                                     | Key types / traits                              |
//! |----------------|-----------------------------------------------------------------|-------------------------------------------------|
//! | **Actions**    | Async, cancelable handlers bound to events.                     | [`Action`], [`ActionFn`], [`ActionRef`]         |
//! | **Admission**  | Non-blocking global and keyed concurrency gates.                | [`AdmissionSet`], [`KeyedSemaphore`], [`KeyFn`] |
//! | **Dispatch**   | Event routing, per-action outcome reports, drain and shutdown.  | [`Engine`], [`Dispatch`], [`Admission`]         |
//! | **Operations** | Hook into the dispatch lifecycle (audit, metrics, logging).     | [`OperationLogger`], [`Operation`]              |
//! | **Errors**     | Typed errors for actions, registration and the engine.          | [`ActionError`], [`RegistrationError`]          |
//! | **Config**     | Engine-wide settings.                                           | [`EngineConfig`]                                |
//!
//! ## Optional features
//! - `logging`: exports the built-in [`TracingLogger`] operation logger.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use std::time::Duration;
//! use tokio_util::sync::CancellationToken;
//! use actionvisor::{ActionFn, Engine};
//!
//! struct Signup {
//!     user: String,
//! }
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let welcomed = Arc::new(AtomicUsize::new(0));
//!
//!     let mut builder = Engine::<Signup>::builder();
//!     let counter = Arc::clone(&welcomed);
//!     builder
//!         .on(["user.signed_up"])
//!         .concurrency_group("user", 1, |_ctx, s| s.user.clone())
//!         .bind(
//!             "send-welcome",
//!             ActionFn::arc(move |_ctx: CancellationToken, s: Arc<Signup>| {
//!                 let counter = Arc::clone(&counter);
//!                 async move {
//!                     if !s.user.is_empty() {
//!                         counter.fetch_add(1, Ordering::SeqCst);
//!                     }
//!                     Ok(())
//!                 }
//!             }),
//!         )?;
//!     let engine = builder.build();
//!
//!     let ctx = CancellationToken::new();
//!     assert!(engine.send(&ctx, "user.signed_up", Signup { user: "ada".into() }));
//!     assert!(!engine.send(&ctx, "user.deleted", Signup { user: "ada".into() }));
//!
//!     engine.drain(Duration::from_secs(1)).await?;
//!     assert_eq!(welcomed.load(Ordering::SeqCst), 1);
//!     Ok(())
//! }
//! ```

mod actions;
mod admission;
mod core;
mod error;
mod keys;
mod loggers;
mod operations;

// ---- Public re-exports ----

pub use actions::{Action, ActionFn, ActionRef};
pub use admission::{
    AdmissionDenied, AdmissionPermit, AdmissionSet, GLOBAL_GROUP, KeyFn, KeyFnRef, KeyedSemaphore,
};
pub use crate::core::{
    ActionBuilder, Admission, Dispatch, ENGINE_GROUP, Engine, EngineBuilder, EngineConfig,
    Registry,
};
pub use error::{ActionError, ConfigViolation, RegistrationError, RuntimeError};
pub use keys::{ActionKey, EventKey};
pub use loggers::{LoggerSet, OperationLogger};
pub use operations::{Operation, OperationKind, meta};

// Optional: expose the built-in tracing logger.
#[cfg(feature = "logging")]
pub use loggers::TracingLogger;
