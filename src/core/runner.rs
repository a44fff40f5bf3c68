//! # Run one admitted action.
//!
//! Executes a single admitted action inside its spawned task, reports its outcome,
//! and gives the admission back.
//!
//! ## Operation flow
//!
//! ```text
//! Success / graceful cancel:
//!   action_started → action.run() → Ok(()) | Err(Canceled) → action_completed
//!
//! Failure:
//!   action_started → action.run() → Err(Failed | Fatal)     → action_failed
//!
//! Panic:
//!   action_started → action.run() panics (caught)            → action_panicked
//!
//! Always last:
//!   permit.release() → admission_released
//! ```
//!
//! ## Rules
//! - Exactly one terminal operation per run.
//! - The permit is released on every path, panics included, before `admission_released` is emitted.
//! - The action receives the caller's context unchanged; the engine never cancels it.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tokio_util::sync::CancellationToken;

use crate::{
    actions::ActionRef,
    admission::AdmissionPermit,
    error::{ActionError, panic_message},
    keys::{ActionKey, EventKey},
    loggers::LoggerSet,
    operations::{Operation, OperationKind, meta},
};

/// Everything one spawned run needs, moved into the task.
pub(crate) struct Admitted<P> {
    pub(crate) event: EventKey,
    pub(crate) action_key: ActionKey,
    pub(crate) action: ActionRef<P>,
    pub(crate) ctx: CancellationToken,
    pub(crate) payload: Arc<P>,
    pub(crate) permit: AdmissionPermit,
    pub(crate) loggers: Arc<LoggerSet>,
}

/// How a run ended.
#[derive(Debug)]
enum Outcome {
    Completed,
    Failed(ActionError),
    Panicked(String),
}

/// Runs the action, reports the outcome, releases the admission.
pub(crate) async fn run_admitted<P>(job: Admitted<P>)
where
    P: Send + Sync + 'static,
{
    let Admitted {
        event,
        action_key,
        action,
        ctx,
        payload,
        permit,
        loggers,
    } = job;

    loggers.emit_with(|| {
        Operation::new(OperationKind::ActionStarted)
            .with_event(&event)
            .with_action(&action_key)
    });

    let outcome = match AssertUnwindSafe(action.run(ctx, payload))
        .catch_unwind()
        .await
    {
        Ok(Ok(())) => Outcome::Completed,
        Ok(Err(e)) if e.is_graceful() => Outcome::Completed,
        Ok(Err(e)) => Outcome::Failed(e),
        Err(panic_err) => Outcome::Panicked(panic_message(panic_err.as_ref())),
    };

    match &outcome {
        Outcome::Completed => {
            tracing::trace!(event = %event, action = %action_key, "action completed");
            loggers.emit_with(|| {
                Operation::new(OperationKind::ActionCompleted)
                    .with_event(&event)
                    .with_action(&action_key)
            });
        }
        Outcome::Failed(e) => {
            tracing::debug!(
                event = %event,
                action = %action_key,
                error = %e,
                label = e.as_label(),
                "action failed"
            );
            loggers.emit_with(|| {
                Operation::new(OperationKind::ActionFailed)
                    .with_event(&event)
                    .with_action(&action_key)
                    .with(meta::ERROR, e.as_label())
                    .with_reason(e.to_string())
            });
        }
        Outcome::Panicked(msg) => {
            tracing::error!(event = %event, action = %action_key, panic = %msg, "action panicked");
            loggers.emit_with(|| {
                Operation::new(OperationKind::ActionPanicked)
                    .with_event(&event)
                    .with_action(&action_key)
                    .with_reason(msg)
            });
        }
    }

    permit.release();
    loggers.emit_with(|| {
        Operation::new(OperationKind::AdmissionReleased)
            .with_event(&event)
            .with_action(&action_key)
    });
}
