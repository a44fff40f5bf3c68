//! # Closure-backed action (`ActionFn`)
//!
//! [`ActionFn`] wraps a closure `F: Fn(CancellationToken, Arc<P>) -> Fut`,
//! producing a fresh future per admitted dispatch.
//!
//! ## Concurrency semantics
//! - Every call creates a **new** future that owns its state.
//! - Invocations may run in parallel; shared state belongs in an explicit `Arc<...>`
//!   captured by the closure.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//! use actionvisor::{ActionFn, ActionRef, ActionError};
//!
//! let a: ActionRef<u64> = ActionFn::arc(|ctx: CancellationToken, n: Arc<u64>| async move {
//!     if ctx.is_cancelled() {
//!         return Err(ActionError::Canceled);
//!     }
//!     let _square = *n * *n;
//!     Ok(())
//! });
//! # let _ = a;
//! ```

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::actions::action::{Action, ActionRef};
use crate::error::ActionError;

/// Function-backed action implementation.
pub struct ActionFn<F> {
    f: F,
}

impl<F> ActionFn<F> {
    /// Creates a new function-backed action.
    ///
    /// Prefer [`ActionFn::arc`] when you immediately need an [`ActionRef`].
    pub fn new(f: F) -> Self {
        Self { f }
    }

    /// Creates the action and returns it as a shared handle (`Arc<dyn Action<P>>`).
    pub fn arc<P, Fut>(f: F) -> ActionRef<P>
    where
        P: Send + Sync + 'static,
        F: Fn(CancellationToken, Arc<P>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), ActionError>> + Send + 'static,
    {
        Arc::new(Self::new(f))
    }
}

#[async_trait]
impl<P, F, Fut> Action<P> for ActionFn<F>
where
    P: Send + Sync + 'static,
    F: Fn(CancellationToken, Arc<P>) -> Fut + Send + Sync + 'static, // Fn, not FnMut
    Fut: Future<Output = Result<(), ActionError>> + Send + 'static,
{
    async fn run(&self, ctx: CancellationToken, payload: Arc<P>) -> Result<(), ActionError> {
        (self.f)(ctx, payload).await
    }
}

impl<F> std::fmt::Debug for ActionFn<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionFn").finish_non_exhaustive()
    }
}
