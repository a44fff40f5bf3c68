//! # Action abstraction.
//!
//! An [`Action`] is the handler executed when an event it is bound to is admitted.
//! It receives the caller's [`CancellationToken`] and the shared dispatch payload.
//!
//! The engine never cancels an action on its own. Its admission slots stay held
//! until `run` returns, so actions should watch the token and return promptly
//! once it is cancelled.

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::ActionError;

/// Shared handle to an action object.
pub type ActionRef<P> = Arc<dyn Action<P>>;

/// # Asynchronous, cancelable handler.
///
/// # Example
/// ```
/// use std::sync::Arc;
/// use tokio_util::sync::CancellationToken;
/// use async_trait::async_trait;
/// use actionvisor::{Action, ActionError};
///
/// struct Greet;
///
/// #[async_trait]
/// impl Action<String> for Greet {
///     async fn run(&self, ctx: CancellationToken, name: Arc<String>) -> Result<(), ActionError> {
///         if ctx.is_cancelled() {
///             return Err(ActionError::Canceled);
///         }
///         println!("hello {name}");
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait Action<P>: Send + Sync + 'static
where
    P: Send + Sync + 'static,
{
    /// Handles one admitted dispatch.
    ///
    /// The returned error is reported through the operation loggers; it never
    /// reaches the sender of the event.
    async fn run(&self, ctx: CancellationToken, payload: Arc<P>) -> Result<(), ActionError>;
}
