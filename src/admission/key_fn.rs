//! # Partition key derivation.
//!
//! A [`KeyFn`] derives the partition key of a concurrency group from a dispatch
//! payload. Any `Fn(&CancellationToken, &P) -> String` closure is a `KeyFn`.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//! use actionvisor::{KeyFn, KeyFnRef};
//!
//! struct Job { user: String }
//!
//! let by_user: KeyFnRef<Job> = Arc::new(|_ctx: &CancellationToken, job: &Job| job.user.clone());
//! let job = Job { user: "u1".into() };
//! assert_eq!(by_user.key(&CancellationToken::new(), &job), "u1");
//! ```

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

/// Shared handle to a key function.
pub type KeyFnRef<P> = Arc<dyn KeyFn<P>>;

/// Derives a partition key from a dispatch payload.
pub trait KeyFn<P>: Send + Sync + 'static {
    /// Returns the partition key for `payload`.
    fn key(&self, ctx: &CancellationToken, payload: &P) -> String;
}

impl<P, F> KeyFn<P> for F
where
    F: Fn(&CancellationToken, &P) -> String + Send + Sync + 'static,
{
    fn key(&self, ctx: &CancellationToken, payload: &P) -> String {
        self(ctx, payload)
    }
}
