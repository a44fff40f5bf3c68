//! # Admission control.
//!
//! Non-blocking, try-only concurrency gates used by the engine before it spawns an action.
//!
//! - [`KeyedSemaphore`] - capacity-N gate partitioned by a string key
//! - [`AdmissionSet`] - all-or-nothing composite of named gates guarding one action
//! - [`AdmissionPermit`] - held slots of one admitted request; releases on drop
//! - [`KeyFn`] - derives a partition key from a dispatch payload
//!
//! Denied requests are never queued or retried.

mod key_fn;
mod keyed;
mod set;

pub use key_fn::{KeyFn, KeyFnRef};
pub use keyed::KeyedSemaphore;
pub use set::{AdmissionDenied, AdmissionPermit, AdmissionSet, GLOBAL_GROUP};
