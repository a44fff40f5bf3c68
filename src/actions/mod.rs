//! # Action abstractions.
//!
//! This module provides the handler side of a binding:
//! - [`Action`] - trait for async, cancelable handlers run on admission
//! - [`ActionFn`] - closure-backed action implementation
//! - [`ActionRef`] - shared reference to an action (`Arc<dyn Action<P>>`)

mod action;
mod action_fn;

pub use action::{Action, ActionRef};
pub use action_fn::ActionFn;
