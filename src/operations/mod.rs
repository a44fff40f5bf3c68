//! Operation records: what the engine reports to operation loggers.
//!
//! ## Contents
//! - [`OperationKind`] classification of dispatch lifecycle steps
//! - [`Operation`] one record: kind, string metadata, sequence number, timestamp
//! - [`meta`] well-known metadata keys
//!
//! ## Quick reference
//! ```text
//! send(event)
//!   ├─► event_received
//!   ├─► no_action_bound                        (nothing listening)
//!   └─► per bound action:
//!         ├─► admission_denied                 (terminal)
//!         └─► admission_granted
//!               ├─► action_spawn_failed        (no runtime; admission released)
//!               └─► action_spawned
//!                     └─► action_started
//!                           ├─► action_completed | action_failed | action_panicked
//!                           └─► admission_released
//! ```

mod operation;

pub use operation::{Operation, OperationKind, meta};
