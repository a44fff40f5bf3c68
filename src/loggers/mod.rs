//! # Operation loggers.
//!
//! This module provides the [`OperationLogger`] trait, the observability hook of
//! the engine, and the [`LoggerSet`] that fans operations out to every logger.
//!
//! ## Architecture
//! ```text
//! Engine::send / action runner
//!     │  emit(Operation)            (non-blocking, try_send)
//!     ▼
//! LoggerSet ──► [queue 1] ──► worker 1 ──► logger1.log_operation()
//!           ├─► [queue 2] ──► worker 2 ──► logger2.log_operation()
//!           └─► [queue N] ──► worker N ──► loggerN.log_operation()
//! ```
//!
//! With no loggers configured, emitting is a no-op and no record is built.
//!
//! ## Implementing a logger
//! ```no_run
//! use actionvisor::{Operation, OperationLogger};
//! use async_trait::async_trait;
//!
//! struct Audit;
//!
//! #[async_trait]
//! impl OperationLogger for Audit {
//!     async fn log_operation(&self, op: &Operation) {
//!         if op.name() == "admission_denied" {
//!             // count dropped dispatches, etc.
//!         }
//!     }
//!
//!     fn name(&self) -> &'static str { "audit" }
//! }
//! ```

mod logger;
mod set;
#[cfg(feature = "logging")]
mod tracing_logger;

pub use logger::OperationLogger;
pub use set::LoggerSet;
#[cfg(feature = "logging")]
pub use tracing_logger::TracingLogger;
