//! # Operation logger trait.
//!
//! Each logger gets:
//! - **Dedicated worker task** (runs independently of dispatch)
//! - **Per-logger bounded queue** (capacity via [`OperationLogger::queue_capacity`])
//! - **Panic isolation** (a panicking logger is reported via `tracing` and keeps receiving)
//!
//! ## Rules
//! - A slow logger only affects its own queue.
//! - Queue overflow drops the operation **for this logger only**.
//! - Operations are processed sequentially (FIFO) per logger.
//! - Loggers never block `send` or the actions themselves.

use async_trait::async_trait;

use crate::operations::Operation;

/// Receives dispatch lifecycle operations for observability.
///
/// ### Implementation requirements
/// - Use async I/O; avoid blocking the executor.
/// - Handle errors internally; do not panic.
#[async_trait]
pub trait OperationLogger: Send + Sync + 'static {
    /// Processes a single operation.
    ///
    /// Called from a dedicated worker task, never from the `send` caller.
    async fn log_operation(&self, op: &Operation);

    /// Returns the logger name used in diagnostics.
    ///
    /// The default uses `type_name::<Self>()`; override it with something short.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Returns the preferred queue capacity for this logger.
    ///
    /// The engine clamps capacity to a minimum of 1. Default: 1024.
    fn queue_capacity(&self) -> usize {
        1024
    }
}
