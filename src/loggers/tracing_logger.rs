//! # TracingLogger — forwards operations to `tracing`
//!
//! A minimal logger that turns each [`Operation`] into a `tracing` event under
//! the `actionvisor::operations` target. Failures and panics are logged at
//! `WARN`, everything else at `DEBUG`.
//!
//! ## Example output (fmt subscriber)
//! ```text
//! DEBUG actionvisor::operations: operation="event_received" event="user.created"
//! DEBUG actionvisor::operations: operation="admission_denied" event="user.created" action="welcome" group="user" key="u1"
//!  WARN actionvisor::operations: operation="action_failed" event="user.created" action="welcome" error="action_failed" reason="smtp down"
//! ```

use async_trait::async_trait;

use crate::loggers::OperationLogger;
use crate::operations::{Operation, OperationKind, meta};

/// Operation logger backed by `tracing`.
#[derive(Default, Debug)]
pub struct TracingLogger;

impl TracingLogger {
    /// Construct a new [`TracingLogger`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl OperationLogger for TracingLogger {
    async fn log_operation(&self, op: &Operation) {
        let event = op.get(meta::EVENT).unwrap_or_default();
        let action = op.get(meta::ACTION).unwrap_or_default();

        match op.kind {
            OperationKind::ActionFailed
            | OperationKind::ActionPanicked
            | OperationKind::ActionSpawnFailed => {
                tracing::warn!(
                    target: "actionvisor::operations",
                    seq = op.seq,
                    operation = op.name(),
                    event,
                    action,
                    error = op.get(meta::ERROR).unwrap_or_default(),
                    reason = op.get(meta::REASON).unwrap_or_default(),
                );
            }
            OperationKind::AdmissionDenied => {
                tracing::debug!(
                    target: "actionvisor::operations",
                    seq = op.seq,
                    operation = op.name(),
                    event,
                    action,
                    group = op.get(meta::GROUP).unwrap_or_default(),
                    key = op.get(meta::KEY).unwrap_or_default(),
                );
            }
            _ => {
                tracing::debug!(
                    target: "actionvisor::operations",
                    seq = op.seq,
                    operation = op.name(),
                    event,
                    action,
                );
            }
        }
    }

    fn name(&self) -> &'static str {
        "TracingLogger"
    }
}

#[cfg(all(test, feature = "logging"))]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::loggers::LoggerSet;

    const KINDS: [OperationKind; 11] = [
        OperationKind::EventReceived,
        OperationKind::NoActionBound,
        OperationKind::AdmissionGranted,
        OperationKind::AdmissionDenied,
        OperationKind::ActionSpawned,
        OperationKind::ActionSpawnFailed,
        OperationKind::ActionStarted,
        OperationKind::ActionCompleted,
        OperationKind::ActionFailed,
        OperationKind::ActionPanicked,
        OperationKind::AdmissionReleased,
    ];

    fn sample(kind: OperationKind) -> Operation {
        Operation::new(kind)
            .with_event("user.created")
            .with_action("welcome")
            .with_group("user")
            .with_key("u1")
            .with(meta::ERROR, "action_failed")
            .with_reason("smtp down")
    }

    #[tokio::test]
    async fn handles_every_operation_kind() {
        let logger = TracingLogger::new();
        for kind in KINDS {
            logger.log_operation(&sample(kind)).await;
            logger.log_operation(&Operation::new(kind)).await;
        }
        assert_eq!(logger.name(), "TracingLogger");
    }

    #[tokio::test]
    async fn delivers_through_a_logger_set() {
        let logger: Arc<dyn OperationLogger> = Arc::new(TracingLogger::new());
        let set = LoggerSet::new(vec![logger]);
        for kind in KINDS {
            set.emit(sample(kind));
        }
        set.shutdown().await;
        assert_eq!(set.dropped("TracingLogger"), 0);
    }
}
