//! Error types used by the actionvisor engine and actions.
//!
//! This module defines the error enums of the crate:
//!
//! - [`ActionError`] — errors returned by individual action executions.
//! - [`ConfigViolation`] / [`RegistrationError`] — problems found while binding actions.
//! - [`RuntimeError`] — errors raised by the engine itself.
//!
//! Each type provides a stable `as_label` for logging and metrics.

use std::time::Duration;
use thiserror::Error;

/// # Errors produced by action execution.
///
/// Returned by [`Action::run`](crate::Action::run). The engine never propagates
/// these to the caller of `send`; they are surfaced through the operation loggers
/// and `tracing` instead.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ActionError {
    /// Action failed.
    #[error("execution failed: {error}")]
    Failed {
        /// The underlying error message.
        error: String,
    },

    /// Non-recoverable error; reported with a distinct label.
    #[error("fatal error: {error}")]
    Fatal {
        /// The underlying error message.
        error: String,
    },

    /// Action observed cancellation of its context and stopped early.
    #[error("context cancelled")]
    Canceled,
}

impl ActionError {
    /// Shorthand for [`ActionError::Failed`].
    pub fn failed(error: impl Into<String>) -> Self {
        ActionError::Failed {
            error: error.into(),
        }
    }

    /// Shorthand for [`ActionError::Fatal`].
    pub fn fatal(error: impl Into<String>) -> Self {
        ActionError::Fatal {
            error: error.into(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use actionvisor::ActionError;
    ///
    /// let err = ActionError::failed("boom");
    /// assert_eq!(err.as_label(), "action_failed");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            ActionError::Failed { .. } => "action_failed",
            ActionError::Fatal { .. } => "action_fatal",
            ActionError::Canceled => "action_canceled",
        }
    }

    /// `Canceled` counts as a graceful stop rather than a failure.
    pub fn is_graceful(&self) -> bool {
        matches!(self, ActionError::Canceled)
    }
}

/// A single problem found while validating one registration.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigViolation {
    /// The action key is empty.
    #[error("action key must be provided")]
    MissingActionKey,

    /// No event keys were listed for the action.
    #[error("at least one event key must be provided")]
    NoEventKeys,

    /// An event key in the list is empty.
    #[error("event key at position {index} is empty")]
    EmptyEventKey {
        /// Position of the empty key in the list.
        index: usize,
    },

    /// The global limit was configured with capacity 0.
    #[error("global concurrency limit must be greater than 0")]
    ZeroGlobalCapacity,

    /// A named group was configured with capacity 0.
    #[error("concurrency group '{group}': capacity must be greater than 0")]
    ZeroGroupCapacity {
        /// Group name.
        group: String,
    },

    /// A named group was configured with an empty name.
    #[error("concurrency group name must be provided")]
    EmptyGroupName,

    /// An action with the same key is already registered.
    #[error("action '{action}' is already registered")]
    DuplicateAction {
        /// The conflicting action key.
        action: String,
    },
}

impl ConfigViolation {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            ConfigViolation::MissingActionKey => "missing_action_key",
            ConfigViolation::NoEventKeys => "no_event_keys",
            ConfigViolation::EmptyEventKey { .. } => "empty_event_key",
            ConfigViolation::ZeroGlobalCapacity => "zero_global_capacity",
            ConfigViolation::ZeroGroupCapacity { .. } => "zero_group_capacity",
            ConfigViolation::EmptyGroupName => "empty_group_name",
            ConfigViolation::DuplicateAction { .. } => "duplicate_action",
        }
    }
}

/// # Aggregate registration failure.
///
/// Carries every [`ConfigViolation`] found in one registration attempt.
/// A failed registration leaves the registry untouched.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistrationError {
    /// One or more violations were found.
    #[error("registration rejected: {}", join_violations(.violations))]
    Invalid {
        /// All violations, in the order they were found.
        violations: Vec<ConfigViolation>,
    },
}

impl RegistrationError {
    /// Returns the individual violations.
    pub fn violations(&self) -> &[ConfigViolation] {
        match self {
            RegistrationError::Invalid { violations } => violations,
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            RegistrationError::Invalid { .. } => "registration_invalid",
        }
    }
}

fn join_violations(violations: &[ConfigViolation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// # Errors produced by the engine itself.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Drain grace period was exceeded while actions were still running.
    #[error("drain timeout {grace:?} exceeded; {in_flight} action(s) still running")]
    GraceExceeded {
        /// The grace duration that elapsed.
        grace: Duration,
        /// Number of actions still in flight when the grace period ended.
        in_flight: usize,
    },
}

impl RuntimeError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use actionvisor::RuntimeError;
    /// use std::time::Duration;
    ///
    /// let err = RuntimeError::GraceExceeded { grace: Duration::from_secs(5), in_flight: 2 };
    /// assert_eq!(err.as_label(), "runtime_grace_exceeded");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            RuntimeError::GraceExceeded { .. } => "runtime_grace_exceeded",
        }
    }
}

/// Extracts a readable message from a caught panic payload.
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}
