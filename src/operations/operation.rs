//! # Dispatch lifecycle records.
//!
//! An [`Operation`] is an `(name, metadata)` pair plus ordering information.
//! The name is the stable snake_case label of its [`OperationKind`]; metadata is a
//! string-to-string map so loggers need no knowledge of payload types.
//!
//! ## Ordering guarantees
//! Each operation has a globally unique sequence number (`seq`) that increases
//! monotonically. Loggers receive operations asynchronously; use `seq` to restore order.
//!
//! ## Example
//! ```rust
//! use actionvisor::{Operation, OperationKind};
//!
//! let op = Operation::new(OperationKind::AdmissionDenied)
//!     .with_event("user.created")
//!     .with_action("send-welcome")
//!     .with_group("user");
//!
//! assert_eq!(op.name(), "admission_denied");
//! assert_eq!(op.get("group"), Some("user"));
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::SystemTime;

/// Global sequence counter for operation ordering.
static OPERATION_SEQ: AtomicU64 = AtomicU64::new(0);

/// Well-known metadata keys.
pub mod meta {
    /// Event key of the dispatch.
    pub const EVENT: &str = "event";
    /// Action key of the binding.
    pub const ACTION: &str = "action";
    /// Concurrency group that decided admission.
    pub const GROUP: &str = "group";
    /// Partition key inside that group.
    pub const KEY: &str = "key";
    /// Error label (`as_label`) of a failed action.
    pub const ERROR: &str = "error";
    /// Human-readable failure or panic message.
    pub const REASON: &str = "reason";
    /// Number of actions bound to the event.
    pub const BOUND: &str = "bound";
}

/// Classification of dispatch lifecycle steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    /// `send` was called.
    ///
    /// Sets: `event`, `bound`
    EventReceived,

    /// No action is bound to the event.
    ///
    /// Sets: `event`
    NoActionBound,

    /// Every gate admitted the request for one action.
    ///
    /// Sets: `event`, `action`
    AdmissionGranted,

    /// A gate refused the request; the action will not run for this dispatch.
    ///
    /// Sets: `event`, `action`, `group`, `key`
    AdmissionDenied,

    /// The admitted action was handed to the runtime.
    ///
    /// Sets: `event`, `action`
    ActionSpawned,

    /// The admitted action could not be spawned (no Tokio runtime); admission was released.
    ///
    /// Sets: `event`, `action`, `reason`
    ActionSpawnFailed,

    /// The action started running.
    ///
    /// Sets: `event`, `action`
    ActionStarted,

    /// The action returned `Ok` or stopped gracefully on cancellation.
    ///
    /// Sets: `event`, `action`
    ActionCompleted,

    /// The action returned an error.
    ///
    /// Sets: `event`, `action`, `error`, `reason`
    ActionFailed,

    /// The action panicked.
    ///
    /// Sets: `event`, `action`, `reason`
    ActionPanicked,

    /// The action's admission slots were released.
    ///
    /// Sets: `event`, `action`
    AdmissionReleased,
}

impl OperationKind {
    /// Returns the stable snake_case name of this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationKind::EventReceived => "event_received",
            OperationKind::NoActionBound => "no_action_bound",
            OperationKind::AdmissionGranted => "admission_granted",
            OperationKind::AdmissionDenied => "admission_denied",
            OperationKind::ActionSpawned => "action_spawned",
            OperationKind::ActionSpawnFailed => "action_spawn_failed",
            OperationKind::ActionStarted => "action_started",
            OperationKind::ActionCompleted => "action_completed",
            OperationKind::ActionFailed => "action_failed",
            OperationKind::ActionPanicked => "action_panicked",
            OperationKind::AdmissionReleased => "admission_released",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One logged dispatch lifecycle step.
#[derive(Debug, Clone)]
pub struct Operation {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Operation classification.
    pub kind: OperationKind,
    /// String metadata (see [`meta`] for well-known keys).
    pub metadata: BTreeMap<String, String>,
}

impl Operation {
    /// Creates a new operation of the given kind with current timestamp and next sequence number.
    pub fn new(kind: OperationKind) -> Self {
        Self {
            seq: OPERATION_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            metadata: BTreeMap::new(),
        }
    }

    /// Returns the stable operation name (e.g. `"admission_granted"`).
    #[inline]
    pub fn name(&self) -> &'static str {
        self.kind.as_str()
    }

    /// Returns a metadata value.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).map(String::as_str)
    }

    /// Attaches an arbitrary metadata entry.
    #[inline]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Attaches the event key.
    #[inline]
    pub fn with_event(self, event: impl AsRef<str>) -> Self {
        self.with(meta::EVENT, event.as_ref())
    }

    /// Attaches the action key.
    #[inline]
    pub fn with_action(self, action: impl AsRef<str>) -> Self {
        self.with(meta::ACTION, action.as_ref())
    }

    /// Attaches the concurrency group name.
    #[inline]
    pub fn with_group(self, group: impl AsRef<str>) -> Self {
        self.with(meta::GROUP, group.as_ref())
    }

    /// Attaches the partition key.
    #[inline]
    pub fn with_key(self, key: impl AsRef<str>) -> Self {
        self.with(meta::KEY, key.as_ref())
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(self, reason: impl AsRef<str>) -> Self {
        self.with(meta::REASON, reason.as_ref())
    }
}
