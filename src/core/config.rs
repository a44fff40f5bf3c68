//! # Engine configuration.
//!
//! Provides [`EngineConfig`] centralized settings for the dispatch engine.
//!
//! ## Sentinel values
//! - `max_concurrent = 0` → unlimited (no engine-wide gate created)
//!
//! Per-logger queue sizes are chosen by each logger through
//! [`OperationLogger::queue_capacity`](crate::OperationLogger::queue_capacity).

use std::time::Duration;

/// Global configuration for the dispatch engine.
///
/// ## Field semantics
/// - `grace`: Default wait used by [`Engine::shutdown`](crate::Engine::shutdown) for in-flight actions
/// - `max_concurrent`: Engine-wide cap on running actions across all bindings (`0` = unlimited)
///
/// ## Notes
/// All fields are public. Prefer the helper accessors over checking sentinels inline.
///
/// ## Example
/// ```
/// use std::time::Duration;
/// use actionvisor::EngineConfig;
///
/// let mut cfg = EngineConfig::default();
/// cfg.grace = Duration::from_secs(5);
/// cfg.max_concurrent = 16;
///
/// assert_eq!(cfg.concurrency_limit(), Some(16));
/// ```
#[derive(Clone, Debug)]
pub struct EngineConfig {
    /// Maximum time `shutdown` waits for running actions before giving up.
    ///
    /// Actions are never cancelled by the engine; if they outlive the grace
    /// period, `shutdown` returns `RuntimeError::GraceExceeded`.
    pub grace: Duration,

    /// Maximum number of actions running at once, across every binding.
    ///
    /// - `0` = unlimited
    /// - `n > 0` = admission is denied once `n` actions are running
    ///
    /// Consulted after an action's own admission set grants.
    pub max_concurrent: usize,
}

impl EngineConfig {
    /// Returns the engine-wide concurrency limit as an `Option`.
    ///
    /// - `None` → unlimited
    /// - `Some(n)` → at most `n` concurrent actions
    #[inline]
    pub fn concurrency_limit(&self) -> Option<usize> {
        if self.max_concurrent == 0 {
            None
        } else {
            Some(self.max_concurrent)
        }
    }
}

impl Default for EngineConfig {
    /// Default configuration:
    ///
    /// - `grace = 30s`
    /// - `max_concurrent = 0` (unlimited)
    fn default() -> Self {
        Self {
            grace: Duration::from_secs(30),
            max_concurrent: 0,
        }
    }
}
