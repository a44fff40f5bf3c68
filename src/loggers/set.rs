//! # Non-blocking operation fan-out to multiple loggers.
//!
//! Provides [`LoggerSet`] — distributes operations to every logger without
//! blocking the dispatcher.
//!
//! ## Rules
//! - **Non-blocking**: `emit()` returns immediately (uses `try_send`)
//! - **Overflow**: operation dropped for that logger only, counted in [`LoggerSet::dropped`]
//! - **Isolation**: a slow or panicking logger doesn't affect others
//! - **Per-logger FIFO**: each logger sees operations in emission order
//! - **Shutdown**: queued operations are delivered before workers exit
//!
//! ## Panic handling
//! Workers use `catch_unwind`; a panic is logged through `tracing` and the worker
//! continues with the next operation. `AssertUnwindSafe` is used, so a logger that
//! panics while holding a lock may leave its own state inconsistent.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use futures::FutureExt;
use tokio::{sync::mpsc, task::JoinHandle};
use tokio_util::sync::CancellationToken;

use crate::error::panic_message;
use crate::loggers::OperationLogger;
use crate::operations::Operation;

/// Per-logger channel metadata.
struct LoggerChannel {
    name: &'static str,
    sender: mpsc::Sender<Arc<Operation>>,
    dropped: AtomicU64,
}

/// Fan-out coordinator for operation loggers.
pub struct LoggerSet {
    channels: Vec<LoggerChannel>,
    workers: Mutex<Vec<JoinHandle<()>>>,
    stop: CancellationToken,
}

impl LoggerSet {
    /// Creates a set with no loggers; emitting is a no-op.
    pub fn empty() -> Self {
        Self {
            channels: Vec::new(),
            workers: Mutex::new(Vec::new()),
            stop: CancellationToken::new(),
        }
    }

    /// Creates a new set and spawns one worker task per logger.
    ///
    /// ### Notes
    /// - Must be called inside a Tokio runtime when `loggers` is non-empty.
    /// - Minimum queue capacity is 1 (enforced).
    #[must_use]
    pub fn new(loggers: Vec<Arc<dyn OperationLogger>>) -> Self {
        let stop = CancellationToken::new();
        let mut channels = Vec::with_capacity(loggers.len());
        let mut workers = Vec::with_capacity(loggers.len());

        for logger in loggers {
            let cap = logger.queue_capacity().max(1);
            let name = logger.name();
            let (tx, rx) = mpsc::channel::<Arc<Operation>>(cap);

            workers.push(tokio::spawn(run_worker(logger, rx, stop.clone())));
            channels.push(LoggerChannel {
                name,
                sender: tx,
                dropped: AtomicU64::new(0),
            });
        }

        Self {
            channels,
            workers: Mutex::new(workers),
            stop,
        }
    }

    /// Returns `true` if no logger is configured.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// Builds the operation only if someone will receive it, then emits it.
    #[inline]
    pub fn emit_with(&self, build: impl FnOnce() -> Operation) {
        if !self.channels.is_empty() {
            self.emit(build());
        }
    }

    /// Emits an operation to every logger (non-blocking).
    pub fn emit(&self, op: Operation) {
        if self.channels.is_empty() || self.stop.is_cancelled() {
            return;
        }
        let op = Arc::new(op);

        for channel in &self.channels {
            match channel.sender.try_send(Arc::clone(&op)) {
                Ok(()) => {}
                Err(mpsc::error::TrySendError::Full(_)) => {
                    channel.dropped.fetch_add(1, Ordering::Relaxed);
                    tracing::warn!(
                        logger = channel.name,
                        operation = op.name(),
                        "operation logger queue full; dropping"
                    );
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    channel.dropped.fetch_add(1, Ordering::Relaxed);
                }
            }
        }
    }

    /// Returns how many operations were dropped for the logger named `name`.
    pub fn dropped(&self, name: &str) -> u64 {
        self.channels
            .iter()
            .filter(|c| c.name == name)
            .map(|c| c.dropped.load(Ordering::Relaxed))
            .sum()
    }

    /// Stops accepting operations, delivers what is queued, and waits for every worker.
    pub async fn shutdown(&self) {
        self.stop.cancel();

        let workers = {
            let mut guard = self.workers.lock().unwrap_or_else(PoisonError::into_inner);
            std::mem::take(&mut *guard)
        };
        for h in workers {
            let _ = h.await;
        }
    }
}

impl std::fmt::Debug for LoggerSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoggerSet")
            .field(
                "loggers",
                &self.channels.iter().map(|c| c.name).collect::<Vec<_>>(),
            )
            .finish()
    }
}

async fn run_worker(
    logger: Arc<dyn OperationLogger>,
    mut rx: mpsc::Receiver<Arc<Operation>>,
    stop: CancellationToken,
) {
    loop {
        let op = tokio::select! {
            biased;
            maybe = rx.recv() => match maybe {
                Some(op) => op,
                None => return,
            },
            _ = stop.cancelled() => break,
        };
        deliver(logger.as_ref(), &op).await;
    }

    rx.close();
    while let Some(op) = rx.recv().await {
        deliver(logger.as_ref(), &op).await;
    }
}

async fn deliver(logger: &dyn OperationLogger, op: &Operation) {
    let fut = logger.log_operation(op);
    if let Err(panic_err) = std::panic::AssertUnwindSafe(fut).catch_unwind().await {
        tracing::error!(
            logger = logger.name(),
            operation = op.name(),
            panic = %panic_message(panic_err.as_ref()),
            "operation logger panicked"
        );
    }
}
