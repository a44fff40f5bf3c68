//! Shared helpers for integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use actionvisor::{ActionError, ActionFn, ActionRef, Operation, OperationLogger};
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

/// Operation logger that keeps every record in memory.
#[derive(Default)]
pub struct RecordingLogger {
    ops: Mutex<Vec<Operation>>,
}

impl RecordingLogger {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn operations(&self) -> Vec<Operation> {
        self.ops.lock().unwrap().clone()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.ops.lock().unwrap().iter().map(Operation::name).collect()
    }

    pub fn count(&self, name: &str) -> usize {
        self.ops
            .lock()
            .unwrap()
            .iter()
            .filter(|op| op.name() == name)
            .count()
    }

    /// Polls until at least `n` operations named `name` were recorded.
    pub async fn wait_for(&self, name: &str, n: usize) {
        let waited = tokio::time::timeout(Duration::from_secs(2), async {
            while self.count(name) < n {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await;
        assert!(
            waited.is_ok(),
            "timed out waiting for {n} x {name}, saw {:?}",
            self.names()
        );
    }
}

#[async_trait]
impl OperationLogger for RecordingLogger {
    async fn log_operation(&self, op: &Operation) {
        self.ops.lock().unwrap().push(op.clone());
    }

    fn name(&self) -> &'static str {
        "recording"
    }
}

/// Tracks how many runs are active at once and the highest value seen.
#[derive(Default)]
pub struct Gauge {
    current: AtomicUsize,
    peak: AtomicUsize,
    runs: AtomicUsize,
}

impl Gauge {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn enter(&self) {
        let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        self.runs.fetch_add(1, Ordering::SeqCst);
    }

    pub fn leave(&self) {
        self.current.fetch_sub(1, Ordering::SeqCst);
    }

    pub fn current(&self) -> usize {
        self.current.load(Ordering::SeqCst)
    }

    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    pub fn runs(&self) -> usize {
        self.runs.load(Ordering::SeqCst)
    }
}

/// Action that holds its admission for `hold`, recording itself in `gauge`.
pub fn sleeper<P>(gauge: Arc<Gauge>, hold: Duration) -> ActionRef<P>
where
    P: Send + Sync + 'static,
{
    ActionFn::arc(move |_ctx: CancellationToken, _payload: Arc<P>| {
        let gauge = Arc::clone(&gauge);
        async move {
            gauge.enter();
            tokio::time::sleep(hold).await;
            gauge.leave();
            Ok::<(), ActionError>(())
        }
    })
}
