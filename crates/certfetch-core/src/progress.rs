//! Progress reporting for batches.
//!
//! The orchestrator calls [`ProgressSink::set_total`] once per batch and the
//! executor calls [`ProgressSink::advance`] once per successful request. A
//! sink is passed explicitly as `Option<&dyn ProgressSink>`; `None` disables
//! reporting.

use std::sync::atomic::{AtomicUsize, Ordering};

/// Receiver of batch progress.
pub trait ProgressSink: Sync {
    /// Number of requests in the batch about to run.
    fn set_total(&self, total: usize);
    /// One request completed successfully.
    fn advance(&self);
}

impl ProgressSink for () {
    fn set_total(&self, _total: usize) {}
    fn advance(&self) {}
}

/// Event form of progress, for channel-based consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressEvent {
    Total(usize),
    Advance,
}

/// Non-blocking: if the consumer lags and the channel is full, events are dropped.
impl ProgressSink for tokio::sync::mpsc::Sender<ProgressEvent> {
    fn set_total(&self, total: usize) {
        let _ = self.try_send(ProgressEvent::Total(total));
    }

    fn advance(&self) {
        let _ = self.try_send(ProgressEvent::Advance);
    }
}

/// Lock-free counter sink; can be read from another thread while a batch runs.
#[derive(Debug, Default)]
pub struct ProgressCounter {
    total: AtomicUsize,
    done: AtomicUsize,
}

impl ProgressCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn total(&self) -> usize {
        self.total.load(Ordering::Relaxed)
    }

    pub fn done(&self) -> usize {
        self.done.load(Ordering::Relaxed)
    }

    /// Fraction complete in [0.0, 1.0].
    pub fn fraction(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            return 1.0;
        }
        (self.done() as f64 / total as f64).min(1.0)
    }
}

impl ProgressSink for ProgressCounter {
    fn set_total(&self, total: usize) {
        self.total.store(total, Ordering::Relaxed);
        self.done.store(0, Ordering::Relaxed);
    }

    fn advance(&self) {
        self.done.fetch_add(1, Ordering::Relaxed);
    }
}
