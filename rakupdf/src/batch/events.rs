//! Events posted by the batch worker.

use serde::Serialize;
use std::sync::Mutex;
use tokio::sync::mpsc::UnboundedSender;

use super::{BatchSummary, TaskOutcome};

/// Progress notifications, in the order they happen.
///
/// `Finished` is always the last event of a batch.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase", tag = "event")]
pub enum BatchEvent {
    /// The worker picked up the batch.
    Started {
        /// Number of progress steps.
        total: usize,
    },
    /// A step completed.
    Progress {
        /// Steps done so far.
        completed: usize,
        /// Number of steps.
        total: usize,
        /// What just happened.
        message: String,
    },
    /// A task reached its outcome.
    TaskFinished {
        /// Zero-based task index.
        index: usize,
        /// Result.
        outcome: TaskOutcome,
    },
    /// The batch is over.
    Finished(BatchSummary),
}

impl BatchEvent {
    /// Completed fraction for `Progress` events.
    pub fn fraction(&self) -> Option<f64> {
        match self {
            BatchEvent::Progress {
                completed, total, ..
            } if *total > 0 => Some(*completed as f64 / *total as f64),
            _ => None,
        }
    }
}

/// Receives events from the worker thread.
pub trait EventSink: Send + Sync {
    /// Deliver one event. Delivery failures are ignored.
    fn post(&self, event: BatchEvent);
}

impl EventSink for UnboundedSender<BatchEvent> {
    fn post(&self, event: BatchEvent) {
        // the receiver may already be gone when the caller stopped listening
        let _ = self.send(event);
    }
}

impl EventSink for Mutex<Vec<BatchEvent>> {
    fn post(&self, event: BatchEvent) {
        if let Ok(mut events) = self.lock() {
            events.push(event);
        }
    }
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl EventSink for NullSink {
    fn post(&self, _event: BatchEvent) {}
}
