//! The batch coordinator.
//!
//! One coordinator runs at most one batch at a time. Work happens on a single
//! dedicated thread so long-running PDF operations never block the caller;
//! events travel back over an unbounded channel.

use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::JoinHandle;

use tokio::sync::mpsc::{self, UnboundedReceiver};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, info_span, warn};

use super::events::{BatchEvent, EventSink};
use super::runner::TaskRunner;
use super::{
    Batch, BatchError, BatchState, BatchSummary, BatchTask, MergeTask, SkipReason, TaskOutcome,
};
use crate::document::display_name;
use crate::error::RakuError;

/// Runs batches against a [`TaskRunner`].
#[derive(Debug)]
pub struct BatchCoordinator<R> {
    runner: Arc<R>,
    state: Arc<Mutex<BatchState>>,
}

impl<R> Clone for BatchCoordinator<R> {
    fn clone(&self) -> Self {
        Self {
            runner: Arc::clone(&self.runner),
            state: Arc::clone(&self.state),
        }
    }
}

impl<R: TaskRunner> BatchCoordinator<R> {
    /// Create an idle coordinator.
    pub fn new(runner: R) -> Self {
        Self {
            runner: Arc::new(runner),
            state: Arc::new(Mutex::new(BatchState::Idle)),
        }
    }

    /// Current state.
    pub fn state(&self) -> BatchState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Whether a batch is in progress.
    pub fn is_running(&self) -> bool {
        self.state() == BatchState::Running
    }

    /// Run `batch` on the calling thread.
    ///
    /// # Errors
    ///
    /// Returns [`BatchError::AlreadyRunning`] if another batch is in progress.
    pub fn run(
        &self,
        batch: Batch,
        sink: &dyn EventSink,
        cancel: &CancellationToken,
    ) -> Result<BatchSummary, BatchError> {
        self.begin()?;
        Ok(execute(&*self.runner, &self.state, batch, sink, cancel))
    }

    /// Run `batch` on a worker thread.
    ///
    /// The returned handle yields events and can cancel the batch.
    ///
    /// # Errors
    ///
    /// Returns [`BatchError::AlreadyRunning`] if another batch is in progress,
    /// or [`BatchError::Spawn`] if the thread cannot be started.
    pub fn spawn(&self, batch: Batch) -> Result<BatchHandle, BatchError> {
        self.begin()?;

        let (tx, rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();
        let runner = Arc::clone(&self.runner);
        let state = Arc::clone(&self.state);
        let token = cancel.clone();

        let spawned = std::thread::Builder::new()
            .name("rakupdf-batch".to_string())
            .spawn(move || execute(&*runner, &state, batch, &tx, &token));

        match spawned {
            Ok(thread) => Ok(BatchHandle {
                events: rx,
                cancel,
                thread: Some(thread),
            }),
            Err(err) => {
                self.set_state(BatchState::Idle);
                Err(BatchError::Spawn(err))
            }
        }
    }

    fn begin(&self) -> Result<(), BatchError> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if *state == BatchState::Running {
            return Err(BatchError::AlreadyRunning);
        }
        *state = BatchState::Running;
        Ok(())
    }

    fn set_state(&self, next: BatchState) {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = next;
    }
}

/// Handle to a batch running on a worker thread.
#[derive(Debug)]
pub struct BatchHandle {
    events: UnboundedReceiver<BatchEvent>,
    cancel: CancellationToken,
    thread: Option<JoinHandle<BatchSummary>>,
}

impl BatchHandle {
    /// Next event, or `None` once the worker has finished and the channel
    /// is drained.
    pub async fn next_event(&mut self) -> Option<BatchEvent> {
        self.events.recv().await
    }

    /// Ask the worker to stop before its next task.
    ///
    /// The task in progress, if any, runs to completion.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Token observed by the worker.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Wait for the worker thread and return its summary.
    ///
    /// # Errors
    ///
    /// Returns [`BatchError::WorkerPanicked`] if the worker thread panicked.
    pub fn join(mut self) -> Result<BatchSummary, BatchError> {
        let thread = self.thread.take().ok_or(BatchError::WorkerPanicked)?;
        thread.join().map_err(|_| BatchError::WorkerPanicked)
    }
}

fn execute<R: TaskRunner + ?Sized>(
    runner: &R,
    state: &Mutex<BatchState>,
    batch: Batch,
    sink: &dyn EventSink,
    cancel: &CancellationToken,
) -> BatchSummary {
    let total = batch.len();
    info!(total, "batch started");
    sink.post(BatchEvent::Started { total });

    let outcomes = match batch {
        Batch::Merge(task) => vec![execute_merge(runner, &task, sink, cancel)],
        Batch::Files(tasks) => execute_files(runner, &tasks, sink, cancel),
    };

    let summary = BatchSummary::from_outcomes(outcomes);
    *state.lock().unwrap_or_else(PoisonError::into_inner) = summary.state;
    info!(
        succeeded = summary.succeeded,
        failed = summary.failed,
        skipped = summary.skipped,
        state = ?summary.state,
        "batch finished"
    );
    sink.post(BatchEvent::Finished(summary.clone()));
    summary
}

fn execute_merge<R: TaskRunner + ?Sized>(
    runner: &R,
    task: &MergeTask,
    sink: &dyn EventSink,
    cancel: &CancellationToken,
) -> TaskOutcome {
    let path = task.destination.clone();

    let outcome = if cancel.is_cancelled() {
        skipped(path, SkipReason::Cancelled)
    } else if let Some(reason) = task.skip {
        skipped(path, reason)
    } else {
        let _span = info_span!("merge", destination = %task.destination.display()).entered();
        let result = guarded(&task.destination, || {
            runner.run_merge(task, &mut |progress| {
                sink.post(BatchEvent::Progress {
                    completed: progress.merged,
                    total: progress.total,
                    message: format!("added {}", progress.name),
                });
            })
        });
        settle(path, result)
    };

    sink.post(BatchEvent::TaskFinished {
        index: 0,
        outcome: outcome.clone(),
    });
    outcome
}

fn execute_files<R: TaskRunner + ?Sized>(
    runner: &R,
    tasks: &[BatchTask],
    sink: &dyn EventSink,
    cancel: &CancellationToken,
) -> Vec<TaskOutcome> {
    let total = tasks.len();
    let mut outcomes = Vec::with_capacity(total);

    for (index, task) in tasks.iter().enumerate() {
        let path = task.source.clone();

        let outcome = if cancel.is_cancelled() {
            skipped(path, SkipReason::Cancelled)
        } else if let Some(reason) = task.skip {
            skipped(path, reason)
        } else {
            let _span = info_span!("task", index, source = %task.source.display()).entered();
            settle(path, guarded(&task.source, || runner.run_task(task)))
        };

        sink.post(BatchEvent::TaskFinished {
            index,
            outcome: outcome.clone(),
        });
        sink.post(BatchEvent::Progress {
            completed: index + 1,
            total,
            message: outcome.message(),
        });
        outcomes.push(outcome);
    }

    outcomes
}

fn skipped(path: PathBuf, reason: SkipReason) -> TaskOutcome {
    debug!(path = %path.display(), ?reason, "task skipped");
    TaskOutcome::Skipped { path, reason }
}

fn settle(path: PathBuf, result: Result<super::TaskReport, RakuError>) -> TaskOutcome {
    match result {
        Ok(report) => TaskOutcome::Succeeded { path, report },
        Err(err) => {
            warn!(path = %path.display(), error = %err, "task failed");
            TaskOutcome::Failed {
                path,
                error: err.to_string(),
            }
        }
    }
}

/// Run `f`, turning a panic into an error so the batch can continue.
fn guarded<T, F>(path: &Path, f: F) -> Result<T, RakuError>
where
    F: FnOnce() -> Result<T, RakuError>,
{
    catch_unwind(AssertUnwindSafe(f)).unwrap_or_else(|payload| {
        Err(RakuError::other(format!(
            "unexpected failure while processing {}: {}",
            display_name(path),
            panic_message(payload.as_ref())
        )))
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("panic")
}
