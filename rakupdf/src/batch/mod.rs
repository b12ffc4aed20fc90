//! Batch execution.
//!
//! A [`Batch`] is either a single merge or a list of per-file tasks. The
//! [`BatchCoordinator`] runs it on one worker thread, strictly in input order,
//! and posts [`BatchEvent`]s back to the caller. Per-file failures are
//! recorded and the batch moves on; a merge is all or nothing.
//!
//! # Examples
//!
//! ```no_run
//! use rakupdf::batch::{Batch, BatchCoordinator, BatchEvent, PdfTaskRunner};
//!
//! # async fn example(batch: Batch) -> Result<(), Box<dyn std::error::Error>> {
//! let coordinator = BatchCoordinator::new(PdfTaskRunner::without_compressor());
//! let mut handle = coordinator.spawn(batch)?;
//! while let Some(event) = handle.next_event().await {
//!     if let BatchEvent::Finished(summary) = event {
//!         println!("{} succeeded, {} failed", summary.succeeded, summary.failed);
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod coordinator;
pub mod events;
pub mod runner;

pub use coordinator::{BatchCoordinator, BatchHandle};
pub use events::{BatchEvent, EventSink};
pub use runner::{PdfTaskRunner, TaskRunner};

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

use crate::engine::{
    CompressionLevel, CompressionResult, MergeOutcome, ProtectionIntent, ReorderOutcome,
    ReorderScript, SplitMode, SplitOutcome,
};

/// Errors raised by the coordinator itself.
#[derive(Debug, Error)]
pub enum BatchError {
    /// A batch is already running on this coordinator.
    #[error("a batch is already running")]
    AlreadyRunning,

    /// The worker thread could not be started.
    #[error("failed to start batch worker: {0}")]
    Spawn(#[from] std::io::Error),

    /// The worker thread panicked outside a task.
    #[error("batch worker panicked")]
    WorkerPanicked,
}

/// Lifecycle of a coordinator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BatchState {
    /// Nothing has run yet.
    #[default]
    Idle,
    /// A batch is in progress.
    Running,
    /// The batch finished and something succeeded (or nothing failed).
    Completed,
    /// The merge failed, or every attempted task failed.
    Failed,
    /// The batch was cancelled.
    Cancelled,
}

impl BatchState {
    /// Whether a batch in this state has finished.
    pub fn is_finished(self) -> bool {
        matches!(
            self,
            BatchState::Completed | BatchState::Failed | BatchState::Cancelled
        )
    }
}

/// Why a task did not run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SkipReason {
    /// The user declined to overwrite the destination.
    OverwriteDeclined,
    /// The batch was cancelled before the task started.
    Cancelled,
}

/// What to do with one source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskKind {
    /// Keep or delete pages given as a one-based spec.
    Split {
        /// Keep or delete.
        mode: SplitMode,
        /// Page spec, parsed against each file's page count.
        pages: String,
    },
    /// Replay a reorder script.
    Reorder(ReorderScript),
    /// Compress with Ghostscript.
    Compress {
        /// Level used without a target.
        level: CompressionLevel,
        /// Size target in bytes.
        target_size: Option<u64>,
    },
    /// Password protect.
    Lock(ProtectionIntent),
    /// Remove password protection.
    Unlock {
        /// Password to open the source.
        password: String,
    },
}

/// One source file and where its output goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchTask {
    /// Input file.
    pub source: PathBuf,
    /// Output files. The first is written by the engine; any others receive
    /// a copy of it.
    pub destinations: Vec<PathBuf>,
    /// Operation.
    pub kind: TaskKind,
    /// Set when the task must not run.
    pub skip: Option<SkipReason>,
}

impl BatchTask {
    /// A task writing to a single destination.
    pub fn new(source: PathBuf, destination: PathBuf, kind: TaskKind) -> Self {
        Self {
            source,
            destinations: vec![destination],
            kind,
            skip: None,
        }
    }

    /// Mark the task as skipped.
    pub fn skipped(mut self, reason: SkipReason) -> Self {
        self.skip = Some(reason);
        self
    }
}

/// Merge every source into one destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeTask {
    /// Inputs, in output order.
    pub sources: Vec<PathBuf>,
    /// Output file.
    pub destination: PathBuf,
    /// Set when the merge must not run.
    pub skip: Option<SkipReason>,
}

/// Work handed to the coordinator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Batch {
    /// A single all-or-nothing merge.
    Merge(MergeTask),
    /// Independent per-file tasks.
    Files(Vec<BatchTask>),
}

impl Batch {
    /// Number of progress steps: sources for a merge, tasks otherwise.
    pub fn len(&self) -> usize {
        match self {
            Batch::Merge(task) => task.sources.len(),
            Batch::Files(tasks) => tasks.len(),
        }
    }

    /// Whether there is nothing to do.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// What a successful task produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase", tag = "operation")]
pub enum TaskReport {
    /// Merge summary.
    Merge(MergeOutcome),
    /// Split summary.
    Split(SplitOutcome),
    /// Reorder summary.
    Reorder(ReorderOutcome),
    /// Compression summary.
    Compress(CompressionResult),
    /// Locked output.
    #[serde(rename_all = "camelCase")]
    Lock {
        /// Output file.
        output_path: PathBuf,
        /// Bytes written.
        size: u64,
    },
    /// Unlocked output.
    #[serde(rename_all = "camelCase")]
    Unlock {
        /// Output file.
        output_path: PathBuf,
        /// Bytes written.
        size: u64,
    },
}

impl TaskReport {
    /// One-line description for progress messages.
    pub fn message(&self) -> String {
        match self {
            TaskReport::Merge(outcome) => format!(
                "merged {} files ({} pages) into {}",
                outcome.sources,
                outcome.total_pages,
                outcome.output_path.display()
            ),
            TaskReport::Split(outcome) => format!(
                "kept {} of {} pages in {}",
                outcome.kept_pages,
                outcome.total_pages,
                outcome.output_path.display()
            ),
            TaskReport::Reorder(outcome) => format!(
                "wrote {} pages to {}",
                outcome.output_pages,
                outcome.output_path.display()
            ),
            TaskReport::Compress(result) => format!(
                "{} -> {} ({:.1}% smaller, {})",
                crate::io::format_file_size(result.orig_size),
                crate::io::format_file_size(result.new_size),
                result.reduced_percent(),
                result.used_preset
            ),
            TaskReport::Lock { output_path, .. } => {
                format!("locked copy written to {}", output_path.display())
            }
            TaskReport::Unlock { output_path, .. } => {
                format!("unlocked copy written to {}", output_path.display())
            }
        }
    }
}

/// Result of one task.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase", tag = "status")]
pub enum TaskOutcome {
    /// The task finished.
    Succeeded {
        /// Source file, or the destination of a merge.
        path: PathBuf,
        /// What was produced.
        report: TaskReport,
    },
    /// The task failed.
    Failed {
        /// Source file, or the destination of a merge.
        path: PathBuf,
        /// Human-readable cause.
        error: String,
    },
    /// The task did not run.
    Skipped {
        /// Source file, or the destination of a merge.
        path: PathBuf,
        /// Why.
        reason: SkipReason,
    },
}

impl TaskOutcome {
    /// File the outcome is about.
    pub fn path(&self) -> &std::path::Path {
        match self {
            TaskOutcome::Succeeded { path, .. }
            | TaskOutcome::Failed { path, .. }
            | TaskOutcome::Skipped { path, .. } => path,
        }
    }

    /// One-line description for progress messages.
    pub fn message(&self) -> String {
        let name = crate::document::display_name(self.path());
        match self {
            TaskOutcome::Succeeded { report, .. } => format!("{name}: {}", report.message()),
            TaskOutcome::Failed { error, .. } => format!("{name}: failed: {error}"),
            TaskOutcome::Skipped {
                reason: SkipReason::OverwriteDeclined,
                ..
            } => format!("{name}: skipped (overwrite declined)"),
            TaskOutcome::Skipped {
                reason: SkipReason::Cancelled,
                ..
            } => format!("{name}: skipped (cancelled)"),
        }
    }
}

/// Aggregate result of a batch.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchSummary {
    /// Tasks that finished.
    pub succeeded: usize,
    /// Tasks that failed.
    pub failed: usize,
    /// Tasks that did not run.
    pub skipped: usize,
    /// Per-task outcomes in input order.
    pub outcomes: Vec<TaskOutcome>,
    /// Final state.
    pub state: BatchState,
}

impl BatchSummary {
    /// Tally outcomes and derive the final state.
    pub fn from_outcomes(outcomes: Vec<TaskOutcome>) -> Self {
        let mut succeeded = 0;
        let mut failed = 0;
        let mut skipped = 0;
        let mut cancelled = false;

        for outcome in &outcomes {
            match outcome {
                TaskOutcome::Succeeded { .. } => succeeded += 1,
                TaskOutcome::Failed { .. } => failed += 1,
                TaskOutcome::Skipped { reason, .. } => {
                    skipped += 1;
                    cancelled |= *reason == SkipReason::Cancelled;
                }
            }
        }

        let state = if cancelled {
            BatchState::Cancelled
        } else if failed > 0 && succeeded == 0 {
            BatchState::Failed
        } else {
            BatchState::Completed
        };

        Self {
            succeeded,
            failed,
            skipped,
            outcomes,
            state,
        }
    }

    /// Number of tasks.
    pub fn total(&self) -> usize {
        self.outcomes.len()
    }
}
