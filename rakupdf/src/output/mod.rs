//! User-facing output.
//!
//! Everything a person reads goes through [`OutputFormatter`]; diagnostics go
//! through `tracing` on stderr instead. With `--json` the only thing written
//! to stdout is the serialized [`BatchSummary`].

pub mod formatter;
pub mod progress;

pub use formatter::{MessageLevel, OutputFormatter};
pub use progress::ProgressBar;

use crate::batch::{Batch, BatchState, BatchSummary, TaskOutcome};
use crate::document::display_name;
use crate::error::{RakuError, Result};
use crate::validation::ValidationSummary;

/// Show how many inputs passed validation.
pub fn display_validation_summary(formatter: &OutputFormatter, summary: &ValidationSummary) {
    if summary.files_failed > 0 {
        formatter.warning(&format!(
            "{} file(s) failed validation and will be skipped",
            summary.files_failed
        ));
    }

    formatter.info(&format!(
        "Validated {} file(s): {} pages, {}",
        summary.files_validated,
        summary.total_pages,
        summary.format_total_size()
    ));

    for result in &summary.results {
        let mut detail = format!("{} pages", result.page_count);
        if let Some((major, minor)) = result.version {
            detail.push_str(&format!(", PDF {major}.{minor}"));
        }
        if result.is_encrypted {
            detail.push_str(", encrypted");
        }
        formatter.detail(&display_name(&result.path), &detail);
    }
}

/// Describe what a batch would do without running it.
pub fn display_plan(formatter: &OutputFormatter, operation: &str, batch: &Batch) {
    formatter.section(&format!("Dry run: {operation}"));
    match batch {
        Batch::Merge(task) => {
            for (i, source) in task.sources.iter().enumerate() {
                formatter.list_item(i + 1, &source.display().to_string());
            }
            formatter.info(&format!("  -> {}", task.destination.display()));
        }
        Batch::Files(tasks) => {
            for (i, task) in tasks.iter().enumerate() {
                let destinations: Vec<String> = task
                    .destinations
                    .iter()
                    .map(|d| d.display().to_string())
                    .collect();
                let mut line = format!(
                    "{} -> {}",
                    task.source.display(),
                    destinations.join(", ")
                );
                if task.skip.is_some() {
                    line.push_str(" (skipped)");
                }
                formatter.list_item(i + 1, &line);
            }
        }
    }
    formatter.info("No files were written.");
}

/// Report every outcome and the totals.
pub fn display_batch_summary(formatter: &OutputFormatter, summary: &BatchSummary) {
    for outcome in &summary.outcomes {
        match outcome {
            TaskOutcome::Succeeded { .. } => formatter.success(&outcome.message()),
            TaskOutcome::Failed { .. } => formatter.error(&outcome.message()),
            TaskOutcome::Skipped { .. } => formatter.debug(&outcome.message()),
        }
    }

    let totals = format!(
        "{} succeeded, {} failed, {} skipped",
        summary.succeeded, summary.failed, summary.skipped
    );
    match summary.state {
        BatchState::Completed if summary.failed == 0 => formatter.success(&totals),
        BatchState::Completed => formatter.warning(&totals),
        BatchState::Cancelled => formatter.warning(&format!("Cancelled: {totals}")),
        _ => formatter.error(&totals),
    }
}

/// Serialize a batch summary for `--json`.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn summary_json(summary: &BatchSummary) -> Result<String> {
    serde_json::to_string_pretty(summary)
        .map_err(|e| RakuError::other(format!("failed to serialize summary: {e}")))
}
