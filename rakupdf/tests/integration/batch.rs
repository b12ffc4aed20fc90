//! Batches driven end to end: events, copies, skips and cancellation.

use rakupdf::batch::{
    BatchCoordinator, BatchEvent, BatchState, BatchTask, MergeTask, PdfTaskRunner, SkipReason,
    TaskKind, TaskOutcome, TaskReport, TaskRunner,
};
use rakupdf::batch::events::NullSink;
use rakupdf::batch::Batch;
use rakupdf::config::{Config, Operation};
use rakupdf::engine::{MergeProgress, SplitMode};
use rakupdf::{RakuError, Result};
use std::path::PathBuf;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

use crate::common::{run_batch, widths, write_pdf};

fn split_config(inputs: Vec<PathBuf>) -> Config {
    Config::new(
        Operation::Split {
            mode: SplitMode::Keep,
            pages: "1".into(),
        },
        inputs,
    )
}

#[tokio::test]
async fn test_spawned_batch_reports_events() {
    let dir = TempDir::new().unwrap();
    let inputs = vec![
        write_pdf(dir.path(), "a.pdf", 2),
        write_pdf(dir.path(), "b.pdf", 3),
    ];
    let batch = split_config(inputs).batch().unwrap();

    let coordinator = BatchCoordinator::new(PdfTaskRunner::without_compressor());
    let mut handle = coordinator.spawn(batch).unwrap();

    let mut events = Vec::new();
    while let Some(event) = handle.next_event().await {
        events.push(event);
    }
    let summary = handle.join().unwrap();

    assert!(matches!(events.first(), Some(BatchEvent::Started { total: 2 })));
    let Some(BatchEvent::Finished(finished)) = events.last() else {
        panic!("last event was not Finished: {events:?}");
    };
    assert_eq!(finished, &summary);

    let fractions: Vec<f64> = events.iter().filter_map(BatchEvent::fraction).collect();
    assert_eq!(fractions, vec![0.5, 1.0]);

    assert_eq!(summary.state, BatchState::Completed);
    assert_eq!(summary.succeeded, 2);
    assert_eq!(widths(&dir.path().join("a_extracted.pdf")), vec![100]);
    assert_eq!(widths(&dir.path().join("b_extracted.pdf")), vec![100]);
}

#[test]
fn test_outputs_are_copied() {
    let dir = TempDir::new().unwrap();
    let copies = dir.path().join("copies");
    let input = write_pdf(dir.path(), "report.pdf", 2);

    let mut config = split_config(vec![input]);
    config.output_dir = Some(dir.path().join("out"));
    config.copy_dirs = vec![copies.clone()];
    config.validate().unwrap();

    let summary = run_batch(PdfTaskRunner::without_compressor(), config.batch().unwrap());
    assert_eq!(summary.state, BatchState::Completed);

    let written = dir.path().join("out").join("report_extracted.pdf");
    let copied = copies.join("report_extracted.pdf");
    assert_eq!(std::fs::read(&written).unwrap(), std::fs::read(&copied).unwrap());
}

#[test]
fn test_declined_task_is_skipped() {
    let dir = TempDir::new().unwrap();
    let first = write_pdf(dir.path(), "first.pdf", 2);
    let second = write_pdf(dir.path(), "second.pdf", 2);

    let Batch::Files(mut tasks) = split_config(vec![first, second.clone()]).batch().unwrap()
    else {
        panic!("expected per-file tasks");
    };
    tasks[1] = tasks[1].clone().skipped(SkipReason::OverwriteDeclined);

    let summary = run_batch(PdfTaskRunner::without_compressor(), Batch::Files(tasks));
    assert_eq!(summary.succeeded, 1);
    assert_eq!(summary.skipped, 1);
    assert_eq!(summary.state, BatchState::Completed);
    assert!(matches!(
        &summary.outcomes[1],
        TaskOutcome::Skipped { path, reason: SkipReason::OverwriteDeclined } if *path == second
    ));
    assert!(!dir.path().join("second_extracted.pdf").exists());
}

/// Cancels the batch while running its first task.
struct CancelAfterFirst {
    token: CancellationToken,
}

impl TaskRunner for CancelAfterFirst {
    fn run_task(&self, task: &BatchTask) -> Result<TaskReport> {
        self.token.cancel();
        Ok(TaskReport::Unlock {
            output_path: task.destinations[0].clone(),
            size: 0,
        })
    }

    fn run_merge(
        &self,
        _task: &MergeTask,
        _progress: &mut dyn FnMut(MergeProgress<'_>),
    ) -> Result<TaskReport> {
        Err(RakuError::other("merge is not used here"))
    }
}

#[test]
fn test_cancel_finishes_current_task_only() {
    let token = CancellationToken::new();
    let tasks = ["a.pdf", "b.pdf", "c.pdf"]
        .into_iter()
        .map(|name| {
            BatchTask::new(
                PathBuf::from(name),
                PathBuf::from(format!("out_{name}")),
                TaskKind::Unlock {
                    password: "secret".into(),
                },
            )
        })
        .collect();

    let runner = CancelAfterFirst {
        token: token.clone(),
    };
    let coordinator = BatchCoordinator::new(runner);
    let summary = coordinator
        .run(Batch::Files(tasks), &NullSink, &token)
        .unwrap();

    assert_eq!(summary.state, BatchState::Cancelled);
    assert_eq!(summary.succeeded, 1);
    assert_eq!(summary.skipped, 2);
    assert!(summary.outcomes[1..].iter().all(|outcome| matches!(
        outcome,
        TaskOutcome::Skipped {
            reason: SkipReason::Cancelled,
            ..
        }
    )));
    assert_eq!(coordinator.state(), BatchState::Cancelled);
}
