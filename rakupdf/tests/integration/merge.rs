//! Merging real files.

use rakupdf::batch::{Batch, MergeTask, PdfTaskRunner, TaskOutcome, TaskReport};
use rakupdf::batch::{BatchCoordinator, BatchEvent};
use rakupdf::config::{Config, Operation};
use std::sync::Mutex;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

use crate::common::{run_batch, widths, write_pdf};

#[test]
fn test_merge_keeps_input_order() {
    let dir = TempDir::new().unwrap();
    let first = write_pdf(dir.path(), "first.pdf", 2);
    let second = write_pdf(dir.path(), "second.pdf", 1);
    let third = write_pdf(dir.path(), "third.pdf", 3);

    let config = Config::new(Operation::Merge, vec![first, second, third]);
    config.validate().unwrap();
    let batch = config.batch().unwrap();

    let Batch::Merge(task) = &batch else {
        panic!("expected a merge batch");
    };
    let destination = task.destination.clone();
    assert_eq!(
        destination,
        dir.path().join("first_plus-2-others_merged.pdf")
    );

    let summary = run_batch(PdfTaskRunner::without_compressor(), batch);
    let TaskOutcome::Succeeded {
        report: TaskReport::Merge(outcome),
        ..
    } = &summary.outcomes[0]
    else {
        panic!("merge failed: {:?}", summary.outcomes);
    };

    assert_eq!(outcome.sources, 3);
    assert_eq!(outcome.total_pages, 6);
    assert_eq!(widths(&destination), vec![100, 200, 100, 100, 200, 300]);
}

#[test]
fn test_merge_reports_progress_per_source() {
    let dir = TempDir::new().unwrap();
    let sources = vec![
        write_pdf(dir.path(), "a.pdf", 1),
        write_pdf(dir.path(), "b.pdf", 1),
        write_pdf(dir.path(), "c.pdf", 1),
        write_pdf(dir.path(), "d.pdf", 1),
    ];
    let destination = dir.path().join("out.pdf");

    let events = Mutex::new(Vec::new());
    BatchCoordinator::new(PdfTaskRunner::without_compressor())
        .run(
            Batch::Merge(MergeTask {
                sources,
                destination,
                skip: None,
            }),
            &events,
            &CancellationToken::new(),
        )
        .unwrap();

    let events = events.into_inner().unwrap();
    let fractions: Vec<f64> = events.iter().filter_map(BatchEvent::fraction).collect();
    assert_eq!(fractions, vec![0.25, 0.5, 0.75, 1.0]);
    assert!(matches!(events.last(), Some(BatchEvent::Finished(_))));
}

#[test]
fn test_merge_fails_as_a_whole() {
    let dir = TempDir::new().unwrap();
    let good = write_pdf(dir.path(), "good.pdf", 2);
    let broken = dir.path().join("broken.pdf");
    std::fs::write(&broken, b"%PDF-1.4 not really").unwrap();
    let destination = dir.path().join("out.pdf");

    let summary = run_batch(
        PdfTaskRunner::without_compressor(),
        Batch::Merge(MergeTask {
            sources: vec![good, broken],
            destination: destination.clone(),
            skip: None,
        }),
    );

    assert_eq!(summary.failed, 1);
    assert_eq!(summary.state, rakupdf::batch::BatchState::Failed);
    assert!(!destination.exists());
}
