//! Keeping and deleting pages of real files.

use rakupdf::batch::{Batch, BatchTask, PdfTaskRunner, TaskKind, TaskOutcome, TaskReport};
use rakupdf::document::{LopdfDocument, PdfDocument};
use rakupdf::engine::{SplitEngine, SplitError, SplitMode};
use rakupdf::pages::parse_page_ranges;
use tempfile::TempDir;

use crate::common::{run_batch, widths, write_pdf};

fn split_task(source: std::path::PathBuf, out: std::path::PathBuf, mode: SplitMode, pages: &str) -> BatchTask {
    BatchTask::new(
        source,
        out,
        TaskKind::Split {
            mode,
            pages: pages.to_string(),
        },
    )
}

#[test]
fn test_keep_pages() {
    let dir = TempDir::new().unwrap();
    let source = write_pdf(dir.path(), "ten.pdf", 10);
    let out = dir.path().join("ten_extracted.pdf");

    let summary = run_batch(
        PdfTaskRunner::without_compressor(),
        Batch::Files(vec![split_task(source, out.clone(), SplitMode::Keep, "7, 1-2")]),
    );

    assert_eq!(summary.succeeded, 1);
    assert_eq!(widths(&out), vec![100, 200, 700]);
}

#[test]
fn test_delete_pages() {
    let dir = TempDir::new().unwrap();
    let source = write_pdf(dir.path(), "five.pdf", 5);
    let out = dir.path().join("five_removed.pdf");

    let summary = run_batch(
        PdfTaskRunner::without_compressor(),
        Batch::Files(vec![split_task(source, out.clone(), SplitMode::Delete, "2-4")]),
    );

    let TaskOutcome::Succeeded {
        report: TaskReport::Split(outcome),
        ..
    } = &summary.outcomes[0]
    else {
        panic!("expected a split report, got {:?}", summary.outcomes[0]);
    };
    assert_eq!((outcome.total_pages, outcome.kept_pages), (5, 2));
    assert_eq!(widths(&out), vec![100, 500]);
}

#[test]
fn test_same_spec_applies_per_file() {
    let dir = TempDir::new().unwrap();
    let long = write_pdf(dir.path(), "long.pdf", 6);
    let short = write_pdf(dir.path(), "short.pdf", 2);

    let summary = run_batch(
        PdfTaskRunner::without_compressor(),
        Batch::Files(vec![
            split_task(long, dir.path().join("long_out.pdf"), SplitMode::Keep, "5-6"),
            split_task(short, dir.path().join("short_out.pdf"), SplitMode::Keep, "5-6"),
        ]),
    );

    assert_eq!((summary.succeeded, summary.failed), (1, 1));
    assert!(dir.path().join("long_out.pdf").exists());
    assert!(!dir.path().join("short_out.pdf").exists());
}

#[test]
fn test_deleting_everything_writes_nothing() {
    let dir = TempDir::new().unwrap();
    let source = write_pdf(dir.path(), "three.pdf", 3);
    let doc = LopdfDocument::load(&source).unwrap();
    let targets = parse_page_ranges("1-3", doc.page_count()).unwrap();

    let result = SplitEngine::split(&doc, SplitMode::Delete, &targets);
    assert!(matches!(result, Err(SplitError::NothingRemains)));
}
