//! Compression through the batch runner with a stand-in compressor.

use rakupdf::batch::{Batch, BatchState, BatchTask, PdfTaskRunner, TaskKind, TaskOutcome, TaskReport};
use rakupdf::engine::{CompressError, CompressionLevel, CompressionResult, Compressor};
use std::path::Path;
use tempfile::TempDir;

use crate::common::{run_batch, write_pdf};

/// Writes an output whose size depends only on the preset.
struct SizedByPreset;

impl Compressor for SizedByPreset {
    fn compress(&self, _input: &Path, output: &Path, preset: &str) -> Result<(), CompressError> {
        let size = match preset {
            "/prepress" => 5000,
            "/printer" => 4000,
            "/default" => 3000,
            "/ebook" => 2000,
            _ => 1000,
        };
        std::fs::write(output, vec![b'%'; size]).map_err(|err| CompressError::ProcessFailed {
            preset: preset.to_string(),
            code: None,
            stderr: err.to_string(),
        })
    }
}

fn compress_one(level: u8, target_size: Option<u64>) -> (TempDir, CompressionResult) {
    let dir = TempDir::new().unwrap();
    let source = write_pdf(dir.path(), "scan.pdf", 3);
    let destination = dir.path().join("scan_compressed.pdf");
    let kind = TaskKind::Compress {
        level: CompressionLevel::new(level).unwrap(),
        target_size,
    };

    let batch = Batch::Files(vec![BatchTask::new(source, destination.clone(), kind)]);
    let summary = run_batch(PdfTaskRunner::with_compressor(SizedByPreset), batch);

    let TaskOutcome::Succeeded {
        report: TaskReport::Compress(result),
        ..
    } = &summary.outcomes[0]
    else {
        panic!("compression failed: {:?}", summary.outcomes);
    };
    assert_eq!(result.out, destination);
    assert_eq!(std::fs::metadata(&destination).unwrap().len(), result.new_size);
    let result = result.clone();
    (dir, result)
}

#[test]
fn test_level_picks_single_preset() {
    let (_dir, result) = compress_one(3, None);
    assert_eq!(result.used_preset, "/default");
    assert_eq!(result.new_size, 3000);
    assert_eq!(result.attempts, 1);
    assert!(result.met_target);

    let (_dir, result) = compress_one(5, None);
    assert_eq!(result.used_preset, "/screen");
}

#[test]
fn test_target_stops_at_first_fit() {
    let (_dir, result) = compress_one(3, Some(2500));
    assert_eq!(result.used_preset, "/ebook");
    assert_eq!(result.new_size, 2000);
    assert_eq!(result.attempts, 4);
    assert!(result.met_target);
}

#[test]
fn test_unreachable_target_keeps_smallest() {
    let (_dir, result) = compress_one(1, Some(10));
    assert_eq!(result.used_preset, "/screen");
    assert_eq!(result.attempts, 5);
    assert!(!result.met_target);
}

#[test]
fn test_without_compressor_fails_task() {
    let dir = TempDir::new().unwrap();
    let source = write_pdf(dir.path(), "scan.pdf", 1);
    let destination = dir.path().join("scan_compressed.pdf");
    let kind = TaskKind::Compress {
        level: CompressionLevel::default(),
        target_size: None,
    };

    let batch = Batch::Files(vec![BatchTask::new(source, destination.clone(), kind)]);
    let summary = run_batch(PdfTaskRunner::without_compressor(), batch);

    assert_eq!(summary.state, BatchState::Failed);
    let TaskOutcome::Failed { error, .. } = &summary.outcomes[0] else {
        panic!("expected a failure: {:?}", summary.outcomes);
    };
    assert!(error.contains("Ghostscript"));
    assert!(!destination.exists());
}
