//! Integration tests for error handling and edge cases.

use rakupdf::RakuError;
use rakupdf::batch::{BatchState, PdfTaskRunner, TaskOutcome};
use rakupdf::config::{Config, Operation, OverwriteMode};
use rakupdf::engine::SplitMode;
use rakupdf::validation::Validator;
use std::path::PathBuf;
use tempfile::TempDir;

use crate::common::{run_batch, write_pdf};

fn split(inputs: Vec<PathBuf>) -> Config {
    Config::new(
        Operation::Split {
            mode: SplitMode::Delete,
            pages: "1".into(),
        },
        inputs,
    )
}

#[tokio::test]
async fn test_error_nonexistent_input() {
    let config = split(vec![PathBuf::from("/nonexistent/file.pdf")]);
    let err = Validator::new().validate_config(&config).await.unwrap_err();

    assert!(matches!(err, RakuError::FileNotFound { .. }));
    assert_eq!(err.exit_code(), 2);
}

#[test]
fn test_error_no_inputs() {
    let err = split(Vec::new()).validate().unwrap_err();
    assert!(err.to_string().contains("No input files"));
}

#[tokio::test]
async fn test_error_empty_file() {
    let dir = TempDir::new().unwrap();
    let empty = dir.path().join("empty.pdf");
    std::fs::write(&empty, b"").unwrap();

    let err = Validator::new().validate_file(&empty).await.unwrap_err();
    assert!(matches!(err, RakuError::CorruptedPdf { .. }));
}

#[tokio::test]
async fn test_error_directory_input() {
    let dir = TempDir::new().unwrap();
    let err = Validator::new().validate_file(dir.path()).await.unwrap_err();
    assert!(matches!(err, RakuError::NotAFile { .. }));
}

#[tokio::test]
async fn test_continue_on_error_drops_corrupt_input() {
    let dir = TempDir::new().unwrap();
    let good = write_pdf(dir.path(), "good.pdf", 2);
    let bad = dir.path().join("bad.pdf");
    std::fs::write(&bad, b"this is not a PDF").unwrap();

    let mut config = split(vec![bad.clone(), good.clone()]);
    let validator = Validator::new();
    assert!(validator.validate_config(&config).await.is_err());

    config.continue_on_error = true;
    let summary = validator.validate_config(&config).await.unwrap();
    assert_eq!(summary.files_validated, 1);
    assert_eq!(summary.files_failed, 1);
    assert_eq!(summary.paths(), vec![good]);
}

#[test]
fn test_corrupt_input_fails_only_its_task() {
    let dir = TempDir::new().unwrap();
    let good = write_pdf(dir.path(), "good.pdf", 2);
    let bad = dir.path().join("bad.pdf");
    std::fs::write(&bad, b"not a PDF at all").unwrap();

    let config = split(vec![bad, good]);
    let summary = run_batch(PdfTaskRunner::without_compressor(), config.batch().unwrap());

    assert_eq!(summary.state, BatchState::Completed);
    assert_eq!((summary.succeeded, summary.failed), (1, 1));
    assert!(matches!(&summary.outcomes[0], TaskOutcome::Failed { .. }));
    assert!(!dir.path().join("bad_removed.pdf").exists());
    assert!(dir.path().join("good_removed.pdf").exists());
}

#[test]
fn test_merge_rejects_single_input() {
    let dir = TempDir::new().unwrap();
    let only = write_pdf(dir.path(), "only.pdf", 1);

    let err = Config::new(Operation::Merge, vec![only]).validate().unwrap_err();
    assert!(err.to_string().contains("at least two"));
}

#[test]
fn test_no_clobber_rejects_existing_output() {
    let dir = TempDir::new().unwrap();
    let input = write_pdf(dir.path(), "report.pdf", 2);
    let existing = dir.path().join("report_removed.pdf");
    std::fs::write(&existing, b"keep me").unwrap();

    let validator = Validator::new();
    let err = validator
        .validate_outputs(&[existing.as_path()], OverwriteMode::NoClobber)
        .unwrap_err();
    assert!(matches!(err, RakuError::OutputExists { .. }));
    assert_eq!(err.exit_code(), 4);

    validator
        .validate_outputs(&[existing.as_path()], OverwriteMode::Force)
        .unwrap();
    assert_eq!(std::fs::read(&existing).unwrap(), b"keep me");
    assert!(input.exists());
}

#[test]
fn test_output_may_not_replace_input() {
    let dir = TempDir::new().unwrap();
    let input = write_pdf(dir.path(), "report.pdf", 2);

    let mut config = split(vec![input]);
    config.name_pattern = Some("{name}".into());
    assert!(config.batch().is_err());
}

#[test]
fn test_invalid_page_spec_fails_task() {
    let dir = TempDir::new().unwrap();
    let input = write_pdf(dir.path(), "short.pdf", 2);

    let mut config = split(vec![input]);
    config.operation = Operation::Split {
        mode: SplitMode::Keep,
        pages: "5-9".into(),
    };
    let summary = run_batch(PdfTaskRunner::without_compressor(), config.batch().unwrap());

    assert_eq!(summary.state, BatchState::Failed);
    let TaskOutcome::Failed { error, .. } = &summary.outcomes[0] else {
        panic!("expected a failure: {:?}", summary.outcomes);
    };
    assert!(!error.is_empty());
}
