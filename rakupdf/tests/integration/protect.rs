//! Password protection of real files.

use rakupdf::batch::{Batch, BatchTask, PdfTaskRunner, TaskKind, TaskOutcome};
use rakupdf::document::{LopdfDocument, PdfDocument};
use rakupdf::engine::{ProtectionEngine, ProtectionError, ProtectionIntent};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use crate::common::{
    PAGE_TEXT, is_encrypted, page_contents, run_batch, widths, write_pdf, write_text_pdf,
};

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|window| window == needle)
}

/// Run a single-task batch and assert it succeeded.
fn run_one(source: &Path, destination: &Path, kind: TaskKind) {
    let summary = run_batch(
        PdfTaskRunner::without_compressor(),
        Batch::Files(vec![BatchTask::new(
            source.to_path_buf(),
            destination.to_path_buf(),
            kind,
        )]),
    );
    assert_eq!(summary.succeeded, 1, "{:?}", summary.outcomes);
}

/// Lock a three-page text PDF with `intent` and return (source, locked).
fn locked_text_pdf(dir: &Path, intent: ProtectionIntent) -> (PathBuf, PathBuf) {
    let source = write_text_pdf(dir, "text.pdf", 3);
    let locked = dir.join("text_locked.pdf");
    run_one(&source, &locked, TaskKind::Lock(intent));
    assert!(is_encrypted(&locked));
    (source, locked)
}

fn assert_unlocked_copy(source: &Path, unlocked: &Path) {
    assert!(!is_encrypted(unlocked));
    assert_eq!(widths(unlocked), widths(source));
    assert_eq!(page_contents(unlocked), vec![PAGE_TEXT.to_vec(); 3]);
    assert_eq!(page_contents(unlocked), page_contents(source));
}

#[test]
fn test_unlock_view_locked_file() {
    let dir = TempDir::new().unwrap();
    let (source, locked) = locked_text_pdf(
        dir.path(),
        ProtectionIntent::ViewLocked {
            password: "secret".to_string(),
        },
    );

    let unlocked = dir.path().join("text_unlocked.pdf");
    run_one(
        &locked,
        &unlocked,
        TaskKind::Unlock {
            password: "secret".to_string(),
        },
    );

    assert_unlocked_copy(&source, &unlocked);
}

#[test]
fn test_unlock_restricted_file() {
    let dir = TempDir::new().unwrap();
    let (source, locked) = locked_text_pdf(
        dir.path(),
        ProtectionIntent::Restricted {
            password: "owner".to_string(),
            forbid_copy: true,
            forbid_print: true,
        },
    );

    let unlocked = dir.path().join("text_unlocked.pdf");
    run_one(
        &locked,
        &unlocked,
        TaskKind::Unlock {
            password: "owner".to_string(),
        },
    );

    assert_unlocked_copy(&source, &unlocked);
}

#[test]
fn test_unlock_with_wrong_password_writes_nothing() {
    let dir = TempDir::new().unwrap();
    let (_, locked) = locked_text_pdf(
        dir.path(),
        ProtectionIntent::ViewLocked {
            password: "secret".to_string(),
        },
    );
    let unlocked = dir.path().join("text_unlocked.pdf");

    let mut doc = LopdfDocument::load(&locked).unwrap();
    let err = ProtectionEngine::unprotect_to(&mut doc, "guess", &unlocked).unwrap_err();

    assert!(matches!(err, ProtectionError::WrongPassword(ref name) if name == "text_locked.pdf"));
    assert!(doc.is_encrypted());
    assert!(!unlocked.exists());
}

#[test]
fn test_lock_writes_encrypted_copy() {
    let dir = TempDir::new().unwrap();
    let source = write_pdf(dir.path(), "plain.pdf", 2);
    let locked = dir.path().join("plain_locked.pdf");

    let summary = run_batch(
        PdfTaskRunner::without_compressor(),
        Batch::Files(vec![BatchTask::new(
            source.clone(),
            locked.clone(),
            TaskKind::Lock(ProtectionIntent::ViewLocked {
                password: "secret".to_string(),
            }),
        )]),
    );

    assert_eq!(summary.succeeded, 1, "{:?}", summary.outcomes);
    let bytes = std::fs::read(&locked).unwrap();
    assert!(contains(&bytes, b"/Encrypt"));
    assert!(!contains(&std::fs::read(&source).unwrap(), b"/Encrypt"));
}

#[test]
fn test_restricted_lock_without_restrictions_fails() {
    let dir = TempDir::new().unwrap();
    let source = write_pdf(dir.path(), "plain.pdf", 1);
    let locked = dir.path().join("plain_locked.pdf");

    let summary = run_batch(
        PdfTaskRunner::without_compressor(),
        Batch::Files(vec![BatchTask::new(
            source,
            locked.clone(),
            TaskKind::Lock(ProtectionIntent::Restricted {
                password: "owner".to_string(),
                forbid_copy: false,
                forbid_print: false,
            }),
        )]),
    );

    assert_eq!(summary.failed, 1);
    assert!(!locked.exists());
}

#[test]
fn test_unlock_plain_file_fails() {
    let dir = TempDir::new().unwrap();
    let source = write_pdf(dir.path(), "plain.pdf", 1);
    let out = dir.path().join("plain_unlocked.pdf");

    let summary = run_batch(
        PdfTaskRunner::without_compressor(),
        Batch::Files(vec![BatchTask::new(
            source,
            out.clone(),
            TaskKind::Unlock {
                password: "anything".to_string(),
            },
        )]),
    );

    let TaskOutcome::Failed { error, .. } = &summary.outcomes[0] else {
        panic!("expected failure, got {:?}", summary.outcomes[0]);
    };
    assert!(error.contains("plain.pdf"), "{error}");
    assert!(!out.exists());
}
