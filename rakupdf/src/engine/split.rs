//! Keep or delete a set of pages.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

use crate::document::{DocumentError, PdfDocument};
use crate::pages::{PageIndexSet, PagePlan};

/// What to do with the targeted pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SplitMode {
    /// Output only the targeted pages.
    Keep,
    /// Output every page except the targeted ones.
    Delete,
}

impl SplitMode {
    /// Suffix used for default output names.
    pub fn suffix(self) -> &'static str {
        match self {
            SplitMode::Keep => "extracted",
            SplitMode::Delete => "removed",
        }
    }
}

/// Errors raised while splitting.
#[derive(Debug, Error)]
pub enum SplitError {
    /// The source is encrypted.
    #[error("{0} is encrypted; unlock it before splitting")]
    Encrypted(String),

    /// The source has no pages.
    #[error("document has no pages (total pages: {total_pages})")]
    Empty {
        /// Page count of the source.
        total_pages: usize,
    },

    /// No pages were named.
    #[error("no pages selected")]
    NoTargets,

    /// A targeted index does not exist.
    #[error("page {} does not exist (document has {total_pages} page(s))", .index + 1)]
    TargetOutOfRange {
        /// Zero-based index that was rejected.
        index: usize,
        /// Page count of the source.
        total_pages: usize,
    },

    /// Deleting the targets would leave an empty document.
    #[error("no pages would remain")]
    NothingRemains,

    /// The backend failed.
    #[error(transparent)]
    Document(#[from] DocumentError),
}

/// Summary of a written split.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SplitOutcome {
    /// Page count of the source.
    pub total_pages: usize,
    /// Pages in the output.
    pub kept_pages: usize,
    /// Output file.
    pub output_path: PathBuf,
}

/// A split document that has not been written yet.
#[derive(Debug)]
pub struct Split<D> {
    /// The new document.
    pub document: D,
    /// Page count of the source.
    pub total_pages: usize,
    /// Pages in the new document.
    pub kept_pages: usize,
}

impl<D: PdfDocument> Split<D> {
    /// Write the split document.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot write `path`.
    pub fn write(self, path: &Path) -> Result<SplitOutcome, SplitError> {
        self.document.write(path)?;
        info!(
            path = %path.display(),
            kept = self.kept_pages,
            total = self.total_pages,
            "split document written"
        );
        Ok(SplitOutcome {
            total_pages: self.total_pages,
            kept_pages: self.kept_pages,
            output_path: path.to_path_buf(),
        })
    }
}

/// Page list for `mode`, ascending.
///
/// # Errors
///
/// Returns the first precondition that fails.
pub fn pages_to_keep(
    mode: SplitMode,
    targets: &PageIndexSet,
    total_pages: usize,
) -> Result<Vec<usize>, SplitError> {
    if total_pages == 0 {
        return Err(SplitError::Empty { total_pages });
    }
    if targets.is_empty() {
        return Err(SplitError::NoTargets);
    }
    if let Some(index) = targets.iter().find(|&index| index >= total_pages) {
        return Err(SplitError::TargetOutOfRange { index, total_pages });
    }

    let kept = match mode {
        SplitMode::Keep => targets.as_slice().to_vec(),
        SplitMode::Delete => targets.complement(total_pages).into_vec(),
    };

    if kept.is_empty() {
        return Err(SplitError::NothingRemains);
    }
    Ok(kept)
}

/// Builds documents from a subset of a source's pages.
#[derive(Debug, Default, Clone, Copy)]
pub struct SplitEngine;

impl SplitEngine {
    /// Keep or delete `targets` from `doc`.
    ///
    /// # Errors
    ///
    /// Fails without producing a document when the source is encrypted or
    /// empty, `targets` is empty or out of range, or nothing would remain.
    pub fn split<D: PdfDocument>(
        doc: &D,
        mode: SplitMode,
        targets: &PageIndexSet,
    ) -> Result<Split<D>, SplitError> {
        if doc.is_encrypted() {
            return Err(SplitError::Encrypted(doc.name().to_string()));
        }

        let total_pages = doc.page_count();
        let kept = pages_to_keep(mode, targets, total_pages)?;
        let kept_pages = kept.len();
        let document = D::assemble(&[doc], &PagePlan::pages_of(0, kept))?;

        Ok(Split {
            document,
            total_pages,
            kept_pages,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::MemoryDocument;
    use crate::pages::parse_page_ranges;
    use rstest::rstest;

    #[test]
    fn test_delete_middle_page() {
        let doc = MemoryDocument::new("d", 3);
        let targets = parse_page_ranges("2", 3).unwrap();

        let split = SplitEngine::split(&doc, SplitMode::Delete, &targets).unwrap();
        assert_eq!(split.total_pages, 3);
        assert_eq!(split.kept_pages, 2);
        assert_eq!(split.document.labels(), vec!["d#1", "d#3"]);
    }

    #[test]
    fn test_keep_sorts_targets() {
        let doc = MemoryDocument::new("d", 10);
        let targets = parse_page_ranges("7,1", 10).unwrap();

        let split = SplitEngine::split(&doc, SplitMode::Keep, &targets).unwrap();
        assert_eq!(split.document.labels(), vec!["d#1", "d#7"]);
    }

    #[rstest]
    #[case("1")]
    #[case("2-4,9")]
    #[case("1-10")]
    #[case("3,5,7")]
    fn test_keep_and_delete_partition_pages(#[case] spec: &str) {
        let targets = parse_page_ranges(spec, 10).unwrap();
        let kept = pages_to_keep(SplitMode::Keep, &targets, 10).unwrap();
        let removed = pages_to_keep(SplitMode::Delete, &targets, 10).unwrap_or_default();

        assert_eq!(kept.len(), targets.len());
        assert_eq!(kept.len() + removed.len(), 10);
        assert!(kept.iter().all(|page| !removed.contains(page)));
    }

    #[test]
    fn test_delete_everything_fails() {
        let doc = MemoryDocument::new("d", 2);
        let targets = parse_page_ranges("1-2", 2).unwrap();
        let err = SplitEngine::split(&doc, SplitMode::Delete, &targets).unwrap_err();
        assert!(matches!(err, SplitError::NothingRemains));
    }

    #[test]
    fn test_preconditions() {
        let empty = MemoryDocument::new("e", 0);
        let targets: PageIndexSet = [0].into_iter().collect();
        assert!(matches!(
            SplitEngine::split(&empty, SplitMode::Keep, &targets),
            Err(SplitError::Empty { total_pages: 0 })
        ));

        let doc = MemoryDocument::new("d", 2);
        assert!(matches!(
            SplitEngine::split(&doc, SplitMode::Keep, &PageIndexSet::new()),
            Err(SplitError::NoTargets)
        ));

        let far: PageIndexSet = [5].into_iter().collect();
        assert!(matches!(
            SplitEngine::split(&doc, SplitMode::Keep, &far),
            Err(SplitError::TargetOutOfRange { index: 5, .. })
        ));

        let locked = MemoryDocument::encrypted("l", 2, "pw");
        assert!(matches!(
            SplitEngine::split(&locked, SplitMode::Keep, &targets),
            Err(SplitError::Encrypted(_))
        ));
    }
}
