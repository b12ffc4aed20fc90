//! Concatenate whole documents.

use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

use crate::document::{DocumentError, PdfDocument};
use crate::pages::PagePlan;

/// Errors raised while merging.
#[derive(Debug, Error)]
pub enum MergeError {
    /// Merging needs at least two inputs.
    #[error("merging needs at least two PDF files (got {0})")]
    NotEnoughSources(usize),

    /// A source is encrypted.
    #[error("{0} is encrypted; unlock it before merging")]
    EncryptedSource(String),

    /// The backend failed.
    #[error(transparent)]
    Document(#[from] DocumentError),
}

/// Progress after a source has been appended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergeProgress<'a> {
    /// Sources appended so far.
    pub merged: usize,
    /// Number of sources.
    pub total: usize,
    /// Name of the source just appended.
    pub name: &'a str,
}

impl MergeProgress<'_> {
    /// Completed share in `0.0..=1.0`.
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            return 1.0;
        }
        self.merged as f64 / self.total as f64
    }
}

/// A merged document that has not been written yet.
#[derive(Debug)]
pub struct Merged<D> {
    /// The merged document.
    pub document: D,
    /// Number of sources merged.
    pub sources: usize,
    /// Number of pages in the result.
    pub total_pages: usize,
}

/// Summary of a written merge.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeOutcome {
    /// Number of sources merged.
    pub sources: usize,
    /// Number of pages written.
    pub total_pages: usize,
    /// Output file.
    pub output_path: PathBuf,
}

impl<D: PdfDocument> Merged<D> {
    /// Write the merged document.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot write `path`.
    pub fn write(self, path: &Path) -> Result<MergeOutcome, MergeError> {
        self.document.write(path)?;
        info!(path = %path.display(), pages = self.total_pages, "merged document written");
        Ok(MergeOutcome {
            sources: self.sources,
            total_pages: self.total_pages,
            output_path: path.to_path_buf(),
        })
    }
}

/// Appends every page of every source, in input order.
#[derive(Debug, Default, Clone, Copy)]
pub struct MergeEngine;

impl MergeEngine {
    /// Merge `sources` into one new document.
    ///
    /// Every source is checked for encryption before any page is copied, so
    /// an encrypted input never leaves a partial result behind.
    ///
    /// `on_progress` fires once per source as its pages join the plan. Pages
    /// are copied afterwards in one assembly pass, and the final report waits
    /// for that pass: a merge is only reported complete once the merged
    /// document exists.
    ///
    /// # Errors
    ///
    /// Returns [`MergeError::NotEnoughSources`] for fewer than two sources and
    /// [`MergeError::EncryptedSource`] for the first encrypted one.
    pub fn merge<D, F>(sources: &[&D], mut on_progress: F) -> Result<Merged<D>, MergeError>
    where
        D: PdfDocument,
        F: FnMut(MergeProgress<'_>),
    {
        if sources.len() < 2 {
            return Err(MergeError::NotEnoughSources(sources.len()));
        }

        if let Some(locked) = sources.iter().find(|source| source.is_encrypted()) {
            return Err(MergeError::EncryptedSource(locked.name().to_string()));
        }

        let total = sources.len();
        let mut plan = PagePlan::default();
        for (position, source) in sources.iter().enumerate() {
            plan.extend(PagePlan::whole(position, source.page_count()));
            debug!(name = source.name(), pages = source.page_count(), "appending source");
            if position + 1 < total {
                on_progress(MergeProgress {
                    merged: position + 1,
                    total,
                    name: source.name(),
                });
            }
        }

        let total_pages = plan.len();
        let document = D::assemble(sources, &plan)?;
        if let Some(last) = sources.last() {
            on_progress(MergeProgress {
                merged: total,
                total,
                name: last.name(),
            });
        }

        Ok(Merged {
            document,
            sources: total,
            total_pages,
        })
    }
}
