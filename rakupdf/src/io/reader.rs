//! PDF loading.
//!
//! Loading is synchronous and CPU-bound; async callers move it onto tokio's
//! blocking pool.
//!
//! # Examples
//!
//! ```no_run
//! use rakupdf::io::PdfReader;
//! use std::path::Path;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let loaded = PdfReader::new().load(Path::new("a.pdf"))?;
//! println!("{} pages", loaded.page_count);
//! # Ok(())
//! # }
//! ```

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::debug;

use crate::document::{LopdfDocument, PdfDocument};
use crate::error::{RakuError, Result};

/// A loaded PDF document with metadata.
#[derive(Debug)]
pub struct LoadedPdf {
    /// The PDF document.
    pub document: LopdfDocument,

    /// Path to the source file.
    pub path: PathBuf,

    /// Number of pages in the document.
    pub page_count: usize,

    /// Whether the document is password protected.
    pub encrypted: bool,

    /// Time taken to load the document.
    pub load_time: Duration,

    /// File size in bytes.
    pub file_size: u64,
}

/// PDF reader with configurable loading behavior.
#[derive(Debug, Clone)]
pub struct PdfReader {
    /// Reject documents without pages.
    verify: bool,
}

impl Default for PdfReader {
    fn default() -> Self {
        Self::new()
    }
}

impl PdfReader {
    /// Create a reader that rejects page-less documents.
    pub fn new() -> Self {
        Self { verify: true }
    }

    /// Create a reader that skips verification.
    pub fn without_verification() -> Self {
        Self { verify: false }
    }

    /// Load a single PDF document.
    ///
    /// Encrypted documents load successfully and report `encrypted: true`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be parsed, or, when verifying,
    /// if an unencrypted document has no pages.
    pub fn load(&self, path: &Path) -> Result<LoadedPdf> {
        let start = Instant::now();
        let document = LopdfDocument::load(path)?;

        let page_count = document.page_count();
        let encrypted = document.is_encrypted();
        if self.verify && !encrypted && page_count == 0 {
            return Err(RakuError::corrupted_pdf(path, "PDF has no pages"));
        }

        let load_time = start.elapsed();
        let file_size = std::fs::metadata(path).map(|m| m.len()).unwrap_or(0);
        debug!(
            path = %path.display(),
            pages = page_count,
            encrypted,
            elapsed_ms = load_time.as_millis() as u64,
            "pdf loaded"
        );

        Ok(LoadedPdf {
            document,
            path: path.to_path_buf(),
            page_count,
            encrypted,
            load_time,
            file_size,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::{Document, dictionary};
    use tempfile::TempDir;

    fn write_pdf(path: &Path, pages: usize) {
        let mut doc = Document::with_version("1.4");
        let pages_id = doc.new_object_id();
        let kids: Vec<lopdf::Object> = (0..pages)
            .map(|_| {
                doc.add_object(dictionary! {
                    "Type" => "Page",
                    "Parent" => pages_id,
                    "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
                })
                .into()
            })
            .collect();
        doc.objects.insert(
            pages_id,
            dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => pages as i64,
            }
            .into(),
        );
        let catalog = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog);
        doc.save(path).unwrap();
    }

    #[test]
    fn test_load_single() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("three.pdf");
        write_pdf(&path, 3);

        let loaded = PdfReader::new().load(&path).unwrap();
        assert_eq!(loaded.page_count, 3);
        assert!(!loaded.encrypted);
        assert!(loaded.file_size > 0);
        assert_eq!(loaded.document.name(), "three.pdf");
    }

    #[test]
    fn test_load_rejects_garbage() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("fake.pdf");
        std::fs::write(&path, b"not a pdf at all").unwrap();

        let err = PdfReader::new().load(&path).unwrap_err();
        assert!(matches!(err, RakuError::FailedToLoadPdf { .. }));
    }

    #[test]
    fn test_verification_rejects_empty_documents() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("empty.pdf");
        write_pdf(&path, 0);

        assert!(matches!(
            PdfReader::new().load(&path),
            Err(RakuError::CorruptedPdf { .. })
        ));
        assert!(PdfReader::without_verification().load(&path).is_ok());
    }
}
