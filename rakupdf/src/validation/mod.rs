//! Input and output validation.
//!
//! Runs before any engine: every input must exist, be a non-empty regular
//! file and load as a PDF, and the output directory must be usable. Inputs
//! are validated concurrently, results stay in input order.
//!
//! # Examples
//!
//! ```no_run
//! use rakupdf::validation::Validator;
//! use std::path::Path;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let result = Validator::new().validate_file(Path::new("test.pdf")).await?;
//! println!("PDF has {} pages", result.page_count);
//! # Ok(())
//! # }
//! ```

use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::config::{Config, Operation, OverwriteMode};
use crate::error::{RakuError, Result};
use crate::io::{LoadedPdf, PdfReader, format_file_size};

/// Result of validating a single PDF file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    /// Path to the validated file.
    pub path: PathBuf,

    /// Number of pages in the PDF.
    pub page_count: usize,

    /// PDF version (major, minor).
    pub version: Option<(u8, u8)>,

    /// Size of the file in bytes.
    pub file_size: u64,

    /// Whether the PDF is encrypted.
    pub is_encrypted: bool,

    /// First page size (width, height) in points, if available.
    pub page_dimensions: Option<(f32, f32)>,
}

impl ValidationResult {
    fn from_loaded(loaded: &LoadedPdf) -> Self {
        let doc = loaded.document.inner();

        let version = doc.version.split_once('.').map(|(major, minor)| {
            (
                major.parse::<u8>().unwrap_or_default(),
                minor.parse::<u8>().unwrap_or_default(),
            )
        });

        let page_dimensions = doc
            .get_pages()
            .values()
            .next()
            .and_then(|page_id| doc.get_dictionary(*page_id).ok())
            .and_then(|page| page.get(b"MediaBox").ok())
            .and_then(|mediabox| mediabox.as_array().ok())
            .filter(|arr| arr.len() >= 4)
            .and_then(|arr| Some((arr[2].as_float().ok()?, arr[3].as_float().ok()?)));

        Self {
            path: loaded.path.clone(),
            page_count: loaded.page_count,
            version,
            file_size: loaded.file_size,
            is_encrypted: loaded.encrypted,
            page_dimensions,
        }
    }
}

/// Summary of validation results for multiple files.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationSummary {
    /// Individual validation results for each file.
    pub results: Vec<ValidationResult>,

    /// Total number of pages across all files.
    pub total_pages: usize,

    /// Total file size in bytes.
    pub total_size: u64,

    /// Number of files that passed validation.
    pub files_validated: usize,

    /// Number of files that failed validation.
    pub files_failed: usize,

    /// Number of valid files that are encrypted.
    pub files_encrypted: usize,
}

impl ValidationSummary {
    /// Create a summary from validation results.
    pub fn from_results(results: Vec<ValidationResult>) -> Self {
        Self {
            total_pages: results.iter().map(|r| r.page_count).sum(),
            total_size: results.iter().map(|r| r.file_size).sum(),
            files_validated: results.len(),
            files_failed: 0,
            files_encrypted: results.iter().filter(|r| r.is_encrypted).count(),
            results,
        }
    }

    /// Paths of the files that passed.
    pub fn paths(&self) -> Vec<PathBuf> {
        self.results.iter().map(|r| r.path.clone()).collect()
    }

    /// Format the total file size as a human-readable string.
    pub fn format_total_size(&self) -> String {
        format_file_size(self.total_size)
    }
}

/// Validator for PDF files and output locations.
#[derive(Debug, Clone, Default)]
pub struct Validator {
    reader: PdfReader,
}

impl Validator {
    /// Create a new validator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate a single PDF file.
    ///
    /// Encrypted files pass; whether that is acceptable depends on the
    /// operation.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing, not a regular file, empty,
    /// inaccessible, or not a loadable PDF.
    pub async fn validate_file(&self, path: &Path) -> Result<ValidationResult> {
        let metadata = tokio::fs::metadata(path).await.map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => RakuError::file_not_found(path),
            _ => RakuError::not_accessible(path, e),
        })?;

        if !metadata.is_file() {
            return Err(RakuError::not_a_file(path));
        }

        if metadata.len() == 0 {
            return Err(RakuError::corrupted_pdf(path, "File is empty"));
        }

        let reader = self.reader.clone();
        let owned = path.to_path_buf();
        let loaded = tokio::task::spawn_blocking(move || reader.load(&owned))
            .await
            .map_err(|e| RakuError::other(format!("validation task failed: {e}")))??;

        Ok(ValidationResult::from_loaded(&loaded))
    }

    /// Validate `paths` with up to `jobs` files in flight.
    ///
    /// With `continue_on_error`, invalid files are logged and counted but
    /// left out of the summary.
    ///
    /// # Errors
    ///
    /// Returns the first file error unless `continue_on_error` is set, and
    /// [`RakuError::NoInputFiles`] if nothing valid remains.
    pub async fn validate_files(
        &self,
        paths: &[PathBuf],
        jobs: usize,
        continue_on_error: bool,
    ) -> Result<ValidationSummary> {
        let outcomes: Vec<Result<ValidationResult>> = stream::iter(paths)
            .map(|path| self.validate_file(path))
            .buffered(jobs.max(1))
            .collect()
            .await;

        let mut results = Vec::with_capacity(outcomes.len());
        let mut failed = 0;
        for (path, outcome) in paths.iter().zip(outcomes) {
            match outcome {
                Ok(result) => results.push(result),
                Err(e) if continue_on_error && !e.is_fatal() => {
                    warn!(path = %path.display(), error = %e, "skipping invalid input");
                    failed += 1;
                }
                Err(e) => return Err(e),
            }
        }

        if results.is_empty() {
            return Err(RakuError::NoInputFiles);
        }

        let mut summary = ValidationSummary::from_results(results);
        summary.files_failed = failed;
        Ok(summary)
    }

    /// Check that every planned output can be written.
    ///
    /// With [`OverwriteMode::NoClobber`] an existing output is an error; the
    /// other modes leave existing files to the overwrite gate.
    ///
    /// # Errors
    ///
    /// Returns an error for an existing output under no-clobber or an
    /// unwritable location.
    pub fn validate_outputs(&self, outputs: &[&Path], mode: OverwriteMode) -> Result<()> {
        let writer = crate::io::PdfWriter::new();
        for output in outputs {
            if mode == OverwriteMode::NoClobber && output.exists() {
                return Err(RakuError::output_exists(*output));
            }
            writer.can_write(output)?;
        }
        Ok(())
    }

    /// Create the output directory if one is configured.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub async fn prepare_output_dir(&self, config: &Config) -> Result<()> {
        if let Some(dir) = &config.output_dir
            && !config.dry_run
        {
            tokio::fs::create_dir_all(dir)
                .await
                .map_err(|e| RakuError::failed_to_create_output(dir, e))?;
        }
        Ok(())
    }

    /// Validate every input of `config`.
    ///
    /// A merge additionally refuses encrypted inputs up front, since one
    /// encrypted source fails the whole merge anyway.
    ///
    /// # Errors
    ///
    /// Returns an error if any check fails.
    pub async fn validate_config(&self, config: &Config) -> Result<ValidationSummary> {
        let summary = self
            .validate_files(&config.inputs, config.effective_jobs(), config.continue_on_error)
            .await?;

        if config.operation == Operation::Merge
            && let Some(locked) = summary.results.iter().find(|r| r.is_encrypted)
        {
            return Err(RakuError::encrypted_pdf(&locked.path));
        }

        Ok(summary)
    }
}
