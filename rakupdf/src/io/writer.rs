//! PDF writing.
//!
//! Output files are written atomically by default: the document goes to a
//! sibling temp file which is renamed over the destination once complete, so
//! a failed write never leaves a truncated PDF behind.
//!
//! # Examples
//!
//! ```no_run
//! use rakupdf::io::PdfWriter;
//! use lopdf::Document;
//! use std::path::Path;
//!
//! # fn example(doc: Document) -> Result<(), Box<dyn std::error::Error>> {
//! let stats = PdfWriter::new().save(&doc, Path::new("output.pdf"))?;
//! println!("wrote {}", stats.format_file_size());
//! # Ok(())
//! # }
//! ```

use lopdf::Document;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::debug;

use crate::error::{RakuError, Result};

/// Options for writing PDF files.
#[derive(Debug, Clone)]
pub struct WriteOptions {
    /// Write to a temp file, then rename.
    pub atomic: bool,

    /// Compress content streams before writing.
    pub compress: bool,

    /// Renumber objects before writing.
    pub optimize: bool,

    /// Buffer size for writing (in bytes).
    pub buffer_size: usize,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            atomic: true,
            compress: true,
            optimize: true,
            buffer_size: 8192,
        }
    }
}

impl WriteOptions {
    /// Write the document exactly as it is, still atomically.
    ///
    /// Needed for encrypted documents, whose object keys depend on object
    /// numbers and whose streams are already sealed.
    pub fn verbatim() -> Self {
        Self {
            compress: false,
            optimize: false,
            ..Self::default()
        }
    }
}

/// Statistics about a write operation.
#[derive(Debug, Clone)]
pub struct WriteStatistics {
    /// Time taken to write the file.
    pub write_time: Duration,

    /// Size of the written file in bytes.
    pub file_size: u64,

    /// Path where the file was written.
    pub output_path: PathBuf,

    /// Whether compression was applied.
    pub compressed: bool,

    /// Whether optimization was applied.
    pub optimized: bool,
}

impl WriteStatistics {
    /// Format file size as human-readable string.
    pub fn format_file_size(&self) -> String {
        format_file_size(self.file_size)
    }
}

/// PDF writer with configurable behavior.
#[derive(Debug, Clone, Default)]
pub struct PdfWriter {
    options: WriteOptions,
}

impl PdfWriter {
    /// Create a new PDF writer with default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a writer with custom options.
    pub fn with_options(options: WriteOptions) -> Self {
        Self { options }
    }

    /// Save `doc` to `path`, creating the parent directory if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory or file cannot be created, or if
    /// serializing or renaming fails.
    pub fn save(&self, doc: &Document, path: &Path) -> Result<WriteStatistics> {
        let start = Instant::now();
        let options = &self.options;

        // save_to takes the document mutably
        let mut doc = doc.clone();
        if options.compress {
            doc.compress();
        }
        if options.optimize {
            doc.renumber_objects();
        }

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|e| RakuError::failed_to_create_output(parent, e))?;
        }

        let write_path = if options.atomic {
            temp_path(path)
        } else {
            path.to_path_buf()
        };

        let written = write_to(&mut doc, &write_path, options.buffer_size).and_then(|()| {
            if options.atomic {
                std::fs::rename(&write_path, path)
                    .map_err(|e| RakuError::failed_to_write(path, e))?;
            }
            Ok(())
        });

        if let Err(err) = written {
            if options.atomic {
                let _ = std::fs::remove_file(&write_path);
            }
            return Err(err);
        }

        let file_size = std::fs::metadata(path).map(|m| m.len()).unwrap_or(0);
        let stats = WriteStatistics {
            write_time: start.elapsed(),
            file_size,
            output_path: path.to_path_buf(),
            compressed: options.compress,
            optimized: options.optimize,
        };

        debug!(
            path = %path.display(),
            size = stats.file_size,
            elapsed_ms = stats.write_time.as_millis() as u64,
            "pdf written"
        );
        Ok(stats)
    }

    /// Check that `path` could be written without writing it.
    ///
    /// # Errors
    ///
    /// Returns an error if the parent directory exists but is read-only or
    /// inaccessible, or if `path` is an existing directory.
    pub fn can_write(&self, path: &Path) -> Result<()> {
        if path.is_dir() {
            return Err(RakuError::not_a_file(path));
        }

        if let Some(parent) = path.parent().filter(|p| p.exists()) {
            let metadata =
                std::fs::metadata(parent).map_err(|e| RakuError::not_accessible(parent, e))?;

            if metadata.permissions().readonly() {
                return Err(RakuError::invalid_config(format!(
                    "Output directory is not writable: {}",
                    parent.display()
                )));
            }
        }

        Ok(())
    }
}

fn write_to(doc: &mut Document, path: &Path, buffer_size: usize) -> Result<()> {
    let file =
        std::fs::File::create(path).map_err(|e| RakuError::failed_to_create_output(path, e))?;
    let mut writer = std::io::BufWriter::with_capacity(buffer_size, file);

    doc.save_to(&mut writer)
        .map_err(|e| RakuError::failed_to_write(path, std::io::Error::other(e)))?;

    writer
        .flush()
        .map_err(|e| RakuError::failed_to_write(path, e))
}

/// `report.pdf` is staged as `report.pdf.part`.
fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".part");
    path.with_file_name(name)
}

/// Format file size as human-readable string.
pub fn format_file_size(size: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if size >= GB {
        format!("{:.2} GB", size as f64 / GB as f64)
    } else if size >= MB {
        format!("{:.2} MB", size as f64 / MB as f64)
    } else if size >= KB {
        format!("{:.2} KB", size as f64 / KB as f64)
    } else {
        format!("{size} bytes")
    }
}
