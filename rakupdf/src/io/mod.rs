//! File I/O for rakupdf.
//!
//! - [`PdfReader`] loads and checks documents
//! - [`PdfWriter`] writes documents atomically
//!
//! # Examples
//!
//! ```no_run
//! use rakupdf::io::{PdfReader, PdfWriter};
//! use std::path::Path;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let loaded = PdfReader::new().load(Path::new("input.pdf"))?;
//! PdfWriter::new().save(loaded.document.inner(), Path::new("copy.pdf"))?;
//! # Ok(())
//! # }
//! ```

pub mod reader;
pub mod writer;

pub use reader::{LoadedPdf, PdfReader};
pub use writer::{PdfWriter, WriteOptions, WriteStatistics, format_file_size};
