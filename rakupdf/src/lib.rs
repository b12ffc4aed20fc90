//! rakupdf - Merge, split, reorder, compress and password-protect PDF files.
//!
//! The crate is organised leaves first:
//!
//! - [`pages`]: page-range parsing, the interactive page order model and
//!   quarter-turn rotations
//! - [`document`]: the [`PdfDocument`](document::PdfDocument) seam with a
//!   `lopdf` backend and an in-memory backend
//! - [`engine`]: merge, split, reorder, compression search and password
//!   protection
//! - [`naming`]: output file names
//! - [`batch`]: runs work on a worker thread and reports progress over a
//!   channel
//! - [`io`], [`validation`], [`output`], [`config`]: the plumbing around them
//!
//! # Examples
//!
//! ## Parse a page range
//!
//! ```
//! use rakupdf::pages::parse_page_ranges;
//!
//! let pages = parse_page_ranges("1-3, 5", 10).unwrap();
//! assert_eq!(pages.as_slice(), &[0, 1, 2, 4]);
//! ```
//!
//! ## Run a batch
//!
//! ```no_run
//! use rakupdf::batch::{BatchCoordinator, BatchEvent, PdfTaskRunner};
//! use rakupdf::config::{Config, Operation};
//! use rakupdf::engine::SplitMode;
//! use std::path::PathBuf;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::new(
//!     Operation::Split {
//!         mode: SplitMode::Keep,
//!         pages: "1-2".into(),
//!     },
//!     vec![PathBuf::from("report.pdf")],
//! );
//! config.validate()?;
//!
//! let coordinator = BatchCoordinator::new(PdfTaskRunner::without_compressor());
//! let mut handle = coordinator.spawn(config.batch()?)?;
//! while let Some(event) = handle.next_event().await {
//!     if let BatchEvent::Finished(summary) = event {
//!         println!("{} file(s) written", summary.succeeded);
//!     }
//! }
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod batch;
pub mod config;
pub mod document;
pub mod engine;
pub mod error;
pub mod io;
pub mod naming;
pub mod output;
pub mod pages;
pub mod utils;
pub mod validation;

pub use config::Config;
pub use error::{RakuError, Result};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name.
pub const NAME: &str = env!("CARGO_PKG_NAME");
