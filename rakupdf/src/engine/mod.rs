//! Document transformation engines.
//!
//! Each engine checks its preconditions, builds a [`PagePlan`](crate::pages::PagePlan)
//! and asks the [`PdfDocument`](crate::document::PdfDocument) backend to assemble
//! the result. Engines are synchronous and hold no shared state, so they can be
//! called directly from tests or from the batch worker thread.
//!
//! # Examples
//!
//! ```
//! use rakupdf::document::MemoryDocument;
//! use rakupdf::engine::{SplitEngine, SplitMode};
//! use rakupdf::pages::parse_page_ranges;
//!
//! let doc = MemoryDocument::new("report", 3);
//! let targets = parse_page_ranges("2", 3).unwrap();
//! let split = SplitEngine::split(&doc, SplitMode::Delete, &targets).unwrap();
//! assert_eq!(split.document.labels(), vec!["report#1", "report#3"]);
//! ```

pub mod compress;
pub mod merge;
pub mod protect;
pub mod reorder;
pub mod split;

pub use compress::{
    CompressError, CompressionJob, CompressionLevel, CompressionResult, CompressionSearch,
    Compressor, GhostscriptCompressor, PresetLadder, SearchOutcome, compress_file,
    find_ghostscript,
};
pub use merge::{MergeEngine, MergeError, MergeOutcome, MergeProgress, Merged};
pub use protect::{ProtectionEngine, ProtectionError, ProtectionIntent};
pub use reorder::{ReorderEngine, ReorderError, ReorderOutcome, ReorderScript, Reordered};
pub use split::{Split, SplitEngine, SplitError, SplitMode, SplitOutcome};
