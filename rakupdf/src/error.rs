//! Error types for rakupdf.
//!
//! Engines and modules raise their own focused errors (`MergeError`,
//! `RangeError`, ...). [`RakuError`] collects them together with the file
//! system problems met while validating inputs and writing outputs, and maps
//! each to a process exit code.
//!
//! # Error Categories
//!
//! - **I/O Errors**: file not found, permission denied, output already exists
//! - **PDF Errors**: unreadable or encrypted documents
//! - **Input Errors**: page specs, page orders, output names, configuration
//! - **Operation Errors**: merge, split, reorder, compress and protection failures

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use crate::batch::BatchError;
use crate::document::DocumentError;
use crate::engine::{
    CompressError, MergeError, ProtectionError, ReorderError, SplitError,
};
use crate::naming::NamingError;
use crate::pages::{OrderError, RangeError};

/// Result type alias for rakupdf operations.
pub type Result<T> = std::result::Result<T, RakuError>;

/// Main error type for rakupdf.
#[derive(Debug)]
pub enum RakuError {
    /// Input file was not found.
    FileNotFound {
        /// Path to the file that was not found.
        path: PathBuf,
    },

    /// Input file is not accessible (permission denied, etc.).
    FileNotAccessible {
        /// Path to the inaccessible file.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// Input path is not a regular file.
    NotAFile {
        /// Offending path.
        path: PathBuf,
    },

    /// Failed to load PDF file.
    FailedToLoadPdf {
        /// Path to the PDF file.
        path: PathBuf,
        /// Reason for the failure.
        reason: String,
    },

    /// PDF loaded but has an unusable structure.
    CorruptedPdf {
        /// Path to the corrupted PDF.
        path: PathBuf,
        /// Details about the corruption.
        details: String,
    },

    /// PDF file is encrypted and the operation needs it unlocked.
    EncryptedPdf {
        /// Path to the encrypted PDF.
        path: PathBuf,
    },

    /// No input files were given.
    NoInputFiles,

    /// Output file already exists and overwriting was refused.
    OutputExists {
        /// Path to the existing output file.
        path: PathBuf,
    },

    /// Failed to create an output file or directory.
    FailedToCreateOutput {
        /// Path where output should be created.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// Failed to write an output file.
    FailedToWrite {
        /// Path being written to.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// A page spec could not be parsed.
    PageRange(RangeError),

    /// A page order is not a valid permutation.
    PageOrder(OrderError),

    /// Output name problem.
    Naming(NamingError),

    /// Merge operation failed.
    Merge(MergeError),

    /// Split operation failed.
    Split(SplitError),

    /// Reorder operation failed.
    Reorder(ReorderError),

    /// Compression failed.
    Compress(CompressError),

    /// Locking or unlocking failed.
    Protection(ProtectionError),

    /// The document backend failed.
    Document(DocumentError),

    /// The batch coordinator refused or lost a batch.
    Batch(BatchError),

    /// Some tasks of a batch failed.
    BatchIncomplete {
        /// Tasks that failed.
        failed: usize,
        /// Tasks in the batch.
        total: usize,
    },

    /// Invalid configuration.
    InvalidConfig {
        /// Description of what's wrong with the configuration.
        message: String,
    },

    /// User cancelled the operation.
    Cancelled,

    /// Generic I/O error.
    Io {
        /// Underlying I/O error.
        source: io::Error,
    },

    /// Generic error with a custom message.
    Other {
        /// Error message.
        message: String,
    },
}

impl fmt::Display for RakuError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FileNotFound { path } => {
                write!(f, "File not found: {}", path.display())
            }
            Self::FileNotAccessible { path, source } => {
                write!(
                    f,
                    "Cannot access file: {}\n  Reason: {}",
                    path.display(),
                    source
                )
            }
            Self::NotAFile { path } => {
                write!(f, "Not a file: {}", path.display())
            }
            Self::FailedToLoadPdf { path, reason } => {
                write!(
                    f,
                    "Failed to load PDF: {}\n  Reason: {}",
                    path.display(),
                    reason
                )
            }
            Self::CorruptedPdf { path, details } => {
                write!(
                    f,
                    "Corrupted or invalid PDF: {}\n  Details: {}",
                    path.display(),
                    details
                )
            }
            Self::EncryptedPdf { path } => {
                write!(
                    f,
                    "PDF is encrypted: {}\n  \
                     Hint: Remove the password first with 'rakupdf unlock'",
                    path.display()
                )
            }
            Self::NoInputFiles => {
                write!(f, "No input PDF files specified")
            }
            Self::OutputExists { path } => {
                write!(
                    f,
                    "Output file already exists: {}\n  \
                     Use --force to overwrite or choose a different output name",
                    path.display()
                )
            }
            Self::FailedToCreateOutput { path, source } => {
                write!(
                    f,
                    "Failed to create output: {}\n  Reason: {}",
                    path.display(),
                    source
                )
            }
            Self::FailedToWrite { path, source } => {
                write!(
                    f,
                    "Failed to write to output file: {}\n  Reason: {}",
                    path.display(),
                    source
                )
            }
            Self::PageRange(err) => write!(f, "Invalid page selection: {err}"),
            Self::PageOrder(err) => write!(f, "Invalid page order: {err}"),
            Self::Naming(err) => write!(f, "Invalid output name: {err}"),
            Self::Merge(err) => write!(f, "Merge failed: {err}"),
            Self::Split(err) => write!(f, "Split failed: {err}"),
            Self::Reorder(err) => write!(f, "Reorder failed: {err}"),
            Self::Compress(err) => write!(f, "Compression failed: {err}"),
            Self::Protection(err) => write!(f, "{err}"),
            Self::Document(err) => write!(f, "{err}"),
            Self::Batch(err) => write!(f, "{err}"),
            Self::BatchIncomplete { failed, total } => {
                write!(f, "{failed} of {total} file(s) failed")
            }
            Self::InvalidConfig { message } => {
                write!(f, "Invalid configuration: {message}")
            }
            Self::Cancelled => {
                write!(f, "Operation cancelled by user")
            }
            Self::Io { source } => {
                write!(f, "I/O error: {source}")
            }
            Self::Other { message } => {
                write!(f, "{message}")
            }
        }
    }
}

impl std::error::Error for RakuError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::FileNotAccessible { source, .. }
            | Self::FailedToCreateOutput { source, .. }
            | Self::FailedToWrite { source, .. }
            | Self::Io { source } => Some(source),
            Self::PageRange(err) => Some(err),
            Self::PageOrder(err) => Some(err),
            Self::Naming(err) => Some(err),
            Self::Merge(err) => Some(err),
            Self::Split(err) => Some(err),
            Self::Reorder(err) => Some(err),
            Self::Compress(err) => Some(err),
            Self::Protection(err) => Some(err),
            Self::Document(err) => Some(err),
            Self::Batch(err) => Some(err),
            _ => None,
        }
    }
}

macro_rules! wrap_error {
    ($($source:ty => $variant:ident),+ $(,)?) => {
        $(
            impl From<$source> for RakuError {
                fn from(err: $source) -> Self {
                    Self::$variant(err)
                }
            }
        )+
    };
}

wrap_error! {
    RangeError => PageRange,
    OrderError => PageOrder,
    NamingError => Naming,
    MergeError => Merge,
    SplitError => Split,
    ReorderError => Reorder,
    CompressError => Compress,
    ProtectionError => Protection,
    BatchError => Batch,
}

impl From<DocumentError> for RakuError {
    fn from(err: DocumentError) -> Self {
        match err {
            DocumentError::Load { path, reason } => Self::FailedToLoadPdf { path, reason },
            other => Self::Document(other),
        }
    }
}

impl From<io::Error> for RakuError {
    fn from(err: io::Error) -> Self {
        Self::Io { source: err }
    }
}

impl From<lopdf::Error> for RakuError {
    fn from(err: lopdf::Error) -> Self {
        Self::other(err.to_string())
    }
}

impl From<anyhow::Error> for RakuError {
    fn from(err: anyhow::Error) -> Self {
        Self::invalid_config(err.to_string())
    }
}

impl RakuError {
    /// Create a FileNotFound error.
    pub fn file_not_found(path: impl Into<PathBuf>) -> Self {
        Self::FileNotFound { path: path.into() }
    }

    /// Create a NotAFile error.
    pub fn not_a_file(path: impl Into<PathBuf>) -> Self {
        Self::NotAFile { path: path.into() }
    }

    /// Create a FileNotAccessible error.
    pub fn not_accessible(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::FileNotAccessible {
            path: path.into(),
            source,
        }
    }

    /// Create a FailedToLoadPdf error.
    pub fn failed_to_load_pdf(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::FailedToLoadPdf {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a CorruptedPdf error.
    pub fn corrupted_pdf(path: impl Into<PathBuf>, details: impl Into<String>) -> Self {
        Self::CorruptedPdf {
            path: path.into(),
            details: details.into(),
        }
    }

    /// Create an EncryptedPdf error.
    pub fn encrypted_pdf(path: impl Into<PathBuf>) -> Self {
        Self::EncryptedPdf { path: path.into() }
    }

    /// Create an OutputExists error.
    pub fn output_exists(path: impl Into<PathBuf>) -> Self {
        Self::OutputExists { path: path.into() }
    }

    /// Create a FailedToCreateOutput error.
    pub fn failed_to_create_output(path: &Path, source: io::Error) -> Self {
        Self::FailedToCreateOutput {
            path: path.to_path_buf(),
            source,
        }
    }

    /// Create a FailedToWrite error.
    pub fn failed_to_write(path: &Path, source: io::Error) -> Self {
        Self::FailedToWrite {
            path: path.to_path_buf(),
            source,
        }
    }

    /// Create an InvalidConfig error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Create an Other error with a custom message.
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other {
            message: message.into(),
        }
    }

    /// Check if this error only affects one file of a batch.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::FailedToLoadPdf { .. }
                | Self::CorruptedPdf { .. }
                | Self::EncryptedPdf { .. }
                | Self::PageRange(_)
                | Self::Split(_)
                | Self::Reorder(_)
                | Self::Compress(_)
                | Self::Protection(_)
        )
    }

    /// Check if this error should stop all processing immediately.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::NoInputFiles
                | Self::FailedToCreateOutput { .. }
                | Self::Batch(_)
                | Self::Cancelled
        )
    }

    /// Get the process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::FileNotFound { .. } => 2,
            Self::FileNotAccessible { .. } => 2,
            Self::NotAFile { .. } => 2,
            Self::FailedToLoadPdf { .. } => 3,
            Self::CorruptedPdf { .. } => 3,
            Self::EncryptedPdf { .. } => 3,
            Self::NoInputFiles => 1,
            Self::OutputExists { .. } => 4,
            Self::FailedToCreateOutput { .. } => 5,
            Self::FailedToWrite { .. } => 5,
            Self::PageRange(_) | Self::PageOrder(_) | Self::Naming(_) => 1,
            Self::Merge(_) | Self::Split(_) | Self::Reorder(_) => 6,
            Self::Compress(CompressError::CompressorMissing { .. }) => 7,
            Self::Compress(_) => 6,
            Self::Protection(_) => 6,
            Self::Document(DocumentError::Write { .. }) => 5,
            Self::Document(_) => 3,
            Self::Batch(_) => 1,
            Self::BatchIncomplete { .. } => 6,
            Self::InvalidConfig { .. } => 1,
            Self::Cancelled => 130, // SIGINT
            Self::Io { .. } => 5,
            Self::Other { .. } => 1,
        }
    }
}
