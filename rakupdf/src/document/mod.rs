//! The document collaborator seam.
//!
//! Engines never touch PDF objects directly. They compute a [`PagePlan`] and
//! hand it to a [`PdfDocument`] backend, which copies the planned pages into a
//! fresh output document. Two backends ship with the crate:
//!
//! - [`LopdfDocument`] reads and writes real PDF files through `lopdf`
//! - [`MemoryDocument`] keeps labelled pages in memory for planning and tests

pub mod backend;
pub mod memory;
pub mod security;

pub use backend::LopdfDocument;
pub use memory::{MemoryDocument, MemoryPage};
pub use security::{EncryptionSettings, Permission, PermissionSet};

use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::pages::PagePlan;

/// Errors raised by a document backend.
#[derive(Debug, Error)]
pub enum DocumentError {
    /// The file could not be parsed as a PDF.
    #[error("failed to load {}: {reason}", .path.display())]
    Load {
        /// File that failed to load.
        path: PathBuf,
        /// Parser message.
        reason: String,
    },

    /// The page tree or an object is not shaped as expected.
    #[error("invalid document structure: {0}")]
    Structure(String),

    /// A plan names a source that was not supplied.
    #[error("plan refers to source #{0}, which was not supplied")]
    MissingSource(usize),

    /// A plan names a page the source does not have.
    #[error("{name} has no page {}", .index + 1)]
    MissingPage {
        /// Source document name.
        name: String,
        /// Zero-based page index.
        index: usize,
    },

    /// A source is still encrypted and cannot be copied from.
    #[error("{0} is encrypted")]
    Locked(String),

    /// Encrypting the output failed.
    #[error("encryption failed: {0}")]
    Encryption(String),

    /// The password was accepted but the encrypted objects could not be read.
    #[error("{name} could not be decrypted: {reason}")]
    Decryption {
        /// Source document name.
        name: String,
        /// Why the objects are unavailable.
        reason: String,
    },

    /// Writing the output failed.
    #[error("failed to write {}: {reason}", .path.display())]
    Write {
        /// Destination path.
        path: PathBuf,
        /// Underlying cause.
        reason: String,
    },

    /// Generic I/O error.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Operations the engines need from a PDF document.
///
/// `assemble` plays the role of "add these pages to a new writer": it builds a
/// fresh, unencrypted document from pages of already-open sources.
pub trait PdfDocument: Sized {
    /// Display name, usually the source file name.
    fn name(&self) -> &str;

    /// Number of pages.
    fn page_count(&self) -> usize;

    /// Whether the document is encrypted and not yet unlocked.
    fn is_encrypted(&self) -> bool;

    /// Try to unlock an encrypted document.
    ///
    /// Returns `Ok(false)` when the password is rejected.
    ///
    /// # Errors
    ///
    /// Returns an error only when the backend itself fails.
    fn decrypt(&mut self, password: &str) -> Result<bool, DocumentError>;

    /// Build a new document from the pages named by `plan`.
    ///
    /// # Errors
    ///
    /// Returns an error if a planned source or page does not exist, a source
    /// is still encrypted, or the page tree cannot be rebuilt.
    fn assemble(sources: &[&Self], plan: &PagePlan) -> Result<Self, DocumentError>;

    /// Encrypt this document in place.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot derive or apply the keys.
    fn encrypt(&mut self, settings: &EncryptionSettings) -> Result<(), DocumentError>;

    /// Write the document to `path`, returning the number of bytes written.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created or written.
    fn write(&self, path: &Path) -> Result<u64, DocumentError>;
}

/// File name of `path` for use in messages.
pub(crate) fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
