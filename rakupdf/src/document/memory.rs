//! In-memory document backend.
//!
//! Pages are plain labels with a rotation, which makes the outcome of a plan
//! easy to inspect. Writing produces a JSON snapshot rather than a PDF.

use serde::{Deserialize, Serialize};
use std::path::Path;

use super::{DocumentError, EncryptionSettings, PdfDocument};
use crate::pages::PagePlan;

/// A page of a [`MemoryDocument`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryPage {
    /// Label identifying where the page came from.
    pub label: String,
    /// Absolute rotation in degrees, `0..360`.
    pub rotation: i64,
}

/// Passwords and permission bits recorded by [`MemoryDocument::encrypt`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryEncryption {
    /// Owner password.
    pub owner_password: String,
    /// User password.
    pub user_password: String,
    /// Granted permission bits.
    pub permissions: u32,
}

/// A document held entirely in memory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryDocument {
    name: String,
    pages: Vec<MemoryPage>,
    encryption: Option<MemoryEncryption>,
    locked: bool,
}

impl MemoryDocument {
    /// Create a document whose pages are labelled `name#1`, `name#2`, ...
    pub fn new(name: impl Into<String>, page_count: usize) -> Self {
        let name = name.into();
        let pages = (1..=page_count)
            .map(|number| MemoryPage {
                label: format!("{name}#{number}"),
                rotation: 0,
            })
            .collect();

        Self {
            name,
            pages,
            encryption: None,
            locked: false,
        }
    }

    /// Create a locked document that opens with `password`.
    pub fn encrypted(name: impl Into<String>, page_count: usize, password: &str) -> Self {
        let mut doc = Self::new(name, page_count);
        doc.encryption = Some(MemoryEncryption {
            owner_password: password.to_string(),
            user_password: password.to_string(),
            permissions: 0,
        });
        doc.locked = true;
        doc
    }

    /// Read a snapshot previously written by [`PdfDocument::write`].
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing or not a snapshot.
    pub fn load(path: &Path) -> Result<Self, DocumentError> {
        let bytes = std::fs::read(path)?;
        serde_json::from_slice(&bytes).map_err(|err| DocumentError::Load {
            path: path.to_path_buf(),
            reason: err.to_string(),
        })
    }

    /// Pages in order.
    pub fn pages(&self) -> &[MemoryPage] {
        &self.pages
    }

    /// Page labels in order.
    pub fn labels(&self) -> Vec<&str> {
        self.pages.iter().map(|page| page.label.as_str()).collect()
    }

    /// Encryption applied to this document, if any.
    pub fn encryption(&self) -> Option<&MemoryEncryption> {
        self.encryption.as_ref()
    }
}

impl PdfDocument for MemoryDocument {
    fn name(&self) -> &str {
        &self.name
    }

    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn is_encrypted(&self) -> bool {
        self.locked
    }

    fn decrypt(&mut self, password: &str) -> Result<bool, DocumentError> {
        let Some(encryption) = &self.encryption else {
            return Ok(true);
        };

        if password == encryption.owner_password || password == encryption.user_password {
            self.locked = false;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    fn assemble(sources: &[&Self], plan: &PagePlan) -> Result<Self, DocumentError> {
        let name = sources
            .first()
            .map(|source| source.name.clone())
            .ok_or(DocumentError::MissingSource(0))?;

        let mut pages = Vec::with_capacity(plan.len());
        for planned in plan {
            let source = sources
                .get(planned.document)
                .ok_or(DocumentError::MissingSource(planned.document))?;

            if source.locked {
                return Err(DocumentError::Locked(source.name.clone()));
            }

            let page = source
                .pages
                .get(planned.index)
                .ok_or_else(|| DocumentError::MissingPage {
                    name: source.name.clone(),
                    index: planned.index,
                })?;

            pages.push(MemoryPage {
                label: page.label.clone(),
                rotation: planned.rotation.apply_to(page.rotation),
            });
        }

        Ok(Self {
            name,
            pages,
            encryption: None,
            locked: false,
        })
    }

    fn encrypt(&mut self, settings: &EncryptionSettings) -> Result<(), DocumentError> {
        self.encryption = Some(MemoryEncryption {
            owner_password: settings.owner_password.clone(),
            user_password: settings.user_password.clone(),
            permissions: settings.permissions.bits(),
        });
        self.locked = !settings.user_password.is_empty();
        Ok(())
    }

    fn write(&self, path: &Path) -> Result<u64, DocumentError> {
        let bytes = serde_json::to_vec_pretty(self).map_err(|err| DocumentError::Write {
            path: path.to_path_buf(),
            reason: err.to_string(),
        })?;
        std::fs::write(path, &bytes).map_err(|err| DocumentError::Write {
            path: path.to_path_buf(),
            reason: err.to_string(),
        })?;
        Ok(bytes.len() as u64)
    }
}
