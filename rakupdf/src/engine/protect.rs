//! Password protection and removal.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

use crate::document::{DocumentError, EncryptionSettings, PdfDocument, Permission, PermissionSet};
use crate::pages::PagePlan;

const COPY_PERMISSIONS: &[Permission] = &[Permission::Copy, Permission::ExtractForAccessibility];
const PRINT_PERMISSIONS: &[Permission] = &[Permission::Print, Permission::PrintHighQuality];

/// Errors raised while locking or unlocking.
#[derive(Debug, Error)]
pub enum ProtectionError {
    /// The password is empty.
    #[error("password must not be empty")]
    EmptyPassword,

    /// A restricted intent forbids nothing.
    #[error("choose at least one restriction (copy or print)")]
    NoRestrictionSelected,

    /// The source is already encrypted.
    #[error("{0} is already encrypted")]
    AlreadyEncrypted(String),

    /// The source is not encrypted.
    #[error("{0} is not encrypted")]
    NotEncrypted(String),

    /// The password was rejected.
    #[error("wrong password for {0}")]
    WrongPassword(String),

    /// The unlocked source has no readable pages.
    #[error("{0} has no readable pages after unlocking")]
    NoPages(String),

    /// The unlocked copy lost pages of the source.
    #[error("unlocked copy of {name} has {found} pages, expected {expected}")]
    PageCountMismatch {
        /// Source document name.
        name: String,
        /// Pages in the unlocked source.
        expected: usize,
        /// Pages in the copy.
        found: usize,
    },

    /// The backend failed.
    #[error(transparent)]
    Document(#[from] DocumentError),
}

/// How an output should be locked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "mode")]
pub enum ProtectionIntent {
    /// A password is needed to open the document.
    ViewLocked {
        /// Password for both owner and user.
        password: String,
    },
    /// Opens freely but restricts copying and/or printing.
    #[serde(rename_all = "camelCase")]
    Restricted {
        /// Owner password that lifts the restrictions.
        password: String,
        /// Forbid copying text and graphics.
        forbid_copy: bool,
        /// Forbid printing.
        forbid_print: bool,
    },
}

impl ProtectionIntent {
    /// The owner password.
    pub fn password(&self) -> &str {
        match self {
            ProtectionIntent::ViewLocked { password }
            | ProtectionIntent::Restricted { password, .. } => password,
        }
    }

    /// Passwords and permissions this intent asks for.
    ///
    /// # Errors
    ///
    /// Returns [`ProtectionError::EmptyPassword`] or
    /// [`ProtectionError::NoRestrictionSelected`].
    pub fn settings(&self) -> Result<EncryptionSettings, ProtectionError> {
        if self.password().is_empty() {
            return Err(ProtectionError::EmptyPassword);
        }

        let settings = match self {
            ProtectionIntent::ViewLocked { password } => EncryptionSettings {
                owner_password: password.clone(),
                user_password: password.clone(),
                permissions: clear(PermissionSet::all(), &[COPY_PERMISSIONS, PRINT_PERMISSIONS]),
            },
            ProtectionIntent::Restricted {
                password,
                forbid_copy,
                forbid_print,
            } => {
                if !forbid_copy && !forbid_print {
                    return Err(ProtectionError::NoRestrictionSelected);
                }

                let mut groups: Vec<&[Permission]> = Vec::new();
                if *forbid_copy {
                    groups.push(COPY_PERMISSIONS);
                }
                if *forbid_print {
                    groups.push(PRINT_PERMISSIONS);
                }

                EncryptionSettings {
                    owner_password: password.clone(),
                    user_password: String::new(),
                    permissions: clear(PermissionSet::all(), &groups),
                }
            }
        };

        Ok(settings)
    }
}

fn clear(set: PermissionSet, groups: &[&[Permission]]) -> PermissionSet {
    groups
        .iter()
        .flat_map(|group| group.iter().copied())
        .fold(set, PermissionSet::without)
}

/// Locks and unlocks documents.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProtectionEngine;

impl ProtectionEngine {
    /// Copy `doc` into a new document encrypted according to `intent`.
    ///
    /// # Errors
    ///
    /// Fails before touching the document when the intent is invalid or the
    /// source is already encrypted.
    pub fn protect<D: PdfDocument>(doc: &D, intent: &ProtectionIntent) -> Result<D, ProtectionError> {
        let settings = intent.settings()?;

        if doc.is_encrypted() {
            return Err(ProtectionError::AlreadyEncrypted(doc.name().to_string()));
        }

        let mut output = D::assemble(&[doc], &PagePlan::whole(0, doc.page_count()))?;
        output.encrypt(&settings)?;

        debug!(
            name = doc.name(),
            granted = ?settings.permissions.granted(),
            "document encrypted"
        );
        Ok(output)
    }

    /// Unlock `doc` with `password` and copy it into an unencrypted document.
    ///
    /// # Errors
    ///
    /// Returns [`ProtectionError::NotEncrypted`] for plain sources and
    /// [`ProtectionError::WrongPassword`] when the password is rejected. An
    /// unlocked copy that does not hold every source page is never returned.
    pub fn unprotect<D: PdfDocument>(doc: &mut D, password: &str) -> Result<D, ProtectionError> {
        if !doc.is_encrypted() {
            return Err(ProtectionError::NotEncrypted(doc.name().to_string()));
        }

        if !doc.decrypt(password)? {
            return Err(ProtectionError::WrongPassword(doc.name().to_string()));
        }

        let expected = doc.page_count();
        if expected == 0 {
            return Err(ProtectionError::NoPages(doc.name().to_string()));
        }

        let output = D::assemble(&[&*doc], &PagePlan::whole(0, expected))?;
        let found = output.page_count();
        if found != expected {
            return Err(ProtectionError::PageCountMismatch {
                name: doc.name().to_string(),
                expected,
                found,
            });
        }

        debug!(name = doc.name(), pages = found, "document decrypted");
        Ok(output)
    }

    /// Protect `doc` and write the result to `path`.
    ///
    /// # Errors
    ///
    /// See [`ProtectionEngine::protect`]; also fails if writing fails.
    pub fn protect_to<D: PdfDocument>(
        doc: &D,
        intent: &ProtectionIntent,
        path: &Path,
    ) -> Result<u64, ProtectionError> {
        let output = Self::protect(doc, intent)?;
        let size = output.write(path)?;
        info!(path = %path.display(), "locked document written");
        Ok(size)
    }

    /// Unprotect `doc` and write the result to `path`.
    ///
    /// # Errors
    ///
    /// See [`ProtectionEngine::unprotect`]; also fails if writing fails.
    pub fn unprotect_to<D: PdfDocument>(
        doc: &mut D,
        password: &str,
        path: &Path,
    ) -> Result<u64, ProtectionError> {
        let output = Self::unprotect(doc, password)?;
        let size = output.write(path)?;
        info!(path = %path.display(), "unlocked document written");
        Ok(size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::MemoryDocument;

    fn restricted(forbid_copy: bool, forbid_print: bool) -> ProtectionIntent {
        ProtectionIntent::Restricted {
            password: "owner".to_string(),
            forbid_copy,
            forbid_print,
        }
    }

    #[test]
    fn test_view_locked_settings() {
        let intent = ProtectionIntent::ViewLocked {
            password: "pw".to_string(),
        };
        let settings = intent.settings().unwrap();

        assert_eq!(settings.user_password, "pw");
        assert_eq!(settings.owner_password, "pw");
        for permission in COPY_PERMISSIONS.iter().chain(PRINT_PERMISSIONS) {
            assert!(!settings.permissions.allows(*permission));
        }
        assert!(settings.permissions.allows(Permission::Modify));
    }

    #[test]
    fn test_restricted_clears_only_requested_bits() {
        let copy_only = restricted(true, false).settings().unwrap();
        assert!(copy_only.user_password.is_empty());
        assert!(!copy_only.permissions.allows(Permission::Copy));
        assert!(copy_only.permissions.allows(Permission::Print));

        let print_only = restricted(false, true).settings().unwrap();
        assert!(print_only.permissions.allows(Permission::Copy));
        assert!(!print_only.permissions.allows(Permission::PrintHighQuality));
    }

    #[test]
    fn test_restricted_without_flags_fails() {
        let doc = MemoryDocument::new("d", 1);
        let err = ProtectionEngine::protect(&doc, &restricted(false, false)).unwrap_err();
        assert!(matches!(err, ProtectionError::NoRestrictionSelected));
    }

    #[test]
    fn test_empty_password_fails() {
        let doc = MemoryDocument::new("d", 1);
        let intent = ProtectionIntent::ViewLocked {
            password: String::new(),
        };
        assert!(matches!(
            ProtectionEngine::protect(&doc, &intent),
            Err(ProtectionError::EmptyPassword)
        ));
    }

    #[test]
    fn test_protect_then_unprotect() {
        let doc = MemoryDocument::new("d", 3);
        let intent = ProtectionIntent::ViewLocked {
            password: "pw".to_string(),
        };

        let mut locked = ProtectionEngine::protect(&doc, &intent).unwrap();
        assert!(locked.is_encrypted());
        assert_eq!(locked.page_count(), 3);

        let err = ProtectionEngine::unprotect(&mut locked, "nope").unwrap_err();
        assert!(matches!(err, ProtectionError::WrongPassword(_)));

        let unlocked = ProtectionEngine::unprotect(&mut locked, "pw").unwrap();
        assert!(!unlocked.is_encrypted());
        assert!(unlocked.encryption().is_none());
        assert_eq!(unlocked.labels(), vec!["d#1", "d#2", "d#3"]);
    }

    #[test]
    fn test_unprotect_rejects_pageless_result() {
        let mut locked = MemoryDocument::encrypted("e", 0, "pw");
        let err = ProtectionEngine::unprotect(&mut locked, "pw").unwrap_err();
        assert!(matches!(err, ProtectionError::NoPages(name) if name == "e"));
    }

    #[test]
    fn test_already_encrypted_and_not_encrypted() {
        let locked = MemoryDocument::encrypted("l", 1, "pw");
        let intent = restricted(true, true);
        assert!(matches!(
            ProtectionEngine::protect(&locked, &intent),
            Err(ProtectionError::AlreadyEncrypted(_))
        ));

        let mut plain = MemoryDocument::new("p", 1);
        assert!(matches!(
            ProtectionEngine::unprotect(&mut plain, "pw"),
            Err(ProtectionError::NotEncrypted(_))
        ));
    }
}
