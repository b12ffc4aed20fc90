//! Permission flags and encryption settings.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

/// A single user-access permission of an encrypted PDF.
///
/// Clearing a permission goes through this closed set, so only bits the PDF
/// format defines can ever be touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Permission {
    /// Print the document.
    Print,
    /// Modify contents.
    Modify,
    /// Copy or otherwise extract text and graphics.
    Copy,
    /// Add or modify annotations.
    Annotate,
    /// Fill in form fields.
    FillForms,
    /// Extract text and graphics for accessibility.
    ExtractForAccessibility,
    /// Insert, rotate or delete pages.
    Assemble,
    /// Print at full quality.
    PrintHighQuality,
}

impl Permission {
    /// Every permission, in bit order.
    pub const ALL: [Permission; 8] = [
        Permission::Print,
        Permission::Modify,
        Permission::Copy,
        Permission::Annotate,
        Permission::FillForms,
        Permission::ExtractForAccessibility,
        Permission::Assemble,
        Permission::PrintHighQuality,
    ];

    /// The flag this permission corresponds to.
    pub const fn flag(self) -> PermissionSet {
        match self {
            Permission::Print => PermissionSet::PRINT,
            Permission::Modify => PermissionSet::MODIFY,
            Permission::Copy => PermissionSet::COPY,
            Permission::Annotate => PermissionSet::ANNOTATE,
            Permission::FillForms => PermissionSet::FILL_FORMS,
            Permission::ExtractForAccessibility => PermissionSet::EXTRACT_FOR_ACCESSIBILITY,
            Permission::Assemble => PermissionSet::ASSEMBLE,
            Permission::PrintHighQuality => PermissionSet::PRINT_HIGH_QUALITY,
        }
    }
}

bitflags! {
    /// Set of permissions granted to a user who opens the document.
    ///
    /// Bit positions follow the `/P` entry of the standard security handler.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct PermissionSet: u32 {
        /// Bit 3.
        const PRINT = 1 << 2;
        /// Bit 4.
        const MODIFY = 1 << 3;
        /// Bit 5.
        const COPY = 1 << 4;
        /// Bit 6.
        const ANNOTATE = 1 << 5;
        /// Bit 9.
        const FILL_FORMS = 1 << 8;
        /// Bit 10.
        const EXTRACT_FOR_ACCESSIBILITY = 1 << 9;
        /// Bit 11.
        const ASSEMBLE = 1 << 10;
        /// Bit 12.
        const PRINT_HIGH_QUALITY = 1 << 11;
    }
}

impl PermissionSet {
    /// Remove a single permission.
    pub fn without(self, permission: Permission) -> Self {
        self.difference(permission.flag())
    }

    /// Whether a single permission is granted.
    pub fn allows(self, permission: Permission) -> bool {
        self.contains(permission.flag())
    }

    /// Granted permissions, in bit order.
    pub fn granted(self) -> Vec<Permission> {
        Permission::ALL
            .into_iter()
            .filter(|permission| self.allows(*permission))
            .collect()
    }
}

impl From<Permission> for PermissionSet {
    fn from(permission: Permission) -> Self {
        permission.flag()
    }
}

/// Passwords and permissions used to encrypt an output document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptionSettings {
    /// Password that lifts every restriction.
    pub owner_password: String,
    /// Password needed to open the document (empty: opens freely).
    pub user_password: String,
    /// Permissions granted to users who open with the user password.
    pub permissions: PermissionSet,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_without_clears_single_bit() {
        let set = PermissionSet::all().without(Permission::Copy);
        assert!(!set.allows(Permission::Copy));
        assert!(set.allows(Permission::Print));
        assert_eq!(set.granted().len(), 7);
    }

    #[test]
    fn test_flags_match_standard_security_handler_bits() {
        assert_eq!(PermissionSet::PRINT.bits(), 4);
        assert_eq!(PermissionSet::COPY.bits(), 16);
        assert_eq!(PermissionSet::PRINT_HIGH_QUALITY.bits(), 2048);
    }

    #[test]
    fn test_every_permission_maps_to_distinct_flag() {
        let union = Permission::ALL
            .into_iter()
            .fold(PermissionSet::empty(), |set, p| set | p.flag());
        assert_eq!(union, PermissionSet::all());
    }
}
