//! Output file naming.
//!
//! Default names are derived from the source stem and the operation, e.g.
//! `report_extracted.pdf`. A user pattern may contain `{name}`, which is
//! replaced with the stem; a pattern without it is used as is. `.pdf` is
//! appended when missing.

use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::engine::SplitMode;

/// Placeholder replaced with the source stem.
pub const NAME_TOKEN: &str = "{name}";

/// Characters that may not appear in an output file name.
pub const INVALID_CHARACTERS: [char; 9] = ['\\', '/', ':', '*', '?', '"', '<', '>', '|'];

/// Errors raised while naming outputs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NamingError {
    /// The name contains a forbidden character.
    #[error("output name '{name}' contains invalid character '{found}' (not allowed: \\ / : * ? \" < > |)")]
    InvalidCharacters {
        /// Offending name.
        name: String,
        /// First forbidden character.
        found: char,
    },

    /// The source path has no file stem.
    #[error("cannot derive an output name from {}", .0.display())]
    NoStem(PathBuf),

    /// A merge was named without sources.
    #[error("no input files to name the output after")]
    NoSources,
}

/// Operation an output belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputKind {
    /// Merge of `count` inputs.
    Merge {
        /// Number of inputs.
        count: usize,
    },
    /// Split in the given mode.
    Split(SplitMode),
    /// Reordered pages.
    Reorder,
    /// Compressed copy.
    Compress,
    /// Password protected copy.
    Lock,
    /// Unprotected copy.
    Unlock,
}

impl OutputKind {
    /// Suffix appended to the stem for default names.
    pub fn suffix(self) -> String {
        match self {
            OutputKind::Merge { count } if count > 1 => {
                format!("plus-{}-others_merged", count - 1)
            }
            OutputKind::Merge { .. } => "merged".to_string(),
            OutputKind::Split(mode) => mode.suffix().to_string(),
            OutputKind::Reorder => "reordered".to_string(),
            OutputKind::Compress => "compressed".to_string(),
            OutputKind::Lock => "locked".to_string(),
            OutputKind::Unlock => "unlocked".to_string(),
        }
    }
}

/// `{stem}_{suffix}.pdf`.
pub fn default_name(stem: &str, kind: OutputKind) -> String {
    format!("{stem}_{}.pdf", kind.suffix())
}

/// Expand a user pattern for `stem` and make sure it ends in `.pdf`.
pub fn apply_pattern(pattern: &str, stem: &str) -> String {
    let name = if pattern.contains(NAME_TOKEN) {
        pattern.replace(NAME_TOKEN, stem)
    } else {
        pattern.to_string()
    };
    ensure_pdf_extension(name)
}

fn ensure_pdf_extension(name: String) -> String {
    if name.to_lowercase().ends_with(".pdf") {
        name
    } else {
        format!("{name}.pdf")
    }
}

/// Reject names containing any of [`INVALID_CHARACTERS`].
///
/// # Errors
///
/// Returns [`NamingError::InvalidCharacters`] with the first offending
/// character.
pub fn validate_file_name(name: &str) -> Result<(), NamingError> {
    match name.chars().find(|c| INVALID_CHARACTERS.contains(c)) {
        Some(found) => Err(NamingError::InvalidCharacters {
            name: name.to_string(),
            found,
        }),
        None => Ok(()),
    }
}

fn stem_of(path: &Path) -> Result<String, NamingError> {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .filter(|stem| !stem.is_empty())
        .ok_or_else(|| NamingError::NoStem(path.to_path_buf()))
}

/// Computes destination paths for a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutputNamer {
    output_dir: Option<PathBuf>,
    pattern: Option<String>,
}

impl OutputNamer {
    /// Create a namer. A blank pattern means "use the default name".
    pub fn new(output_dir: Option<PathBuf>, pattern: Option<String>) -> Self {
        Self {
            output_dir,
            pattern: pattern
                .map(|pattern| pattern.trim().to_string())
                .filter(|pattern| !pattern.is_empty()),
        }
    }

    /// File name for an output derived from `source`.
    ///
    /// # Errors
    ///
    /// Fails if `source` has no stem or the name has invalid characters.
    pub fn file_name(&self, source: &Path, kind: OutputKind) -> Result<String, NamingError> {
        let stem = stem_of(source)?;
        let name = match &self.pattern {
            Some(pattern) => apply_pattern(pattern, &stem),
            None => default_name(&stem, kind),
        };
        validate_file_name(&name)?;
        Ok(name)
    }

    /// Full destination path for an output derived from `source`.
    ///
    /// The output directory wins; otherwise the output sits next to `source`.
    ///
    /// # Errors
    ///
    /// See [`OutputNamer::file_name`].
    pub fn destination(&self, source: &Path, kind: OutputKind) -> Result<PathBuf, NamingError> {
        let name = self.file_name(source, kind)?;
        let dir = match &self.output_dir {
            Some(dir) => dir.clone(),
            None => source.parent().map(Path::to_path_buf).unwrap_or_default(),
        };
        Ok(dir.join(name))
    }

    /// Destination of a merge, named after the first source.
    ///
    /// # Errors
    ///
    /// Fails for an empty source list or an invalid name.
    pub fn merge_destination(&self, sources: &[PathBuf]) -> Result<PathBuf, NamingError> {
        let first = sources.first().ok_or(NamingError::NoSources)?;
        self.destination(
            first,
            OutputKind::Merge {
                count: sources.len(),
            },
        )
    }
}
