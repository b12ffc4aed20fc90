//! Input path collection.

use crate::error::{RakuError, Result};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Expand command-line inputs into a list of files.
///
/// - A directory is walked recursively for `*.pdf` files (case-insensitive),
///   sorted by path.
/// - An argument containing glob metacharacters is expanded with `glob`;
///   matches come back in glob's sorted order.
/// - Anything else is passed through untouched, so a missing file is
///   reported by validation with its own name.
///
/// Duplicates are dropped; the first occurrence wins.
///
/// # Errors
///
/// Returns an error for an invalid glob pattern, an unreadable glob match, a
/// pattern that matches nothing, or a directory walk failure.
pub fn collect_inputs<T>(args: T) -> Result<Vec<PathBuf>>
where
    T: IntoIterator,
    T::Item: AsRef<str>,
{
    let mut seen = HashSet::new();
    let mut inputs = Vec::new();

    for arg in args {
        let arg = arg.as_ref();
        let path = Path::new(arg);

        let expanded = if path.is_dir() {
            collect_directory(path)?
        } else if is_pattern(arg) {
            collect_pattern(arg)?
        } else {
            vec![path.to_path_buf()]
        };

        for candidate in expanded {
            if seen.insert(candidate.clone()) {
                inputs.push(candidate);
            }
        }
    }

    Ok(inputs)
}

fn is_pattern(arg: &str) -> bool {
    arg.contains(['*', '?', '['])
}

fn collect_pattern(pattern: &str) -> Result<Vec<PathBuf>> {
    let entries = glob::glob(pattern).map_err(|err| {
        RakuError::invalid_config(format!("invalid input pattern '{pattern}': {err}"))
    })?;

    let mut paths = Vec::new();
    for entry in entries {
        let path = entry.map_err(|err| RakuError::other(err.to_string()))?;
        if path.is_file() {
            paths.push(path);
        }
    }

    if paths.is_empty() {
        return Err(RakuError::invalid_config(format!(
            "input pattern '{pattern}' matched no files"
        )));
    }
    Ok(paths)
}

fn collect_directory(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry.map_err(|err| RakuError::other(err.to_string()))?;
        if entry.file_type().is_file() && is_pdf(entry.path()) {
            paths.push(entry.into_path());
        }
    }
    Ok(paths)
}

fn is_pdf(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
}
