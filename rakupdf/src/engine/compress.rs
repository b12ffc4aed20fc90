//! Size-targeted compression through an external compressor.
//!
//! Compression walks a ladder of presets ordered from least to most
//! compressed. Without a size target a single preset chosen by the
//! [`CompressionLevel`] is used. With a target the ladder is scanned from the
//! first rung and the search stops at the first result that fits.
//!
//! The ladder is assumed to shrink output monotonically. That is not checked:
//! a document that grows at a later rung can end the search at a rung that is
//! not the smallest possible.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Ghostscript `-dPDFSETTINGS` presets, least to most compressed.
pub const PRESET_LADDER: [&str; 5] = ["/prepress", "/printer", "/default", "/ebook", "/screen"];

/// Environment variable naming a Ghostscript executable.
pub const GHOSTSCRIPT_ENV: &str = "RAKUPDF_GS";

/// Errors raised while compressing.
#[derive(Debug, Error)]
pub enum CompressError {
    /// Level outside `1..=5`.
    #[error("compression level must be between 1 and 5 (got {0})")]
    InvalidLevel(u8),

    /// The preset ladder has no rungs.
    #[error("compression preset ladder is empty")]
    EmptyLadder,

    /// A size target of zero bytes.
    #[error("target size must be greater than zero")]
    InvalidTarget,

    /// The compressor executable could not be found or started.
    #[error("Ghostscript not found: {}", .path.display())]
    CompressorMissing {
        /// Executable that was tried.
        path: PathBuf,
    },

    /// The compressor exited unsuccessfully.
    #[error(
        "Ghostscript failed with preset {preset} (exit code {}): {stderr}",
        .code.map_or_else(|| "unknown".to_string(), |c| c.to_string())
    )]
    ProcessFailed {
        /// Preset being applied.
        preset: String,
        /// Exit code, if the process exited normally.
        code: Option<i32>,
        /// Captured standard error.
        stderr: String,
    },

    /// A file could not be read or created.
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        /// File involved.
        path: PathBuf,
        /// Underlying error.
        source: io::Error,
    },
}

impl CompressError {
    pub(crate) fn io(path: &Path, source: io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Compression strength from 1 (least) to 5 (most).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct CompressionLevel(u8);

impl CompressionLevel {
    /// Least compression.
    pub const MIN: u8 = 1;
    /// Most compression.
    pub const MAX: u8 = 5;

    /// Validate a level.
    ///
    /// # Errors
    ///
    /// Returns [`CompressError::InvalidLevel`] outside `1..=5`.
    pub fn new(level: u8) -> Result<Self, CompressError> {
        if (Self::MIN..=Self::MAX).contains(&level) {
            Ok(Self(level))
        } else {
            Err(CompressError::InvalidLevel(level))
        }
    }

    /// Numeric level.
    pub fn get(self) -> u8 {
        self.0
    }

    /// Rung of a `rungs`-long ladder this level starts at.
    ///
    /// Level 1 maps to the first rung and level 5 to the last.
    pub fn rung(self, rungs: usize) -> usize {
        let span = rungs.saturating_sub(1);
        let step = usize::from(self.0 - Self::MIN);
        (step * span / usize::from(Self::MAX - Self::MIN)).min(span)
    }
}

impl Default for CompressionLevel {
    fn default() -> Self {
        Self(3)
    }
}

impl TryFrom<u8> for CompressionLevel {
    type Error = CompressError;

    fn try_from(level: u8) -> Result<Self, Self::Error> {
        Self::new(level)
    }
}

impl From<CompressionLevel> for u8 {
    fn from(level: CompressionLevel) -> Self {
        level.0
    }
}

impl fmt::Display for CompressionLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Ordered compressor presets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct PresetLadder(Vec<String>);

impl PresetLadder {
    /// Build a ladder from presets ordered least to most compressed.
    ///
    /// # Errors
    ///
    /// Returns [`CompressError::EmptyLadder`] when `presets` is empty.
    pub fn new(presets: Vec<String>) -> Result<Self, CompressError> {
        if presets.is_empty() {
            return Err(CompressError::EmptyLadder);
        }
        Ok(Self(presets))
    }

    /// Number of rungs.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false; a ladder has at least one rung.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Preset at `rung`.
    pub fn get(&self, rung: usize) -> Option<&str> {
        self.0.get(rung).map(String::as_str)
    }

    /// Presets from `start` to the end.
    pub fn from_rung(&self, start: usize) -> impl Iterator<Item = &str> {
        self.0.iter().skip(start).map(String::as_str)
    }
}

impl Default for PresetLadder {
    fn default() -> Self {
        Self(PRESET_LADDER.iter().map(|preset| preset.to_string()).collect())
    }
}

/// Inputs of one compression search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompressionJob {
    /// Size of the source in bytes.
    pub source_size: u64,
    /// Largest acceptable output in bytes.
    pub target_size: Option<u64>,
    /// Level used when there is no target.
    pub level: CompressionLevel,
    /// Presets to try.
    pub ladder: PresetLadder,
}

/// One compressor invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Attempt {
    /// Preset used.
    pub preset: String,
    /// Resulting output size in bytes.
    pub size: u64,
}

/// Result of a search: the last attempt is the output left on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchOutcome {
    /// Every attempt in order.
    pub attempts: Vec<Attempt>,
    /// Whether the final size fits the target (always true without one).
    pub met_target: bool,
}

impl SearchOutcome {
    /// The attempt whose output was kept.
    pub fn last(&self) -> Option<&Attempt> {
        self.attempts.last()
    }
}

/// Drives a compressor across the preset ladder.
#[derive(Debug, Default, Clone, Copy)]
pub struct CompressionSearch;

impl CompressionSearch {
    /// Run `job`, calling `compress(preset)` for each attempt.
    ///
    /// `compress` must write the same output path every time and return the
    /// resulting size. Without a target it is called exactly once; with one
    /// it is called at most once per rung.
    ///
    /// # Errors
    ///
    /// Propagates the first error returned by `compress`.
    pub fn run<E, F>(job: &CompressionJob, mut compress: F) -> Result<SearchOutcome, E>
    where
        F: FnMut(&str) -> Result<u64, E>,
    {
        let mut attempts = Vec::new();

        let Some(target) = job.target_size else {
            let rung = job.level.rung(job.ladder.len());
            if let Some(preset) = job.ladder.get(rung) {
                let size = compress(preset)?;
                attempts.push(Attempt {
                    preset: preset.to_string(),
                    size,
                });
            }
            return Ok(SearchOutcome {
                attempts,
                met_target: true,
            });
        };

        for preset in job.ladder.from_rung(0) {
            let size = compress(preset)?;
            debug!(preset, size, target, "compression attempt");
            attempts.push(Attempt {
                preset: preset.to_string(),
                size,
            });
            if size <= target {
                return Ok(SearchOutcome {
                    attempts,
                    met_target: true,
                });
            }
        }

        Ok(SearchOutcome {
            attempts,
            met_target: false,
        })
    }
}

/// Outcome of compressing one file.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompressionResult {
    /// Source file.
    pub src: PathBuf,
    /// Output file.
    pub out: PathBuf,
    /// Source size in bytes.
    pub orig_size: u64,
    /// Output size in bytes.
    pub new_size: u64,
    /// Preset of the kept output.
    pub used_preset: String,
    /// `1 - new/orig`, or 0 for an empty source.
    pub reduction: f64,
    /// Number of compressor invocations.
    pub attempts: usize,
    /// Whether the size target was met.
    pub met_target: bool,
}

impl CompressionResult {
    /// Reduction scaled to a percentage.
    pub fn reduced_percent(&self) -> f64 {
        self.reduction * 100.0
    }
}

fn reduction(orig_size: u64, new_size: u64) -> f64 {
    if orig_size == 0 {
        return 0.0;
    }
    1.0 - new_size as f64 / orig_size as f64
}

/// Something that rewrites a PDF with a given preset.
pub trait Compressor {
    /// Compress `input` into `output` using `preset`, replacing `output`.
    ///
    /// # Errors
    ///
    /// Returns an error if the compressor is missing or fails.
    fn compress(&self, input: &Path, output: &Path, preset: &str) -> Result<(), CompressError>;
}

/// Compress `src` into `out`, optionally searching for a size target.
///
/// # Errors
///
/// Returns an error if the source cannot be read, the target is zero, or the
/// compressor fails.
pub fn compress_file<C: Compressor + ?Sized>(
    src: &Path,
    out: &Path,
    level: CompressionLevel,
    target_size: Option<u64>,
    compressor: &C,
) -> Result<CompressionResult, CompressError> {
    if target_size == Some(0) {
        return Err(CompressError::InvalidTarget);
    }

    let orig_size = std::fs::metadata(src)
        .map_err(|err| CompressError::io(src, err))?
        .len();

    let job = CompressionJob {
        source_size: orig_size,
        target_size,
        level,
        ladder: PresetLadder::default(),
    };

    let outcome = CompressionSearch::run(&job, |preset| {
        compressor.compress(src, out, preset)?;
        std::fs::metadata(out)
            .map(|meta| meta.len())
            .map_err(|err| CompressError::io(out, err))
    })?;

    let last = outcome.last().ok_or(CompressError::EmptyLadder)?;
    if !outcome.met_target {
        warn!(
            src = %src.display(),
            size = last.size,
            "size target not reached with the strongest preset"
        );
    }

    let result = CompressionResult {
        src: src.to_path_buf(),
        out: out.to_path_buf(),
        orig_size,
        new_size: last.size,
        used_preset: last.preset.clone(),
        reduction: reduction(orig_size, last.size),
        attempts: outcome.attempts.len(),
        met_target: outcome.met_target,
    };

    info!(
        src = %src.display(),
        preset = %result.used_preset,
        reduced_percent = result.reduced_percent(),
        "compressed"
    );
    Ok(result)
}

/// Runs Ghostscript's `pdfwrite` device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GhostscriptCompressor {
    executable: PathBuf,
}

impl GhostscriptCompressor {
    /// Use a specific executable.
    pub fn new(executable: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
        }
    }

    /// Locate Ghostscript, preferring `explicit` when given.
    ///
    /// # Errors
    ///
    /// Returns [`CompressError::CompressorMissing`] when nothing is found.
    pub fn discover(explicit: Option<&Path>) -> Result<Self, CompressError> {
        find_ghostscript(explicit)
            .map(Self::new)
            .ok_or_else(|| CompressError::CompressorMissing {
                path: PathBuf::from(executable_names()[0]),
            })
    }

    /// The executable that will be run.
    pub fn executable(&self) -> &Path {
        &self.executable
    }
}

impl Compressor for GhostscriptCompressor {
    fn compress(&self, input: &Path, output: &Path, preset: &str) -> Result<(), CompressError> {
        if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|err| CompressError::io(parent, err))?;
        }

        let mut command = Command::new(&self.executable);
        command
            .arg("-sDEVICE=pdfwrite")
            .arg("-dCompatibilityLevel=1.4")
            .arg(format!("-dPDFSETTINGS={preset}"))
            .arg("-dNOPAUSE")
            .arg("-dQUIET")
            .arg("-dBATCH")
            .arg(format!("-sOutputFile={}", output.display()))
            .arg(input);

        #[cfg(windows)]
        {
            use std::os::windows::process::CommandExt;
            const CREATE_NO_WINDOW: u32 = 0x0800_0000;
            command.creation_flags(CREATE_NO_WINDOW);
        }

        debug!(executable = %self.executable.display(), preset, "running ghostscript");

        let result = command.output().map_err(|err| match err.kind() {
            io::ErrorKind::NotFound | io::ErrorKind::PermissionDenied => {
                CompressError::CompressorMissing {
                    path: self.executable.clone(),
                }
            }
            _ => CompressError::io(&self.executable, err),
        })?;

        if result.status.success() {
            Ok(())
        } else {
            Err(CompressError::ProcessFailed {
                preset: preset.to_string(),
                code: result.status.code(),
                stderr: String::from_utf8_lossy(&result.stderr).trim().to_string(),
            })
        }
    }
}

fn executable_names() -> &'static [&'static str] {
    if cfg!(windows) {
        &["gswin64c.exe", "gswin32c.exe", "gs.exe"]
    } else {
        &["gs"]
    }
}

fn first_existing(dir: &Path) -> Option<PathBuf> {
    executable_names()
        .iter()
        .map(|name| dir.join(name))
        .find(|candidate| candidate.is_file())
}

/// Locate a Ghostscript executable.
///
/// Looks, in order, at `explicit`, the `RAKUPDF_GS` environment variable, a
/// `ghostscript/bin` or `ghostscript` directory next to the running
/// executable, `PATH`, and on Windows the standard install directories.
pub fn find_ghostscript(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }

    if let Some(path) = std::env::var_os(GHOSTSCRIPT_ENV).filter(|value| !value.is_empty()) {
        return Some(PathBuf::from(path));
    }

    if let Ok(exe) = std::env::current_exe()
        && let Some(dir) = exe.parent()
    {
        let bundled = dir.join("ghostscript");
        if let Some(found) = first_existing(&bundled.join("bin")).or_else(|| first_existing(&bundled))
        {
            return Some(found);
        }
    }

    if let Some(paths) = std::env::var_os("PATH")
        && let Some(found) = std::env::split_paths(&paths).find_map(|dir| first_existing(&dir))
    {
        return Some(found);
    }

    if cfg!(windows) {
        for root in [r"C:\Program Files\gs", r"C:\Program Files (x86)\gs"] {
            if let Some(found) = newest_install(Path::new(root)) {
                return Some(found);
            }
        }
    }

    None
}

/// Newest `<root>/<version>/bin/<exe>`.
fn newest_install(root: &Path) -> Option<PathBuf> {
    let mut versions: Vec<PathBuf> = std::fs::read_dir(root)
        .ok()?
        .filter_map(|entry| entry.ok().map(|entry| entry.path()))
        .filter(|path| path.is_dir())
        .collect();
    versions.sort_by_key(|path| version_key(path));
    versions
        .iter()
        .rev()
        .find_map(|version| first_existing(&version.join("bin")))
}

/// Numeric components of a directory name such as `gs10.02.1`.
fn version_key(path: &Path) -> Vec<u32> {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
        .split(|c: char| !c.is_ascii_digit())
        .filter_map(|part| part.parse().ok())
        .collect()
}
