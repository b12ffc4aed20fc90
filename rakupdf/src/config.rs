//! Run configuration.
//!
//! The CLI turns its arguments into a [`Config`]. [`Config::validate`] rejects
//! inconsistent combinations before any file is touched, and
//! [`Config::batch`] turns the configuration into the [`Batch`] the
//! coordinator runs.

use anyhow::{Context, Result, bail};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::batch::{Batch, BatchTask, MergeTask, TaskKind};
use crate::engine::{CompressionLevel, ProtectionIntent, ReorderScript, SplitMode};
use crate::naming::{NAME_TOKEN, OutputKind, OutputNamer, apply_pattern, validate_file_name};

/// Output file overwrite behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverwriteMode {
    /// Ask before overwriting (default).
    #[default]
    Prompt,
    /// Always overwrite without asking.
    Force,
    /// Never overwrite; an existing output is an error.
    NoClobber,
}

/// What a run does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    /// Concatenate every input into one file.
    Merge,
    /// Keep or delete pages of each input.
    Split {
        /// Keep or delete.
        mode: SplitMode,
        /// One-based page spec.
        pages: String,
    },
    /// Reorder and rotate pages of each input.
    Reorder(ReorderScript),
    /// Compress each input with Ghostscript.
    Compress {
        /// Level used without a target.
        level: CompressionLevel,
        /// Size target in bytes.
        target_size: Option<u64>,
        /// Explicit Ghostscript executable.
        ghostscript: Option<PathBuf>,
    },
    /// Password protect each input.
    Lock(ProtectionIntent),
    /// Remove password protection from each input.
    Unlock {
        /// Password to open the inputs.
        password: String,
    },
}

impl Operation {
    /// Subcommand name.
    pub fn name(&self) -> &'static str {
        match self {
            Operation::Merge => "merge",
            Operation::Split { .. } => "split",
            Operation::Reorder(_) => "reorder",
            Operation::Compress { .. } => "compress",
            Operation::Lock(_) => "lock",
            Operation::Unlock { .. } => "unlock",
        }
    }

    /// Per-file task kind; `None` for a merge.
    pub fn task_kind(&self) -> Option<TaskKind> {
        let kind = match self {
            Operation::Merge => return None,
            Operation::Split { mode, pages } => TaskKind::Split {
                mode: *mode,
                pages: pages.clone(),
            },
            Operation::Reorder(script) => TaskKind::Reorder(script.clone()),
            Operation::Compress {
                level, target_size, ..
            } => TaskKind::Compress {
                level: *level,
                target_size: *target_size,
            },
            Operation::Lock(intent) => TaskKind::Lock(intent.clone()),
            Operation::Unlock { password } => TaskKind::Unlock {
                password: password.clone(),
            },
        };
        Some(kind)
    }

    fn output_kind(&self, inputs: usize) -> OutputKind {
        match self {
            Operation::Merge => OutputKind::Merge { count: inputs },
            Operation::Split { mode, .. } => OutputKind::Split(*mode),
            Operation::Reorder(_) => OutputKind::Reorder,
            Operation::Compress { .. } => OutputKind::Compress,
            Operation::Lock(_) => OutputKind::Lock,
            Operation::Unlock { .. } => OutputKind::Unlock,
        }
    }
}

/// Complete, validated configuration for one run.
#[derive(Debug, Clone)]
pub struct Config {
    /// What to do.
    pub operation: Operation,

    /// Input PDF files, in order.
    pub inputs: Vec<PathBuf>,

    /// Directory for outputs; next to each input when unset.
    pub output_dir: Option<PathBuf>,

    /// Output name pattern, `{name}` is the input stem.
    pub name_pattern: Option<String>,

    /// Extra directories that receive a copy of every per-file output.
    pub copy_dirs: Vec<PathBuf>,

    /// File overwrite behavior.
    pub overwrite_mode: OverwriteMode,

    /// Validate and show planned outputs without writing anything.
    pub dry_run: bool,

    /// Verbose output mode.
    pub verbose: bool,

    /// Quiet mode: suppress non-error output.
    pub quiet: bool,

    /// Print the batch summary as JSON.
    pub json: bool,

    /// Drop inputs that fail validation instead of stopping.
    pub continue_on_error: bool,

    /// Validation concurrency (None = auto-detect).
    pub jobs: Option<usize>,
}

impl Config {
    /// A configuration with default flags.
    pub fn new(operation: Operation, inputs: Vec<PathBuf>) -> Self {
        Self {
            operation,
            inputs,
            output_dir: None,
            name_pattern: None,
            copy_dirs: Vec::new(),
            overwrite_mode: OverwriteMode::default(),
            dry_run: false,
            verbose: false,
            quiet: false,
            json: false,
            continue_on_error: false,
            jobs: None,
        }
    }

    /// Returns a reference to inputs.
    pub fn inputs(&self) -> &[PathBuf] {
        &self.inputs
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error describing the first inconsistency found.
    pub fn validate(&self) -> Result<()> {
        if self.inputs.is_empty() {
            bail!("No input files specified");
        }

        if self.verbose && self.quiet {
            bail!("Cannot use both --verbose and --quiet");
        }

        if self.json && self.verbose {
            bail!("Cannot use both --json and --verbose");
        }

        if self.jobs == Some(0) {
            bail!("Number of jobs must be at least 1");
        }

        if let Some(pattern) = &self.name_pattern {
            validate_file_name(&apply_pattern(pattern, "name"))
                .context("Invalid --name pattern")?;
        }

        if let Some(dir) = &self.output_dir
            && dir.exists()
            && !dir.is_dir()
        {
            bail!("Output directory is not a directory: {}", dir.display());
        }

        self.validate_operation()
    }

    fn validate_operation(&self) -> Result<()> {
        match &self.operation {
            Operation::Merge => {
                if self.inputs.len() < 2 {
                    bail!(
                        "Merging needs at least two PDF files (got {})",
                        self.inputs.len()
                    );
                }
                if !self.copy_dirs.is_empty() {
                    bail!("--copy-to is not available for merge");
                }
            }
            Operation::Split { pages, .. } => {
                if pages.trim().is_empty() {
                    bail!("No pages given; use --pages like '1-3, 5'");
                }
            }
            Operation::Reorder(script) => {
                if script.is_empty() {
                    bail!("Nothing to do; give --order, --move or --rotate");
                }
            }
            Operation::Compress { target_size, .. } => {
                if *target_size == Some(0) {
                    bail!("Target size must be greater than zero");
                }
            }
            Operation::Lock(intent) => {
                intent.settings().context("Invalid lock options")?;
            }
            Operation::Unlock { password } => {
                if password.is_empty() {
                    bail!("Password must not be empty");
                }
            }
        }
        Ok(())
    }

    /// Namer for this run's outputs.
    pub fn namer(&self) -> OutputNamer {
        OutputNamer::new(self.output_dir.clone(), self.name_pattern.clone())
    }

    /// Plan the batch: one merge, or one task per input.
    ///
    /// # Errors
    ///
    /// Returns an error if an output name is invalid, an output would
    /// overwrite its own input, or two tasks would write the same file.
    pub fn batch(&self) -> crate::Result<Batch> {
        let namer = self.namer();
        let kind = self.operation.output_kind(self.inputs.len());

        let Some(task_kind) = self.operation.task_kind() else {
            let destination = namer.merge_destination(&self.inputs)?;
            if let Some(input) = self.inputs.iter().find(|i| same_file(i, &destination)) {
                return Err(overwrites_input(input));
            }
            return Ok(Batch::Merge(MergeTask {
                sources: self.inputs.clone(),
                destination,
                skip: None,
            }));
        };

        let mut tasks = Vec::with_capacity(self.inputs.len());
        let mut planned: HashSet<PathBuf> = HashSet::new();
        for input in &self.inputs {
            let destination = namer.destination(input, kind)?;
            if same_file(input, &destination) {
                return Err(overwrites_input(input));
            }
            let mut task = BatchTask::new(input.clone(), destination, task_kind.clone());
            for dir in &self.copy_dirs {
                let file_name = namer.file_name(input, kind)?;
                task.destinations.push(dir.join(file_name));
            }
            let shared = task
                .destinations
                .iter()
                .find(|path| !planned.insert(path.to_path_buf()));
            if let Some(shared) = shared {
                return Err(shared_destination(shared));
            }
            tasks.push(task);
        }
        Ok(Batch::Files(tasks))
    }

    /// Get the effective number of parallel jobs.
    pub fn effective_jobs(&self) -> usize {
        self.jobs.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        })
    }

    /// Whether progress and status output should be shown.
    pub fn should_print(&self) -> bool {
        (!self.quiet && !self.json) || self.dry_run
    }
}

fn same_file(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

fn overwrites_input(input: &Path) -> crate::RakuError {
    crate::RakuError::invalid_config(format!(
        "Output file cannot be the same as an input file: {}",
        input.display()
    ))
}

fn shared_destination(path: &Path) -> crate::RakuError {
    crate::RakuError::invalid_config(format!(
        "Several inputs would be written to {}; include {NAME_TOKEN} in the name pattern",
        path.display()
    ))
}
