//! Command-line interface.
//!
//! Parsed with `clap` derive; [`Cli::to_config`] turns the arguments into a
//! [`Config`] the library understands. This file is also compiled by
//! `build.rs` to render the man page, so it only depends on `clap`, the
//! standard library and `rakupdf`.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use rakupdf::config::{Config, Operation, OverwriteMode};
use rakupdf::engine::{CompressionLevel, ProtectionIntent, ReorderScript, SplitMode};
use rakupdf::pages::PageMove;
use rakupdf::utils::collect_inputs;

/// Merge, split, reorder, compress and password-protect PDF files.
///
/// Every command except `merge` works on each input separately and writes
/// one output per input, next to the input or into --output-dir. Inputs may
/// be files, directories (searched for *.pdf) or glob patterns.
#[derive(Parser, Debug)]
#[command(name = "rakupdf")]
#[command(version)]
#[command(about = "Merge, split, reorder, compress and password-protect PDF files", long_about = None)]
#[command(author)]
#[command(arg_required_else_help = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[command(flatten)]
    pub options: GlobalOptions,
}

/// Flags shared by every command.
#[derive(Args, Debug, Default)]
pub struct GlobalOptions {
    /// Directory for output files
    ///
    /// Created if missing. Without it, each output is written next to its
    /// input.
    #[arg(short, long, value_name = "DIR", global = true)]
    pub output_dir: Option<PathBuf>,

    /// Output file name pattern
    ///
    /// `{name}` is replaced with the input file name without extension;
    /// `.pdf` is appended when missing.
    ///
    /// Example:
    ///   rakupdf compress --name "{name}-small" scans/*.pdf
    #[arg(long, value_name = "PATTERN", global = true)]
    pub name: Option<String>,

    /// Also copy every output into this directory (repeatable)
    #[arg(long, value_name = "DIR", global = true)]
    pub copy_to: Vec<PathBuf>,

    /// Show planned outputs without writing anything
    #[arg(short = 'n', long, global = true)]
    pub dry_run: bool,

    /// Show details about every input and every finished file
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Overwrite existing outputs without asking
    #[arg(short, long, global = true)]
    pub force: bool,

    /// Never overwrite existing outputs
    #[arg(long, conflicts_with = "force", global = true)]
    pub no_clobber: bool,

    /// Only print warnings and errors
    #[arg(short, long, conflicts_with = "verbose", global = true)]
    pub quiet: bool,

    /// Print the final summary as JSON on stdout
    #[arg(long, global = true)]
    pub json: bool,

    /// Skip inputs that fail validation instead of stopping
    #[arg(long, global = true)]
    pub continue_on_error: bool,

    /// Number of inputs validated concurrently
    ///
    /// Defaults to the number of CPU cores.
    #[arg(short, long, value_name = "N", global = true)]
    pub jobs: Option<usize>,
}

/// Operations.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Combine PDF files into one, in the order given
    ///
    /// The output is named after the first input, e.g.
    /// `intro_plus-2-others_merged.pdf`.
    Merge {
        /// Input PDF files, directories or glob patterns
        #[arg(required = true, value_name = "FILE")]
        inputs: Vec<String>,
    },

    /// Keep or delete selected pages of each file
    ///
    /// Examples:
    ///   rakupdf split --pages "1-3, 7" report.pdf
    ///   rakupdf split --pages 1 --delete scans/*.pdf
    Split {
        /// One-based pages, e.g. "1-3, 5"
        #[arg(short, long, value_name = "RANGE")]
        pages: String,

        /// Delete the given pages instead of keeping them
        #[arg(short, long)]
        delete: bool,

        /// Input PDF files, directories or glob patterns
        #[arg(required = true, value_name = "FILE")]
        inputs: Vec<String>,
    },

    /// Reorder and rotate pages of each file
    ///
    /// Steps run in this order: --order, --select, each --move, --rotate.
    /// Rotating without --select rotates every page.
    ///
    /// Examples:
    ///   rakupdf reorder --order "3, 1-2" slides.pdf
    ///   rakupdf reorder --select 2,4 --move top --rotate 90 scan.pdf
    Reorder {
        /// New page order; pages left out are dropped
        #[arg(long, value_name = "PAGES")]
        order: Option<String>,

        /// Pages the moves and rotation apply to
        #[arg(long, value_name = "PAGES")]
        select: Option<String>,

        /// Move the selection: up, down, top, bottom or FROM:TO (one-based
        /// positions, a drag)
        #[arg(long = "move", value_name = "MOVE", value_parser = parse_move)]
        moves: Vec<PageMove>,

        /// Rotate the selection by a multiple of 90 degrees
        #[arg(long, value_name = "DEGREES", allow_negative_numbers = true)]
        rotate: Option<i64>,

        /// Input PDF files, directories or glob patterns
        #[arg(required = true, value_name = "FILE")]
        inputs: Vec<String>,
    },

    /// Shrink each file with Ghostscript
    ///
    /// With --target, presets are tried from the highest quality down until
    /// the output fits; otherwise --level picks one preset.
    Compress {
        /// 1 (best quality) to 5 (smallest file)
        #[arg(short, long, value_name = "LEVEL", default_value_t = 3)]
        #[arg(value_parser = clap::value_parser!(u8).range(1..=5))]
        level: u8,

        /// Size to aim for, e.g. 500K, 2MB or 1048576
        #[arg(short, long, value_name = "SIZE", value_parser = parse_size)]
        target: Option<u64>,

        /// Ghostscript executable
        #[arg(long = "gs", value_name = "PATH", env = "RAKUPDF_GS")]
        ghostscript: Option<PathBuf>,

        /// Input PDF files, directories or glob patterns
        #[arg(required = true, value_name = "FILE")]
        inputs: Vec<String>,
    },

    /// Password-protect each file
    ///
    /// By default the password is needed to open the file, and copying and
    /// printing are disabled. With --restrict the file opens freely and
    /// the password only lifts the restrictions chosen with --no-copy and
    /// --no-print.
    Lock {
        /// Password
        #[arg(short, long, env = "RAKUPDF_PASSWORD", hide_env_values = true)]
        password: String,

        /// Open without a password but restrict permissions
        #[arg(long)]
        restrict: bool,

        /// Forbid copying text and images
        #[arg(long, requires = "restrict")]
        no_copy: bool,

        /// Forbid printing
        #[arg(long, requires = "restrict")]
        no_print: bool,

        /// Input PDF files, directories or glob patterns
        #[arg(required = true, value_name = "FILE")]
        inputs: Vec<String>,
    },

    /// Remove password protection from each file
    Unlock {
        /// Password of the inputs
        #[arg(short, long, env = "RAKUPDF_PASSWORD", hide_env_values = true)]
        password: String,

        /// Input PDF files, directories or glob patterns
        #[arg(required = true, value_name = "FILE")]
        inputs: Vec<String>,
    },
}

impl Command {
    fn inputs(&self) -> &[String] {
        match self {
            Command::Merge { inputs }
            | Command::Split { inputs, .. }
            | Command::Reorder { inputs, .. }
            | Command::Compress { inputs, .. }
            | Command::Lock { inputs, .. }
            | Command::Unlock { inputs, .. } => inputs,
        }
    }

    fn operation(&self) -> rakupdf::Result<Operation> {
        let operation = match self {
            Command::Merge { .. } => Operation::Merge,
            Command::Split { pages, delete, .. } => Operation::Split {
                mode: if *delete {
                    SplitMode::Delete
                } else {
                    SplitMode::Keep
                },
                pages: pages.clone(),
            },
            Command::Reorder {
                order,
                select,
                moves,
                rotate,
                ..
            } => Operation::Reorder(ReorderScript {
                order: order.clone(),
                select: select.clone(),
                moves: moves.clone(),
                rotate: *rotate,
            }),
            Command::Compress {
                level,
                target,
                ghostscript,
                ..
            } => Operation::Compress {
                level: CompressionLevel::new(*level)?,
                target_size: *target,
                ghostscript: ghostscript.clone(),
            },
            Command::Lock {
                password,
                restrict,
                no_copy,
                no_print,
                ..
            } => Operation::Lock(if *restrict {
                ProtectionIntent::Restricted {
                    password: password.clone(),
                    forbid_copy: *no_copy,
                    forbid_print: *no_print,
                }
            } else {
                ProtectionIntent::ViewLocked {
                    password: password.clone(),
                }
            }),
            Command::Unlock { password, .. } => Operation::Unlock {
                password: password.clone(),
            },
        };
        Ok(operation)
    }
}

impl Cli {
    /// Build the run configuration, expanding input patterns and
    /// directories.
    ///
    /// # Errors
    ///
    /// Returns an error if an input pattern is invalid or matches nothing,
    /// or if the options do not form a valid configuration.
    pub fn to_config(&self) -> rakupdf::Result<Config> {
        let options = &self.options;
        let overwrite_mode = if options.force {
            OverwriteMode::Force
        } else if options.no_clobber {
            OverwriteMode::NoClobber
        } else {
            OverwriteMode::Prompt
        };

        let config = Config {
            operation: self.command.operation()?,
            inputs: collect_inputs(self.command.inputs())?,
            output_dir: options.output_dir.clone(),
            name_pattern: options.name.clone(),
            copy_dirs: options.copy_to.clone(),
            overwrite_mode,
            dry_run: options.dry_run,
            verbose: options.verbose,
            quiet: options.quiet,
            json: options.json,
            continue_on_error: options.continue_on_error,
            jobs: options.jobs,
        };

        config.validate()?;
        Ok(config)
    }
}

/// Parse a `--move` value.
fn parse_move(value: &str) -> Result<PageMove, String> {
    let value = value.trim();
    match value.to_ascii_lowercase().as_str() {
        "up" => return Ok(PageMove::Up),
        "down" => return Ok(PageMove::Down),
        "top" => return Ok(PageMove::ToTop),
        "bottom" => return Ok(PageMove::ToBottom),
        _ => {}
    }

    let (from, to) = value
        .split_once(':')
        .ok_or_else(|| format!("expected up, down, top, bottom or FROM:TO, got '{value}'"))?;
    let position = |text: &str| -> Result<usize, String> {
        match text.trim().parse::<usize>() {
            Ok(n) if n >= 1 => Ok(n - 1),
            _ => Err(format!("'{text}' is not a page position (1 or more)")),
        }
    };
    Ok(PageMove::Drag {
        from: position(from)?,
        to: position(to)?,
    })
}

/// Parse a size like `500K`, `1.5MB` or `2048` into bytes.
fn parse_size(value: &str) -> Result<u64, String> {
    let value = value.trim();
    let split = value
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(value.len());
    let (number, unit) = value.split_at(split);

    let number: f64 = number
        .parse()
        .map_err(|_| format!("'{value}' is not a size"))?;
    let multiplier: u64 = match unit.trim().to_ascii_uppercase().as_str() {
        "" | "B" => 1,
        "K" | "KB" => 1024,
        "M" | "MB" => 1024 * 1024,
        "G" | "GB" => 1024 * 1024 * 1024,
        other => return Err(format!("unknown size unit '{other}'")),
    };

    let bytes = (number * multiplier as f64).round() as u64;
    if bytes == 0 {
        return Err("size must be greater than zero".to_string());
    }
    Ok(bytes)
}
