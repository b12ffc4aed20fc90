//! rakupdf - Merge, split, reorder, compress and password-protect PDF files.

mod cli;

use clap::Parser;
use std::io::{self, IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::process;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;
use rakupdf::batch::{
    Batch, BatchCoordinator, BatchEvent, BatchHandle, BatchState, BatchSummary, BatchTask,
    PdfTaskRunner, SkipReason,
};
use rakupdf::config::{Operation, OverwriteMode};
use rakupdf::engine::GhostscriptCompressor;
use rakupdf::error::RakuError;
use rakupdf::output::{
    OutputFormatter, ProgressBar, display_batch_summary, display_plan,
    display_validation_summary, summary_json,
};
use rakupdf::validation::Validator;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.options.verbose);

    if let Err(err) = run(cli).await {
        eprintln!("Error: {err}");
        if err.is_recoverable() {
            eprintln!("Hint: --continue-on-error skips inputs that cannot be read");
        }
        process::exit(err.exit_code());
    }
}

/// Diagnostics go to stderr; `RUST_LOG` overrides the default level.
fn init_logging(verbose: bool) {
    let default = if verbose { "rakupdf=info" } else { "rakupdf=warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}

async fn run(cli: Cli) -> Result<(), RakuError> {
    let mut config = cli.to_config()?;
    let formatter = OutputFormatter::from_config(&config);
    formatter.debug(&format!("{} v{}", rakupdf::NAME, rakupdf::VERSION));

    let validator = Validator::new();
    let validation = validator.validate_config(&config).await?;
    display_validation_summary(&formatter, &validation);

    if validation.files_failed > 0 {
        config.inputs = validation.paths();
        config.validate()?;
    }

    let mut batch = config.batch()?;
    validator.validate_outputs(&destinations(&batch), config.overwrite_mode)?;

    if config.dry_run {
        display_plan(&formatter, config.operation.name(), &batch);
        return Ok(());
    }

    validator.prepare_output_dir(&config).await?;

    let interactive = formatter.should_print() && io::stdin().is_terminal();
    let declined = apply_overwrite_gate(&mut batch, config.overwrite_mode, |path| {
        if interactive {
            prompt_overwrite(path)
        } else {
            formatter.warning(&format!(
                "{} exists; skipping (use --force to overwrite)",
                path.display()
            ));
            Ok(Answer::No)
        }
    })?;
    if declined > 0 {
        info!(declined, "outputs left untouched");
    }

    let runner = match &config.operation {
        Operation::Compress { ghostscript, .. } => {
            let compressor = GhostscriptCompressor::discover(ghostscript.as_deref())?;
            debug!(executable = %compressor.executable().display(), "using ghostscript");
            PdfTaskRunner::with_compressor(compressor)
        }
        _ => PdfTaskRunner::without_compressor(),
    };

    let coordinator = BatchCoordinator::new(runner);
    let handle = coordinator.spawn(batch)?;
    let mut progress = ProgressBar::when(formatter.should_print());
    let summary = drive(handle, &mut progress, &formatter).await?;

    if config.json {
        println!("{}", summary_json(&summary)?);
    } else {
        display_batch_summary(&formatter, &summary);
    }

    finish(&summary)
}

/// Forward batch events to the progress bar until the worker is done.
///
/// The first Ctrl-C cancels the batch between files; the worker still posts
/// its final summary.
async fn drive(
    mut handle: BatchHandle,
    progress: &mut ProgressBar,
    formatter: &OutputFormatter,
) -> Result<BatchSummary, RakuError> {
    let cancel = handle.cancellation_token();
    let mut interrupted = false;

    loop {
        tokio::select! {
            event = handle.next_event() => match event {
                Some(event) => {
                    progress.observe(&event);
                    if let BatchEvent::TaskFinished { outcome, .. } = &event {
                        formatter.debug(&outcome.message());
                    }
                }
                None => break,
            },
            signal = tokio::signal::ctrl_c(), if !interrupted => {
                interrupted = true;
                if signal.is_ok() {
                    progress.clear();
                    formatter.warning("Interrupted; stopping after the current file");
                    cancel.cancel();
                }
            }
        }
    }

    Ok(handle.join()?)
}

/// Map the summary to the process result.
fn finish(summary: &BatchSummary) -> Result<(), RakuError> {
    match summary.state {
        BatchState::Cancelled => Err(RakuError::Cancelled),
        _ if summary.failed > 0 => Err(RakuError::BatchIncomplete {
            failed: summary.failed,
            total: summary.total(),
        }),
        _ => Ok(()),
    }
}

fn destinations(batch: &Batch) -> Vec<&Path> {
    match batch {
        Batch::Merge(task) => vec![task.destination.as_path()],
        Batch::Files(tasks) => tasks
            .iter()
            .flat_map(|task| task.destinations.iter().map(|p| p.as_path()))
            .collect(),
    }
}

/// Reply to an overwrite question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Answer {
    Yes,
    No,
    All,
}

/// Decide what happens to outputs that already exist.
///
/// `Force` overwrites everything. `NoClobber` fails on the first existing
/// output. `Prompt` asks once per task; a declined task is marked skipped
/// and "all" stops asking. Returns the number of declined tasks.
fn apply_overwrite_gate<F>(
    batch: &mut Batch,
    mode: OverwriteMode,
    mut ask: F,
) -> Result<usize, RakuError>
where
    F: FnMut(&Path) -> Result<Answer, RakuError>,
{
    if mode == OverwriteMode::Force {
        return Ok(0);
    }

    let mut gates: Vec<(&[PathBuf], &mut Option<SkipReason>)> = match batch {
        Batch::Merge(task) => vec![(std::slice::from_ref(&task.destination), &mut task.skip)],
        Batch::Files(tasks) => tasks
            .iter_mut()
            .map(|BatchTask { destinations, skip, .. }| (destinations.as_slice(), skip))
            .collect(),
    };

    let mut declined = 0;
    let mut overwrite_all = false;
    for (outputs, skip) in gates.iter_mut() {
        let Some(existing) = outputs.iter().find(|p| p.exists()) else {
            continue;
        };

        if mode == OverwriteMode::NoClobber {
            return Err(RakuError::output_exists(existing));
        }
        if overwrite_all {
            continue;
        }

        match ask(existing)? {
            Answer::Yes => {}
            Answer::All => overwrite_all = true,
            Answer::No => {
                **skip = Some(SkipReason::OverwriteDeclined);
                declined += 1;
            }
        }
    }
    Ok(declined)
}

fn prompt_overwrite(path: &Path) -> Result<Answer, RakuError> {
    print!("{} already exists. Overwrite? [y/N/a]: ", path.display());
    io::stdout().flush().ok();

    let mut response = String::new();
    io::stdin()
        .read_line(&mut response)
        .map_err(|err| RakuError::other(format!("Failed to read input: {err}")))?;

    Ok(parse_answer(&response))
}

fn parse_answer(response: &str) -> Answer {
    match response.trim().to_lowercase().as_str() {
        "y" | "yes" => Answer::Yes,
        "a" | "all" => Answer::All,
        _ => Answer::No,
    }
}
