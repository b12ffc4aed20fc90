//! Executes individual tasks against real files.

use std::path::{Path, PathBuf};
use tracing::debug;

use super::{BatchTask, MergeTask, TaskKind, TaskReport};
use crate::document::{LopdfDocument, PdfDocument};
use crate::engine::{
    Compressor, GhostscriptCompressor, MergeEngine, MergeProgress, ProtectionEngine,
    ReorderEngine, SplitEngine, compress_file,
};
use crate::error::{RakuError, Result};
use crate::io::PdfReader;
use crate::pages::parse_page_ranges;

/// Performs the work behind a batch.
///
/// The coordinator calls these methods from its worker thread, one at a time.
pub trait TaskRunner: Send + Sync + 'static {
    /// Run one per-file task.
    ///
    /// # Errors
    ///
    /// Any error fails this task only.
    fn run_task(&self, task: &BatchTask) -> Result<TaskReport>;

    /// Run a merge, reporting after each source.
    ///
    /// # Errors
    ///
    /// Any error fails the whole merge.
    fn run_merge(
        &self,
        task: &MergeTask,
        progress: &mut dyn FnMut(MergeProgress<'_>),
    ) -> Result<TaskReport>;
}

/// Runs tasks with `lopdf` documents and an external compressor.
#[derive(Debug, Clone)]
pub struct PdfTaskRunner<C = GhostscriptCompressor> {
    reader: PdfReader,
    compressor: Option<C>,
}

impl PdfTaskRunner {
    /// A runner that cannot compress.
    pub fn without_compressor() -> Self {
        Self {
            reader: PdfReader::new(),
            compressor: None,
        }
    }
}

impl<C: Compressor> PdfTaskRunner<C> {
    /// A runner that compresses with `compressor`.
    pub fn with_compressor(compressor: C) -> Self {
        Self {
            reader: PdfReader::new(),
            compressor: Some(compressor),
        }
    }

    fn open(&self, path: &Path) -> Result<LopdfDocument> {
        Ok(self.reader.load(path)?.document)
    }

    fn compressor(&self) -> Result<&C> {
        self.compressor.as_ref().ok_or_else(|| {
            RakuError::invalid_config(
                "Ghostscript was not found; install it or pass --gs <path>",
            )
        })
    }
}

impl<C> TaskRunner for PdfTaskRunner<C>
where
    C: Compressor + Send + Sync + 'static,
{
    fn run_task(&self, task: &BatchTask) -> Result<TaskReport> {
        let (destination, copies) = task
            .destinations
            .split_first()
            .ok_or_else(|| RakuError::invalid_config("task has no destination"))?;

        let report = match &task.kind {
            TaskKind::Split { mode, pages } => {
                let doc = self.open(&task.source)?;
                let targets = parse_page_ranges(pages, doc.page_count())?;
                let split = SplitEngine::split(&doc, *mode, &targets)?;
                TaskReport::Split(split.write(destination)?)
            }
            TaskKind::Reorder(script) => {
                let doc = self.open(&task.source)?;
                let model = script.apply(doc.page_count())?;
                let reordered = ReorderEngine::reorder_model(&doc, &model)?;
                TaskReport::Reorder(reordered.write(destination)?)
            }
            TaskKind::Compress { level, target_size } => {
                let result = compress_file(
                    &task.source,
                    destination,
                    *level,
                    *target_size,
                    self.compressor()?,
                )?;
                TaskReport::Compress(result)
            }
            TaskKind::Lock(intent) => {
                let doc = self.open(&task.source)?;
                let size = ProtectionEngine::protect_to(&doc, intent, destination)?;
                TaskReport::Lock {
                    output_path: destination.clone(),
                    size,
                }
            }
            TaskKind::Unlock { password } => {
                let mut doc = self.open(&task.source)?;
                let size = ProtectionEngine::unprotect_to(&mut doc, password, destination)?;
                TaskReport::Unlock {
                    output_path: destination.clone(),
                    size,
                }
            }
        };

        copy_to(destination, copies)?;
        Ok(report)
    }

    fn run_merge(
        &self,
        task: &MergeTask,
        progress: &mut dyn FnMut(MergeProgress<'_>),
    ) -> Result<TaskReport> {
        let documents = task
            .sources
            .iter()
            .map(|path| self.open(path))
            .collect::<Result<Vec<_>>>()?;
        let sources: Vec<&LopdfDocument> = documents.iter().collect();

        let merged = MergeEngine::merge(&sources, |step| progress(step))?;
        Ok(TaskReport::Merge(merged.write(&task.destination)?))
    }
}

/// Copy the finished output to every extra destination.
fn copy_to(written: &Path, copies: &[PathBuf]) -> Result<()> {
    for copy in copies {
        if let Some(parent) = copy.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|err| RakuError::failed_to_create_output(parent, err))?;
        }
        std::fs::copy(written, copy).map_err(|err| RakuError::failed_to_write(copy, err))?;
        debug!(from = %written.display(), to = %copy.display(), "copied output");
    }
    Ok(())
}
