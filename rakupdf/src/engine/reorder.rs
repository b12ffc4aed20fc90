//! Write a page order snapshot into a new document.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

use crate::document::{DocumentError, PdfDocument};
use crate::pages::{
    OrderError, PageIndex, PageMove, PageOrderModel, PagePlan, PlannedPage, RangeError, Rotation,
    parse_page_ranges, parse_page_sequence, validate_order,
};

/// Errors raised while reordering.
#[derive(Debug, Error)]
pub enum ReorderError {
    /// The source is encrypted.
    #[error("{0} is encrypted; unlock it before reordering")]
    Encrypted(String),

    /// The source has no pages.
    #[error("{0} has no pages")]
    Empty(String),

    /// The requested order is invalid.
    #[error(transparent)]
    Order(#[from] OrderError),

    /// A page list in a script could not be parsed.
    #[error(transparent)]
    Range(#[from] RangeError),

    /// The backend failed.
    #[error(transparent)]
    Document(#[from] DocumentError),
}

/// Summary of a written reorder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReorderOutcome {
    /// Page count of the source.
    pub total_pages: usize,
    /// Pages in the output.
    pub output_pages: usize,
    /// Output file.
    pub output_path: PathBuf,
}

/// A reordered document that has not been written yet.
#[derive(Debug)]
pub struct Reordered<D> {
    /// The new document.
    pub document: D,
    /// Page count of the source.
    pub total_pages: usize,
    /// Pages in the new document.
    pub output_pages: usize,
}

impl<D: PdfDocument> Reordered<D> {
    /// Write the reordered document.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot write `path`.
    pub fn write(self, path: &Path) -> Result<ReorderOutcome, ReorderError> {
        self.document.write(path)?;
        info!(path = %path.display(), pages = self.output_pages, "reordered document written");
        Ok(ReorderOutcome {
            total_pages: self.total_pages,
            output_pages: self.output_pages,
            output_path: path.to_path_buf(),
        })
    }
}

/// Non-interactive description of edits to a page order.
///
/// Steps run in field order: replace the order, select pages, apply moves,
/// then rotate the selection. Page lists are one-based specs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReorderScript {
    /// New order, e.g. `3,1-2`. Pages left out are dropped.
    pub order: Option<String>,
    /// Pages to select, e.g. `2,4`.
    pub select: Option<String>,
    /// Moves applied to the selection.
    #[serde(default)]
    pub moves: Vec<PageMove>,
    /// Rotation in degrees applied to the selection.
    pub rotate: Option<i64>,
}

impl ReorderScript {
    /// Replay the script on a fresh model for a `page_count`-page document.
    ///
    /// Rotating without an explicit selection rotates every page.
    ///
    /// # Errors
    ///
    /// Returns an error if a page list is malformed or the order is invalid.
    pub fn apply(&self, page_count: usize) -> Result<PageOrderModel, ReorderError> {
        let mut model = PageOrderModel::new(page_count);

        if let Some(order) = &self.order {
            model.set_order(parse_page_sequence(order, page_count)?)?;
        }

        match &self.select {
            Some(select) => {
                let pages = parse_page_ranges(select, page_count)?;
                model.select_all_of(pages.as_slice());
            }
            None if self.rotate.is_some() => model.select_all(),
            None => {}
        }

        for &page_move in &self.moves {
            if !model.apply(page_move) {
                debug!(?page_move, "move had no effect");
            }
        }

        if let Some(degrees) = self.rotate {
            model.rotate(degrees).map_err(OrderError::from)?;
        }

        Ok(model)
    }

    /// Whether the script changes nothing.
    pub fn is_empty(&self) -> bool {
        self.order.is_none() && self.moves.is_empty() && self.rotate.is_none()
    }
}

/// Writes a chosen page order with per-page rotations.
#[derive(Debug, Default, Clone, Copy)]
pub struct ReorderEngine;

impl ReorderEngine {
    /// Emit `doc`'s pages in `order`, adding `rotations[original]` to each.
    ///
    /// # Errors
    ///
    /// Fails when the source is encrypted or empty, or when `order` is empty,
    /// repeats a page or names one outside the document.
    pub fn reorder<D: PdfDocument>(
        doc: &D,
        order: &[PageIndex],
        rotations: &BTreeMap<PageIndex, Rotation>,
    ) -> Result<Reordered<D>, ReorderError> {
        if doc.is_encrypted() {
            return Err(ReorderError::Encrypted(doc.name().to_string()));
        }

        let total_pages = doc.page_count();
        if total_pages == 0 {
            return Err(ReorderError::Empty(doc.name().to_string()));
        }
        validate_order(order, total_pages)?;

        let plan: PagePlan = order
            .iter()
            .map(|&index| {
                let rotation = rotations.get(&index).copied().unwrap_or_default();
                PlannedPage::new(0, index).rotated(rotation)
            })
            .collect();

        let document = D::assemble(&[doc], &plan)?;

        Ok(Reordered {
            document,
            total_pages,
            output_pages: order.len(),
        })
    }

    /// Emit `doc` as laid out by `model`.
    ///
    /// # Errors
    ///
    /// See [`ReorderEngine::reorder`].
    pub fn reorder_model<D: PdfDocument>(
        doc: &D,
        model: &PageOrderModel,
    ) -> Result<Reordered<D>, ReorderError> {
        Self::reorder(doc, model.order(), model.rotations())
    }
}
