//! Page order model with rotation bookkeeping.
//!
//! [`PageOrderModel`] holds the display order of a document's pages as a list
//! of original page indices, a rotation per original index, and the current
//! multi-selection. Rotations are keyed by the original index so they follow a
//! page wherever it moves.
//!
//! # Examples
//!
//! ```
//! use rakupdf::pages::PageOrderModel;
//!
//! let mut model = PageOrderModel::new(4);
//! model.select_all_of(&[0, 2]);
//! model.move_selection_down();
//! assert_eq!(model.order(), &[1, 0, 3, 2]);
//! ```

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;

use super::{PageIndex, PagePlan, PlannedPage, Rotation, RotationError};

/// Errors produced when replacing the page order.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrderError {
    /// The order contains no pages.
    #[error("page order is empty")]
    EmptyOrder,

    /// An index does not exist in the document.
    #[error("page {} is out of range (valid pages: 1-{page_count})", .index + 1)]
    PageOutOfRange {
        /// Zero-based index that was rejected.
        index: PageIndex,
        /// Total pages in the document.
        page_count: usize,
    },

    /// An index appears more than once.
    #[error("page {} appears more than once", .0 + 1)]
    DuplicatePage(PageIndex),

    /// A rotation was not a quarter turn.
    #[error(transparent)]
    Rotation(#[from] RotationError),
}

/// A single reposition command applied to the current selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PageMove {
    /// Shift the selection one slot towards the start.
    Up,
    /// Shift the selection one slot towards the end.
    Down,
    /// Gather the selection at the start.
    ToTop,
    /// Gather the selection at the end.
    ToBottom,
    /// Drag from one display position to another.
    Drag {
        /// Display position the drag started at.
        from: usize,
        /// Display position the pointer was released at.
        to: usize,
    },
}

/// Ordered pages, per-page rotations and the current selection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageOrderModel {
    page_count: usize,
    order: Vec<PageIndex>,
    rotations: BTreeMap<PageIndex, Rotation>,
    selection: BTreeSet<PageIndex>,
}

impl PageOrderModel {
    /// Create a model for a document with `page_count` pages.
    pub fn new(page_count: usize) -> Self {
        let mut model = Self::default();
        model.load(page_count);
        model
    }

    /// Reset to the natural order with no rotations.
    ///
    /// The first page is selected when the document has any pages.
    pub fn load(&mut self, page_count: usize) {
        self.page_count = page_count;
        self.order = (0..page_count).collect();
        self.rotations.clear();
        self.selection.clear();
        if page_count > 0 {
            self.selection.insert(0);
        }
    }

    /// Number of pages in the bound document.
    pub fn page_count(&self) -> usize {
        self.page_count
    }

    /// Number of pages in the current order.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether the order is empty.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Current display order as original indices.
    pub fn order(&self) -> &[PageIndex] {
        &self.order
    }

    /// Rotation for every original index that has one.
    pub fn rotations(&self) -> &BTreeMap<PageIndex, Rotation> {
        &self.rotations
    }

    /// Rotation of a single original index.
    pub fn rotation_of(&self, index: PageIndex) -> Rotation {
        self.rotations.get(&index).copied().unwrap_or_default()
    }

    /// Currently selected original indices.
    pub fn selection(&self) -> &BTreeSet<PageIndex> {
        &self.selection
    }

    /// Replace the selection with a single original index.
    pub fn select(&mut self, index: PageIndex) {
        self.selection.clear();
        if self.order.contains(&index) {
            self.selection.insert(index);
        }
    }

    /// Replace the selection with several original indices.
    ///
    /// Indices that are not part of the current order are ignored.
    pub fn select_all_of(&mut self, indices: &[PageIndex]) {
        self.selection = indices
            .iter()
            .copied()
            .filter(|index| self.order.contains(index))
            .collect();
    }

    /// Select every page in the current order.
    pub fn select_all(&mut self) {
        self.selection = self.order.iter().copied().collect();
    }

    /// Add or remove an original index from the selection.
    pub fn toggle(&mut self, index: PageIndex) {
        if !self.selection.remove(&index) && self.order.contains(&index) {
            self.selection.insert(index);
        }
    }

    /// Select every page between two display positions, inclusive.
    ///
    /// The positions may come in either order; positions past the end are
    /// clamped.
    pub fn select_range(&mut self, from: usize, to: usize) {
        self.selection.clear();
        let Some(last) = self.order.len().checked_sub(1) else {
            return;
        };
        let (start, end) = (from.min(to).min(last), from.max(to).min(last));
        self.selection.extend(self.order[start..=end].iter().copied());
    }

    /// Clear the selection.
    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    /// Pointer press at a display position.
    ///
    /// An additive press toggles the page. A plain press on an unselected page
    /// selects only that page; on a selected page it keeps the selection so
    /// the whole block can be dragged.
    pub fn press(&mut self, position: usize, additive: bool) {
        let Some(&index) = self.order.get(position) else {
            return;
        };

        if additive {
            self.toggle(index);
        } else if !self.selection.contains(&index) {
            self.select(index);
        }
    }

    /// Rotate every selected page by `degrees`.
    ///
    /// # Errors
    ///
    /// Returns an error if `degrees` is not a multiple of 90.
    pub fn rotate(&mut self, degrees: i64) -> Result<(), RotationError> {
        let delta = Rotation::from_degrees(degrees)?;
        for &index in &self.selection {
            let rotated = self.rotations.get(&index).copied().unwrap_or_default() + delta;
            if rotated.is_none() {
                self.rotations.remove(&index);
            } else {
                self.rotations.insert(index, rotated);
            }
        }
        Ok(())
    }

    /// Move every selected page one slot towards the start.
    ///
    /// Returns `false` without changes when nothing is selected or a selected
    /// page is already first.
    pub fn move_selection_up(&mut self) -> bool {
        let positions = self.selected_positions();
        match positions.first() {
            Some(&first) if first > 0 => {
                for &position in &positions {
                    self.order.swap(position - 1, position);
                }
                true
            }
            _ => false,
        }
    }

    /// Move every selected page one slot towards the end.
    ///
    /// Returns `false` without changes when nothing is selected or a selected
    /// page is already last.
    pub fn move_selection_down(&mut self) -> bool {
        let positions = self.selected_positions();
        match positions.last() {
            Some(&last) if last + 1 < self.order.len() => {
                for &position in positions.iter().rev() {
                    self.order.swap(position, position + 1);
                }
                true
            }
            _ => false,
        }
    }

    /// Gather the selection at the start, keeping its internal order.
    pub fn move_selection_to_top(&mut self) -> bool {
        let (block, others) = self.split_selection();
        self.replace_order([block, others].concat())
    }

    /// Gather the selection at the end, keeping its internal order.
    pub fn move_selection_to_bottom(&mut self) -> bool {
        let (block, others) = self.split_selection();
        self.replace_order([others, block].concat())
    }

    /// Apply a drag gesture that was released at display position `target`.
    ///
    /// Without a selection the page at `from` is moved to `target`, clamped
    /// to the end of the list. With a selection, `from` is ignored: releasing
    /// inside the selection's span does nothing, and releasing elsewhere
    /// moves the selection as one block in front of the non-selected page
    /// that sat at `target`.
    ///
    /// Returns whether the order changed.
    pub fn drag(&mut self, from: usize, target: usize) -> bool {
        let positions = self.selected_positions();

        let (Some(&first), Some(&last)) = (positions.first(), positions.last()) else {
            if from >= self.order.len() {
                return false;
            }
            let mut order = self.order.clone();
            let page = order.remove(from);
            let target = target.min(order.len());
            order.insert(target, page);
            return self.replace_order(order);
        };

        if (first..=last).contains(&target) {
            return false;
        }

        let before = self
            .order
            .iter()
            .take(target)
            .filter(|&&index| !self.selection.contains(&index))
            .count();

        let (block, mut others) = self.split_selection();
        let at = before.min(others.len());
        others.splice(at..at, block);
        self.replace_order(others)
    }

    /// Apply a [`PageMove`], returning whether the order changed.
    pub fn apply(&mut self, page_move: PageMove) -> bool {
        match page_move {
            PageMove::Up => self.move_selection_up(),
            PageMove::Down => self.move_selection_down(),
            PageMove::ToTop => self.move_selection_to_top(),
            PageMove::ToBottom => self.move_selection_to_bottom(),
            PageMove::Drag { from, to } => self.drag(from, to),
        }
    }

    /// Replace the order with an explicit list of original indices.
    ///
    /// The list may leave pages out but must not repeat or invent any.
    /// Selected pages that are no longer present are deselected.
    ///
    /// # Errors
    ///
    /// Returns an error if the list is empty, repeats an index, or names an
    /// index outside the document.
    pub fn set_order(&mut self, order: Vec<PageIndex>) -> Result<(), OrderError> {
        validate_order(&order, self.page_count)?;
        self.selection.retain(|index| order.contains(index));
        self.order = order;
        Ok(())
    }

    /// Build a single-source page plan from the current order and rotations.
    pub fn to_plan(&self) -> PagePlan {
        self.order
            .iter()
            .map(|&index| PlannedPage::new(0, index).rotated(self.rotation_of(index)))
            .collect()
    }

    /// Display positions of selected pages, ascending.
    fn selected_positions(&self) -> Vec<usize> {
        self.order
            .iter()
            .enumerate()
            .filter(|(_, index)| self.selection.contains(*index))
            .map(|(position, _)| position)
            .collect()
    }

    /// Split the order into (selected, others), both in display order.
    fn split_selection(&self) -> (Vec<PageIndex>, Vec<PageIndex>) {
        self.order
            .iter()
            .copied()
            .partition(|index| self.selection.contains(index))
    }

    fn replace_order(&mut self, order: Vec<PageIndex>) -> bool {
        debug_assert_eq!(order.len(), self.order.len());
        if order == self.order {
            return false;
        }
        self.order = order;
        true
    }
}

/// Check that `order` is a non-empty list of distinct indices below `page_count`.
///
/// # Errors
///
/// Returns the first problem found.
pub fn validate_order(order: &[PageIndex], page_count: usize) -> Result<(), OrderError> {
    if order.is_empty() {
        return Err(OrderError::EmptyOrder);
    }

    let mut seen = BTreeSet::new();
    for &index in order {
        if index >= page_count {
            return Err(OrderError::PageOutOfRange { index, page_count });
        }
        if !seen.insert(index) {
            return Err(OrderError::DuplicatePage(index));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn model_with_selection(page_count: usize, selected: &[PageIndex]) -> PageOrderModel {
        let mut model = PageOrderModel::new(page_count);
        model.select_all_of(selected);
        model
    }

    fn assert_bijection(model: &PageOrderModel, page_count: usize) {
        let mut sorted = model.order().to_vec();
        sorted.sort_unstable();
        assert_eq!(sorted, (0..page_count).collect::<Vec<_>>());
    }

    #[test]
    fn test_load_defaults() {
        let model = PageOrderModel::new(3);
        assert_eq!(model.order(), &[0, 1, 2]);
        assert!(model.rotations().is_empty());
        assert_eq!(model.selection().iter().copied().collect::<Vec<_>>(), vec![0]);
    }

    #[test]
    fn test_load_empty_document() {
        let model = PageOrderModel::new(0);
        assert!(model.is_empty());
        assert!(model.selection().is_empty());
    }

    #[test]
    fn test_move_down_scattered_selection() {
        let mut model = model_with_selection(4, &[0, 2]);
        assert!(model.move_selection_down());
        assert_eq!(model.order(), &[1, 0, 3, 2]);
    }

    #[test]
    fn test_move_up_scattered_selection() {
        let mut model = model_with_selection(4, &[1, 3]);
        assert!(model.move_selection_up());
        assert_eq!(model.order(), &[1, 0, 3, 2]);
    }

    #[test]
    fn test_move_adjacent_block_keeps_internal_order() {
        let mut model = model_with_selection(5, &[1, 2]);
        assert!(model.move_selection_down());
        assert_eq!(model.order(), &[0, 3, 1, 2, 4]);
        assert!(model.move_selection_up());
        assert!(model.move_selection_up());
        assert_eq!(model.order(), &[1, 2, 0, 3, 4]);
    }

    #[test]
    fn test_move_is_noop_at_boundary() {
        let mut model = model_with_selection(4, &[0, 2]);
        assert!(!model.move_selection_up());
        assert_eq!(model.order(), &[0, 1, 2, 3]);

        let mut model = model_with_selection(4, &[1, 3]);
        assert!(!model.move_selection_down());
        assert_eq!(model.order(), &[0, 1, 2, 3]);
    }

    #[test]
    fn test_move_without_selection_is_noop() {
        let mut model = PageOrderModel::new(3);
        model.clear_selection();
        assert!(!model.move_selection_down());
        assert!(!model.move_selection_to_top());
        assert_eq!(model.order(), &[0, 1, 2]);
    }

    #[test]
    fn test_move_to_top_and_bottom_gather_block() {
        let mut model = model_with_selection(5, &[1, 3]);
        assert!(model.move_selection_to_top());
        assert_eq!(model.order(), &[1, 3, 0, 2, 4]);
        assert!(!model.move_selection_to_top());

        assert!(model.move_selection_to_bottom());
        assert_eq!(model.order(), &[0, 2, 4, 1, 3]);
        assert!(!model.move_selection_to_bottom());
    }

    #[test]
    fn test_drag_single_without_selection() {
        let mut model = PageOrderModel::new(4);
        model.clear_selection();
        assert!(model.drag(0, 2));
        assert_eq!(model.order(), &[1, 2, 0, 3]);
    }

    #[test]
    fn test_drag_single_clamps_target() {
        let mut model = PageOrderModel::new(4);
        model.clear_selection();
        assert!(model.drag(1, 99));
        assert_eq!(model.order(), &[0, 2, 3, 1]);
    }

    #[test]
    fn test_drag_inside_own_span_is_noop() {
        let mut model = model_with_selection(6, &[1, 3]);
        for target in 1..=3 {
            assert!(!model.drag(1, target));
        }
        assert_eq!(model.order(), &[0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_drag_block_forward() {
        // Block (1, 3) dropped at position 5 lands before page 5.
        let mut model = model_with_selection(6, &[1, 3]);
        assert!(model.drag(1, 5));
        assert_eq!(model.order(), &[0, 2, 4, 1, 3, 5]);
    }

    #[test]
    fn test_drag_block_backward() {
        let mut model = model_with_selection(6, &[3, 4]);
        assert!(model.drag(3, 0));
        assert_eq!(model.order(), &[3, 4, 0, 1, 2, 5]);
    }

    #[test]
    fn test_drag_block_past_end() {
        let mut model = model_with_selection(4, &[0, 1]);
        assert!(model.drag(0, 10));
        assert_eq!(model.order(), &[2, 3, 0, 1]);
    }

    #[rstest]
    #[case(PageMove::Up)]
    #[case(PageMove::Down)]
    #[case(PageMove::ToTop)]
    #[case(PageMove::ToBottom)]
    #[case(PageMove::Drag { from: 0, to: 7 })]
    #[case(PageMove::Drag { from: 4, to: 0 })]
    fn test_moves_are_bijections(#[case] page_move: PageMove) {
        let mut model = model_with_selection(8, &[2, 5, 6]);
        for _ in 0..3 {
            model.apply(page_move);
            assert_bijection(&model, 8);
        }
    }

    #[test]
    fn test_rotation_follows_original_index() {
        let mut model = model_with_selection(3, &[2]);
        model.rotate(90).unwrap();
        model.move_selection_to_top();
        assert_eq!(model.order(), &[2, 0, 1]);
        assert_eq!(model.rotation_of(2), Rotation::Clockwise90);
        assert_eq!(model.rotation_of(0), Rotation::None);
    }

    #[test]
    fn test_rotate_four_times_returns_to_zero() {
        let mut model = model_with_selection(2, &[0, 1]);
        for _ in 0..4 {
            model.rotate(90).unwrap();
        }
        assert!(model.rotations().is_empty());
    }

    #[test]
    fn test_rotate_counter_clockwise() {
        let mut model = PageOrderModel::new(2);
        model.rotate(-90).unwrap();
        assert_eq!(model.rotation_of(0), Rotation::Clockwise270);
    }

    #[test]
    fn test_rotate_without_selection_is_noop() {
        let mut model = PageOrderModel::new(2);
        model.clear_selection();
        model.rotate(90).unwrap();
        assert!(model.rotations().is_empty());
    }

    #[test]
    fn test_rotate_rejects_partial_turn() {
        let mut model = PageOrderModel::new(2);
        assert!(model.rotate(45).is_err());
    }

    #[test]
    fn test_press_semantics() {
        let mut model = PageOrderModel::new(4);
        model.press(2, false);
        assert_eq!(model.selection().len(), 1);
        assert!(model.selection().contains(&2));

        model.press(3, true);
        assert!(model.selection().contains(&3));

        // Plain press on a selected page keeps the block for dragging.
        model.press(2, false);
        assert_eq!(model.selection().len(), 2);

        model.press(3, true);
        assert!(!model.selection().contains(&3));
    }

    #[test]
    fn test_set_order_validates() {
        let mut model = PageOrderModel::new(3);
        assert_eq!(model.set_order(vec![]), Err(OrderError::EmptyOrder));
        assert_eq!(
            model.set_order(vec![0, 3]),
            Err(OrderError::PageOutOfRange {
                index: 3,
                page_count: 3
            })
        );
        assert_eq!(
            model.set_order(vec![1, 1]),
            Err(OrderError::DuplicatePage(1))
        );

        model.set_order(vec![2, 1]).unwrap();
        assert_eq!(model.order(), &[2, 1]);
        assert!(model.selection().is_empty());
    }

    #[test]
    fn test_to_plan_carries_rotations() {
        let mut model = model_with_selection(3, &[1]);
        model.rotate(180).unwrap();
        model.move_selection_to_bottom();

        let plan = model.to_plan();
        let pages: Vec<_> = plan.iter().map(|p| (p.index, p.rotation)).collect();
        assert_eq!(
            pages,
            vec![
                (0, Rotation::None),
                (2, Rotation::None),
                (1, Rotation::Rotate180)
            ]
        );
    }

    #[test]
    fn test_select_range_in_display_order() {
        let mut model = PageOrderModel::new(5);
        model.set_order(vec![4, 3, 2, 1, 0]).unwrap();
        model.select_range(3, 1);
        assert_eq!(
            model.selection().iter().copied().collect::<Vec<_>>(),
            vec![1, 2, 3]
        );

        model.select_range(3, 99);
        assert_eq!(
            model.selection().iter().copied().collect::<Vec<_>>(),
            vec![0, 1]
        );
    }
}
