//! Page-level models: ranges, ordering, rotation and output plans.
//!
//! Nothing in this module touches a PDF; it decides *which* pages go *where*
//! and leaves the object-level work to [`crate::document`].

pub mod order;
pub mod range;
pub mod rotation;

pub use order::{OrderError, PageMove, PageOrderModel, validate_order};
pub use range::{
    PageIndexSet, RangeError, format_page_ranges, parse_page_ranges, parse_page_sequence,
};
pub use rotation::{Rotation, RotationError};

use serde::{Deserialize, Serialize};

/// Zero-based page index within its source document.
pub type PageIndex = usize;

/// One page of an output document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlannedPage {
    /// Position of the source in the list handed to the backend.
    pub document: usize,
    /// Page index within that source.
    pub index: PageIndex,
    /// Rotation added on top of the page's own rotation.
    pub rotation: Rotation,
}

impl PlannedPage {
    /// Plan page `index` of source `document` without rotation.
    pub fn new(document: usize, index: PageIndex) -> Self {
        Self {
            document,
            index,
            rotation: Rotation::None,
        }
    }

    /// Set the rotation delta.
    pub fn rotated(mut self, rotation: Rotation) -> Self {
        self.rotation = rotation;
        self
    }
}

/// Ordered list of pages that make up an output document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PagePlan(Vec<PlannedPage>);

impl PagePlan {
    /// Every page of source `document`, in order.
    pub fn whole(document: usize, page_count: usize) -> Self {
        (0..page_count)
            .map(|index| PlannedPage::new(document, index))
            .collect()
    }

    /// Selected pages of source `document`, in the order given.
    pub fn pages_of(document: usize, indices: impl IntoIterator<Item = PageIndex>) -> Self {
        indices
            .into_iter()
            .map(|index| PlannedPage::new(document, index))
            .collect()
    }

    /// Append every page of another plan.
    pub fn extend(&mut self, other: PagePlan) {
        self.0.extend(other.0);
    }

    /// Number of planned pages.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the plan has no pages.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate the planned pages in output order.
    pub fn iter(&self) -> std::slice::Iter<'_, PlannedPage> {
        self.0.iter()
    }
}

impl FromIterator<PlannedPage> for PagePlan {
    fn from_iter<I: IntoIterator<Item = PlannedPage>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a PagePlan {
    type Item = &'a PlannedPage;
    type IntoIter = std::slice::Iter<'a, PlannedPage>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
