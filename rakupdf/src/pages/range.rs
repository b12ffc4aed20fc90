//! Page range parsing.
//!
//! Users name pages with one-based, inclusive, comma-separated tokens such as
//! `"1,3,5-7"`. Internally every page is a zero-based [`PageIndex`].
//!
//! # Examples
//!
//! ```
//! use rakupdf::pages::parse_page_ranges;
//!
//! let set = parse_page_ranges("1,3,5-7", 10).unwrap();
//! assert_eq!(set.as_slice(), &[0, 2, 4, 5, 6]);
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::num::{IntErrorKind, ParseIntError};
use thiserror::Error;

use super::PageIndex;

/// Errors produced while parsing a page range string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RangeError {
    /// A token is not an integer or integer range.
    #[error("invalid page specification '{token}'")]
    Malformed {
        /// The offending token.
        token: String,
    },

    /// A page number lies outside `1..=page_count`.
    #[error("page {page} is out of range (document has {page_count} page(s))")]
    OutOfRange {
        /// The one-based page number as written, saturated to `i64`.
        page: i64,
        /// Total pages in the document.
        page_count: usize,
    },

    /// A range starts after it ends.
    #[error("range '{token}' starts after it ends")]
    InvalidOrder {
        /// The offending token.
        token: String,
    },
}

/// A sorted, deduplicated set of zero-based page indices.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PageIndexSet(Vec<PageIndex>);

impl PageIndexSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of pages in the set.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether the set contains `index`.
    pub fn contains(&self, index: PageIndex) -> bool {
        self.0.binary_search(&index).is_ok()
    }

    /// Indices in ascending order.
    pub fn as_slice(&self) -> &[PageIndex] {
        &self.0
    }

    /// Iterate indices in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = PageIndex> + '_ {
        self.0.iter().copied()
    }

    /// Every index in `0..page_count` that is not in this set.
    pub fn complement(&self, page_count: usize) -> PageIndexSet {
        (0..page_count).filter(|i| !self.contains(*i)).collect()
    }

    /// Consume the set, returning the sorted indices.
    pub fn into_vec(self) -> Vec<PageIndex> {
        self.0
    }
}

impl FromIterator<PageIndex> for PageIndexSet {
    fn from_iter<I: IntoIterator<Item = PageIndex>>(iter: I) -> Self {
        let set: BTreeSet<PageIndex> = iter.into_iter().collect();
        Self(set.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a PageIndexSet {
    type Item = &'a PageIndex;
    type IntoIter = std::slice::Iter<'a, PageIndex>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Parse a one-based page specification into zero-based indices.
///
/// Tokens are separated by `,`; surrounding whitespace and empty tokens are
/// ignored. A token is either a page number or a `start-end` range split on
/// its first `-`. An empty string yields an empty set, as does any input
/// for a document without pages.
///
/// # Errors
///
/// - [`RangeError::Malformed`] for tokens that are not integers
/// - [`RangeError::OutOfRange`] for numbers below 1 or above `page_count`
/// - [`RangeError::InvalidOrder`] for ranges whose start exceeds their end
///
/// # Examples
///
/// ```
/// use rakupdf::pages::{parse_page_ranges, RangeError};
///
/// assert!(parse_page_ranges("", 10).unwrap().is_empty());
/// assert!(matches!(
///     parse_page_ranges("5-3", 10),
///     Err(RangeError::InvalidOrder { .. })
/// ));
/// ```
pub fn parse_page_ranges(spec: &str, page_count: usize) -> Result<PageIndexSet, RangeError> {
    if page_count == 0 {
        return Ok(PageIndexSet::new());
    }

    let mut pages = BTreeSet::new();
    for token in tokens(spec) {
        let (start, end) = parse_token(token, page_count)?;
        pages.extend(start..=end);
    }

    Ok(PageIndexSet(pages.into_iter().collect()))
}

/// Parse a one-based page specification, keeping the order it was written in.
///
/// Used for explicit page orders such as `"3,1,2"` or `"4-6,1"`. Tokens follow
/// the same rules as [`parse_page_ranges`], but indices are neither sorted nor
/// deduplicated; callers validate duplicates themselves.
///
/// # Errors
///
/// Same as [`parse_page_ranges`].
pub fn parse_page_sequence(spec: &str, page_count: usize) -> Result<Vec<PageIndex>, RangeError> {
    let mut pages = Vec::new();
    for token in tokens(spec) {
        let (start, end) = parse_token(token, page_count)?;
        pages.extend(start..=end);
    }
    Ok(pages)
}

/// Render indices back into compact one-based notation (`"1-3,5"`).
pub fn format_page_ranges(pages: &PageIndexSet) -> String {
    let mut parts = Vec::new();
    let mut iter = pages.iter().peekable();

    while let Some(start) = iter.next() {
        let mut end = start;
        while iter.peek() == Some(&(end + 1)) {
            end += 1;
            iter.next();
        }

        if start == end {
            parts.push(format!("{}", start + 1));
        } else {
            parts.push(format!("{}-{}", start + 1, end + 1));
        }
    }

    parts.join(",")
}

fn tokens(spec: &str) -> impl Iterator<Item = &str> {
    spec.split(',').map(str::trim).filter(|token| !token.is_empty())
}

/// Parse one token into an inclusive zero-based range.
fn parse_token(token: &str, page_count: usize) -> Result<(PageIndex, PageIndex), RangeError> {
    match token.split_once('-') {
        Some((start, end)) => {
            let start = parse_number(start, token, page_count)?;
            let end = parse_number(end, token, page_count)?;

            if start < 1 {
                return Err(out_of_range(start, page_count));
            }
            if end < 1 {
                return Err(out_of_range(end, page_count));
            }
            if start > end {
                return Err(RangeError::InvalidOrder {
                    token: token.to_string(),
                });
            }
            let last = to_index(end, page_count)?;
            Ok((to_index(start, page_count)?, last))
        }
        None => {
            let page = parse_number(token, token, page_count)?;
            let index = to_index(page, page_count)?;
            Ok((index, index))
        }
    }
}

/// Integers too large for `i64` are still integers, so they are out of range
/// rather than malformed.
fn parse_number(text: &str, token: &str, page_count: usize) -> Result<i64, RangeError> {
    text.trim().parse().map_err(|err: ParseIntError| match err.kind() {
        IntErrorKind::PosOverflow => out_of_range(i64::MAX, page_count),
        IntErrorKind::NegOverflow => out_of_range(i64::MIN, page_count),
        _ => RangeError::Malformed {
            token: token.to_string(),
        },
    })
}

fn to_index(page: i64, page_count: usize) -> Result<PageIndex, RangeError> {
    match usize::try_from(page) {
        Ok(page) if (1..=page_count).contains(&page) => Ok(page - 1),
        _ => Err(out_of_range(page, page_count)),
    }
}

fn out_of_range(page: i64, page_count: usize) -> RangeError {
    RangeError::OutOfRange { page, page_count }
}
