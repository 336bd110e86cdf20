//! Page type for paginated list responses.

use serde::Deserialize;
use serde::Serialize;

/// Totals reported alongside a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Pagination {
    /// Number of pages for the current query.
    pub total_pages: u32,
    /// Number of entities matching the current query.
    pub total_items: u64,
}

/// One page of entities as returned by the list endpoint:
/// `{"data": [...], "pagination": {"total_pages": n, "total_items": n}}`.
///
/// Both keys are required; a body missing either is not a page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchedPage<E> {
    /// Entities in server order.
    pub data: Vec<E>,
    /// Totals for the whole result set.
    pub pagination: Pagination,
}

impl<E> FetchedPage<E> {
    /// Creates a page.
    pub fn new(data: Vec<E>, pagination: Pagination) -> Self {
        Self { data, pagination }
    }

    /// Creates a page with no entities.
    pub fn empty() -> Self {
        Self {
            data: Vec::new(),
            pagination: Pagination::default(),
        }
    }

    /// Returns `true` if this page has no entities.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns the number of entities in this page.
    pub fn len(&self) -> usize {
        self.data.len()
    }
}
