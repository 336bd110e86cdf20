//! Request parameters for the paginated list endpoint.

use super::DateRange;
use super::SortOrder;

/// The tuple that fully determines which page is fetched.
///
/// Compared by value: two requests with equal params are the same request.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryParams {
    /// 1-based page number.
    pub page: u32,
    /// Rows per page.
    pub page_size: u32,
    /// Free-text search.
    pub search: String,
    /// Creation date range.
    pub date_range: DateRange,
    /// Sort field.
    pub sort_by: String,
    /// Sort direction.
    pub sort_order: SortOrder,
}

impl QueryParams {
    /// Query string pairs for the list endpoint.
    ///
    /// An empty search and open date ends are left out.
    pub fn to_query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("page", self.page.to_string()),
            ("page_size", self.page_size.to_string()),
        ];
        if !self.search.is_empty() {
            pairs.push(("search", self.search.clone()));
        }
        if let Some(from) = self.date_range.from {
            pairs.push(("from_date", from.format("%Y-%m-%d").to_string()));
        }
        if let Some(to) = self.date_range.to {
            pairs.push(("to_date", to.format("%Y-%m-%d").to_string()));
        }
        if !self.sort_by.is_empty() {
            pairs.push(("sort_by", self.sort_by.clone()));
            pairs.push(("sort_order", self.sort_order.as_str().to_string()));
        }
        pairs
    }
}
