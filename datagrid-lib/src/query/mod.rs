//! Query state and the paginated wire shapes.
//!
//! - [`QueryState`] - everything that determines which page is fetched,
//!   plus the view-only column filters and visibility
//! - [`QueryParams`] - the subset sent to the data source, compared by value
//! - [`FetchedPage`] - one page of entities with pagination totals

mod page;
mod params;
mod state;

pub use page::FetchedPage;
pub use page::Pagination;
pub use params::QueryParams;
pub use state::ColumnFilter;
pub use state::DateRange;
pub use state::QueryState;
pub use state::SortOrder;
pub use state::SortingEntry;
pub use state::is_page_size_allowed;
pub use state::DEFAULT_PAGE_SIZE;
pub use state::DEFAULT_SORT_BY;
