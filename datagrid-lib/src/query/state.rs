//! Query state: page, sort, search and filters.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Deserialize;
use serde::Deserializer;
use serde::Serialize;
use serde::Serializer;

use crate::url_state::StateStore;

use super::QueryParams;

/// Page size used until the user picks another one.
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Field the data is sorted by when no explicit sort is set.
pub const DEFAULT_SORT_BY: &str = "created_at";

const KEY_PAGE: &str = "page";
const KEY_PAGE_SIZE: &str = "pageSize";
const KEY_SEARCH: &str = "search";
const KEY_DATE_RANGE: &str = "dateRange";
const KEY_SORT_BY: &str = "sortBy";
const KEY_SORT_ORDER: &str = "sortOrder";
const KEY_COLUMN_VISIBILITY: &str = "columnVisibility";
const KEY_COLUMN_FILTERS: &str = "columnFilters";

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    /// Ascending order (A-Z, 0-9).
    Asc,
    /// Descending order (Z-A, 9-0).
    #[default]
    Desc,
}

impl SortOrder {
    /// Wire representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }

    /// Parses `asc` or `desc`.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "asc" => Some(Self::Asc),
            "desc" => Some(Self::Desc),
            _ => None,
        }
    }
}

impl std::fmt::Display for SortOrder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Inclusive creation-date range. Either end may be open.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct DateRange {
    /// First day included.
    #[serde(
        rename = "from_date",
        default,
        serialize_with = "serialize_date",
        deserialize_with = "deserialize_date"
    )]
    pub from: Option<NaiveDate>,
    /// Last day included.
    #[serde(
        rename = "to_date",
        default,
        serialize_with = "serialize_date",
        deserialize_with = "deserialize_date"
    )]
    pub to: Option<NaiveDate>,
}

impl DateRange {
    /// Creates a range.
    pub fn new(from: Option<NaiveDate>, to: Option<NaiveDate>) -> Self {
        Self { from, to }
    }

    /// Returns `true` when neither end is set.
    pub fn is_empty(&self) -> bool {
        self.from.is_none() && self.to.is_none()
    }
}

// Open ends travel as empty strings.
fn serialize_date<S: Serializer>(date: &Option<NaiveDate>, serializer: S) -> Result<S::Ok, S::Error> {
    match date {
        Some(date) => serializer.serialize_str(&date.format("%Y-%m-%d").to_string()),
        None => serializer.serialize_str(""),
    }
}

fn deserialize_date<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<NaiveDate>, D::Error> {
    let raw = Option::<String>::deserialize(deserializer)?;
    match raw.as_deref() {
        None | Some("") => Ok(None),
        Some(raw) => NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}

/// One column filter. The value is opaque to the grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnFilter {
    /// Column id.
    pub id: String,
    /// Filter value as provided by the filter control.
    pub value: serde_json::Value,
}

impl ColumnFilter {
    /// Creates a filter.
    pub fn new(id: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        Self {
            id: id.into(),
            value: value.into(),
        }
    }
}

/// A sort request as reported by the table engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortingEntry {
    /// Column id.
    pub id: String,
    /// Descending when `true`.
    pub desc: bool,
}

impl SortingEntry {
    /// Creates an ascending entry.
    pub fn asc(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            desc: false,
        }
    }

    /// Creates a descending entry.
    pub fn desc(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            desc: true,
        }
    }
}

/// A page size is usable when it is positive and, if options are configured,
/// one of them.
pub fn is_page_size_allowed(page_size: u32, options: &[u32]) -> bool {
    page_size > 0 && (options.is_empty() || options.contains(&page_size))
}

/// Every user-controlled parameter of the grid.
///
/// Initialized from the state store at mount, mutated by user interaction and
/// written back to the store after every change.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryState {
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
    /// Per-column filters, in the order they were added.
    pub column_filters: Vec<ColumnFilter>,
    /// Column id to visibility. Absent means visible.
    pub column_visibility: BTreeMap<String, bool>,
}

impl Default for QueryState {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
            search: String::new(),
            date_range: DateRange::default(),
            sort_by: DEFAULT_SORT_BY.to_string(),
            sort_order: SortOrder::Desc,
            column_filters: Vec::new(),
            column_visibility: BTreeMap::new(),
        }
    }
}

impl QueryState {
    /// Reads every key from the store. Missing, malformed or non-positive
    /// values fall back to the defaults, as does a page size that is not one
    /// of `page_size_options`.
    pub fn load(store: &StateStore, page_size_options: &[u32]) -> Self {
        let defaults = Self::default();
        let page = store.get(KEY_PAGE, defaults.page);
        let page_size = store.get(KEY_PAGE_SIZE, defaults.page_size);
        Self {
            page: if page > 0 { page } else { defaults.page },
            page_size: if is_page_size_allowed(page_size, page_size_options) {
                page_size
            } else {
                log::debug!("ignoring page size {} outside {:?}", page_size, page_size_options);
                defaults.page_size
            },
            search: store.get(KEY_SEARCH, defaults.search.clone()),
            date_range: store.get(KEY_DATE_RANGE, defaults.date_range.clone()),
            sort_by: store.get(KEY_SORT_BY, defaults.sort_by.clone()),
            sort_order: store.get(KEY_SORT_ORDER, defaults.sort_order),
            column_filters: store.get(KEY_COLUMN_FILTERS, defaults.column_filters.clone()),
            column_visibility: store.get(KEY_COLUMN_VISIBILITY, defaults.column_visibility.clone()),
        }
    }

    /// Writes every key to the store. Values equal to their default are
    /// removed instead.
    pub fn save(&self, store: &mut StateStore) {
        let defaults = Self::default();
        store.set(KEY_PAGE, &self.page, &defaults.page);
        store.set(KEY_PAGE_SIZE, &self.page_size, &defaults.page_size);
        store.set(KEY_SEARCH, &self.search, &defaults.search);
        store.set(KEY_DATE_RANGE, &self.date_range, &defaults.date_range);
        store.set(KEY_SORT_BY, &self.sort_by, &defaults.sort_by);
        store.set(KEY_SORT_ORDER, &self.sort_order, &defaults.sort_order);
        store.set(KEY_COLUMN_FILTERS, &self.column_filters, &defaults.column_filters);
        store.set(KEY_COLUMN_VISIBILITY, &self.column_visibility, &defaults.column_visibility);
    }

    /// The fetch parameters derived from this state.
    pub fn params(&self) -> QueryParams {
        QueryParams {
            page: self.page,
            page_size: self.page_size,
            search: self.search.clone(),
            date_range: self.date_range.clone(),
            sort_by: self.sort_by.clone(),
            sort_order: self.sort_order,
        }
    }

    /// Current sort in the engine's list form.
    pub fn sorting(&self) -> Vec<SortingEntry> {
        if self.sort_by.is_empty() {
            return Vec::new();
        }
        vec![SortingEntry {
            id: self.sort_by.clone(),
            desc: self.sort_order == SortOrder::Desc,
        }]
    }

    /// Applies a sort reported by the engine. Only the first entry is
    /// honored; an empty list restores the default sort.
    pub fn apply_sorting(&mut self, sorting: &[SortingEntry]) {
        match sorting.first() {
            Some(entry) => {
                self.sort_by = entry.id.clone();
                self.sort_order = if entry.desc { SortOrder::Desc } else { SortOrder::Asc };
            }
            None => {
                self.sort_by = DEFAULT_SORT_BY.to_string();
                self.sort_order = SortOrder::Desc;
            }
        }
    }

    /// Returns `false` only for columns explicitly hidden.
    pub fn is_column_visible(&self, column_id: &str) -> bool {
        self.column_visibility.get(column_id).copied().unwrap_or(true)
    }
}
