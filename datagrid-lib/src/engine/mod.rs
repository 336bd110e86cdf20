//! Table engine adapter.
//!
//! Composes column definitions, the loaded page and every state slice into a
//! read-only [`RowModel`]. Sorting, filtering and pagination are manual: the
//! engine never reorders, filters or slices the rows it is given. User
//! intents are turned into [`TableChange`] values that the owner applies to
//! its own state (and, for data-affecting changes, re-queries with).

mod column;
mod resize;

pub use column::*;
pub use resize::*;

use std::collections::BTreeMap;

use crate::config::TableConfig;
use crate::model::Entity;
use crate::query::ColumnFilter;
use crate::query::SortOrder;
use crate::query::SortingEntry;
use crate::selection::RowSelectionMask;
use crate::sizing::ColumnSizing;

/// Page position as the engine sees it (0-based index).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationState {
    /// 0-based page index.
    pub page_index: u32,
    /// Rows per page.
    pub page_size: u32,
}

impl PaginationState {
    /// Creates the state for a 1-based page number.
    pub fn from_page(page: u32, page_size: u32) -> Self {
        Self {
            page_index: page.saturating_sub(1),
            page_size,
        }
    }

    /// 1-based page number.
    pub fn page(&self) -> u32 {
        self.page_index + 1
    }
}

/// A state change requested through the engine.
#[derive(Debug, Clone, PartialEq)]
pub enum TableChange {
    /// New sort list. Empty means "no explicit sort".
    Sorting(Vec<SortingEntry>),
    /// New page position.
    Pagination(PaginationState),
    /// New column filters.
    ColumnFilters(Vec<ColumnFilter>),
    /// New visibility map.
    ColumnVisibility(BTreeMap<String, bool>),
    /// New page selection mask.
    RowSelection(RowSelectionMask),
    /// New column widths.
    ColumnSizing(ColumnSizing),
}

/// Feature switches the engine honors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineOptions {
    /// Rows can be selected.
    pub enable_row_selection: bool,
    /// Columns can be resized.
    pub enable_column_resizing: bool,
}

impl From<&TableConfig> for EngineOptions {
    fn from(config: &TableConfig) -> Self {
        Self {
            enable_row_selection: config.enable_row_selection,
            enable_column_resizing: config.enable_column_resizing,
        }
    }
}

/// Everything the row model is computed from.
#[derive(Debug, Clone, Copy)]
pub struct TableInputs<'a, E> {
    /// Rows of the loaded page, in server order.
    pub rows: &'a [E],
    /// Current sort.
    pub sorting: &'a [SortingEntry],
    /// Current column filters.
    pub column_filters: &'a [ColumnFilter],
    /// Current visibility map.
    pub column_visibility: &'a BTreeMap<String, bool>,
    /// Current page selection mask.
    pub row_selection: &'a RowSelectionMask,
    /// Current page position.
    pub pagination: PaginationState,
    /// Current column widths.
    pub column_sizing: &'a ColumnSizing,
    /// Page count reported by the server.
    pub page_count: u32,
    /// Active resize drag.
    pub resizing: Option<&'a ResizeSession>,
}

/// One header cell.
#[derive(Debug, Clone, PartialEq)]
pub struct Header {
    /// Column id.
    pub column_id: String,
    /// Header text.
    pub label: String,
    /// Column kind.
    pub kind: ColumnKind,
    /// Rendered width in pixels.
    pub width: u32,
    /// Current sort direction on this column.
    pub sort: Option<SortOrder>,
    /// Header toggles sorting.
    pub can_sort: bool,
    /// Header shows a resize handle.
    pub can_resize: bool,
    /// This column is being resized right now.
    pub is_resizing: bool,
    /// Active filter value on this column.
    pub filter: Option<serde_json::Value>,
}

/// A row of headers. Flat tables have exactly one.
#[derive(Debug, Clone, PartialEq)]
pub struct HeaderGroup {
    /// Group id.
    pub id: String,
    /// Headers of visible columns.
    pub headers: Vec<Header>,
}

/// Content of one body cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CellContent {
    /// Plain text.
    Text(String),
    /// Selection checkbox state.
    Checkbox(bool),
}

/// One body cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    /// Column id.
    pub column_id: String,
    /// Cell content.
    pub content: CellContent,
}

/// One body row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    /// Position on the page.
    pub index: usize,
    /// Entity id as text.
    pub id: String,
    /// Row is selected.
    pub selected: bool,
    /// Cells of visible columns.
    pub cells: Vec<Cell>,
}

/// Render-ready output of the engine.
#[derive(Debug, Clone, PartialEq)]
pub struct RowModel {
    /// Header rows.
    pub header_groups: Vec<HeaderGroup>,
    /// Body rows.
    pub rows: Vec<Row>,
    /// Page position.
    pub pagination: PaginationState,
    /// Page count reported by the server.
    pub page_count: u32,
    /// A previous page exists.
    pub can_previous_page: bool,
    /// A next page exists.
    pub can_next_page: bool,
    /// Every row on the page is selected.
    pub all_rows_selected: bool,
    /// Some but not all rows on the page are selected.
    pub some_rows_selected: bool,
}

/// Column model plus the options that gate its interactions.
#[derive(Debug, Clone)]
pub struct TableEngine {
    columns: Vec<ColumnDef>,
    options: EngineOptions,
}

impl TableEngine {
    /// Creates an engine. Selection columns are dropped when row selection is
    /// disabled.
    pub fn new(columns: Vec<ColumnDef>, options: EngineOptions) -> Self {
        let columns = columns
            .into_iter()
            .filter(|column| options.enable_row_selection || column.kind != ColumnKind::Select)
            .collect();
        Self { columns, options }
    }

    /// All columns, visible or not.
    pub fn columns(&self) -> &[ColumnDef] {
        &self.columns
    }

    /// Looks up a column.
    pub fn column(&self, column_id: &str) -> Option<&ColumnDef> {
        self.columns.iter().find(|column| column.id == column_id)
    }

    /// Engine options.
    pub fn options(&self) -> EngineOptions {
        self.options
    }

    fn is_visible(&self, column: &ColumnDef, visibility: &BTreeMap<String, bool>) -> bool {
        !column.enable_hiding || visibility.get(&column.id).copied().unwrap_or(true)
    }

    fn can_resize(&self, column: &ColumnDef) -> bool {
        self.options.enable_column_resizing && column.enable_resizing
    }

    /// Columns currently shown.
    pub fn visible_columns(&self, visibility: &BTreeMap<String, bool>) -> Vec<&ColumnDef> {
        self.columns
            .iter()
            .filter(|column| self.is_visible(column, visibility))
            .collect()
    }

    /// Computes the row model.
    pub fn row_model<E: Entity>(&self, inputs: &TableInputs<'_, E>) -> RowModel {
        let visible = self.visible_columns(inputs.column_visibility);

        let headers = visible
            .iter()
            .map(|column| Header {
                column_id: column.id.clone(),
                label: column.header.clone(),
                kind: column.kind,
                width: column.width(inputs.column_sizing),
                sort: inputs
                    .sorting
                    .iter()
                    .find(|entry| entry.id == column.id)
                    .map(|entry| if entry.desc { SortOrder::Desc } else { SortOrder::Asc }),
                can_sort: column.enable_sorting,
                can_resize: self.can_resize(column),
                is_resizing: inputs
                    .resizing
                    .is_some_and(|session| session.column_id == column.id),
                filter: inputs
                    .column_filters
                    .iter()
                    .find(|filter| filter.id == column.id)
                    .map(|filter| filter.value.clone()),
            })
            .collect();

        let rows: Vec<Row> = inputs
            .rows
            .iter()
            .enumerate()
            .map(|(index, entity)| {
                let selected = self.options.enable_row_selection
                    && inputs.row_selection.get(&index).copied().unwrap_or(false);
                let cells = visible
                    .iter()
                    .map(|column| Cell {
                        column_id: column.id.clone(),
                        content: match column.kind {
                            ColumnKind::Data => CellContent::Text(entity.cell(&column.id)),
                            ColumnKind::Select => CellContent::Checkbox(selected),
                        },
                    })
                    .collect();
                Row {
                    index,
                    id: entity.id().to_string(),
                    selected,
                    cells,
                }
            })
            .collect();

        let selected_rows = rows.iter().filter(|row| row.selected).count();

        RowModel {
            header_groups: vec![HeaderGroup {
                id: "0".to_string(),
                headers,
            }],
            pagination: inputs.pagination,
            page_count: inputs.page_count,
            can_previous_page: inputs.pagination.page_index > 0,
            can_next_page: inputs.pagination.page_index + 1 < inputs.page_count,
            all_rows_selected: !rows.is_empty() && selected_rows == rows.len(),
            some_rows_selected: selected_rows > 0 && selected_rows < rows.len(),
            rows,
        }
    }

    // -------------------------------------------------------------------------
    // Sorting
    // -------------------------------------------------------------------------

    /// Cycles a column through ascending, descending and unsorted.
    ///
    /// Returns `None` for unknown or unsortable columns.
    pub fn toggle_sorting(&self, current: &[SortingEntry], column_id: &str) -> Option<TableChange> {
        let column = self.column(column_id)?;
        if !column.enable_sorting {
            return None;
        }
        let next = match current.iter().find(|entry| entry.id == column_id) {
            None => vec![SortingEntry::asc(column_id)],
            Some(entry) if !entry.desc => vec![SortingEntry::desc(column_id)],
            Some(_) => Vec::new(),
        };
        Some(TableChange::Sorting(next))
    }

    // -------------------------------------------------------------------------
    // Pagination
    // -------------------------------------------------------------------------

    /// Moves to a page index, clamped to the known page count.
    pub fn set_page_index(&self, current: PaginationState, page_count: u32, page_index: u32) -> TableChange {
        let max_index = page_count.saturating_sub(1);
        TableChange::Pagination(PaginationState {
            page_index: page_index.min(max_index),
            page_size: current.page_size,
        })
    }

    /// Changes the page size, keeping the current top row on screen.
    ///
    /// With a known `total_rows` the new index is clamped to the last page.
    /// Indices past `u32` saturate.
    pub fn set_page_size(&self, current: PaginationState, page_size: u32, total_rows: Option<u64>) -> TableChange {
        let page_size = page_size.max(1);
        let top_row = u64::from(current.page_index) * u64::from(current.page_size);
        let mut page_index = top_row / u64::from(page_size);
        if let Some(total_rows) = total_rows {
            page_index = page_index.min(total_rows.div_ceil(u64::from(page_size)).saturating_sub(1));
        }
        TableChange::Pagination(PaginationState {
            page_index: u32::try_from(page_index).unwrap_or(u32::MAX - 1),
            page_size,
        })
    }

    /// Next page, if there is one.
    pub fn next_page(&self, current: PaginationState, page_count: u32) -> Option<TableChange> {
        (current.page_index + 1 < page_count)
            .then(|| self.set_page_index(current, page_count, current.page_index + 1))
    }

    /// Previous page, if there is one.
    pub fn previous_page(&self, current: PaginationState, page_count: u32) -> Option<TableChange> {
        (current.page_index > 0).then(|| self.set_page_index(current, page_count, current.page_index - 1))
    }

    /// First page, unless already there.
    pub fn first_page(&self, current: PaginationState, page_count: u32) -> Option<TableChange> {
        self.previous_page(current, page_count)
            .map(|_| self.set_page_index(current, page_count, 0))
    }

    /// Last page, unless already there.
    pub fn last_page(&self, current: PaginationState, page_count: u32) -> Option<TableChange> {
        self.next_page(current, page_count)
            .map(|_| self.set_page_index(current, page_count, page_count.saturating_sub(1)))
    }

    // -------------------------------------------------------------------------
    // Columns
    // -------------------------------------------------------------------------

    /// Shows or hides a column. Returns `None` for columns that cannot be
    /// hidden.
    pub fn set_column_visibility(
        &self,
        current: &BTreeMap<String, bool>,
        column_id: &str,
        visible: bool,
    ) -> Option<TableChange> {
        let column = self.column(column_id)?;
        if !column.enable_hiding {
            return None;
        }
        let mut next = current.clone();
        next.insert(column_id.to_string(), visible);
        Some(TableChange::ColumnVisibility(next))
    }

    /// Sets or clears (`None`) the filter of a column. Existing filters keep
    /// their position.
    pub fn set_column_filter(
        &self,
        current: &[ColumnFilter],
        column_id: &str,
        value: Option<serde_json::Value>,
    ) -> Option<TableChange> {
        self.column(column_id)?;
        let mut next: Vec<ColumnFilter> = Vec::with_capacity(current.len() + 1);
        let mut replaced = false;
        for filter in current {
            if filter.id == column_id {
                replaced = true;
                if let Some(value) = &value {
                    next.push(ColumnFilter::new(column_id, value.clone()));
                }
            } else {
                next.push(filter.clone());
            }
        }
        if !replaced
            && let Some(value) = value
        {
            next.push(ColumnFilter::new(column_id, value));
        }
        Some(TableChange::ColumnFilters(next))
    }

    // -------------------------------------------------------------------------
    // Selection
    // -------------------------------------------------------------------------

    /// Toggles one row of the page.
    pub fn toggle_row_selected(
        &self,
        current: &RowSelectionMask,
        row_index: usize,
        row_count: usize,
    ) -> Option<TableChange> {
        if !self.options.enable_row_selection || row_index >= row_count {
            return None;
        }
        let mut next = current.clone();
        if next.remove(&row_index).is_none() {
            next.insert(row_index, true);
        }
        Some(TableChange::RowSelection(next))
    }

    /// Selects every row of the page, or clears the page when all are
    /// already selected.
    pub fn toggle_all_page_rows_selected(
        &self,
        current: &RowSelectionMask,
        row_count: usize,
    ) -> Option<TableChange> {
        if !self.options.enable_row_selection || row_count == 0 {
            return None;
        }
        let all_selected = (0..row_count).all(|index| current.get(&index).copied().unwrap_or(false));
        let next = if all_selected {
            RowSelectionMask::new()
        } else {
            (0..row_count).map(|index| (index, true)).collect()
        };
        Some(TableChange::RowSelection(next))
    }

    // -------------------------------------------------------------------------
    // Resizing
    // -------------------------------------------------------------------------

    /// Starts resizing a column at pointer position `x`.
    pub fn begin_resize(&self, column_id: &str, x: i32, sizing: &ColumnSizing) -> Option<ResizeSession> {
        let column = self.column(column_id)?;
        if !self.can_resize(column) {
            return None;
        }
        Some(ResizeSession::new(column_id, x, column.width(sizing)))
    }

    /// Width change for a pointer move. Emitted on every move, not only on
    /// release. Returns `None` when the width does not change.
    pub fn resize_to(&self, session: &ResizeSession, x: i32, sizing: &ColumnSizing) -> Option<TableChange> {
        let column = self.column(&session.column_id)?;
        let width = column.clamp_width(session.width_at(x));
        if width == column.width(sizing) && sizing.contains_key(&column.id) {
            return None;
        }
        let mut next = sizing.clone();
        next.insert(column.id.clone(), width);
        Some(TableChange::ColumnSizing(next))
    }
}
