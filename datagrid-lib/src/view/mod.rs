//! Presentation model.
//!
//! [`build_view`] turns the row model and the surrounding grid state into a
//! [`GridView`]: an error panel, or a table with optional toolbar and
//! pagination. Front ends only draw what is in the view; the
//! [`render_text`] function is the terminal front end's drawing.

mod text;

pub use text::*;

use crate::config::TableConfig;
use crate::engine::Cell;
use crate::engine::ColumnDef;
use crate::engine::Header;
use crate::engine::RowModel;
use crate::query::DateRange;

/// Text of the empty-state row.
pub const EMPTY_MESSAGE: &str = "No results.";

/// Everything a front end draws.
#[derive(Debug, Clone, PartialEq)]
pub enum GridView {
    /// The last fetch failed. No stale rows are shown.
    Error(ErrorView),
    /// The table.
    Table(TableView),
}

/// Error panel shown instead of the table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorView {
    /// "Failed to load {entity}: {message}".
    pub message: String,
    /// A retry action is offered.
    pub retryable: bool,
}

/// The table and its controls.
#[derive(Debug, Clone, PartialEq)]
pub struct TableView {
    /// Search, filters and bulk actions. `None` when the toolbar is disabled.
    pub toolbar: Option<ToolbarView>,
    /// Headers of visible columns.
    pub headers: Vec<Header>,
    /// Body contents.
    pub body: BodyView,
    /// Every row on the page is selected.
    pub all_rows_selected: bool,
    /// Some but not all rows on the page are selected.
    pub some_rows_selected: bool,
    /// Page controls. `None` when pagination is disabled.
    pub pagination: Option<PaginationView>,
    /// A column resize is in progress.
    pub resizing: bool,
    /// Index of the focused row.
    pub focused_row: Option<usize>,
    /// Changes whenever column layout must be measured again.
    pub layout_epoch: u64,
}

/// Table body state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BodyView {
    /// Placeholder grid while a request is in flight.
    Skeleton {
        /// One per row of the configured page size.
        rows: usize,
        /// One per visible column.
        columns: usize,
    },
    /// Loaded rows.
    Rows(Vec<RowView>),
    /// Loaded page without rows: a single cell spanning every column.
    Empty {
        /// Number of columns the cell spans.
        colspan: usize,
    },
}

/// One rendered body row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowView {
    /// Position on the page.
    pub index: usize,
    /// Element id, `row-{index}`.
    pub dom_id: String,
    /// Entity id as text.
    pub id: String,
    /// Row is selected.
    pub selected: bool,
    /// Row has focus. At most one row is focused.
    pub focused: bool,
    /// Cells of visible columns.
    pub cells: Vec<Cell>,
}

/// Entry of the column visibility menu.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnToggle {
    /// Column id.
    pub id: String,
    /// Header text.
    pub label: String,
    /// Column is shown.
    pub visible: bool,
}

/// Toolbar contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolbarView {
    /// Current search text.
    pub search: String,
    /// Date range filter. `None` when the date filter is disabled.
    pub date_range: Option<DateRange>,
    /// Selected entities across all pages.
    pub selected_count: usize,
    /// Bulk actions are shown (something is selected).
    pub show_bulk_actions: bool,
    /// Column visibility menu. Empty when the menu is disabled.
    pub columns: Vec<ColumnToggle>,
    /// Export action is offered.
    pub can_export: bool,
    /// Column width reset is offered.
    pub can_reset_sizing: bool,
}

/// Pagination contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaginationView {
    /// "{selected} of {total} row(s) selected."
    pub selection_summary: String,
    /// Rows per page.
    pub page_size: u32,
    /// Choices for the rows-per-page control.
    pub page_size_options: Vec<u32>,
    /// "Page {n} of {count}".
    pub page_label: String,
    /// First page button enabled.
    pub can_first: bool,
    /// Previous page button enabled.
    pub can_previous: bool,
    /// Next page button enabled.
    pub can_next: bool,
    /// Last page button enabled.
    pub can_last: bool,
}

/// Inputs of [`build_view`].
#[derive(Debug, Clone)]
pub struct ViewContext<'a> {
    /// Feature toggles.
    pub config: &'a TableConfig,
    /// Column definitions, for the visibility menu.
    pub columns: &'a [ColumnDef],
    /// Output of the table engine.
    pub model: RowModel,
    /// A request is in flight.
    pub is_loading: bool,
    /// Message of the last failed fetch.
    pub error: Option<&'a str>,
    /// Current search text.
    pub search: &'a str,
    /// Current date range.
    pub date_range: &'a DateRange,
    /// Total items reported by the server.
    pub total_items: u64,
    /// Selected entities across all pages.
    pub selected_count: usize,
    /// Focused row.
    pub focused_row: Option<usize>,
    /// A resize drag is active.
    pub resizing: bool,
    /// Layout measurement counter.
    pub layout_epoch: u64,
}

/// Builds the view for the current state.
///
/// A failed fetch shows the error panel unless a new request is in flight;
/// loading shows skeleton rows; a loaded page with no rows shows the empty
/// state.
pub fn build_view(ctx: ViewContext<'_>) -> GridView {
    if let Some(message) = ctx.error {
        if !ctx.is_loading {
            return GridView::Error(ErrorView {
                message: format!("Failed to load {}: {}", ctx.config.entity_name, message),
                retryable: true,
            });
        }
    }

    let model = ctx.model;
    let headers = model.header_groups.into_iter().next().map(|group| group.headers).unwrap_or_default();

    let body = if ctx.is_loading {
        BodyView::Skeleton {
            rows: model.pagination.page_size as usize,
            columns: headers.len(),
        }
    } else if model.rows.is_empty() {
        BodyView::Empty {
            colspan: headers.len(),
        }
    } else {
        BodyView::Rows(
            model
                .rows
                .into_iter()
                .map(|row| RowView {
                    dom_id: format!("row-{}", row.index),
                    focused: ctx.focused_row == Some(row.index),
                    index: row.index,
                    id: row.id,
                    selected: row.selected,
                    cells: row.cells,
                })
                .collect(),
        )
    };

    let config = ctx.config;
    let toolbar = config.enable_toolbar.then(|| ToolbarView {
        search: ctx.search.to_string(),
        date_range: config.enable_date_filter.then(|| ctx.date_range.clone()),
        selected_count: ctx.selected_count,
        show_bulk_actions: config.enable_row_selection && ctx.selected_count > 0,
        columns: if config.enable_column_visibility {
            ctx.columns
                .iter()
                .filter(|column| column.enable_hiding)
                .map(|column| ColumnToggle {
                    id: column.id.clone(),
                    label: column.header.clone(),
                    visible: headers.iter().any(|header| header.column_id == column.id),
                })
                .collect()
        } else {
            Vec::new()
        },
        can_export: config.enable_export,
        can_reset_sizing: config.enable_column_resizing,
    });

    let pagination = config.enable_pagination.then(|| PaginationView {
        selection_summary: format!("{} of {} row(s) selected.", ctx.selected_count, ctx.total_items),
        page_size: model.pagination.page_size,
        page_size_options: config.page_size_options.clone(),
        page_label: format!("Page {} of {}", model.pagination.page(), model.page_count.max(1)),
        can_first: model.can_previous_page,
        can_previous: model.can_previous_page,
        can_next: model.can_next_page,
        can_last: model.can_next_page,
    });

    GridView::Table(TableView {
        toolbar,
        headers,
        body,
        all_rows_selected: model.all_rows_selected,
        some_rows_selected: model.some_rows_selected,
        pagination,
        resizing: ctx.resizing,
        focused_row: ctx.focused_row,
        layout_epoch: ctx.layout_epoch,
    })
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use serde::Deserialize;

    use super::*;
    use crate::engine::EngineOptions;
    use crate::engine::PaginationState;
    use crate::engine::TableEngine;
    use crate::engine::TableInputs;
    use crate::model::Entity;
    use crate::selection::RowSelectionMask;
    use crate::sizing::ColumnSizing;

    #[derive(Debug, Clone, Deserialize)]
    struct Person {
        id: u32,
        name: String,
    }

    impl Entity for Person {
        type Id = u32;

        fn id(&self) -> u32 {
            self.id
        }

        fn cell(&self, column_id: &str) -> String {
            match column_id {
                "name" => self.name.clone(),
                _ => String::new(),
            }
        }
    }

    fn columns() -> Vec<ColumnDef> {
        vec![ColumnDef::select(), ColumnDef::new("name", "Name")]
    }

    fn model(rows: &[Person], mask: &RowSelectionMask, page_count: u32) -> RowModel {
        let engine = TableEngine::new(
            columns(),
            EngineOptions {
                enable_row_selection: true,
                enable_column_resizing: true,
            },
        );
        engine.row_model(&TableInputs {
            rows,
            sorting: &[],
            column_filters: &[],
            column_visibility: &BTreeMap::new(),
            row_selection: mask,
            pagination: PaginationState::from_page(1, 10),
            column_sizing: &ColumnSizing::new(),
            page_count,
            resizing: None,
        })
    }

    fn context<'a>(config: &'a TableConfig, columns: &'a [ColumnDef], model: RowModel) -> ViewContext<'a> {
        ViewContext {
            config,
            columns,
            model,
            is_loading: false,
            error: None,
            search: "",
            date_range: &EMPTY_RANGE,
            total_items: 0,
            selected_count: 0,
            focused_row: None,
            resizing: false,
            layout_epoch: 0,
        }
    }

    static EMPTY_RANGE: DateRange = DateRange { from: None, to: None };

    #[test]
    fn test_empty_page_shows_empty_row() {
        let config = TableConfig::default();
        let columns = columns();
        let view = build_view(context(&config, &columns, model(&[], &RowSelectionMask::new(), 0)));
        let GridView::Table(table) = view else {
            panic!("expected a table");
        };
        assert_eq!(table.body, BodyView::Empty { colspan: 2 });
        assert_eq!(table.pagination.unwrap().page_label, "Page 1 of 1");
    }

    #[test]
    fn test_loading_shows_skeleton_sized_to_page() {
        let config = TableConfig::default();
        let columns = columns();
        let mut ctx = context(&config, &columns, model(&[], &RowSelectionMask::new(), 0));
        ctx.is_loading = true;
        let GridView::Table(table) = build_view(ctx) else {
            panic!("expected a table");
        };
        assert_eq!(table.body, BodyView::Skeleton { rows: 10, columns: 2 });
    }

    #[test]
    fn test_error_replaces_table() {
        let config = TableConfig::default().with_entity_name("users");
        let columns = columns();
        let mut ctx = context(&config, &columns, model(&[], &RowSelectionMask::new(), 0));
        ctx.error = Some("HTTP 500: boom");
        assert_eq!(
            build_view(ctx),
            GridView::Error(ErrorView {
                message: "Failed to load users: HTTP 500: boom".to_string(),
                retryable: true,
            })
        );
    }

    #[test]
    fn test_rows_carry_focus_and_selection() {
        let config = TableConfig::default();
        let columns = columns();
        let rows = vec![
            Person {
                id: 1,
                name: "Ann".to_string(),
            },
            Person {
                id: 2,
                name: "Bo".to_string(),
            },
        ];
        let mask = RowSelectionMask::from([(0, true)]);
        let mut ctx = context(&config, &columns, model(&rows, &mask, 4));
        ctx.focused_row = Some(1);
        ctx.selected_count = 3;
        ctx.total_items = 35;
        let GridView::Table(table) = build_view(ctx) else {
            panic!("expected a table");
        };

        let BodyView::Rows(body) = &table.body else {
            panic!("expected rows");
        };
        assert_eq!(body[1].dom_id, "row-1");
        assert!(body[0].selected && !body[0].focused);
        assert!(!body[1].selected && body[1].focused);
        assert!(table.some_rows_selected);

        let toolbar = table.toolbar.unwrap();
        assert!(toolbar.show_bulk_actions);
        assert_eq!(toolbar.columns.len(), 1);

        let pagination = table.pagination.unwrap();
        assert_eq!(pagination.selection_summary, "3 of 35 row(s) selected.");
        assert_eq!(pagination.page_label, "Page 1 of 4");
        assert!(!pagination.can_first && pagination.can_last);
    }

    #[test]
    fn test_gated_sections() {
        let config = TableConfig::default().with_toolbar(false).with_pagination(false);
        let columns = columns();
        let GridView::Table(table) = build_view(context(&config, &columns, model(&[], &RowSelectionMask::new(), 0)))
        else {
            panic!("expected a table");
        };
        assert!(table.toolbar.is_none());
        assert!(table.pagination.is_none());
    }
}
