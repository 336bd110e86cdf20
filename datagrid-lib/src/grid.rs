//! The grid controller.
//!
//! [`DataGrid`] owns every piece of grid state and is driven by its owner's
//! event loop: user intents come in through the handler methods, fetch
//! results through [`DataGrid::complete`], and [`DataGrid::view`] produces
//! what to draw.

use std::io::Write;
use std::sync::Arc;

use chrono::NaiveDate;
use tokio::sync::mpsc;
use url::Url;

use crate::config::TableConfig;
use crate::engine::ColumnDef;
use crate::engine::EngineOptions;
use crate::engine::PaginationState;
use crate::engine::ResizeSession;
use crate::engine::TableChange;
use crate::engine::TableEngine;
use crate::engine::TableInputs;
use crate::error::Error;
use crate::export::ExportConfig;
use crate::export::export_file_name;
use crate::export::write_csv;
use crate::fetch::DataSource;
use crate::fetch::FetchCompletion;
use crate::fetch::FetchState;
use crate::fetch::Fetcher;
use crate::model::Entity;
use crate::query::DateRange;
use crate::query::DEFAULT_SORT_BY;
use crate::query::QueryState;
use crate::query::SortOrder;
use crate::query::SortingEntry;
use crate::query::is_page_size_allowed;
use crate::selection::RowSelectionMask;
use crate::selection::SelectionTracker;
use crate::sizing::ColumnSizingState;
use crate::sizing::SizingStore;
use crate::url_state::StateStore;
use crate::view::GridView;
use crate::view::ViewContext;
use crate::view::build_view;

/// Keys the grid reacts to when keyboard navigation is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    /// Toggle selection of the focused row.
    Space,
    /// Activate the focused row.
    Enter,
}

/// What a key press did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOutcome {
    /// Nothing happened.
    Ignored,
    /// The focused row's selection was toggled.
    Toggled(usize),
    /// The focused row was activated. The grid takes no action of its own;
    /// the embedding application decides what activation means.
    Activated(usize),
}

/// Called with the page selection mask every time it changes.
pub type SelectionListener = Box<dyn FnMut(&RowSelectionMask) + Send>;

/// A paginated, sortable, selectable table over a [`DataSource`].
///
/// # Example
///
/// ```ignore
/// let (mut grid, mut completions) = DataGrid::new(config, columns, source, sizing_store, location);
/// grid.mount().await;
///
/// while let Some(completion) = completions.recv().await {
///     if grid.complete(completion) {
///         print!("{}", render_text(&grid.view()));
///     }
/// }
/// ```
pub struct DataGrid<E: Entity> {
    config: TableConfig,
    store: StateStore,
    query: QueryState,
    fetcher: Fetcher<E>,
    selection: SelectionTracker<E::Id>,
    selection_listener: Option<SelectionListener>,
    selection_changes: u64,
    sizing: ColumnSizingState,
    sizing_store: SizingStore,
    engine: TableEngine,
    export: ExportConfig,
    resizing: Option<ResizeSession>,
    focused_row: Option<usize>,
}

impl<E: Entity> DataGrid<E> {
    /// Creates a grid and the receiver its fetch completions arrive on.
    ///
    /// `location` is the page URL query state is read from and written to
    /// when URL state is enabled. Nothing is loaded until
    /// [`mount`](Self::mount).
    pub fn new(
        config: TableConfig,
        columns: Vec<ColumnDef>,
        source: Arc<dyn DataSource<E>>,
        sizing_store: SizingStore,
        location: Url,
    ) -> (Self, mpsc::UnboundedReceiver<FetchCompletion<E>>) {
        let (fetcher, receiver) = Fetcher::new(source);
        let engine = TableEngine::new(columns, EngineOptions::from(&config));
        let export = ExportConfig::from_columns(config.entity_name.clone(), engine.columns());
        let grid = Self {
            store: StateStore::from_config(&config, location),
            query: QueryState::default(),
            fetcher,
            selection: SelectionTracker::new(),
            selection_listener: None,
            selection_changes: 0,
            sizing: ColumnSizingState::new(config.column_resizing_table_id.clone(), config.enable_column_resizing),
            sizing_store,
            engine,
            export,
            resizing: None,
            focused_row: None,
            config,
        };
        (grid, receiver)
    }

    /// Registers a listener for page selection mask changes.
    pub fn with_selection_listener(mut self, listener: impl FnMut(&RowSelectionMask) + Send + 'static) -> Self {
        self.selection_listener = Some(Box::new(listener));
        self
    }

    /// Overrides the exported columns.
    pub fn with_export_config(mut self, export: ExportConfig) -> Self {
        self.export = export;
        self
    }

    /// Loads query state and column widths and issues the first fetch.
    ///
    /// Must be called from within a tokio runtime.
    pub async fn mount(&mut self) {
        self.query = QueryState::load(&self.store, &self.config.page_size_options);
        self.query.save(&mut self.store);

        let stored = self.sizing.hydrate(&self.sizing_store).await;
        if self.sizing.apply_defaults(self.engine.columns(), stored) {
            log::debug!("applied default column widths for '{}'", self.sizing.table_id());
        }

        log::info!(
            "mounted grid '{}' at page {} (url state: {})",
            self.sizing.table_id(),
            self.query.page,
            self.store.is_url_backed()
        );
        self.fetcher.request(self.query.params());
    }

    /// Commits a fetch completion and reconciles the selection against the
    /// new rows. Returns whether anything changed.
    pub fn complete(&mut self, completion: FetchCompletion<E>) -> bool {
        if !self.fetcher.complete(completion) {
            return false;
        }
        self.reconcile_selection();

        let row_count = self.rows().len();
        if self.focused_row.is_some_and(|index| index >= row_count) {
            self.focused_row = None;
        }
        true
    }

    fn reconcile_selection(&mut self) {
        if self.selection.reconcile(self.fetcher.state().rows()).is_some() {
            self.notify_selection();
        }
    }

    fn notify_selection(&mut self) {
        self.selection_changes += 1;
        if let Some(listener) = &mut self.selection_listener {
            listener(self.selection.mask());
        }
    }

    // =========================================================================
    // Query state
    // =========================================================================

    /// Sets the search text and returns to the first page.
    pub fn set_search(&mut self, search: impl Into<String>) {
        self.query.search = search.into();
        self.query.page = 1;
        self.commit_query();
    }

    /// Sets the creation date range and returns to the first page.
    pub fn set_date_range(&mut self, from: Option<NaiveDate>, to: Option<NaiveDate>) {
        self.query.date_range = DateRange::new(from, to);
        self.query.page = 1;
        self.commit_query();
    }

    /// Cycles sorting on a column. Returns `false` for unsortable columns.
    pub fn toggle_sort(&mut self, column_id: &str) -> bool {
        let sorting = self.explicit_sorting();
        match self.engine.toggle_sorting(&sorting, column_id) {
            Some(change) => self.apply(change),
            None => false,
        }
    }

    /// Moves to a 1-based page. Clamped to the page count once it is known.
    pub fn set_page(&mut self, page: u32) -> bool {
        let change = self
            .engine
            .set_page_index(self.pagination(), self.page_bound(), page.saturating_sub(1));
        self.apply(change)
    }

    /// Changes the page size. Sizes that are not among the configured
    /// options are rejected.
    pub fn set_page_size(&mut self, page_size: u32) -> bool {
        if !is_page_size_allowed(page_size, &self.config.page_size_options) {
            log::debug!("rejected page size {}", page_size);
            return false;
        }
        let total_rows = self.fetcher.state().data.as_ref().map(|page| page.pagination.total_items);
        let change = self.engine.set_page_size(self.pagination(), page_size, total_rows);
        self.apply(change)
    }

    /// Moves to the next page.
    pub fn next_page(&mut self) -> bool {
        let change = self.engine.next_page(self.pagination(), self.page_count());
        self.apply_opt(change)
    }

    /// Moves to the previous page.
    pub fn previous_page(&mut self) -> bool {
        let change = self.engine.previous_page(self.pagination(), self.page_count());
        self.apply_opt(change)
    }

    /// Moves to the first page.
    pub fn first_page(&mut self) -> bool {
        let change = self.engine.first_page(self.pagination(), self.page_count());
        self.apply_opt(change)
    }

    /// Moves to the last page.
    pub fn last_page(&mut self) -> bool {
        let change = self.engine.last_page(self.pagination(), self.page_count());
        self.apply_opt(change)
    }

    /// Shows or hides a column.
    pub fn set_column_visible(&mut self, column_id: &str, visible: bool) -> bool {
        let change = self
            .engine
            .set_column_visibility(&self.query.column_visibility, column_id, visible);
        self.apply_opt(change)
    }

    /// Sets or clears a column filter.
    pub fn set_column_filter(&mut self, column_id: &str, value: Option<serde_json::Value>) -> bool {
        let change = self
            .engine
            .set_column_filter(&self.query.column_filters, column_id, value);
        self.apply_opt(change)
    }

    fn apply_opt(&mut self, change: Option<TableChange>) -> bool {
        change.is_some_and(|change| self.apply(change))
    }

    /// Applies an engine change that does not touch storage.
    fn apply(&mut self, change: TableChange) -> bool {
        match change {
            TableChange::Sorting(sorting) => self.query.apply_sorting(&sorting),
            TableChange::Pagination(pagination) => {
                self.query.page = pagination.page();
                self.query.page_size = pagination.page_size;
            }
            TableChange::ColumnFilters(filters) => self.query.column_filters = filters,
            TableChange::ColumnVisibility(visibility) => self.query.column_visibility = visibility,
            TableChange::RowSelection(mask) => {
                self.selection.apply_mask(self.fetcher.state().rows(), mask);
                self.notify_selection();
                return true;
            }
            TableChange::ColumnSizing(_) => {
                log::debug!("column sizing changes go through resize_to");
                return false;
            }
        }
        self.commit_query();
        true
    }

    fn commit_query(&mut self) {
        self.query.save(&mut self.store);
        self.fetcher.request(self.query.params());
    }

    /// Sort as the engine sees it: empty while the default sort is active.
    fn explicit_sorting(&self) -> Vec<SortingEntry> {
        if self.query.sort_by == DEFAULT_SORT_BY && self.query.sort_order == SortOrder::Desc {
            return Vec::new();
        }
        self.query.sorting()
    }

    fn pagination(&self) -> PaginationState {
        PaginationState::from_page(self.query.page, self.query.page_size)
    }

    fn page_count(&self) -> u32 {
        self.fetcher.state().total_pages()
    }

    fn page_bound(&self) -> u32 {
        match self.fetcher.state().data {
            Some(_) => self.page_count(),
            None => u32::MAX,
        }
    }

    // =========================================================================
    // Selection
    // =========================================================================

    /// Toggles selection of a row on the current page.
    pub fn toggle_row(&mut self, index: usize) -> bool {
        let change = self
            .engine
            .toggle_row_selected(self.selection.mask(), index, self.rows().len());
        self.apply_opt(change)
    }

    /// Selects every row on the page, or clears the page when all are
    /// selected.
    pub fn toggle_page_rows(&mut self) -> bool {
        let change = self
            .engine
            .toggle_all_page_rows_selected(self.selection.mask(), self.rows().len());
        self.apply_opt(change)
    }

    /// Deselects one entity, on this page or any other.
    pub fn deselect(&mut self, id: &E::Id) -> bool {
        if !self.selection.deselect(id) {
            return false;
        }
        self.reconcile_selection();
        true
    }

    /// Drops the whole selection.
    pub fn clear_selection(&mut self) {
        let had_mask = !self.selection.mask().is_empty();
        self.selection.clear();
        if had_mask {
            self.notify_selection();
        }
    }

    /// Selected entities among the loaded rows.
    pub fn selected_rows(&self) -> Vec<&E> {
        self.selection.selected_entities(self.fetcher.state().rows())
    }

    // =========================================================================
    // Column sizing
    // =========================================================================

    /// Starts a resize drag on a column at pointer position `x`.
    pub fn begin_resize(&mut self, column_id: &str, x: i32) -> bool {
        self.resizing = self.engine.begin_resize(column_id, x, self.sizing.sizing());
        self.resizing.is_some()
    }

    /// Moves the active resize drag. Widths are committed and persisted on
    /// every move.
    pub async fn resize_to(&mut self, x: i32) -> bool {
        let Some(session) = &self.resizing else {
            return false;
        };
        match self.engine.resize_to(session, x, self.sizing.sizing()) {
            Some(TableChange::ColumnSizing(sizing)) => self.sizing.set(sizing, &self.sizing_store).await,
            _ => false,
        }
    }

    /// Ends the active resize drag.
    pub fn end_resize(&mut self) -> bool {
        self.resizing.take().is_some()
    }

    /// Resizes a column to `width` in one step.
    pub async fn set_column_width(&mut self, column_id: &str, width: u32) -> bool {
        if !self.begin_resize(column_id, 0) {
            return false;
        }
        let start = self.resizing.as_ref().map(|session| session.start_width).unwrap_or(width);
        let delta = (width as i64 - start as i64).clamp(i32::MIN as i64, i32::MAX as i64) as i32;
        let changed = self.resize_to(delta).await;
        self.end_resize();
        changed
    }

    /// Forgets stored widths and returns to the declared defaults.
    pub async fn reset_column_sizing(&mut self) {
        self.resizing = None;
        self.sizing.reset(&self.sizing_store).await;
        self.sizing.apply_defaults(self.engine.columns(), false);
        log::info!("column sizing reset for '{}'", self.sizing.table_id());
    }

    // =========================================================================
    // Focus and keyboard
    // =========================================================================

    /// Moves focus to a row. Exactly one row is focused at a time.
    pub fn focus_row(&mut self, index: usize) -> bool {
        if index >= self.rows().len() {
            return false;
        }
        self.focused_row = Some(index);
        true
    }

    /// Clears row focus.
    pub fn blur(&mut self) {
        self.focused_row = None;
    }

    /// Handles a click on a row: focuses it and, when click-to-select is
    /// enabled, toggles its selection.
    pub fn click_row(&mut self, index: usize) -> bool {
        if !self.focus_row(index) {
            return false;
        }
        if self.config.enable_click_row_select {
            self.toggle_row(index);
        }
        true
    }

    /// Handles a key press on the focused row.
    pub fn handle_key(&mut self, key: Key) -> KeyOutcome {
        if !self.config.enable_keyboard_navigation {
            return KeyOutcome::Ignored;
        }
        let Some(index) = self.focused_row else {
            return KeyOutcome::Ignored;
        };
        match key {
            Key::Space if self.toggle_row(index) => KeyOutcome::Toggled(index),
            Key::Space => KeyOutcome::Ignored,
            Key::Enter => {
                log::debug!("row {} activated", index);
                KeyOutcome::Activated(index)
            }
        }
    }

    // =========================================================================
    // Export and retry
    // =========================================================================

    /// Writes the selected rows of the page as CSV, or every row of the page
    /// when none is selected. Returns the number of rows written.
    pub fn export_csv<W: Write>(&self, writer: W) -> Result<usize, Error> {
        let rows = self.fetcher.state().rows();
        let mut entities = self.selection.selected_entities(rows);
        if entities.is_empty() {
            entities = self.selection.all_entities(rows);
        }
        write_csv(&entities, &self.export, writer)?;
        log::info!("exported {} {}", entities.len(), self.config.entity_name);
        Ok(entities.len())
    }

    /// File name for an export made on `date`.
    pub fn export_file_name(&self, date: NaiveDate) -> String {
        export_file_name(&self.export.entity_name, date)
    }

    /// Issues the last request again.
    pub fn retry(&mut self) -> bool {
        self.fetcher.retry()
    }

    // =========================================================================
    // Presentation
    // =========================================================================

    /// Builds the current view.
    pub fn view(&self) -> GridView {
        let state = self.fetcher.state();
        let sorting = self.query.sorting();
        let model = self.engine.row_model(&TableInputs {
            rows: state.rows(),
            sorting: &sorting,
            column_filters: &self.query.column_filters,
            column_visibility: &self.query.column_visibility,
            row_selection: self.selection.mask(),
            pagination: self.pagination(),
            column_sizing: self.sizing.sizing(),
            page_count: state.total_pages(),
            resizing: self.resizing.as_ref(),
        });
        build_view(ViewContext {
            config: &self.config,
            columns: self.engine.columns(),
            model,
            is_loading: state.is_loading,
            error: state.error.as_deref(),
            search: &self.query.search,
            date_range: &self.query.date_range,
            total_items: state.total_items(),
            selected_count: self.selection.selected_count(),
            focused_row: self.focused_row,
            resizing: self.resizing.is_some(),
            layout_epoch: self.sizing.layout_epoch(),
        })
    }

    /// The current page URL, when query state lives in the URL.
    pub fn location(&self) -> Option<&Url> {
        self.store.location()
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    /// Feature toggles.
    pub fn config(&self) -> &TableConfig {
        &self.config
    }

    /// Current query state.
    pub fn query(&self) -> &QueryState {
        &self.query
    }

    /// Current fetch state.
    pub fn fetch_state(&self) -> &FetchState<E> {
        self.fetcher.state()
    }

    /// Loaded rows.
    pub fn rows(&self) -> &[E] {
        self.fetcher.state().rows()
    }

    /// Selection across pages.
    pub fn selection(&self) -> &SelectionTracker<E::Id> {
        &self.selection
    }

    /// Number of times the page selection mask changed.
    pub fn selection_changes(&self) -> u64 {
        self.selection_changes
    }

    /// Column widths.
    pub fn sizing(&self) -> &ColumnSizingState {
        &self.sizing
    }

    /// Columns known to the grid.
    pub fn columns(&self) -> &[ColumnDef] {
        self.engine.columns()
    }

    /// Focused row.
    pub fn focused_row(&self) -> Option<usize> {
        self.focused_row
    }

    /// Active resize drag.
    pub fn resizing(&self) -> Option<&ResizeSession> {
        self.resizing.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use serde::Deserialize;

    use super::*;
    use crate::error::ApiError;
    use crate::query::FetchedPage;
    use crate::query::Pagination;
    use crate::query::QueryParams;
    use crate::storage::MemoryBackend;

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
                "id" => self.id.to_string(),
                "name" => self.name.clone(),
                _ => String::new(),
            }
        }
    }

    /// Three pages of two people each.
    struct People;

    #[async_trait]
    impl DataSource<Person> for People {
        async fn fetch_page(&self, params: &QueryParams) -> Result<FetchedPage<Person>, ApiError> {
            let first = (params.page - 1) * 2;
            Ok(FetchedPage::new(
                (first..first + 2)
                    .map(|id| Person {
                        id,
                        name: format!("person {}", id),
                    })
                    .collect(),
                Pagination {
                    total_pages: 3,
                    total_items: 6,
                },
            ))
        }
    }

    fn grid(config: TableConfig) -> (DataGrid<Person>, mpsc::UnboundedReceiver<FetchCompletion<Person>>) {
        DataGrid::new(
            config,
            vec![ColumnDef::select(), ColumnDef::new("name", "Name").size(180)],
            Arc::new(People),
            SizingStore::new(MemoryBackend::new()),
            Url::parse("https://app.example.com/users").unwrap(),
        )
    }

    async fn settle(
        grid: &mut DataGrid<Person>,
        completions: &mut mpsc::UnboundedReceiver<FetchCompletion<Person>>,
    ) {
        while grid.fetch_state().is_loading {
            let completion = completions.recv().await.unwrap();
            grid.complete(completion);
        }
    }

    #[tokio::test]
    async fn test_mount_loads_first_page() {
        let (mut grid, mut completions) = grid(TableConfig::default());
        grid.mount().await;
        settle(&mut grid, &mut completions).await;

        assert_eq!(grid.rows().len(), 2);
        assert_eq!(grid.sizing().sizing().get("name"), Some(&180));
        assert_eq!(grid.location().unwrap().query(), None);
    }

    #[tokio::test]
    async fn test_search_resets_page() {
        let (mut grid, mut completions) = grid(TableConfig::default());
        grid.mount().await;
        settle(&mut grid, &mut completions).await;

        assert!(grid.set_page(3));
        settle(&mut grid, &mut completions).await;
        grid.set_search("person");
        assert_eq!(grid.query().page, 1);
        assert_eq!(grid.location().unwrap().query(), Some("search=person"));
    }

    #[tokio::test]
    async fn test_toggle_sort_cycles_back_to_default() {
        let (mut grid, _completions) = grid(TableConfig::default());
        grid.mount().await;

        assert!(grid.toggle_sort("name"));
        assert_eq!(grid.query().sort_order, SortOrder::Asc);
        assert!(grid.toggle_sort("name"));
        assert_eq!(grid.query().sort_order, SortOrder::Desc);
        assert!(grid.toggle_sort("name"));
        assert_eq!(grid.query().sort_by, "created_at");
        assert!(!grid.toggle_sort("select"));
    }

    #[tokio::test]
    async fn test_keyboard_space_and_enter() {
        let (mut grid, mut completions) = grid(TableConfig::default());
        grid.mount().await;
        settle(&mut grid, &mut completions).await;

        assert_eq!(grid.handle_key(Key::Space), KeyOutcome::Ignored);
        assert!(grid.focus_row(1));
        assert_eq!(grid.handle_key(Key::Space), KeyOutcome::Toggled(1));
        assert!(grid.selection().is_selected(&1));
        assert_eq!(grid.handle_key(Key::Enter), KeyOutcome::Activated(1));
        assert!(grid.selection().is_selected(&1));
    }

    #[tokio::test]
    async fn test_keyboard_disabled() {
        let (mut grid, mut completions) = grid(TableConfig::default().with_keyboard_navigation(false));
        grid.mount().await;
        settle(&mut grid, &mut completions).await;

        grid.focus_row(0);
        assert_eq!(grid.handle_key(Key::Space), KeyOutcome::Ignored);
    }

    #[tokio::test]
    async fn test_click_row_select_is_gated() {
        let (mut grid, mut completions) = grid(TableConfig::default());
        grid.mount().await;
        settle(&mut grid, &mut completions).await;
        assert!(grid.click_row(0));
        assert_eq!(grid.selection().selected_count(), 0);
        assert_eq!(grid.focused_row(), Some(0));

        let (mut grid, mut completions) = self::grid(TableConfig::default().with_click_row_select(true));
        grid.mount().await;
        settle(&mut grid, &mut completions).await;
        assert!(grid.click_row(0));
        assert!(grid.selection().is_selected(&0));
    }

    #[tokio::test]
    async fn test_export_prefers_selection() {
        let (mut grid, mut completions) = grid(TableConfig::default().with_entity_name("people"));
        grid.mount().await;
        settle(&mut grid, &mut completions).await;

        let mut out = Vec::new();
        assert_eq!(grid.export_csv(&mut out).unwrap(), 2);

        grid.toggle_row(1);
        let mut out = Vec::new();
        assert_eq!(grid.export_csv(&mut out).unwrap(), 1);
        assert_eq!(String::from_utf8(out).unwrap(), "Name\nperson 1\n");

        let date = NaiveDate::from_ymd_opt(2025, 1, 2).unwrap();
        assert_eq!(grid.export_file_name(date), "people-export-2025-01-02.csv");
    }

    #[tokio::test]
    async fn test_resize_and_reset() {
        let (mut grid, mut completions) = grid(TableConfig::default());
        grid.mount().await;
        settle(&mut grid, &mut completions).await;

        assert!(grid.begin_resize("name", 10));
        assert!(grid.resize_to(40).await);
        assert_eq!(grid.sizing().sizing().get("name"), Some(&210));
        assert!(grid.end_resize());

        grid.reset_column_sizing().await;
        assert_eq!(grid.sizing().sizing().get("name"), Some(&180));
        assert_eq!(grid.sizing().layout_epoch(), 1);
    }
}
