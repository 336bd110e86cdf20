//! End-to-end grid behavior against an in-process data source.

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::time::Duration;

use async_trait::async_trait;
use datagrid_lib::DataGrid;
use datagrid_lib::config::TableConfig;
use datagrid_lib::engine::ColumnDef;
use datagrid_lib::error::ApiError;
use datagrid_lib::error::StorageError;
use datagrid_lib::fetch::DataSource;
use datagrid_lib::fetch::FetchCompletion;
use datagrid_lib::model::Entity;
use datagrid_lib::query::FetchedPage;
use datagrid_lib::query::Pagination;
use datagrid_lib::query::QueryParams;
use datagrid_lib::sizing::ColumnSizing;
use datagrid_lib::sizing::SizingStore;
use datagrid_lib::storage::MemoryBackend;
use datagrid_lib::storage::SettingsBackend;
use datagrid_lib::storage::SqliteBackend;
use datagrid_lib::view::BodyView;
use datagrid_lib::view::EMPTY_MESSAGE;
use datagrid_lib::view::GridView;
use datagrid_lib::view::render_text;
use serde::Deserialize;
use tokio::sync::mpsc::UnboundedReceiver;
use url::Url;

#[derive(Debug, Clone, PartialEq, Deserialize)]
struct User {
    id: u64,
    name: String,
}

impl Entity for User {
    type Id = u64;

    fn id(&self) -> u64 {
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

/// Serves `total` users named "user {id}", filtered by search. Page 1 can be
/// made slow.
#[derive(Default)]
struct Users {
    total: u64,
    slow_first_page: bool,
    calls: Mutex<Vec<QueryParams>>,
}

impl Users {
    fn new(total: u64) -> Self {
        Self {
            total,
            ..Self::default()
        }
    }

    fn calls(&self) -> Vec<QueryParams> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl DataSource<User> for Users {
    async fn fetch_page(&self, params: &QueryParams) -> Result<FetchedPage<User>, ApiError> {
        self.calls.lock().unwrap().push(params.clone());
        if self.slow_first_page && params.page == 1 {
            tokio::time::sleep(Duration::from_millis(100)).await;
        }

        let matching: Vec<User> = (1..=self.total)
            .map(|id| User {
                id,
                name: format!("user {}", id),
            })
            .filter(|user| user.name.contains(&params.search))
            .collect();
        let size = params.page_size as usize;
        let data = matching
            .iter()
            .skip((params.page as usize - 1) * size)
            .take(size)
            .cloned()
            .collect();
        Ok(FetchedPage::new(
            data,
            Pagination {
                total_pages: matching.len().div_ceil(size) as u32,
                total_items: matching.len() as u64,
            },
        ))
    }
}

struct BrokenBackend;

#[async_trait]
impl SettingsBackend for BrokenBackend {
    async fn get_bytes(&self, _key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        Err(StorageError::Unavailable("storage corrupted".to_string()))
    }

    async fn set_bytes(&self, _key: &str, _value: Vec<u8>) -> Result<(), StorageError> {
        Err(StorageError::Unavailable("quota exceeded".to_string()))
    }

    async fn delete(&self, _key: &str) -> Result<(), StorageError> {
        Err(StorageError::Unavailable("quota exceeded".to_string()))
    }
}

type Completions = UnboundedReceiver<FetchCompletion<User>>;

fn columns() -> Vec<ColumnDef> {
    vec![
        ColumnDef::select(),
        ColumnDef::new("id", "ID").size(80),
        ColumnDef::new("name", "Name").size(200),
    ]
}

fn location() -> Url {
    Url::parse("https://app.example.com/users?tab=all").unwrap()
}

fn grid_with(source: Arc<Users>, store: SizingStore, location: Url) -> (DataGrid<User>, Completions) {
    DataGrid::new(
        TableConfig::default().with_table_id("users").with_entity_name("users"),
        columns(),
        source,
        store,
        location,
    )
}

async fn settle(grid: &mut DataGrid<User>, completions: &mut Completions) {
    while grid.fetch_state().is_loading {
        let completion = completions.recv().await.unwrap();
        grid.complete(completion);
    }
}

fn page_ids(grid: &DataGrid<User>) -> Vec<u64> {
    grid.rows().iter().map(|user| user.id).collect()
}

// =============================================================================
// Fetching
// =============================================================================

#[tokio::test]
async fn test_latest_request_wins() {
    let source = Arc::new(Users {
        total: 25,
        slow_first_page: true,
        ..Users::default()
    });
    let (mut grid, mut completions) = grid_with(source.clone(), SizingStore::new(MemoryBackend::new()), location());

    grid.mount().await;
    // Let the slow first request start before superseding it.
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert!(grid.set_page(2));
    settle(&mut grid, &mut completions).await;
    assert_eq!(page_ids(&grid), (11..=20).collect::<Vec<_>>());

    // Nothing from the superseded request ever lands.
    tokio::time::sleep(Duration::from_millis(150)).await;
    assert!(completions.try_recv().is_err());
    assert_eq!(page_ids(&grid), (11..=20).collect::<Vec<_>>());
}

#[tokio::test]
async fn test_identical_parameters_fetch_once() {
    let source = Arc::new(Users::new(25));
    let (mut grid, mut completions) = grid_with(source.clone(), SizingStore::new(MemoryBackend::new()), location());

    grid.mount().await;
    settle(&mut grid, &mut completions).await;
    grid.set_page_size(20);
    settle(&mut grid, &mut completions).await;
    let before = source.calls().len();

    grid.set_page_size(20);
    grid.set_page(1);
    assert!(!grid.fetch_state().is_loading);
    assert_eq!(source.calls().len(), before);
    assert_eq!(source.calls().last().unwrap().page_size, 20);
}

#[tokio::test]
async fn test_search_resets_page() {
    let source = Arc::new(Users::new(25));
    let (mut grid, mut completions) = grid_with(source.clone(), SizingStore::new(MemoryBackend::new()), location());
    grid.mount().await;
    settle(&mut grid, &mut completions).await;

    grid.last_page();
    settle(&mut grid, &mut completions).await;
    assert_eq!(grid.query().page, 3);

    grid.set_search("user 2");
    settle(&mut grid, &mut completions).await;
    assert_eq!(grid.query().page, 1);
    // "user 2" and "user 20" through "user 25".
    assert_eq!(grid.fetch_state().total_items(), 7);
}

// =============================================================================
// Selection
// =============================================================================

#[tokio::test]
async fn test_selection_survives_page_round_trip() {
    let source = Arc::new(Users::new(25));
    let (mut grid, mut completions) = grid_with(source, SizingStore::new(MemoryBackend::new()), location());
    grid.mount().await;
    settle(&mut grid, &mut completions).await;

    assert!(grid.toggle_row(3));
    assert!(grid.selection().is_selected(&4));

    grid.next_page();
    settle(&mut grid, &mut completions).await;
    assert!(grid.selection().mask().is_empty());
    assert_eq!(grid.selection().selected_count(), 1);

    grid.previous_page();
    settle(&mut grid, &mut completions).await;
    let GridView::Table(table) = grid.view() else {
        panic!("expected a table");
    };
    let BodyView::Rows(rows) = table.body else {
        panic!("expected rows");
    };
    let selected: Vec<&str> = rows.iter().filter(|row| row.selected).map(|row| row.id.as_str()).collect();
    assert_eq!(selected, vec!["4"]);
}

#[tokio::test]
async fn test_reconciliation_is_idempotent() {
    let dispatched = Arc::new(AtomicUsize::new(0));
    let counter = dispatched.clone();

    let source = Arc::new(Users::new(25));
    let (grid, mut completions) = grid_with(source, SizingStore::new(MemoryBackend::new()), location());
    let mut grid = grid.with_selection_listener(move |_mask| {
        counter.fetch_add(1, Ordering::SeqCst);
    });
    grid.mount().await;
    settle(&mut grid, &mut completions).await;

    grid.toggle_row(0);
    assert_eq!(dispatched.load(Ordering::SeqCst), 1);

    // Same rows again: the recomputed mask is equal, nothing is dispatched.
    grid.retry();
    settle(&mut grid, &mut completions).await;
    grid.retry();
    settle(&mut grid, &mut completions).await;
    assert_eq!(dispatched.load(Ordering::SeqCst), 1);
    assert_eq!(grid.selection_changes(), 1);
}

#[tokio::test]
async fn test_deselect_from_another_page() {
    let source = Arc::new(Users::new(25));
    let (mut grid, mut completions) = grid_with(source, SizingStore::new(MemoryBackend::new()), location());
    grid.mount().await;
    settle(&mut grid, &mut completions).await;

    grid.toggle_page_rows();
    assert_eq!(grid.selection().selected_count(), 10);
    grid.next_page();
    settle(&mut grid, &mut completions).await;

    assert!(grid.deselect(&1));
    assert_eq!(grid.selection().selected_count(), 9);
    grid.clear_selection();
    assert_eq!(grid.selection().selected_count(), 0);
}

// =============================================================================
// URL state
// =============================================================================

#[tokio::test]
async fn test_url_state_survives_reload() {
    let source = Arc::new(Users::new(25));
    let (mut grid, mut completions) = grid_with(source.clone(), SizingStore::new(MemoryBackend::new()), location());
    grid.mount().await;
    settle(&mut grid, &mut completions).await;

    grid.set_search("alice");
    let shared = grid.location().unwrap().clone();
    assert_eq!(shared.as_str(), "https://app.example.com/users?tab=all&search=alice");

    let (mut reloaded, _completions) = grid_with(source, SizingStore::new(MemoryBackend::new()), shared);
    reloaded.mount().await;
    // Restored before any response arrives.
    assert_eq!(reloaded.query().search, "alice");
}

#[tokio::test]
async fn test_malformed_url_values_fall_back() {
    let source = Arc::new(Users::new(25));
    let location = Url::parse("https://app.example.com/users?page=-4&pageSize=abc&sortOrder=sideways").unwrap();
    let (mut grid, _completions) = grid_with(source, SizingStore::new(MemoryBackend::new()), location);
    grid.mount().await;

    assert_eq!(grid.query().page, 1);
    assert_eq!(grid.query().page_size, 10);
    assert_eq!(grid.location().unwrap().query(), None);
}

#[tokio::test]
async fn test_page_size_outside_options_falls_back() {
    let source = Arc::new(Users::new(25));
    let location = Url::parse("https://app.example.com/users?tab=all&pageSize=5000000").unwrap();
    let (mut grid, mut completions) = grid_with(source.clone(), SizingStore::new(MemoryBackend::new()), location);
    grid.mount().await;

    assert_eq!(grid.query().page_size, 10);
    assert_eq!(grid.location().unwrap().query(), Some("tab=all"));
    let GridView::Table(table) = grid.view() else {
        panic!("expected a table");
    };
    assert_eq!(table.body, BodyView::Skeleton { rows: 10, columns: 3 });

    settle(&mut grid, &mut completions).await;
    assert!(!grid.set_page_size(7));
    assert!(!grid.set_page_size(5_000_000));
    assert_eq!(grid.query().page_size, 10);
    assert!(source.calls().iter().all(|params| params.page_size == 10));
}

#[tokio::test]
async fn test_page_size_change_clamps_to_loaded_total() {
    let source = Arc::new(Users::new(25));
    let location = Url::parse("https://app.example.com/users?page=100000000&pageSize=50").unwrap();
    let (mut grid, mut completions) = grid_with(source, SizingStore::new(MemoryBackend::new()), location);
    grid.mount().await;
    settle(&mut grid, &mut completions).await;
    assert!(grid.rows().is_empty());

    assert!(grid.set_page_size(10));
    assert_eq!(grid.query().page, 3);
    settle(&mut grid, &mut completions).await;
    assert_eq!(page_ids(&grid), (21..=25).collect::<Vec<_>>());
}

#[tokio::test]
async fn test_memory_state_leaves_location_alone() {
    let source = Arc::new(Users::new(25));
    let (mut grid, _completions) = DataGrid::new(
        TableConfig::default().with_url_state(false),
        columns(),
        source,
        SizingStore::new(MemoryBackend::new()),
        location(),
    );
    grid.mount().await;
    grid.set_search("alice");
    assert!(grid.location().is_none());
    assert_eq!(grid.query().search, "alice");
}

// =============================================================================
// Column sizing
// =============================================================================

#[tokio::test]
async fn test_default_widths_then_persisted_resize() {
    let backend: Arc<dyn SettingsBackend> = Arc::new(SqliteBackend::open_in_memory().await.unwrap());
    let source = Arc::new(Users::new(25));

    let (mut grid, _completions) = grid_with(source.clone(), SizingStore::from_arc(backend.clone()), location());
    grid.mount().await;
    let defaults = ColumnSizing::from([("id".to_string(), 80), ("name".to_string(), 200), ("select".to_string(), 40)]);
    assert_eq!(grid.sizing().sizing(), &defaults);
    // Defaults are not written back.
    assert_eq!(SizingStore::from_arc(backend.clone()).get_sizing("users").await, None);

    assert!(grid.set_column_width("name", 260).await);

    let (mut remounted, _completions) = grid_with(source, SizingStore::from_arc(backend), location());
    remounted.mount().await;
    assert_eq!(remounted.sizing().sizing().get("name"), Some(&260));
}

#[tokio::test]
async fn test_failing_storage_read_yields_defaults() {
    let source = Arc::new(Users::new(25));
    let (mut grid, _completions) = grid_with(source, SizingStore::new(BrokenBackend), location());
    grid.mount().await;

    assert_eq!(grid.sizing().sizing().get("name"), Some(&200));
    assert_eq!(grid.sizing().sizing().get("id"), Some(&80));
    // Writes fail silently and the width still applies in memory.
    assert!(grid.set_column_width("name", 120).await);
    assert_eq!(grid.sizing().sizing().get("name"), Some(&120));
}

// =============================================================================
// Presentation
// =============================================================================

#[tokio::test]
async fn test_empty_page_renders_no_results_row() {
    let source = Arc::new(Users::new(0));
    let (mut grid, mut completions) = grid_with(source, SizingStore::new(MemoryBackend::new()), location());
    grid.mount().await;

    let GridView::Table(loading) = grid.view() else {
        panic!("expected a table");
    };
    assert_eq!(loading.body, BodyView::Skeleton { rows: 10, columns: 3 });

    settle(&mut grid, &mut completions).await;
    let view = grid.view();
    let GridView::Table(table) = &view else {
        panic!("expected a table");
    };
    assert_eq!(table.body, BodyView::Empty { colspan: 3 });
    assert!(render_text(&view).contains(EMPTY_MESSAGE));
    assert_eq!(table.pagination.as_ref().unwrap().page_label, "Page 1 of 1");
}
