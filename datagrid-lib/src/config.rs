//! Table configuration
//!
//! A static set of feature toggles supplied when the grid is constructed.
//! Nothing here changes at runtime.

use serde::Deserialize;
use serde::Serialize;

use crate::error::ConfigError;

/// Default page size options offered by the pagination controls.
pub const DEFAULT_PAGE_SIZE_OPTIONS: [u32; 5] = [10, 20, 30, 40, 50];

/// Table id used for column sizing persistence when none is configured.
pub const DEFAULT_TABLE_ID: &str = "data-table-default";

/// Feature toggles and identifiers for one grid instance.
///
/// Every field has a default, so overrides only need to name what they
/// change:
///
/// ```
/// use datagrid_lib::config::TableConfig;
///
/// let config = TableConfig::from_json(r#"{"enableUrlState": false, "enableClickRowSelect": true}"#)?;
/// assert!(!config.enable_url_state);
/// assert!(config.enable_click_row_select);
/// assert!(config.enable_pagination);
/// # Ok::<(), datagrid_lib::error::ConfigError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TableConfig {
    /// Mirror query state into URL query parameters.
    pub enable_url_state: bool,
    /// Show the selection column and allow selecting rows.
    pub enable_row_selection: bool,
    /// Allow resizing columns and persist their widths.
    pub enable_column_resizing: bool,
    /// Render the toolbar (search, date range, bulk actions, export, columns).
    pub enable_toolbar: bool,
    /// Render the pagination controls.
    pub enable_pagination: bool,
    /// Space toggles the focused row, Enter activates it.
    pub enable_keyboard_navigation: bool,
    /// Clicking a row toggles its selection.
    pub enable_click_row_select: bool,
    /// Offer the column visibility menu in the toolbar.
    pub enable_column_visibility: bool,
    /// Offer the export action in the toolbar.
    pub enable_export: bool,
    /// Offer the date range filter in the toolbar.
    pub enable_date_filter: bool,
    /// Storage identifier for persisted column widths.
    pub column_resizing_table_id: String,
    /// Choices for the rows-per-page control.
    pub page_size_options: Vec<u32>,
    /// Plural name of the entities shown, used in messages and export names.
    pub entity_name: String,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            enable_url_state: true,
            enable_row_selection: true,
            enable_column_resizing: true,
            enable_toolbar: true,
            enable_pagination: true,
            enable_keyboard_navigation: true,
            enable_click_row_select: false,
            enable_column_visibility: true,
            enable_export: true,
            enable_date_filter: true,
            column_resizing_table_id: DEFAULT_TABLE_ID.to_string(),
            page_size_options: DEFAULT_PAGE_SIZE_OPTIONS.to_vec(),
            entity_name: "items".to_string(),
        }
    }
}

impl TableConfig {
    /// Creates a config with every default applied.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a partial override document. Missing keys keep their defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks values that parse but make no sense.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.page_size_options.is_empty() {
            return Err(ConfigError::Invalid {
                field: "pageSizeOptions",
                message: "at least one option is required".to_string(),
            });
        }
        if self.page_size_options.contains(&0) {
            return Err(ConfigError::Invalid {
                field: "pageSizeOptions",
                message: "page sizes must be positive".to_string(),
            });
        }
        if self.column_resizing_table_id.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "columnResizingTableId",
                message: "must not be empty".to_string(),
            });
        }
        Ok(())
    }

    /// Sets whether query state is mirrored into the URL.
    pub fn with_url_state(mut self, enabled: bool) -> Self {
        self.enable_url_state = enabled;
        self
    }

    /// Sets whether rows can be selected.
    pub fn with_row_selection(mut self, enabled: bool) -> Self {
        self.enable_row_selection = enabled;
        self
    }

    /// Sets whether columns can be resized.
    pub fn with_column_resizing(mut self, enabled: bool) -> Self {
        self.enable_column_resizing = enabled;
        self
    }

    /// Sets whether the toolbar is rendered.
    pub fn with_toolbar(mut self, enabled: bool) -> Self {
        self.enable_toolbar = enabled;
        self
    }

    /// Sets whether the pagination controls are rendered.
    pub fn with_pagination(mut self, enabled: bool) -> Self {
        self.enable_pagination = enabled;
        self
    }

    /// Sets whether keyboard navigation is handled.
    pub fn with_keyboard_navigation(mut self, enabled: bool) -> Self {
        self.enable_keyboard_navigation = enabled;
        self
    }

    /// Sets whether clicking a row toggles its selection.
    pub fn with_click_row_select(mut self, enabled: bool) -> Self {
        self.enable_click_row_select = enabled;
        self
    }

    /// Sets the storage identifier for column widths.
    pub fn with_table_id(mut self, table_id: impl Into<String>) -> Self {
        self.column_resizing_table_id = table_id.into();
        self
    }

    /// Sets the rows-per-page choices.
    pub fn with_page_size_options(mut self, options: impl Into<Vec<u32>>) -> Self {
        self.page_size_options = options.into();
        self
    }

    /// Sets the plural entity name.
    pub fn with_entity_name(mut self, name: impl Into<String>) -> Self {
        self.entity_name = name.into();
        self
    }
}
