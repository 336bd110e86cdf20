//! Column definitions.

use crate::sizing::ColumnSizing;

/// Width used for columns that declare none.
pub const DEFAULT_COLUMN_SIZE: u32 = 150;

/// Narrowest a column can be resized to.
pub const DEFAULT_MIN_COLUMN_SIZE: u32 = 20;

/// Id of the row selection column.
pub const SELECT_COLUMN_ID: &str = "select";

/// What a column renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    /// Text taken from [`Entity::cell`](crate::model::Entity::cell).
    Data,
    /// Row selection checkbox.
    Select,
}

/// A table column definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDef {
    /// Unique identifier, also the sort field sent to the server.
    pub id: String,
    /// Header text.
    pub header: String,
    /// What the cells contain.
    pub kind: ColumnKind,
    /// Declared default width in pixels.
    pub size: Option<u32>,
    /// Lower resize bound.
    pub min_size: u32,
    /// Upper resize bound.
    pub max_size: u32,
    /// Header click toggles sorting.
    pub enable_sorting: bool,
    /// Column can be hidden from the visibility menu.
    pub enable_hiding: bool,
    /// Column has a resize handle.
    pub enable_resizing: bool,
}

impl ColumnDef {
    /// Creates a sortable, hideable, resizable data column.
    pub fn new(id: impl Into<String>, header: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            header: header.into(),
            kind: ColumnKind::Data,
            size: None,
            min_size: DEFAULT_MIN_COLUMN_SIZE,
            max_size: u32::MAX,
            enable_sorting: true,
            enable_hiding: true,
            enable_resizing: true,
        }
    }

    /// Creates the row selection column.
    pub fn select() -> Self {
        Self {
            id: SELECT_COLUMN_ID.to_string(),
            header: String::new(),
            kind: ColumnKind::Select,
            size: Some(40),
            min_size: 40,
            max_size: 40,
            enable_sorting: false,
            enable_hiding: false,
            enable_resizing: false,
        }
    }

    /// Sets the declared default width.
    pub fn size(mut self, size: u32) -> Self {
        self.size = Some(size);
        self
    }

    /// Sets the resize bounds.
    pub fn bounds(mut self, min_size: u32, max_size: u32) -> Self {
        self.min_size = min_size;
        self.max_size = max_size.max(min_size);
        self
    }

    /// Sets whether the header toggles sorting.
    pub fn sortable(mut self, enabled: bool) -> Self {
        self.enable_sorting = enabled;
        self
    }

    /// Sets whether the column can be hidden.
    pub fn hideable(mut self, enabled: bool) -> Self {
        self.enable_hiding = enabled;
        self
    }

    /// Sets whether the column can be resized.
    pub fn resizable(mut self, enabled: bool) -> Self {
        self.enable_resizing = enabled;
        self
    }

    /// Width to render: the sized width, else the declared one, else the
    /// default, clamped to the column bounds.
    pub fn width(&self, sizing: &ColumnSizing) -> u32 {
        sizing
            .get(&self.id)
            .copied()
            .or(self.size)
            .unwrap_or(DEFAULT_COLUMN_SIZE)
            .clamp(self.min_size, self.max_size)
    }

    /// Clamps a requested width to the column bounds.
    pub fn clamp_width(&self, width: i64) -> u32 {
        width.clamp(self.min_size as i64, self.max_size as i64) as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_width_precedence() {
        let column = ColumnDef::new("name", "Name").size(200);
        let mut sizing = ColumnSizing::new();
        assert_eq!(column.width(&sizing), 200);
        sizing.insert("name".to_string(), 260);
        assert_eq!(column.width(&sizing), 260);
        assert_eq!(ColumnDef::new("x", "X").width(&ColumnSizing::new()), DEFAULT_COLUMN_SIZE);
    }

    #[test]
    fn test_width_is_clamped() {
        let column = ColumnDef::new("name", "Name").bounds(50, 300);
        let sizing = ColumnSizing::from([("name".to_string(), 5)]);
        assert_eq!(column.width(&sizing), 50);
        assert_eq!(column.clamp_width(1000), 300);
        assert_eq!(column.clamp_width(-40), 50);
    }
}
