//! CSV export of table rows.

use std::io::Write;

use chrono::NaiveDate;

use crate::engine::ColumnDef;
use crate::engine::ColumnKind;
use crate::error::ExportError;
use crate::model::Entity;

/// Which columns to export and under which headings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportConfig {
    /// Plural entity name, used in the file name.
    pub entity_name: String,
    /// Column id and heading, in output order.
    pub columns: Vec<(String, String)>,
}

impl ExportConfig {
    /// Creates an empty config.
    pub fn new(entity_name: impl Into<String>) -> Self {
        Self {
            entity_name: entity_name.into(),
            columns: Vec::new(),
        }
    }

    /// Adds a column.
    pub fn column(mut self, id: impl Into<String>, heading: impl Into<String>) -> Self {
        self.columns.push((id.into(), heading.into()));
        self
    }

    /// Exports every data column under its header text.
    pub fn from_columns(entity_name: impl Into<String>, columns: &[ColumnDef]) -> Self {
        Self {
            entity_name: entity_name.into(),
            columns: columns
                .iter()
                .filter(|column| column.kind == ColumnKind::Data)
                .map(|column| (column.id.clone(), column.header.clone()))
                .collect(),
        }
    }
}

/// File name for an export made on `date`.
pub fn export_file_name(entity_name: &str, date: NaiveDate) -> String {
    format!("{}-export-{}.csv", entity_name, date.format("%Y-%m-%d"))
}

/// Writes a heading row and one record per entity.
pub fn write_csv<E: Entity, W: Write>(rows: &[&E], config: &ExportConfig, writer: W) -> Result<(), ExportError> {
    if rows.is_empty() {
        return Err(ExportError::Empty);
    }

    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(config.columns.iter().map(|(_, heading)| heading.as_str()))?;
    for row in rows {
        csv.write_record(config.columns.iter().map(|(id, _)| row.cell(id)))?;
    }
    csv.flush()?;
    Ok(())
}
