//! The record type shown by the grid.

use std::fmt::Debug;
use std::fmt::Display;
use std::hash::Hash;

use serde::de::DeserializeOwned;

/// Trait for records that can be fetched and displayed by the grid.
///
/// # Example
///
/// ```
/// use datagrid_lib::model::Entity;
/// use serde::Deserialize;
///
/// #[derive(Clone, Deserialize)]
/// struct User {
///     id: u64,
///     name: String,
///     email: String,
/// }
///
/// impl Entity for User {
///     type Id = u64;
///
///     fn id(&self) -> u64 {
///         self.id
///     }
///
///     fn cell(&self, column_id: &str) -> String {
///         match column_id {
///             "name" => self.name.clone(),
///             "email" => self.email.clone(),
///             _ => String::new(),
///         }
///     }
/// }
/// ```
pub trait Entity: Clone + Send + Sync + DeserializeOwned + 'static {
    /// Stable identifier, unique across all pages.
    type Id: Clone + Eq + Hash + Debug + Display + Send + Sync + 'static;

    /// Returns the stable id of this record.
    fn id(&self) -> Self::Id;

    /// Text content of the cell for a column.
    fn cell(&self, column_id: &str) -> String;
}
