//! The user records browsed by the CLI.

use datagrid_lib::engine::ColumnDef;
use datagrid_lib::model::Entity;
use serde::Deserialize;

/// A user as returned by the users endpoint.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct User {
    pub id: u64,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub age: u32,
    pub created_at: String,
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
            "email" => self.email.clone(),
            "phone" => self.phone.clone(),
            "age" => self.age.to_string(),
            // Date part of an ISO timestamp.
            "created_at" => self.created_at.split('T').next().unwrap_or_default().to_string(),
            _ => String::new(),
        }
    }
}

/// Columns of the users table. The selection column is only included when
/// rows can be selected.
pub fn user_columns(row_selection: bool) -> Vec<ColumnDef> {
    let mut columns = Vec::with_capacity(6);
    if row_selection {
        columns.push(ColumnDef::select());
    }
    columns.extend([
        ColumnDef::new("name", "Name").size(200),
        ColumnDef::new("email", "Email").size(250),
        ColumnDef::new("phone", "Phone").size(150),
        ColumnDef::new("age", "Age").size(80).bounds(40, 200),
        ColumnDef::new("created_at", "Created At").size(120),
    ]);
    columns
}
