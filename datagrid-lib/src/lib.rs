//! Server-driven data grid library
//!
//! Paginated, sortable and filterable tables over a remote list endpoint,
//! with shareable URL state, persisted column widths and selection that
//! survives page changes.

pub mod config;
pub mod engine;
pub mod error;
pub mod export;
pub mod fetch;
pub mod model;
pub mod query;
pub mod selection;
pub mod sizing;
pub mod storage;
pub mod url_state;
pub mod view;

mod grid;

pub use grid::*;
