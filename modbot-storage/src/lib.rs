//! Storage crate: SQLite helpers for bot modules.
//!
//! ## Modules
//!
//! - [`error`] – Storage error types and identifier validation
//! - [`schema`] – Table/column declarers, row builder, database creation
//! - [`value`] – Column values and rows
//! - [`manager`] – DatabaseManager (select, upsert, update, delete)
//! - [`registry`] – DatabaseRegistry (one manager per file)
//! - [`sqlite_pool`] – SqlitePoolManager

mod error;
mod manager;
mod registry;
mod schema;
mod sqlite_pool;
mod value;

pub use error::{check_identifier, StorageError};
pub use manager::DatabaseManager;
pub use registry::DatabaseRegistry;
pub use schema::{ColumnDeclarer, ColumnType, DbDeclarer, RowBuilder, TableDeclarer};
pub use sqlite_pool::SqlitePoolManager;
pub use value::{row, DbRow, Rows, Value};

pub type Result<T> = std::result::Result<T, StorageError>;
