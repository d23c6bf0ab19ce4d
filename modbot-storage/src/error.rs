//! Storage error types.
//!
//! Used by the schema declarer, the database manager and callers of storage APIs.

use thiserror::Error;

/// Errors that can occur when using storage operations.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Table name not declared: {0}")]
    NoTable(String),
    #[error("No column declared: {0}")]
    NoColumn(String),
    #[error("Database path not declared")]
    NoDbPath,
    #[error("Invalid identifier: {0:?}")]
    InvalidIdentifier(String),
    #[error("Data for table {0} must contain its primary key")]
    MissingPrimaryKey(String),
    #[error("Column {0} not declared")]
    UnknownColumn(String),
    #[error("Column {0} is not nullable")]
    NotNullable(String),
    #[error("Failed to create database: {0}")]
    Creation(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, StorageError>;

/// Accepts `[A-Za-z_][A-Za-z0-9_]*`; everything interpolated into SQL goes through here.
pub fn check_identifier(name: &str) -> Result<&str> {
    let mut chars = name.chars();
    let valid = match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    };
    if valid {
        Ok(name)
    } else {
        Err(StorageError::InvalidIdentifier(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_identifier() {
        assert!(check_identifier("user_lang").is_ok());
        assert!(check_identifier("_t2").is_ok());
        assert!(check_identifier("").is_err());
        assert!(check_identifier("2fast").is_err());
        assert!(check_identifier("a;DROP TABLE x").is_err());
        assert!(check_identifier("名字").is_err());
    }
}
