//! Declarative table schemas: `CREATE TABLE` generation, row validation, and creating or
//! validating a database file from its declared tables.

use std::fmt;
use std::path::{Path, PathBuf};

use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection};
use sqlx::{ConnectOptions, Connection};
use tracing::{debug, warn};

use crate::error::{check_identifier, Result, StorageError};
use crate::value::{DbRow, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Int,
    Text,
    Real,
    Blob,
    Numeric,
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ColumnType::Int => "INT",
            ColumnType::Text => "TEXT",
            ColumnType::Real => "REAL",
            ColumnType::Blob => "BLOB",
            ColumnType::Numeric => "NUMERIC",
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDeclarer {
    pub name: String,
    pub ty: ColumnType,
    pub primary: bool,
    pub not_null: bool,
    pub unique: bool,
    pub default: Option<Value>,
}

impl ColumnDeclarer {
    pub fn new(name: impl Into<String>, ty: ColumnType) -> Self {
        Self {
            name: name.into(),
            ty,
            primary: false,
            not_null: false,
            unique: false,
            default: None,
        }
    }

    pub fn primary(mut self) -> Self {
        self.primary = true;
        self
    }

    pub fn not_null(mut self) -> Self {
        self.not_null = true;
        self
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }
}

/// A table: name plus columns in declaration order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TableDeclarer {
    pub name: String,
    columns: Vec<ColumnDeclarer>,
}

impl TableDeclarer {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
        }
    }

    /// Adds a column; redeclaring a name replaces the earlier column.
    pub fn column(mut self, column: ColumnDeclarer) -> Self {
        match self.columns.iter_mut().find(|c| c.name == column.name) {
            Some(existing) => *existing = column,
            None => self.columns.push(column),
        }
        self
    }

    pub fn columns(&self) -> &[ColumnDeclarer] {
        &self.columns
    }

    pub fn get_column(&self, name: &str) -> Option<&ColumnDeclarer> {
        self.columns.iter().find(|c| c.name == name)
    }

    fn primary_keys(&self) -> Vec<&str> {
        self.columns
            .iter()
            .filter(|c| c.primary)
            .map(|c| c.name.as_str())
            .collect()
    }

    /// The `CREATE TABLE` statement for this table.
    pub fn creation_sql(&self) -> Result<String> {
        if self.name.is_empty() {
            return Err(StorageError::NoTable("table name not declared".to_string()));
        }
        check_identifier(&self.name)?;
        if self.columns.is_empty() {
            return Err(StorageError::NoColumn(self.name.clone()));
        }
        let pkeys = self.primary_keys();
        let mut defs = Vec::with_capacity(self.columns.len() + 1);
        for column in &self.columns {
            check_identifier(&column.name)?;
            let mut def = format!("{} {}", column.name, column.ty);
            if column.primary && pkeys.len() == 1 {
                def.push_str(" PRIMARY KEY");
            }
            if column.not_null {
                def.push_str(" NOT NULL");
            }
            if column.unique {
                def.push_str(" UNIQUE");
            }
            if let Some(default) = &column.default {
                def.push_str(" DEFAULT ");
                def.push_str(&default.to_sql_literal());
            }
            defs.push(def);
        }
        if pkeys.len() > 1 {
            defs.push(format!("PRIMARY KEY ({})", pkeys.join(",")));
        }
        Ok(format!("CREATE TABLE {} (\n{}\n);", self.name, defs.join(",\n")))
    }

    pub fn row(&self) -> RowBuilder<'_> {
        RowBuilder {
            table: self,
            data: DbRow::new(),
        }
    }
}

/// Collects column values for one row, checked against the table declaration.
pub struct RowBuilder<'a> {
    table: &'a TableDeclarer,
    data: DbRow,
}

impl<'a> RowBuilder<'a> {
    pub fn set(mut self, column: &str, value: impl Into<Value>) -> Result<Self> {
        if self.table.get_column(column).is_none() {
            return Err(StorageError::UnknownColumn(column.to_string()));
        }
        self.data.insert(column.to_string(), value.into());
        Ok(self)
    }

    pub fn set_map(mut self, values: DbRow) -> Result<Self> {
        if let Some(unknown) = values.keys().find(|k| self.table.get_column(k).is_none()) {
            return Err(StorageError::UnknownColumn(unknown.clone()));
        }
        self.data.extend(values);
        Ok(self)
    }

    /// Finishes the row. Every NOT NULL column without a default must have been set.
    pub fn create(self) -> Result<DbRow> {
        for column in self.table.columns() {
            if !self.data.contains_key(&column.name) && column.not_null && column.default.is_none()
            {
                return Err(StorageError::NotNullable(column.name.clone()));
            }
        }
        Ok(self.data)
    }
}

/// A database file and the tables it must contain.
#[derive(Debug, Clone, Default)]
pub struct DbDeclarer {
    pub path: PathBuf,
    tables: Vec<TableDeclarer>,
}

impl DbDeclarer {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            tables: Vec::new(),
        }
    }

    pub fn table(mut self, table: TableDeclarer) -> Self {
        self.tables.retain(|t| t.name != table.name);
        self.tables.push(table);
        self
    }

    pub fn tables(&self) -> &[TableDeclarer] {
        &self.tables
    }

    /// Creates the database when the file is absent, otherwise adds any missing tables.
    pub async fn create_or_validate(&self) -> Result<()> {
        if self.path.as_os_str().is_empty() {
            return Err(StorageError::NoDbPath);
        }
        if tokio::fs::try_exists(&self.path).await? {
            self.validate().await
        } else {
            self.create().await
        }
    }

    /// Creates every declared table, dropping same-named tables first.
    pub async fn create(&self) -> Result<()> {
        if self.path.as_os_str().is_empty() {
            return Err(StorageError::NoDbPath);
        }
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(dir).await?;
        }
        if self.tables.is_empty() {
            return Err(StorageError::NoTable(self.path.display().to_string()));
        }
        let statements = self
            .tables
            .iter()
            .map(|t| Ok((check_identifier(&t.name)?.to_string(), t.creation_sql()?)))
            .collect::<Result<Vec<_>>>()?;

        let run = async {
            let mut conn = connect(&self.path).await?;
            let mut tx = conn.begin().await?;
            for (name, _) in &statements {
                let drop_sql = format!("DROP TABLE IF EXISTS {}", name);
                warn!(sql = %drop_sql, "creating database");
                sqlx::query(&drop_sql).execute(&mut *tx).await?;
            }
            for (_, create) in &statements {
                warn!(sql = %create, "creating database");
                sqlx::query(create).execute(&mut *tx).await?;
            }
            tx.commit().await?;
            conn.close().await?;
            Ok::<(), sqlx::Error>(())
        };
        run.await
            .map_err(|e| StorageError::Creation(e.to_string()))
    }

    /// Creates the declared tables that the existing file lacks.
    pub async fn validate(&self) -> Result<()> {
        let mut conn = connect(&self.path).await?;
        for table in &self.tables {
            let found: Option<(String,)> =
                sqlx::query_as("SELECT name FROM sqlite_master WHERE type='table' AND name=?")
                    .bind(&table.name)
                    .fetch_optional(&mut conn)
                    .await?;
            debug!(table = %table.name, exists = found.is_some(), "validating table");
            if found.is_none() {
                let create = table.creation_sql()?;
                warn!(table = %table.name, sql = %create, "Table does not exist, creating");
                sqlx::query(&create).execute(&mut conn).await?;
            }
        }
        conn.close().await?;
        Ok(())
    }
}

async fn connect(path: &Path) -> std::result::Result<SqliteConnection, sqlx::Error> {
    SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true)
        .connect()
        .await
}
