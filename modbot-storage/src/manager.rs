//! Row-level access to one SQLite database: select, upsert by primary key, update, delete.
//!
//! Every operation holds the manager's lock for its whole duration, so a read-then-write upsert
//! is not interleaved with another caller. Identifiers are validated and values are bound.

use std::path::{Path, PathBuf};

use sqlx::sqlite::SqliteConnection;
use sqlx::{Connection, Row};
use tokio::sync::Mutex;
use tracing::{debug, error};

use crate::error::{check_identifier, Result, StorageError};
use crate::sqlite_pool::SqlitePoolManager;
use crate::value::{bind_value, decode_row, DbRow, Rows, Value};

pub struct DatabaseManager {
    path: PathBuf,
    pool: SqlitePoolManager,
    lock: Mutex<()>,
}

impl DatabaseManager {
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let pool = SqlitePoolManager::new(&path).await?;
        Ok(Self {
            path,
            pool,
            lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn conn(&self) -> Result<sqlx::pool::PoolConnection<sqlx::Sqlite>> {
        Ok(self.pool.pool().acquire().await?)
    }

    /// `SELECT need... FROM table WHERE k = ? AND ...`; `Null` in `filter` compiles to `IS NULL`.
    pub async fn select(
        &self,
        table: &str,
        filter: Option<&DbRow>,
        need: Option<&[&str]>,
    ) -> Result<Rows> {
        let _guard = self.lock.lock().await;
        let mut conn = self.conn().await?;
        select_nolock(&mut conn, table, filter, need).await
    }

    /// Name of the table's first primary-key column, if any.
    pub async fn primary_key(&self, table: &str) -> Result<Option<String>> {
        Ok(self.primary_keys(table).await?.into_iter().next())
    }

    /// Every primary-key column of the table, in key order.
    pub async fn primary_keys(&self, table: &str) -> Result<Vec<String>> {
        let _guard = self.lock.lock().await;
        let mut conn = self.conn().await?;
        primary_keys_nolock(&mut conn, table).await
    }

    /// Inserts `row`, or updates the existing row with the same primary key (all key columns
    /// for a composite key).
    pub async fn insert_into(&self, table: &str, row: &DbRow) -> Result<()> {
        self.insert_many(table, std::slice::from_ref(row), false).await
    }

    /// Upserts each row. With `no_pkey_check`, rows are inserted without looking for an
    /// existing primary key.
    pub async fn insert_many(&self, table: &str, rows: &[DbRow], no_pkey_check: bool) -> Result<()> {
        let _guard = self.lock.lock().await;
        let mut conn = self.conn().await?;
        let result = async {
            let pkeys = primary_keys_nolock(&mut conn, table).await?;
            let keys: Vec<&str> = pkeys.iter().map(String::as_str).collect();
            let mut tx = conn.begin().await?;
            for row in rows {
                let seen = if keys.is_empty() || no_pkey_check {
                    false
                } else {
                    let filter = key_filter(table, row, &keys)?;
                    !select_nolock(&mut tx, table, Some(&filter), Some(&keys[..]))
                        .await?
                        .is_empty()
                };
                if seen {
                    debug!(table, keys = ?keys, "already seen this primary key, updating");
                    update_nolock(&mut tx, table, row, &keys).await?;
                } else {
                    insert_nolock(&mut tx, table, row).await?;
                }
            }
            tx.commit().await?;
            Ok::<(), StorageError>(())
        }
        .await;
        log_failure(&self.path, "insert", &result);
        result
    }

    /// `UPDATE table SET ... WHERE pkey = row[pkey]`. Does nothing when only the key is set.
    pub async fn update(&self, table: &str, row: &DbRow, pkey: &str) -> Result<()> {
        let _guard = self.lock.lock().await;
        let mut conn = self.conn().await?;
        update_nolock(&mut conn, table, row, &[pkey]).await
    }

    pub async fn delete(&self, table: &str, filter: Option<&DbRow>) -> Result<()> {
        let _guard = self.lock.lock().await;
        let mut conn = self.conn().await?;
        let result = delete_nolock(&mut conn, table, filter).await;
        log_failure(&self.path, "delete", &result);
        result
    }

    /// Deletes every row of `table`.
    pub async fn clean(&self, table: &str) -> Result<()> {
        self.delete(table, None).await
    }

    /// Runs raw statements in one transaction.
    pub async fn execute(&self, statements: &[&str]) -> Result<()> {
        let _guard = self.lock.lock().await;
        let mut conn = self.conn().await?;
        let mut tx = conn.begin().await?;
        for statement in statements {
            debug!(sql = %statement, "execute");
            sqlx::query(statement).execute(&mut *tx).await?;
        }
        tx.commit().await?;
        Ok(())
    }

    pub async fn close(&self) {
        let _guard = self.lock.lock().await;
        self.pool.close().await;
    }
}

fn log_failure(path: &Path, op: &str, result: &Result<()>) {
    if let Err(e) = result {
        error!(path = %path.display(), op, error = %e, "Error when operating database");
    }
}

fn where_clause(filter: Option<&DbRow>) -> Result<(String, Vec<Value>)> {
    let Some(filter) = filter.filter(|f| !f.is_empty()) else {
        return Ok((String::new(), Vec::new()));
    };
    let mut parts = Vec::with_capacity(filter.len());
    let mut args = Vec::new();
    for (column, value) in filter {
        check_identifier(column)?;
        if value.is_null() {
            parts.push(format!("{} IS NULL", column));
        } else {
            parts.push(format!("{} = ?", column));
            args.push(value.clone());
        }
    }
    Ok((format!(" WHERE {}", parts.join(" AND ")), args))
}

async fn select_nolock(
    conn: &mut SqliteConnection,
    table: &str,
    filter: Option<&DbRow>,
    need: Option<&[&str]>,
) -> Result<Rows> {
    check_identifier(table)?;
    let columns = match need {
        Some(need) if !need.is_empty() => need
            .iter()
            .map(|c| check_identifier(c))
            .collect::<Result<Vec<_>>>()?
            .join(", "),
        _ => "*".to_string(),
    };
    let (clause, args) = where_clause(filter)?;
    let sql = format!("SELECT {} FROM {}{};", columns, table, clause);
    debug!(sql = %sql, args = ?args, "select");
    let mut query = sqlx::query(&sql);
    for arg in args {
        query = bind_value(query, arg);
    }
    let rows = query.fetch_all(&mut *conn).await?;
    rows.iter()
        .map(|r| decode_row(r).map_err(StorageError::from))
        .collect()
}

/// `row` restricted to `keys`; every key column must be present.
fn key_filter(table: &str, row: &DbRow, keys: &[&str]) -> Result<DbRow> {
    keys.iter()
        .map(|key| {
            row.get(*key)
                .map(|value| (key.to_string(), value.clone()))
                .ok_or_else(|| StorageError::MissingPrimaryKey(table.to_string()))
        })
        .collect()
}

async fn primary_keys_nolock(conn: &mut SqliteConnection, table: &str) -> Result<Vec<String>> {
    check_identifier(table)?;
    let sql = format!("PRAGMA table_info({});", table);
    let rows = sqlx::query(&sql).fetch_all(&mut *conn).await?;
    let mut keys = Vec::new();
    for row in &rows {
        let position: i64 = row.try_get("pk")?;
        if position > 0 {
            keys.push((position, row.try_get::<String, _>("name")?));
        }
    }
    keys.sort_by_key(|(position, _)| *position);
    Ok(keys.into_iter().map(|(_, name)| name).collect())
}

async fn insert_nolock(conn: &mut SqliteConnection, table: &str, row: &DbRow) -> Result<()> {
    check_identifier(table)?;
    let columns = row
        .keys()
        .map(|c| check_identifier(c))
        .collect::<Result<Vec<_>>>()?;
    let sql = if columns.is_empty() {
        format!("INSERT INTO {} DEFAULT VALUES;", table)
    } else {
        let placeholders = vec!["?"; columns.len()].join(", ");
        format!(
            "INSERT INTO {} ({}) VALUES ({});",
            table,
            columns.join(", "),
            placeholders
        )
    };
    debug!(sql = %sql, "insert");
    let mut query = sqlx::query(&sql);
    for value in row.values() {
        query = bind_value(query, value.clone());
    }
    query.execute(&mut *conn).await?;
    Ok(())
}

async fn update_nolock(
    conn: &mut SqliteConnection,
    table: &str,
    row: &DbRow,
    keys: &[&str],
) -> Result<()> {
    check_identifier(table)?;
    let filter = key_filter(table, row, keys)?;
    let mut sets = Vec::new();
    let mut args = Vec::new();
    for (column, value) in row.iter().filter(|(c, _)| !keys.contains(&c.as_str())) {
        check_identifier(column)?;
        sets.push(format!("{} = ?", column));
        args.push(value.clone());
    }
    if sets.is_empty() {
        debug!(table, "nothing to set, no need to update database");
        return Ok(());
    }
    let (clause, key_args) = where_clause(Some(&filter))?;
    let sql = format!("UPDATE {} SET {}{};", table, sets.join(", "), clause);
    debug!(sql = %sql, "update");
    let mut query = sqlx::query(&sql);
    for arg in args.into_iter().chain(key_args) {
        query = bind_value(query, arg);
    }
    query.execute(&mut *conn).await?;
    Ok(())
}

async fn delete_nolock(
    conn: &mut SqliteConnection,
    table: &str,
    filter: Option<&DbRow>,
) -> Result<()> {
    check_identifier(table)?;
    let (clause, args) = where_clause(filter)?;
    let sql = format!("DELETE FROM {}{};", table, clause);
    debug!(sql = %sql, "delete");
    let mut query = sqlx::query(&sql);
    for arg in args {
        query = bind_value(query, arg);
    }
    query.execute(&mut *conn).await?;
    Ok(())
}
