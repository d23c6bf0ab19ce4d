//! Integration tests for [`modbot_storage::DatabaseManager`] and [`modbot_storage::DbDeclarer`].
//!
//! Each test works on a fresh database file inside a temporary directory.

use modbot_storage::{
    row, ColumnDeclarer, ColumnType, DatabaseRegistry, DbDeclarer, StorageError, TableDeclarer,
    Value,
};
use tempfile::TempDir;

fn declarer(dir: &TempDir) -> DbDeclarer {
    DbDeclarer::new(dir.path().join("sub").join("bot.db"))
        .table(
            TableDeclarer::new("user_lang")
                .column(ColumnDeclarer::new("user_id", ColumnType::Int).primary())
                .column(
                    ColumnDeclarer::new("locale", ColumnType::Text)
                        .not_null()
                        .default_value("en"),
                )
                .column(ColumnDeclarer::new("note", ColumnType::Text)),
        )
        .table(
            TableDeclarer::new("events")
                .column(ColumnDeclarer::new("name", ColumnType::Text))
                .column(ColumnDeclarer::new("weight", ColumnType::Real)),
        )
}

/// **Test: Upsert by primary key.**
///
/// **Setup:** Declared database with `user_lang(user_id PK, locale, note)`.
/// **Action:** insert user 1, insert user 1 again with another locale.
/// **Expected:** one row, holding the second locale; the default fills `locale` when omitted.
#[tokio::test]
async fn test_insert_into_upserts() {
    let dir = TempDir::new().unwrap();
    let registry = DatabaseRegistry::new();
    let db = registry.open_declared(&declarer(&dir)).await.unwrap();

    db.insert_into("user_lang", &row([("user_id", Value::from(1)), ("locale", Value::from("zh-CN"))]))
        .await
        .unwrap();
    db.insert_into("user_lang", &row([("user_id", Value::from(1)), ("locale", Value::from("en"))]))
        .await
        .unwrap();
    db.insert_into("user_lang", &row([("user_id", 2)])).await.unwrap();

    let rows = db.select("user_lang", None, None).await.unwrap();
    assert_eq!(rows.len(), 2);
    let first = db
        .select("user_lang", Some(&row([("user_id", 1)])), Some(&["locale"]))
        .await
        .unwrap();
    assert_eq!(first[0].get("locale"), Some(&Value::from("en")));
    assert_eq!(first[0].len(), 1);
    let second = db
        .select("user_lang", Some(&row([("user_id", 2)])), None)
        .await
        .unwrap();
    assert_eq!(second[0].get("locale"), Some(&Value::from("en")));
    assert_eq!(second[0].get("note"), Some(&Value::Null));

    registry.shutdown().await;
}

/// **Test: Primary key is required when the table has one.**
#[tokio::test]
async fn test_insert_without_primary_key_fails() {
    let dir = TempDir::new().unwrap();
    let registry = DatabaseRegistry::new();
    let db = registry.open_declared(&declarer(&dir)).await.unwrap();

    let err = db
        .insert_into("user_lang", &row([("locale", "en")]))
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::MissingPrimaryKey(_)));
    assert_eq!(db.primary_key("user_lang").await.unwrap().as_deref(), Some("user_id"));
    assert_eq!(db.primary_key("events").await.unwrap(), None);
    registry.shutdown().await;
}

/// **Test: Upsert matches on every column of a composite primary key.**
///
/// **Setup:** Declared database with `member(chat PK, user PK, role)`.
/// **Action:** insert (1, 10, "a") and (1, 20, "b"), then (1, 10, "c"); insert a row missing `user`.
/// **Expected:** two rows; only (1, 10) now holds "c"; the row missing a key column is rejected.
#[tokio::test]
async fn test_insert_into_upserts_composite_key() {
    let dir = TempDir::new().unwrap();
    let registry = DatabaseRegistry::new();
    let declarer = DbDeclarer::new(dir.path().join("member.db")).table(
        TableDeclarer::new("member")
            .column(ColumnDeclarer::new("chat", ColumnType::Int).primary())
            .column(ColumnDeclarer::new("user", ColumnType::Int).primary())
            .column(ColumnDeclarer::new("role", ColumnType::Text)),
    );
    let db = registry.open_declared(&declarer).await.unwrap();
    assert_eq!(db.primary_keys("member").await.unwrap(), vec!["chat", "user"]);

    let member = |user: i64, role: &str| {
        row([("chat", Value::from(1)), ("user", Value::from(user)), ("role", Value::from(role))])
    };
    db.insert_into("member", &member(10, "a")).await.unwrap();
    db.insert_into("member", &member(20, "b")).await.unwrap();
    assert_eq!(db.select("member", None, None).await.unwrap().len(), 2);

    db.insert_into("member", &member(10, "c")).await.unwrap();
    assert_eq!(db.select("member", None, None).await.unwrap().len(), 2);
    for (user, role) in [(10, "c"), (20, "b")] {
        let found = db
            .select("member", Some(&row([("chat", 1), ("user", user)])), Some(&["role"]))
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].get("role"), Some(&Value::from(role)));
    }

    let err = db
        .insert_into("member", &row([("chat", Value::from(1)), ("role", Value::from("d"))]))
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::MissingPrimaryKey(_)));
    registry.shutdown().await;
}

/// **Test: Tables without a primary key accept duplicates; NULL filters and delete work.**
#[tokio::test]
async fn test_insert_many_select_null_and_delete() {
    let dir = TempDir::new().unwrap();
    let registry = DatabaseRegistry::new();
    let db = registry.open_declared(&declarer(&dir)).await.unwrap();

    let rows = vec![
        row([("name", Value::from("a")), ("weight", Value::from(1.5))]),
        row([("name", Value::from("a")), ("weight", Value::Null)]),
        row([("name", Value::from("b")), ("weight", Value::from(2.0))]),
    ];
    db.insert_many("events", &rows, true).await.unwrap();
    assert_eq!(db.select("events", None, None).await.unwrap().len(), 3);

    let nulls = db
        .select("events", Some(&row([("weight", Value::Null)])), None)
        .await
        .unwrap();
    assert_eq!(nulls.len(), 1);
    assert_eq!(nulls[0].get("name"), Some(&Value::from("a")));

    db.delete("events", Some(&row([("name", "a")]))).await.unwrap();
    assert_eq!(db.select("events", None, None).await.unwrap().len(), 1);
    db.clean("events").await.unwrap();
    assert!(db.select("events", None, None).await.unwrap().is_empty());
    registry.shutdown().await;
}

/// **Test: update only touches non-key columns and is a no-op with only the key.**
#[tokio::test]
async fn test_update_and_execute() {
    let dir = TempDir::new().unwrap();
    let registry = DatabaseRegistry::new();
    let db = registry.open_declared(&declarer(&dir)).await.unwrap();

    db.execute(&[
        "INSERT INTO user_lang (user_id, locale) VALUES (7, 'en')",
        "INSERT INTO user_lang (user_id, locale) VALUES (8, 'en')",
    ])
    .await
    .unwrap();
    db.update("user_lang", &row([("user_id", Value::from(7)), ("note", Value::from("vip"))]), "user_id")
        .await
        .unwrap();
    db.update("user_lang", &row([("user_id", 8)]), "user_id")
        .await
        .unwrap();

    let vip = db
        .select("user_lang", Some(&row([("note", "vip")])), None)
        .await
        .unwrap();
    assert_eq!(vip.len(), 1);
    assert_eq!(vip[0].get("user_id"), Some(&Value::Int(7)));
    registry.shutdown().await;
}

/// **Test: Injection through identifiers is rejected before any SQL runs.**
#[tokio::test]
async fn test_identifiers_are_validated() {
    let dir = TempDir::new().unwrap();
    let registry = DatabaseRegistry::new();
    let db = registry.open_declared(&declarer(&dir)).await.unwrap();

    let err = db
        .select("user_lang; DROP TABLE user_lang", None, None)
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::InvalidIdentifier(_)));
    assert!(db.select("user_lang", None, None).await.is_ok());
    registry.shutdown().await;
}

/// **Test: Validating an existing file adds missing tables and keeps data.**
///
/// **Setup:** Create the database with only `user_lang`, insert a row.
/// **Action:** create_or_validate with both tables declared.
/// **Expected:** `events` exists; the `user_lang` row is still there.
#[tokio::test]
async fn test_validate_creates_missing_tables() {
    let dir = TempDir::new().unwrap();
    let full = declarer(&dir);
    let partial = DbDeclarer::new(full.path.clone()).table(full.tables()[0].clone());
    partial.create_or_validate().await.unwrap();

    let registry = DatabaseRegistry::new();
    let db = registry.open(&full.path).await.unwrap();
    db.insert_into("user_lang", &row([("user_id", 1)])).await.unwrap();
    assert!(db.select("events", None, None).await.is_err());
    registry.shutdown().await;

    full.create_or_validate().await.unwrap();
    let db = registry.open(&full.path).await.unwrap();
    assert!(db.select("events", None, None).await.unwrap().is_empty());
    assert_eq!(db.select("user_lang", None, None).await.unwrap().len(), 1);
    registry.shutdown().await;
}

/// **Test: Declarer errors.**
#[tokio::test]
async fn test_declarer_errors() {
    assert!(matches!(
        DbDeclarer::default().create_or_validate().await,
        Err(StorageError::NoDbPath)
    ));
    let dir = TempDir::new().unwrap();
    assert!(matches!(
        DbDeclarer::new(dir.path().join("empty.db")).create().await,
        Err(StorageError::NoTable(_))
    ));
}

/// **Test: The registry hands out one manager per path.**
#[tokio::test]
async fn test_registry_shares_managers() {
    let dir = TempDir::new().unwrap();
    let registry = DatabaseRegistry::new();
    let path = dir.path().join("shared.db");
    let a = registry.open(&path).await.unwrap();
    let b = registry.open(&path).await.unwrap();
    assert!(std::sync::Arc::ptr_eq(&a, &b));
    assert_eq!(registry.len().await, 1);
    registry.shutdown().await;
    assert_eq!(registry.len().await, 0);
}
