use super::*;

async fn memory_pool() -> StorePool {
    StorePool::connect("sqlite::memory:").await.unwrap()
}

#[test]
fn test_table_resolver_prefix() {
    let plain = TableResolver::new(None);
    assert_eq!(plain.resolve("cms_block"), "cms_block");

    let prefixed = TableResolver::new(Some("m2_".to_string()));
    assert_eq!(prefixed.resolve("cms_block"), "m2_cms_block");

    // blank prefixes collapse to identity
    let blank = TableResolver::new(Some("  ".to_string()));
    assert_eq!(blank.resolve("cms_block"), "cms_block");
}

#[test]
fn test_escape_sql_string_per_backend() {
    assert_eq!(escape_sql_string(DatabaseType::MySql, "it's"), "it''s");
    assert_eq!(escape_sql_string(DatabaseType::MySql, "a\\b"), "a\\\\b");

    // SQLite takes backslashes literally; only quotes are doubled
    assert_eq!(escape_sql_string(DatabaseType::Sqlite, "it's"), "it''s");
    assert_eq!(escape_sql_string(DatabaseType::Sqlite, "a\\b"), "a\\b");
}

#[test]
fn test_value_to_sql_literal() {
    assert_eq!(value_to_sql_literal(DatabaseType::MySql, &Value::Null), "NULL");
    assert_eq!(
        value_to_sql_literal(DatabaseType::MySql, &serde_json::json!(42)),
        "42"
    );
    assert_eq!(
        value_to_sql_literal(DatabaseType::MySql, &Value::String("O'Brien".to_string())),
        "'O''Brien'"
    );
    assert_eq!(value_to_sql_literal(DatabaseType::MySql, &Value::Bool(true)), "1");
    assert_eq!(
        value_to_sql_literal(DatabaseType::Sqlite, &Value::String("C:\\path".to_string())),
        "'C:\\path'"
    );
}

#[test]
fn test_quote_identifier() {
    assert_eq!(quote_identifier(DatabaseType::MySql, "sku"), "`sku`");
    assert_eq!(quote_identifier(DatabaseType::Sqlite, "sku"), "\"sku\"");
}

#[test]
fn test_id_list() {
    assert_eq!(id_list(&[1, 2, 3]), "1, 2, 3");
    assert_eq!(id_list(&[]), "");
}

#[tokio::test]
async fn test_fetch_rows_and_execute() {
    let pool = memory_pool().await;
    pool.execute("CREATE TABLE sample (id INTEGER PRIMARY KEY, name TEXT)")
        .await
        .unwrap();
    let affected = pool
        .execute("INSERT INTO sample (id, name) VALUES (1, 'one'), (2, 'two')")
        .await
        .unwrap();
    assert_eq!(affected, 2);

    let rows = pool
        .fetch_rows("SELECT id, name FROM sample ORDER BY id")
        .await
        .unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].get("id"), Some(&serde_json::json!(1)));
    assert_eq!(rows[1].get("name"), Some(&Value::String("two".to_string())));
}

#[tokio::test]
async fn test_fetch_rows_decodes_null_cells() {
    let pool = memory_pool().await;
    pool.execute("CREATE TABLE sample (id INTEGER PRIMARY KEY, name TEXT)")
        .await
        .unwrap();
    pool.execute("INSERT INTO sample (id, name) VALUES (1, NULL), (2, '')")
        .await
        .unwrap();

    let rows = pool
        .fetch_rows("SELECT id, name FROM sample ORDER BY id")
        .await
        .unwrap();
    // NULL stays NULL and is not flattened into the empty string
    assert_eq!(rows[0].get("name"), Some(&Value::Null));
    assert_eq!(rows[1].get("name"), Some(&Value::String(String::new())));
}

#[tokio::test]
async fn test_fetch_id_column_skips_unparseable() {
    let pool = memory_pool().await;
    pool.execute("CREATE TABLE sample (id TEXT)").await.unwrap();
    pool.execute("INSERT INTO sample (id) VALUES ('10'), ('x'), ('20')")
        .await
        .unwrap();

    let ids = pool.fetch_id_column("SELECT id FROM sample").await.unwrap();
    assert_eq!(ids, vec![10, 20]);
}

#[tokio::test]
async fn test_fetch_optional() {
    let pool = memory_pool().await;
    pool.execute("CREATE TABLE sample (id INTEGER)").await.unwrap();

    assert!(pool
        .fetch_optional("SELECT id FROM sample")
        .await
        .unwrap()
        .is_none());

    pool.execute("INSERT INTO sample (id) VALUES (7)").await.unwrap();
    let row = pool
        .fetch_optional("SELECT id FROM sample")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(row.get("id"), Some(&serde_json::json!(7)));
}

#[tokio::test]
async fn test_connect_rejects_unknown_scheme() {
    let err = StorePool::connect("postgres://localhost/db").await.unwrap_err();
    assert!(err.to_string().contains("Unsupported database URL scheme"));
}
