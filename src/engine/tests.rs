use super::*;
use crate::error::MaintError;

async fn memory_pool() -> StorePool {
    StorePool::connect("sqlite::memory:").await.unwrap()
}

async fn seed_cms_block(pool: &StorePool) {
    pool.execute("CREATE TABLE cms_block (block_id INTEGER PRIMARY KEY, content TEXT)")
        .await
        .unwrap();
    pool.execute(
        "INSERT INTO cms_block (block_id, content) VALUES \
         (1, 'Hello &amp; Welcome'), (2, 'plain text')",
    )
    .await
    .unwrap();
}

async fn content_of(pool: &StorePool, id: i64) -> String {
    let row = pool
        .fetch_optional(&format!(
            "SELECT content FROM cms_block WHERE block_id = {}",
            id
        ))
        .await
        .unwrap()
        .unwrap();
    crate::store::value_to_text(row.get("content").unwrap())
}

#[tokio::test]
async fn test_decode_rewrite_updates_entities() {
    let pool = memory_pool().await;
    seed_cms_block(&pool).await;

    let spec = RewriteSpec::new("cms_block", "content", vec![Transform::DecodeEntities]);
    let report = run_column_rewrite(&pool, &TableResolver::default(), &spec)
        .await
        .unwrap();

    // no filter: both rows enter the write set
    assert_eq!(report.records, 2);
    assert_eq!(report.failed_batches, 0);
    assert_eq!(content_of(&pool, 1).await, "Hello & Welcome");
    assert_eq!(content_of(&pool, 2).await, "plain text");
}

#[tokio::test]
async fn test_replace_rewrite_filters_and_is_idempotent() {
    let pool = memory_pool().await;
    seed_cms_block(&pool).await;

    let spec = RewriteSpec::new(
        "cms_block",
        "content",
        vec![Transform::Replace {
            search: "&amp;".to_string(),
            replace: "&".to_string(),
        }],
    );

    let resolver = TableResolver::default();
    let first = run_column_rewrite(&pool, &resolver, &spec).await.unwrap();
    assert_eq!(first.records, 1);
    assert_eq!(content_of(&pool, 1).await, "Hello & Welcome");

    // after the replacement nothing matches LIKE %&amp;% any more
    let second = run_column_rewrite(&pool, &resolver, &spec).await.unwrap();
    assert_eq!(second.records, 0);
    assert_eq!(second.affected, 0);
}

#[tokio::test]
async fn test_trim_rewrite_on_sku() {
    let pool = memory_pool().await;
    pool.execute(
        "CREATE TABLE catalog_product_entity (entity_id INTEGER PRIMARY KEY, sku TEXT)",
    )
    .await
    .unwrap();
    pool.execute("INSERT INTO catalog_product_entity (entity_id, sku) VALUES (1, ' ABC123 ')")
        .await
        .unwrap();

    let spec = RewriteSpec::new("catalog_product_entity", "sku", vec![Transform::Trim]);
    let report = run_column_rewrite(&pool, &TableResolver::default(), &spec)
        .await
        .unwrap();
    assert_eq!(report.records, 1);

    let row = pool
        .fetch_optional("SELECT sku FROM catalog_product_entity WHERE entity_id = 1")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(row.get("sku"), Some(&serde_json::Value::String("ABC123".to_string())));
}

#[tokio::test]
async fn test_trim_rewrite_preserves_backslashes() {
    let pool = memory_pool().await;
    pool.execute(
        "CREATE TABLE catalog_product_entity (entity_id INTEGER PRIMARY KEY, sku TEXT)",
    )
    .await
    .unwrap();
    pool.execute("INSERT INTO catalog_product_entity (entity_id, sku) VALUES (1, ' C:\\path ')")
        .await
        .unwrap();

    let spec = RewriteSpec::new("catalog_product_entity", "sku", vec![Transform::Trim]);
    run_column_rewrite(&pool, &TableResolver::default(), &spec)
        .await
        .unwrap();

    let row = pool
        .fetch_optional("SELECT sku FROM catalog_product_entity WHERE entity_id = 1")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(
        row.get("sku"),
        Some(&serde_json::Value::String("C:\\path".to_string()))
    );
}

#[tokio::test]
async fn test_primary_column_rejected_before_read() {
    let pool = memory_pool().await;
    pool.execute("CREATE TABLE catalog_product_entity (entity_id INTEGER PRIMARY KEY, sku TEXT)")
        .await
        .unwrap();

    let spec = RewriteSpec::new("catalog_product_entity", "entity_id", vec![Transform::Trim]);
    let err = run_column_rewrite(&pool, &TableResolver::default(), &spec)
        .await
        .unwrap_err();
    assert!(matches!(err, MaintError::Validation(_)));
    assert!(err.to_string().contains("primary column"));
}

#[tokio::test]
async fn test_null_rows_are_skipped() {
    let pool = memory_pool().await;
    pool.execute("CREATE TABLE cms_block (block_id INTEGER PRIMARY KEY, content TEXT)")
        .await
        .unwrap();
    pool.execute("INSERT INTO cms_block (block_id, content) VALUES (1, NULL), (2, 'x &amp; y')")
        .await
        .unwrap();

    let spec = RewriteSpec::new("cms_block", "content", vec![Transform::DecodeEntities]);
    let report = run_column_rewrite(&pool, &TableResolver::default(), &spec)
        .await
        .unwrap();
    assert_eq!(report.records, 1);
    assert_eq!(content_of(&pool, 2).await, "x & y");
}

#[tokio::test]
async fn test_upsert_empty_rows_is_noop() {
    let pool = memory_pool().await;
    pool.execute("CREATE TABLE t (id INTEGER PRIMARY KEY, v TEXT)")
        .await
        .unwrap();

    let affected = upsert(&pool, "t", &["id", "v"], &[], &["id"], &["v"])
        .await
        .unwrap();
    assert_eq!(affected, 0);
}

#[tokio::test]
async fn test_upsert_only_updates_named_columns() {
    let pool = memory_pool().await;
    pool.execute("CREATE TABLE t (id INTEGER PRIMARY KEY, a TEXT, b TEXT)")
        .await
        .unwrap();
    pool.execute("INSERT INTO t (id, a, b) VALUES (1, 'old_a', 'old_b')")
        .await
        .unwrap();

    let rows = vec![vec![
        serde_json::json!(1),
        serde_json::Value::String("new_a".to_string()),
        serde_json::Value::String("new_b".to_string()),
    ]];
    let affected = upsert(&pool, "t", &["id", "a", "b"], &rows, &["id"], &["a"])
        .await
        .unwrap();
    assert_eq!(affected, 1);

    let row = pool.fetch_optional("SELECT a, b FROM t").await.unwrap().unwrap();
    assert_eq!(row.get("a"), Some(&serde_json::Value::String("new_a".to_string())));
    // column outside the update list keeps its value on conflict
    assert_eq!(row.get("b"), Some(&serde_json::Value::String("old_b".to_string())));
}

#[tokio::test]
async fn test_failed_batch_does_not_block_later_batches() {
    let pool = memory_pool().await;
    pool.execute(
        "CREATE TABLE cms_block (block_id INTEGER PRIMARY KEY, content TEXT NOT NULL CHECK (content <> 'boom'))",
    )
    .await
    .unwrap();

    let mut inserts = Vec::new();
    for id in 1..=3 {
        inserts.push(format!("({}, 'x{} &amp;')", id, id));
    }
    pool.execute(&format!(
        "INSERT INTO cms_block (block_id, content) VALUES {}",
        inserts.join(", ")
    ))
    .await
    .unwrap();

    // batch size 1; the middle row rewrites to a value the CHECK rejects
    let mut spec = RewriteSpec::new(
        "cms_block",
        "content",
        vec![
            Transform::Replace {
                search: "&amp;".to_string(),
                replace: "&".to_string(),
            },
            Transform::Replace {
                search: "x2 &".to_string(),
                replace: "boom".to_string(),
            },
        ],
    );
    spec.batch_size = 1;

    let report = run_column_rewrite(&pool, &TableResolver::default(), &spec)
        .await
        .unwrap();
    assert_eq!(report.records, 3);
    assert_eq!(report.failed_batches, 1);

    // rows 1 and 3 committed despite the failed middle batch
    let rows = pool
        .fetch_rows("SELECT content FROM cms_block ORDER BY block_id")
        .await
        .unwrap();
    assert_eq!(rows[0].get("content"), Some(&serde_json::Value::String("x1 &".to_string())));
    assert_eq!(rows[1].get("content"), Some(&serde_json::Value::String("x2 &amp;".to_string())));
    assert_eq!(rows[2].get("content"), Some(&serde_json::Value::String("x3 &".to_string())));
}

#[tokio::test]
async fn test_fetch_key_value_rows_with_order() {
    let pool = memory_pool().await;
    pool.execute("CREATE TABLE t (id INTEGER PRIMARY KEY, v TEXT)")
        .await
        .unwrap();
    pool.execute("INSERT INTO t (id, v) VALUES (1, 'a'), (2, 'b'), (3, 'c')")
        .await
        .unwrap();

    let rows = fetch_key_value_rows(&pool, "t", "id", &["v"], None, Some("id DESC"))
        .await
        .unwrap();
    let ids: Vec<i64> = rows
        .iter()
        .map(|row| crate::store::value_to_i64(row.get("id").unwrap()).unwrap())
        .collect();
    assert_eq!(ids, vec![3, 2, 1]);
}
