use super::*;
use crate::error::MaintError;

async fn memory_pool() -> StorePool {
    StorePool::connect("sqlite::memory:").await.unwrap()
}

#[tokio::test]
async fn test_describe_finds_single_primary() {
    let pool = memory_pool().await;
    pool.execute("CREATE TABLE cms_block (block_id INTEGER PRIMARY KEY, content TEXT)")
        .await
        .unwrap();

    let descriptor = describe(&pool, "cms_block").await.unwrap();
    assert_eq!(descriptor.columns.len(), 2);
    assert!(descriptor.has_column("content"));

    let primary = descriptor.primary_key().unwrap();
    assert_eq!(primary.name, "block_id");
    assert!(primary.is_primary);
}

#[tokio::test]
async fn test_describe_missing_table_is_schema_error() {
    let pool = memory_pool().await;
    let err = describe(&pool, "no_such_table").await.unwrap_err();
    assert!(matches!(err, MaintError::Schema(_)));
}

#[tokio::test]
async fn test_primary_key_absent_is_schema_error() {
    let pool = memory_pool().await;
    pool.execute("CREATE TABLE keyless (a TEXT, b TEXT)").await.unwrap();

    let descriptor = describe(&pool, "keyless").await.unwrap();
    let err = descriptor.primary_key().unwrap_err();
    assert!(matches!(err, MaintError::Schema(_)));
    assert!(err.to_string().contains("primary column"));
}

#[tokio::test]
async fn test_composite_primary_key_is_schema_error() {
    let pool = memory_pool().await;
    pool.execute(
        "CREATE TABLE link (category_id INTEGER, product_id INTEGER, \
         PRIMARY KEY (category_id, product_id))",
    )
    .await
    .unwrap();

    let descriptor = describe(&pool, "link").await.unwrap();
    let err = descriptor.primary_key().unwrap_err();
    assert!(matches!(err, MaintError::Schema(_)));
    assert!(err.to_string().contains("composite"));
}
