use crate::engine;
use crate::error::Result;
use crate::relations;
use crate::store::{id_list, StorePool, TableResolver};
use serde_json::Value;

const CATEGORY_PRODUCT_TABLE: &str = "catalog_category_product";
const PRODUCT_ENTITY_TABLE: &str = "catalog_product_entity";

/// Assigns every product linked to the given categories, plus their
/// configurable/bundle children, to an attribute set. Returns the
/// store-reported affected count; 0 means nothing was linked.
pub async fn assign_attribute_set_by_category(
    pool: &StorePool,
    resolver: &TableResolver,
    attribute_set_id: i64,
    category_ids: &[i64],
) -> Result<u64> {
    let product_ids = category_product_ids(pool, resolver, category_ids).await?;
    let product_ids = relations::expand(pool, resolver, &product_ids).await?;

    let rows: Vec<Vec<Value>> = product_ids
        .iter()
        .map(|&entity_id| vec![serde_json::json!(entity_id), serde_json::json!(attribute_set_id)])
        .collect();

    engine::upsert(
        pool,
        &resolver.resolve(PRODUCT_ENTITY_TABLE),
        &["entity_id", "attribute_set_id"],
        &rows,
        &["entity_id"],
        &["attribute_set_id"],
    )
    .await
}

/// Products directly linked to any of the categories.
async fn category_product_ids(
    pool: &StorePool,
    resolver: &TableResolver,
    category_ids: &[i64],
) -> Result<Vec<i64>> {
    if category_ids.is_empty() {
        return Ok(Vec::new());
    }
    let query = format!(
        "SELECT product_id FROM {} WHERE category_id IN ({})",
        resolver.resolve(CATEGORY_PRODUCT_TABLE),
        id_list(category_ids)
    );
    pool.fetch_id_column(&query).await
}
