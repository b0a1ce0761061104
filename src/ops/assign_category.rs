use crate::engine;
use crate::error::Result;
use crate::ops::OpReport;
use crate::store::{id_list, StorePool, TableResolver};
use serde_json::Value;

const CATEGORY_PRODUCT_TABLE: &str = "catalog_category_product";
const PRODUCT_ENTITY_TABLE: &str = "catalog_product_entity";
const PRODUCT_ENTITY_INT_TABLE: &str = "catalog_product_entity_int";
const EAV_ATTRIBUTE_TABLE: &str = "eav_attribute";

// Visibility values that make a product eligible: catalog, search, both.
const VISIBLE_IN: [i64; 3] = [2, 3, 4];

/// Products carrying the attribute set whose default-scope visibility is in
/// the allow-list, newest first.
pub async fn product_ids_by_attribute_set(
    pool: &StorePool,
    resolver: &TableResolver,
    attribute_set_id: i64,
) -> Result<Vec<i64>> {
    let query = format!(
        "SELECT cpe.entity_id FROM {} AS cpe \
         LEFT JOIN {} AS ea ON ea.attribute_code = 'visibility' \
         LEFT JOIN {} AS cpei ON cpe.entity_id = cpei.entity_id \
         AND ea.attribute_id = cpei.attribute_id AND cpei.store_id = 0 \
         WHERE cpe.attribute_set_id = {} AND cpei.value IN ({}) \
         ORDER BY cpe.entity_id DESC",
        resolver.resolve(PRODUCT_ENTITY_TABLE),
        resolver.resolve(EAV_ATTRIBUTE_TABLE),
        resolver.resolve(PRODUCT_ENTITY_INT_TABLE),
        attribute_set_id,
        id_list(&VISIBLE_IN)
    );
    pool.fetch_id_column(&query).await
}

/// Products currently linked to the filter category.
pub async fn product_ids_by_category(
    pool: &StorePool,
    resolver: &TableResolver,
    category_id: i64,
) -> Result<Vec<i64>> {
    let query = format!(
        "SELECT product_id FROM {} WHERE category_id = {}",
        resolver.resolve(CATEGORY_PRODUCT_TABLE),
        category_id
    );
    pool.fetch_id_column(&query).await
}

/// Links each product to every target category. Positions are assigned
/// sequentially from 0 per successfully processed product and shared across
/// all target categories for that product. A product failing to write is
/// logged and skipped without advancing the position.
pub async fn assign_products_to_categories(
    pool: &StorePool,
    resolver: &TableResolver,
    product_ids: &[i64],
    target_category_ids: &[i64],
) -> Result<OpReport> {
    let table = resolver.resolve(CATEGORY_PRODUCT_TABLE);
    let mut report = OpReport::default();
    let mut position: i64 = 0;

    for &product_id in product_ids {
        let rows: Vec<Vec<Value>> = target_category_ids
            .iter()
            .map(|&category_id| {
                vec![
                    serde_json::json!(category_id),
                    serde_json::json!(product_id),
                    serde_json::json!(position),
                ]
            })
            .collect();

        match engine::upsert(
            pool,
            &table,
            &["category_id", "product_id", "position"],
            &rows,
            &["category_id", "product_id"],
            &[],
        )
        .await
        {
            Ok(affected) => {
                if affected > 0 {
                    log::info!(
                        "The product with ID {} has been assigned to categories: {}.",
                        product_id,
                        id_list(target_category_ids)
                    );
                } else {
                    log::info!("Nothing to assign for product with ID {}.", product_id);
                }
                report.processed += 1;
                position += 1;
            }
            Err(e) => {
                report.failed += 1;
                log::error!("Could not assign product with ID {}: {}", product_id, e);
            }
        }
    }

    Ok(report)
}
