use crate::error::{MaintError, Result};
use crate::ops::OpReport;
use crate::relations;
use crate::store::{id_list, value_to_i64, value_to_text, StorePool, TableResolver};
use std::collections::HashMap;

const PRODUCT_ENTITY_TABLE: &str = "catalog_product_entity";
const SUPER_ATTRIBUTE_TABLE: &str = "catalog_product_super_attribute";
const EAV_ATTRIBUTE_TABLE: &str = "eav_attribute";
const TYPE_CONFIGURABLE: &str = "configurable";

/// Caches attribute backend-type lookups for one run.
#[derive(Debug, Default)]
pub struct BackendTypeCache {
    by_attribute_id: HashMap<i64, String>,
}

impl BackendTypeCache {
    pub async fn backend_type(
        &mut self,
        pool: &StorePool,
        resolver: &TableResolver,
        attribute_id: i64,
    ) -> Result<String> {
        if let Some(backend_type) = self.by_attribute_id.get(&attribute_id) {
            return Ok(backend_type.clone());
        }

        let query = format!(
            "SELECT backend_type FROM {} WHERE attribute_id = {}",
            resolver.resolve(EAV_ATTRIBUTE_TABLE),
            attribute_id
        );
        let backend_type = pool
            .fetch_optional(&query)
            .await?
            .and_then(|row| row.get("backend_type").map(value_to_text))
            .filter(|value| !value.is_empty())
            .ok_or_else(|| {
                MaintError::store(format!(
                    "Could not resolve backend type for attribute with ID {}.",
                    attribute_id
                ))
            })?;

        self.by_attribute_id.insert(attribute_id, backend_type.clone());
        Ok(backend_type)
    }
}

/// Removes super-attribute rows whose attribute no longer has a value on any
/// child product. Runs per product; one product failing is logged and the
/// loop continues.
pub async fn cleanup_product_super_attributes(
    pool: &StorePool,
    resolver: &TableResolver,
    product_ids: Option<Vec<i64>>,
) -> Result<OpReport> {
    let product_ids = match product_ids {
        Some(ids) => ids,
        None => configurable_product_ids(pool, resolver).await?,
    };

    let mut cache = BackendTypeCache::default();
    let mut report = OpReport::default();

    for product_id in product_ids {
        match cleanup_one(pool, resolver, &mut cache, product_id).await {
            Ok(deleted) => {
                if deleted > 0 {
                    log::info!(
                        "A total of {} product super attributes have been cleaned up for product with ID {}.",
                        deleted,
                        product_id
                    );
                    report.processed += deleted;
                } else {
                    log::info!("Nothing to clean up for product with ID {}.", product_id);
                }
            }
            Err(e) => {
                report.failed += 1;
                log::error!("Super attribute cleanup failed for product with ID {}: {}", product_id, e);
            }
        }
    }

    Ok(report)
}

async fn cleanup_one(
    pool: &StorePool,
    resolver: &TableResolver,
    cache: &mut BackendTypeCache,
    product_id: i64,
) -> Result<u64> {
    let child_ids = relations::child_ids(pool, resolver, product_id).await?;
    if child_ids.is_empty() {
        return Ok(0);
    }

    let super_attributes = product_super_attributes(pool, resolver, product_id).await?;
    if super_attributes.is_empty() {
        return Ok(0);
    }

    let mut delete_ids = Vec::new();
    for (super_attribute_id, attribute_id) in super_attributes {
        if !attribute_value_exists(pool, resolver, cache, attribute_id, &child_ids).await? {
            delete_ids.push(super_attribute_id);
        }
    }

    if delete_ids.is_empty() {
        return Ok(0);
    }

    let statement = format!(
        "DELETE FROM {} WHERE product_super_attribute_id IN ({})",
        resolver.resolve(SUPER_ATTRIBUTE_TABLE),
        id_list(&delete_ids)
    );
    pool.execute(&statement).await
}

/// All configurable products, used when no explicit ids are given.
pub async fn configurable_product_ids(
    pool: &StorePool,
    resolver: &TableResolver,
) -> Result<Vec<i64>> {
    let query = format!(
        "SELECT entity_id FROM {} WHERE type_id = '{}'",
        resolver.resolve(PRODUCT_ENTITY_TABLE),
        TYPE_CONFIGURABLE
    );
    pool.fetch_id_column(&query).await
}

/// `(product_super_attribute_id, attribute_id)` pairs for one product.
async fn product_super_attributes(
    pool: &StorePool,
    resolver: &TableResolver,
    product_id: i64,
) -> Result<Vec<(i64, i64)>> {
    let query = format!(
        "SELECT product_super_attribute_id, attribute_id FROM {} WHERE product_id = {}",
        resolver.resolve(SUPER_ATTRIBUTE_TABLE),
        product_id
    );
    let rows = pool.fetch_rows(&query).await?;
    Ok(rows
        .iter()
        .filter_map(|row| {
            let super_attribute_id = row.get("product_super_attribute_id").and_then(value_to_i64)?;
            let attribute_id = row.get("attribute_id").and_then(value_to_i64)?;
            Some((super_attribute_id, attribute_id))
        })
        .collect())
}

/// Whether any child still carries a default-scope value for the attribute
/// in its backend-type value table.
async fn attribute_value_exists(
    pool: &StorePool,
    resolver: &TableResolver,
    cache: &mut BackendTypeCache,
    attribute_id: i64,
    child_ids: &[i64],
) -> Result<bool> {
    let backend_type = cache.backend_type(pool, resolver, attribute_id).await?;
    let value_table = resolver.resolve(&format!("{}_{}", PRODUCT_ENTITY_TABLE, backend_type));

    let query = format!(
        "SELECT value_id FROM {} WHERE attribute_id = {} AND entity_id IN ({}) AND store_id = 0 LIMIT 1",
        value_table,
        attribute_id,
        id_list(child_ids)
    );
    Ok(pool.fetch_optional(&query).await?.is_some())
}
