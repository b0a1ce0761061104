// =====================================================
// PARENT/CHILD PRODUCT RELATIONS
// =====================================================


use crate::error::Result;
use crate::store::{StorePool, TableResolver};
use std::collections::HashSet;

const RELATION_TABLE: &str = "catalog_product_relation";

/// Direct children of a composite (configurable/bundle) product. No matches
/// is an empty set, not an error.
pub async fn child_ids(
    pool: &StorePool,
    resolver: &TableResolver,
    parent_id: i64,
) -> Result<Vec<i64>> {
    let query = format!(
        "SELECT child_id FROM {} WHERE parent_id = {}",
        resolver.resolve(RELATION_TABLE),
        parent_id
    );
    pool.fetch_id_column(&query).await
}

/// Expands a parent identifier set with all direct children. The result is
/// always a superset of the input; ordering is preserved and duplicates are
/// dropped. Relations are one level deep in this domain, so no transitive
/// closure is attempted.
pub async fn expand(
    pool: &StorePool,
    resolver: &TableResolver,
    parent_ids: &[i64],
) -> Result<Vec<i64>> {
    let mut seen: HashSet<i64> = HashSet::new();
    let mut expanded = Vec::new();

    for &parent_id in parent_ids {
        if seen.insert(parent_id) {
            expanded.push(parent_id);
        }
    }

    for &parent_id in parent_ids {
        for child_id in child_ids(pool, resolver, parent_id).await? {
            if seen.insert(child_id) {
                expanded.push(child_id);
            }
        }
    }

    Ok(expanded)
}
