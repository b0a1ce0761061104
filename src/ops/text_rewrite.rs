use crate::engine::{run_column_rewrite, RewriteReport, RewriteSpec};
use crate::error::Result;
use crate::ops::TableColumnFilter;
use crate::store::{StorePool, TableResolver};
use crate::transform::Transform;

/// Converts HTML character references to literal characters in one column.
/// The reported count is the number of records written.
pub async fn decode_html_special_characters(
    pool: &StorePool,
    resolver: &TableResolver,
    filter: &TableColumnFilter,
) -> Result<RewriteReport> {
    let spec = RewriteSpec::new(
        filter.table.clone(),
        filter.column.clone(),
        vec![Transform::DecodeEntities],
    );
    run_column_rewrite(pool, resolver, &spec).await
}

/// Replaces a literal substring in one column, optionally dropping the last
/// `subtract` characters of each rewritten value.
pub async fn replace_string_in_database(
    pool: &StorePool,
    resolver: &TableResolver,
    filter: &TableColumnFilter,
    search: &str,
    replace: &str,
    subtract: usize,
) -> Result<RewriteReport> {
    let step = if subtract > 0 {
        Transform::ReplaceSubtract {
            search: search.to_string(),
            replace: replace.to_string(),
            subtract,
        }
    } else {
        Transform::Replace {
            search: search.to_string(),
            replace: replace.to_string(),
        }
    };
    let spec = RewriteSpec::new(filter.table.clone(), filter.column.clone(), vec![step]);
    run_column_rewrite(pool, resolver, &spec).await
}

/// Rewrites `{{store url=` directives to `{{store direct_url=` and decodes
/// character references in the same pass.
pub async fn fix_store_url_parameters(
    pool: &StorePool,
    resolver: &TableResolver,
    filter: &TableColumnFilter,
) -> Result<RewriteReport> {
    let spec = RewriteSpec::new(
        filter.table.clone(),
        filter.column.clone(),
        vec![
            Transform::Replace {
                search: "{{store url=".to_string(),
                replace: "{{store direct_url=".to_string(),
            },
            Transform::DecodeEntities,
        ],
    );
    run_column_rewrite(pool, resolver, &spec).await
}

/// Strips leading/trailing whitespace from one column. The primary column is
/// rejected as a target before any read.
pub async fn trim_whitespace(
    pool: &StorePool,
    resolver: &TableResolver,
    table: &str,
    column: &str,
) -> Result<RewriteReport> {
    let spec = RewriteSpec::new(table, column, vec![Transform::Trim]);
    run_column_rewrite(pool, resolver, &spec).await
}
