// =====================================================
// GENERIC TABLE-MUTATION ENGINE
// =====================================================
//
// Discovers a table's primary key at runtime, reads key/value rows in one
// pass, applies transform steps per row and writes batches back through an
// insert-or-update-on-conflict statement. Batches commit independently; a
// failed batch is logged and the run moves on.

#[cfg(test)]
mod tests;

use crate::error::{MaintError, Result};
use crate::schema;
use crate::store::{
    escape_sql_string, quote_identifier, value_to_sql_literal, value_to_text, DatabaseType,
    StorePool, TableResolver,
};
use crate::transform::{apply_steps, Transform};
use serde_json::Value;

/// Engine-wide default batch size.
pub const BATCH_SIZE: usize = 20;

/// One column-rewrite request against a logical table.
#[derive(Debug, Clone)]
pub struct RewriteSpec {
    pub table: String,
    pub column: String,
    pub steps: Vec<Transform>,
    pub batch_size: usize,
}

impl RewriteSpec {
    pub fn new(table: impl Into<String>, column: impl Into<String>, steps: Vec<Transform>) -> Self {
        Self {
            table: table.into(),
            column: column.into(),
            steps,
            batch_size: BATCH_SIZE,
        }
    }

    /// Row filter derived from the first step that narrows candidates.
    fn like_pattern(&self) -> Option<String> {
        self.steps.iter().find_map(|step| step.like_pattern())
    }
}

/// Outcome of a rewrite run. `records` counts rows that entered the write
/// set; `affected` is the store-reported count, which differs under
/// update-vs-insert accounting.
#[derive(Debug, Clone, Default)]
pub struct RewriteReport {
    pub records: u64,
    pub affected: u64,
    pub failed_batches: u64,
}

/// Runs a column rewrite end to end: introspect, read, transform, upsert.
pub async fn run_column_rewrite(
    pool: &StorePool,
    resolver: &TableResolver,
    spec: &RewriteSpec,
) -> Result<RewriteReport> {
    let table = resolver.resolve(&spec.table);
    let descriptor = schema::describe(pool, &table).await?;
    let key_column = descriptor.primary_key()?.name.clone();

    if key_column == spec.column {
        return Err(MaintError::validation(format!(
            "{} is a primary column and cannot be used as a rewrite target.",
            spec.column
        )));
    }
    if !descriptor.has_column(&spec.column) {
        return Err(MaintError::validation(format!(
            "Table {} has no column {}.",
            table, spec.column
        )));
    }

    let rows = fetch_key_value_rows(
        pool,
        &table,
        &key_column,
        &[spec.column.as_str()],
        spec.like_pattern().as_deref(),
        None,
    )
    .await?;

    let mut write_set: Vec<Vec<Value>> = Vec::new();
    for row in &rows {
        let key = match row.get(&key_column) {
            Some(value) if !value.is_null() => value.clone(),
            _ => continue,
        };
        let value = match row.get(&spec.column) {
            Some(value) if !value.is_null() => value_to_text(value),
            _ => continue,
        };
        write_set.push(vec![key, Value::String(apply_steps(&spec.steps, &value))]);
    }

    let mut report = RewriteReport {
        records: write_set.len() as u64,
        ..Default::default()
    };

    let batch_size = spec.batch_size.max(1);
    let columns = [key_column.as_str(), spec.column.as_str()];
    for batch in write_set.chunks(batch_size) {
        match upsert(
            pool,
            &table,
            &columns,
            batch,
            &[key_column.as_str()],
            &[spec.column.as_str()],
        )
        .await
        {
            Ok(affected) => {
                report.affected += affected;
                log::info!(
                    "Batch written to {}. Affected IDs: {}",
                    table,
                    batch
                        .iter()
                        .map(|row| value_to_text(&row[0]))
                        .collect::<Vec<String>>()
                        .join(",")
                );
            }
            Err(e) => {
                report.failed_batches += 1;
                log::error!("Batch write to {} failed: {}", table, e);
            }
        }
    }

    Ok(report)
}

/// Selects exactly the key column and the value columns, optionally filtered
/// by `<first value column> LIKE <pattern>` and ordered by the caller's
/// clause. Stateless; re-running re-issues the same query.
pub async fn fetch_key_value_rows(
    pool: &StorePool,
    table: &str,
    key_column: &str,
    value_columns: &[&str],
    like_pattern: Option<&str>,
    order_by: Option<&str>,
) -> Result<Vec<crate::store::StoreRow>> {
    let db_type = pool.database_type();
    let mut select_list = vec![quote_identifier(db_type, key_column)];
    select_list.extend(
        value_columns
            .iter()
            .map(|column| quote_identifier(db_type, column)),
    );

    let mut query = format!(
        "SELECT {} FROM {}",
        select_list.join(", "),
        quote_identifier(db_type, table)
    );

    if let Some(pattern) = like_pattern {
        let column = value_columns.first().copied().unwrap_or(key_column);
        query.push_str(&format!(
            " WHERE {} LIKE '{}'",
            quote_identifier(db_type, column),
            escape_sql_string(db_type, pattern)
        ));
    }

    if let Some(order) = order_by {
        query.push_str(&format!(" ORDER BY {}", order));
    }

    pool.fetch_rows(&query).await
}

/// Inserts rows or updates `update_columns` in place when a row with the
/// same key already exists. Columns outside `update_columns` are left alone
/// on conflict; an empty `update_columns` updates every non-key column. An
/// empty row set is a no-op returning 0.
pub async fn upsert(
    pool: &StorePool,
    table: &str,
    columns: &[&str],
    rows: &[Vec<Value>],
    key_columns: &[&str],
    update_columns: &[&str],
) -> Result<u64> {
    if rows.is_empty() {
        return Ok(0);
    }
    if columns.is_empty() {
        return Err(MaintError::store("Cannot build upsert statement without columns"));
    }

    let db_type = pool.database_type();
    let quoted_columns = columns
        .iter()
        .map(|column| quote_identifier(db_type, column))
        .collect::<Vec<String>>()
        .join(", ");

    let value_lists = rows
        .iter()
        .map(|row| {
            let rendered = columns
                .iter()
                .enumerate()
                .map(|(index, _)| value_to_sql_literal(db_type, row.get(index).unwrap_or(&Value::Null)))
                .collect::<Vec<String>>()
                .join(", ");
            format!("({})", rendered)
        })
        .collect::<Vec<String>>()
        .join(", ");

    let updatable: Vec<&str> = if update_columns.is_empty() {
        columns
            .iter()
            .copied()
            .filter(|column| !key_columns.contains(column))
            .collect()
    } else {
        update_columns.to_vec()
    };

    let mut statement = format!(
        "INSERT INTO {} ({}) VALUES {}",
        quote_identifier(db_type, table),
        quoted_columns,
        value_lists
    );

    match db_type {
        DatabaseType::MySql => {
            let assignments = updatable
                .iter()
                .map(|column| {
                    let quoted = quote_identifier(db_type, column);
                    format!("{} = VALUES({})", quoted, quoted)
                })
                .collect::<Vec<String>>()
                .join(", ");
            statement.push_str(" ON DUPLICATE KEY UPDATE ");
            statement.push_str(&assignments);
        }
        DatabaseType::Sqlite => {
            let conflict_keys = key_columns
                .iter()
                .map(|column| quote_identifier(db_type, column))
                .collect::<Vec<String>>()
                .join(", ");
            let assignments = updatable
                .iter()
                .map(|column| {
                    let quoted = quote_identifier(db_type, column);
                    format!("{} = excluded.{}", quoted, quoted)
                })
                .collect::<Vec<String>>()
                .join(", ");
            statement.push_str(&format!(
                " ON CONFLICT({}) DO UPDATE SET {}",
                conflict_keys, assignments
            ));
        }
    }

    pool.execute(&statement).await
}
