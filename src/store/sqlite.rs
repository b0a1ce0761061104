// =====================================================
// SQLITE SPECIFIC STORE OPERATIONS
// =====================================================

use crate::error::{MaintError, Result};
use crate::store::StoreRow;
use futures::StreamExt;
use serde_json::Value;
use sqlx::{Column, Pool, Row, Sqlite, ValueRef};

pub async fn create_sqlite_pool(url: &str) -> Result<Pool<Sqlite>> {
    // A single connection keeps in-memory databases coherent across queries.
    sqlx::sqlite::SqlitePoolOptions::new()
        .max_connections(1)
        .connect(url)
        .await
        .map_err(|e| MaintError::store(format!("Failed to connect to SQLite database: {}", e)))
}

pub(crate) async fn fetch_rows(pool: &Pool<Sqlite>, sql: &str) -> Result<Vec<StoreRow>> {
    let mut stream = sqlx::query(sql).fetch(pool);
    let mut rows = Vec::new();

    while let Some(result) = stream.next().await {
        let row = result.map_err(|e| MaintError::store(format!("Query failed: {}", e)))?;
        let mut decoded = StoreRow::new();
        for (index, column) in row.columns().iter().enumerate() {
            decoded.insert(column.name().to_string(), decode_cell(&row, index));
        }
        rows.push(decoded);
    }

    Ok(rows)
}

fn decode_cell(row: &sqlx::sqlite::SqliteRow, index: usize) -> Value {
    // NULL decodes into the target type's default otherwise.
    if matches!(row.try_get_raw(index), Ok(raw) if raw.is_null()) {
        return Value::Null;
    }
    if let Ok(v) = row.try_get::<String, _>(index) {
        Value::String(v)
    } else if let Ok(v) = row.try_get::<i64, _>(index) {
        serde_json::json!(v)
    } else if let Ok(v) = row.try_get::<f64, _>(index) {
        serde_json::json!(v)
    } else if let Ok(v) = row.try_get::<Vec<u8>, _>(index) {
        Value::String(String::from_utf8_lossy(&v).to_string())
    } else if let Ok(v) = row.try_get::<bool, _>(index) {
        Value::Bool(v)
    } else {
        Value::Null
    }
}
