// =====================================================
// MySQL SPECIFIC STORE OPERATIONS
// =====================================================

use crate::error::{MaintError, Result};
use crate::store::StoreRow;
use futures::StreamExt;
use serde_json::Value;
use sqlx::{Column, MySql, Pool, Row, ValueRef};

pub async fn create_mysql_pool(url: &str) -> Result<Pool<MySql>> {
    sqlx::mysql::MySqlPoolOptions::new()
        .max_connections(5)
        .min_connections(1)
        .acquire_timeout(std::time::Duration::from_secs(10))
        .idle_timeout(std::time::Duration::from_secs(300))
        .max_lifetime(std::time::Duration::from_secs(1800))
        .connect(url)
        .await
        .map_err(|e| {
            let err_msg = e.to_string();
            if err_msg.contains("os error 111") {
                return MaintError::store(format!(
                    "Connection refused ({}). Check that MySQL is reachable.",
                    err_msg
                ));
            }
            MaintError::store(format!("Failed to create pool: {}", e))
        })
}

pub(crate) async fn fetch_rows(pool: &Pool<MySql>, sql: &str) -> Result<Vec<StoreRow>> {
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

fn decode_cell(row: &sqlx::mysql::MySqlRow, index: usize) -> Value {
    if matches!(row.try_get_raw(index), Ok(raw) if raw.is_null()) {
        return Value::Null;
    }
    if let Ok(v) = row.try_get::<i64, _>(index) {
        serde_json::json!(v)
    } else if let Ok(v) = row.try_get::<u64, _>(index) {
        serde_json::json!(v)
    } else if let Ok(v) = row.try_get::<f64, _>(index) {
        serde_json::json!(v)
    } else if let Ok(v) = row.try_get::<String, _>(index) {
        Value::String(v)
    } else if let Ok(v) = row.try_get::<Vec<u8>, _>(index) {
        Value::String(String::from_utf8_lossy(&v).to_string())
    } else if let Ok(v) = row.try_get::<bool, _>(index) {
        Value::Bool(v)
    } else {
        Value::Null
    }
}
