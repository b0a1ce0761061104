// =====================================================
// RELATIONAL STORE ACCESS
// =====================================================
//
// The production backend is MySQL (the commerce catalog schema); SQLite is
// the local/test backend. Statements are built as SQL text with escaped
// literals and dispatched per backend.

mod mysql;
mod sqlite;

#[cfg(test)]
mod tests;

use crate::error::{MaintError, Result};
use serde_json::Value;
use sqlx::{MySql, Pool, Sqlite};

pub use mysql::create_mysql_pool;
pub use sqlite::create_sqlite_pool;

/// One result row: column name to raw value, in select order.
pub type StoreRow = serde_json::Map<String, Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatabaseType {
    MySql,
    Sqlite,
}

impl DatabaseType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DatabaseType::MySql => "mysql",
            DatabaseType::Sqlite => "sqlite",
        }
    }
}

/// Maps logical table names to physical ones. Installations that prefix
/// their tables configure the prefix once; everything else goes through
/// unchanged.
#[derive(Debug, Clone, Default)]
pub struct TableResolver {
    prefix: Option<String>,
}

impl TableResolver {
    pub fn new(prefix: Option<String>) -> Self {
        Self {
            prefix: prefix
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty()),
        }
    }

    pub fn resolve(&self, logical_name: &str) -> String {
        match &self.prefix {
            Some(prefix) => format!("{}{}", prefix, logical_name),
            None => logical_name.to_string(),
        }
    }
}

/// Connection pool to one of the supported backends.
#[derive(Debug, Clone)]
pub enum StorePool {
    MySql(Pool<MySql>),
    Sqlite(Pool<Sqlite>),
}

impl StorePool {
    /// Connects by URL scheme: `mysql://...` or `sqlite:...`.
    pub async fn connect(url: &str) -> Result<Self> {
        let trimmed = url.trim();
        if trimmed.starts_with("sqlite:") {
            Ok(StorePool::Sqlite(create_sqlite_pool(trimmed).await?))
        } else if trimmed.starts_with("mysql://") {
            Ok(StorePool::MySql(create_mysql_pool(trimmed).await?))
        } else {
            Err(MaintError::validation(format!(
                "Unsupported database URL scheme: {}",
                trimmed
            )))
        }
    }

    pub fn database_type(&self) -> DatabaseType {
        match self {
            StorePool::MySql(_) => DatabaseType::MySql,
            StorePool::Sqlite(_) => DatabaseType::Sqlite,
        }
    }

    /// Runs a statement and returns the affected-row count.
    pub async fn execute(&self, sql: &str) -> Result<u64> {
        match self {
            StorePool::MySql(pool) => sqlx::query(sql)
                .execute(pool)
                .await
                .map(|done| done.rows_affected())
                .map_err(|e| MaintError::store(format!("Statement failed: {}", e))),
            StorePool::Sqlite(pool) => sqlx::query(sql)
                .execute(pool)
                .await
                .map(|done| done.rows_affected())
                .map_err(|e| MaintError::store(format!("Statement failed: {}", e))),
        }
    }

    /// Streams a result set into name → value rows.
    pub async fn fetch_rows(&self, sql: &str) -> Result<Vec<StoreRow>> {
        match self {
            StorePool::MySql(pool) => mysql::fetch_rows(pool, sql).await,
            StorePool::Sqlite(pool) => sqlite::fetch_rows(pool, sql).await,
        }
    }

    /// Fetches the first column of every row as an integer, skipping values
    /// that do not parse.
    pub async fn fetch_id_column(&self, sql: &str) -> Result<Vec<i64>> {
        let rows = self.fetch_rows(sql).await?;
        Ok(rows
            .iter()
            .filter_map(|row| row.values().next().and_then(value_to_i64))
            .collect())
    }

    /// Fetches at most one row.
    pub async fn fetch_optional(&self, sql: &str) -> Result<Option<StoreRow>> {
        let mut rows = self.fetch_rows(sql).await?;
        if rows.len() > 1 {
            rows.truncate(1);
        }
        Ok(rows.pop())
    }
}

pub fn quote_identifier(db_type: DatabaseType, name: &str) -> String {
    match db_type {
        DatabaseType::MySql => format!("`{}`", name.replace('`', "``")),
        DatabaseType::Sqlite => format!("\"{}\"", name.replace('"', "\"\"")),
    }
}

/// Escapes a string for embedding in a single-quoted literal. MySQL treats
/// backslash as an escape character; SQLite takes it literally, so only
/// quote doubling applies there.
pub fn escape_sql_string(db_type: DatabaseType, value: &str) -> String {
    match db_type {
        DatabaseType::MySql => value.replace('\\', "\\\\").replace('\'', "''"),
        DatabaseType::Sqlite => value.replace('\'', "''"),
    }
}

pub fn value_to_sql_literal(db_type: DatabaseType, value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::Bool(v) => {
            if *v {
                "1".to_string()
            } else {
                "0".to_string()
            }
        }
        Value::Number(num) => num.to_string(),
        Value::String(s) => format!("'{}'", escape_sql_string(db_type, s)),
        other => format!("'{}'", escape_sql_string(db_type, &other.to_string())),
    }
}

pub fn value_to_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(raw) => raw.clone(),
        Value::Bool(v) => {
            if *v {
                "true".to_string()
            } else {
                "false".to_string()
            }
        }
        Value::Number(number) => number.to_string(),
        other => other.to_string(),
    }
}

pub fn value_to_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(number) => number.as_i64(),
        Value::String(raw) => raw.trim().parse::<i64>().ok(),
        _ => None,
    }
}

/// Renders an `IN (...)` list for a set of integer identifiers.
pub fn id_list(ids: &[i64]) -> String {
    ids.iter()
        .map(|id| id.to_string())
        .collect::<Vec<String>>()
        .join(", ")
}
