// =====================================================
// RUNTIME SCHEMA INTROSPECTION
// =====================================================

#[cfg(test)]
mod tests;

use crate::error::{MaintError, Result};
use crate::store::{quote_identifier, DatabaseType, StorePool};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnDescriptor {
    pub name: String,
    /// Backend/storage type, e.g. `int`, `varchar`, `decimal`. Used to
    /// resolve EAV value tables.
    pub data_type: String,
    pub is_primary: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableDescriptor {
    pub table: String,
    pub columns: Vec<ColumnDescriptor>,
}

impl TableDescriptor {
    /// The single primary-key column. A table with no primary column or a
    /// composite key is not usable by the rewrite engine.
    pub fn primary_key(&self) -> Result<&ColumnDescriptor> {
        let mut primaries = self.columns.iter().filter(|column| column.is_primary);
        let first = primaries
            .next()
            .ok_or_else(|| MaintError::Schema("Could not allocate primary column name.".to_string()))?;
        if primaries.next().is_some() {
            return Err(MaintError::Schema(format!(
                "Table {} has a composite primary key.",
                self.table
            )));
        }
        Ok(first)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|column| column.name == name)
    }
}

/// Describes a physical table, including which column is the primary key.
pub async fn describe(pool: &StorePool, table: &str) -> Result<TableDescriptor> {
    let columns = match pool.database_type() {
        DatabaseType::MySql => describe_mysql(pool, table).await?,
        DatabaseType::Sqlite => describe_sqlite(pool, table).await?,
    };

    if columns.is_empty() {
        return Err(MaintError::Schema(format!("Table {} does not exist.", table)));
    }

    Ok(TableDescriptor {
        table: table.to_string(),
        columns,
    })
}

async fn describe_mysql(pool: &StorePool, table: &str) -> Result<Vec<ColumnDescriptor>> {
    let query = format!(
        "SHOW COLUMNS FROM {}",
        quote_identifier(DatabaseType::MySql, table)
    );
    let rows = pool
        .fetch_rows(&query)
        .await
        .map_err(|e| MaintError::Schema(format!("Failed to fetch table schema: {}", e)))?;

    let mut columns = Vec::new();
    for row in rows {
        let name = row
            .get("Field")
            .map(crate::store::value_to_text)
            .unwrap_or_default();
        let full_type = row
            .get("Type")
            .map(crate::store::value_to_text)
            .unwrap_or_default();
        let column_key = row
            .get("Key")
            .map(crate::store::value_to_text)
            .unwrap_or_default();

        let data_type = full_type
            .split('(')
            .next()
            .unwrap_or(&full_type)
            .to_string();

        columns.push(ColumnDescriptor {
            name,
            data_type,
            is_primary: column_key == "PRI",
        });
    }

    Ok(columns)
}

async fn describe_sqlite(pool: &StorePool, table: &str) -> Result<Vec<ColumnDescriptor>> {
    let query = format!(
        "PRAGMA table_info({})",
        quote_identifier(DatabaseType::Sqlite, table)
    );
    let rows = pool
        .fetch_rows(&query)
        .await
        .map_err(|e| MaintError::Schema(format!("Failed to fetch table schema: {}", e)))?;

    let mut columns = Vec::new();
    for row in rows {
        let name = row
            .get("name")
            .map(crate::store::value_to_text)
            .unwrap_or_default();
        let data_type = row
            .get("type")
            .map(crate::store::value_to_text)
            .unwrap_or_default()
            .to_ascii_lowercase();
        let pk = row
            .get("pk")
            .and_then(crate::store::value_to_i64)
            .unwrap_or(0);

        columns.push(ColumnDescriptor {
            name,
            data_type,
            is_primary: pk > 0,
        });
    }

    Ok(columns)
}
