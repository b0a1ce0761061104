// =====================================================
// MAINTENANCE OPERATIONS
// =====================================================
//
// One orchestrator per command. Shared parsing contracts and report types
// live here.

pub mod assign_attribute_set;
pub mod assign_category;
pub mod clean_static_files;
pub mod cleanup_super_attributes;
pub mod text_rewrite;
pub mod transactional_email;


use crate::error::{MaintError, Result};

/// `table:column` filter. Split on `:`; first token is the table, last token
/// is the column, tokens trimmed. This splitting rule is a contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableColumnFilter {
    pub table: String,
    pub column: String,
}

impl TableColumnFilter {
    pub fn parse(raw: &str) -> Result<Self> {
        let tokens: Vec<&str> = raw.split(':').map(str::trim).collect();
        if tokens.len() < 2
            || tokens.first().map_or(true, |t| t.is_empty())
            || tokens.last().map_or(true, |t| t.is_empty())
        {
            return Err(MaintError::validation(
                "DB table is required. DB table must be followed by a colon to indicate a column value, e.g. cms_block:content",
            ));
        }
        Ok(Self {
            table: tokens.first().unwrap().to_string(),
            column: tokens.last().unwrap().to_string(),
        })
    }
}

/// `search:::replace` filter for string replacement.
pub fn parse_search_replace(raw: &str) -> Result<(String, String)> {
    let mut parts = raw.splitn(2, ":::").map(str::trim);
    let search = parts.next().unwrap_or("").to_string();
    let replace = parts.next().unwrap_or("").to_string();
    if search.is_empty() {
        return Err(MaintError::validation(
            "String is required. Search and replacement must be separated by three colons, e.g. find string:::replace string",
        ));
    }
    Ok((search, replace))
}

/// Comma-separated identifier list.
pub fn parse_id_list(raw: &str) -> Result<Vec<i64>> {
    let mut ids = Vec::new();
    for token in raw.split(',') {
        let token = token.trim();
        if token.is_empty() {
            continue;
        }
        let id = token
            .parse::<i64>()
            .map_err(|_| MaintError::validation(format!("Invalid identifier: {}", token)))?;
        ids.push(id);
    }
    if ids.is_empty() {
        return Err(MaintError::validation("At least one identifier is required."));
    }
    Ok(ids)
}

/// Per-run outcome. A zero `processed` with zero `failed` is the
/// "nothing to process" case, reported distinctly from failure by callers.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpReport {
    pub processed: u64,
    pub failed: u64,
}

impl OpReport {
    pub fn is_noop(&self) -> bool {
        self.processed == 0 && self.failed == 0
    }
}
