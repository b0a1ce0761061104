use crate::error::{MaintError, Result};
use std::path::PathBuf;

/// Runtime configuration shared by all commands. Values come from CLI flags
/// with environment fallbacks (`DATABASE_URL`, `TABLE_PREFIX`, `BASE_DIR`,
/// `MAIL_ENDPOINT`).
#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    pub database_url: Option<String>,
    pub table_prefix: Option<String>,
    pub base_dir: Option<PathBuf>,
    pub mail_endpoint: Option<String>,
}

impl AppConfig {
    pub fn from_sources(
        database_url: Option<String>,
        table_prefix: Option<String>,
        base_dir: Option<PathBuf>,
        mail_endpoint: Option<String>,
    ) -> Self {
        Self {
            database_url: database_url.or_else(|| env_non_empty("DATABASE_URL")),
            table_prefix: table_prefix.or_else(|| env_non_empty("TABLE_PREFIX")),
            base_dir: base_dir.or_else(|| env_non_empty("BASE_DIR").map(PathBuf::from)),
            mail_endpoint: mail_endpoint.or_else(|| env_non_empty("MAIL_ENDPOINT")),
        }
    }

    pub fn require_database_url(&self) -> Result<&str> {
        self.database_url
            .as_deref()
            .ok_or_else(|| MaintError::validation("Database URL is required. Pass --database-url or set DATABASE_URL."))
    }

    pub fn require_base_dir(&self) -> Result<&PathBuf> {
        self.base_dir
            .as_ref()
            .ok_or_else(|| MaintError::validation("Base directory is required. Pass --base-dir or set BASE_DIR."))
    }

    pub fn require_mail_endpoint(&self) -> Result<&str> {
        self.mail_endpoint
            .as_deref()
            .ok_or_else(|| MaintError::validation("Mail endpoint is required. Pass --mail-endpoint or set MAIL_ENDPOINT."))
    }
}

fn env_non_empty(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
