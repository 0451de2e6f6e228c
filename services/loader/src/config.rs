//! Loader configuration from the environment (`.env` is read by `main`).

use anyhow::{bail, Context, Result};
use channels::discovery::DEFAULT_SUFFIX;
use std::path::PathBuf;

use crate::sink::MAX_PAGE_SIZE;

const DEFAULT_TABLE: &str = "measurements";
const DEFAULT_PAGE_SIZE: usize = 5000;
const DEFAULT_MAX_CONNECTIONS: u32 = 1;

#[derive(Debug, Clone)]
pub struct Config {
    /// Only required when the run writes to the database.
    pub db_url: Option<String>,
    pub log_root: PathBuf,
    pub log_suffix: String,
    pub measurements_table: String,
    pub upsert_page_size: usize,
    pub db_max_connections: u32,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let measurements_table = lookup("MEASUREMENTS_TABLE").unwrap_or_else(|| DEFAULT_TABLE.to_string());
        validate_table_name(&measurements_table)?;

        let upsert_page_size = match lookup("UPSERT_PAGE_SIZE") {
            Some(raw) => raw
                .trim()
                .parse::<usize>()
                .with_context(|| format!("UPSERT_PAGE_SIZE is not a number: {raw:?}"))?,
            None => DEFAULT_PAGE_SIZE,
        };

        let db_max_connections = match lookup("DB_MAX_CONNECTIONS") {
            Some(raw) => raw
                .trim()
                .parse::<u32>()
                .with_context(|| format!("DB_MAX_CONNECTIONS is not a number: {raw:?}"))?
                .max(1),
            None => DEFAULT_MAX_CONNECTIONS,
        };

        Ok(Self {
            db_url: lookup("DB_URL").filter(|url| !url.trim().is_empty()),
            log_root: PathBuf::from(lookup("LOG_ROOT").unwrap_or_else(|| ".".to_string())),
            log_suffix: lookup("LOG_SUFFIX").unwrap_or_else(|| DEFAULT_SUFFIX.to_string()),
            measurements_table,
            upsert_page_size: upsert_page_size.clamp(1, MAX_PAGE_SIZE),
            db_max_connections,
        })
    }

    pub fn require_db_url(&self) -> Result<&str> {
        self.db_url.as_deref().context("DB_URL env var missing")
    }
}

/// Accepts `name` or `schema.name` made of ASCII letters, digits and `_`.
///
/// The table name ends up inside SQL text, so anything else is refused.
fn validate_table_name(name: &str) -> Result<()> {
    let valid_part = |part: &str| {
        part.chars().next().is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
            && part.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
    };
    let parts: Vec<&str> = name.split('.').collect();
    if parts.len() > 2 || !parts.iter().all(|part| valid_part(part)) {
        bail!("MEASUREMENTS_TABLE is not a valid table name: {name:?}");
    }
    Ok(())
}
