use anyhow::{bail, Context, Result};
use std::path::PathBuf;
use std::time::Duration;

use crate::locales::LocaleCatalog;

#[derive(Debug, Clone)]
pub struct Config {
    // Change detection
    pub poll_interval: Duration,

    // Host document
    pub field_id: String,
    pub document_path: PathBuf,

    // Host locales
    pub locales: Vec<(String, String)>,
    pub default_locale: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            // Change detection
            poll_interval: Duration::from_millis(
                std::env::var("POLL_INTERVAL_MS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .filter(|ms: &u64| *ms > 0)
                    .unwrap_or(1000),
            ),

            // Host document
            field_id: std::env::var("SIDEBAR_FIELD_ID").unwrap_or_else(|_| "phrase".to_string()),
            document_path: std::env::var("SIDEBAR_DOCUMENT_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("data/entry.json")),

            // Host locales
            locales: parse_locales(
                &std::env::var("SIDEBAR_LOCALES").context("SIDEBAR_LOCALES not set")?,
            )?,
            default_locale: std::env::var("SIDEBAR_DEFAULT_LOCALE")
                .context("SIDEBAR_DEFAULT_LOCALE not set")?,
        })
    }

    /// Build the locale catalog for a session.
    pub fn catalog(&self) -> Result<LocaleCatalog> {
        LocaleCatalog::new(self.locales.clone(), &self.default_locale)
            .context("Invalid locale configuration")
    }
}

/// Parse `code=Name,code=Name` into ordered pairs.
fn parse_locales(raw: &str) -> Result<Vec<(String, String)>> {
    let mut locales = Vec::new();

    for entry in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let Some((code, name)) = entry.split_once('=') else {
            bail!("Invalid locale entry: '{}'. Expected code=Name", entry);
        };

        let code = code.trim();
        let name = name.trim();
        if code.is_empty() || name.is_empty() {
            bail!("Invalid locale entry: '{}'. Expected code=Name", entry);
        }

        locales.push((code.to_string(), name.to_string()));
    }

    Ok(locales)
}
