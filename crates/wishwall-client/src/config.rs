//! Client configuration loaded from environment variables.
//!
//! Everything has a default so the wall runs in private mode with no
//! configuration at all.

use std::path::PathBuf;

use tracing::warn;
use wishwall_gateway::RestConfig;

const PLACEHOLDER_URL: &str = "YOUR_BACKEND_URL";
const PLACEHOLDER_KEY: &str = "YOUR_BACKEND_ANON_KEY";

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// SQLite file standing in for browser local storage.
    /// Env: `WISHWALL_DB_PATH`
    /// Default: `wishwall.db`
    pub db_path: PathBuf,

    /// Page address the room is resolved from.
    /// Env: `WISHWALL_PAGE_URL`
    /// Default: `http://localhost/`
    pub page_url: String,

    /// Env: `WISHWALL_BACKEND_URL`
    pub backend_url: Option<String>,

    /// Env: `WISHWALL_ANON_KEY`
    pub anon_key: Option<String>,

    /// Remote entries table.
    /// Env: `WISHWALL_TABLE`
    /// Default: `wishes`
    pub table: String,

    /// Name attached to wishes typed at the prompt.
    /// Env: `WISHWALL_NAME`
    pub wisher_name: String,

    /// Env: `WISHWALL_LOOKUP_IP` (true/false)
    /// Default: `true`
    pub lookup_ip: bool,
}

impl ClientConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        Self {
            db_path: PathBuf::from(non_empty("WISHWALL_DB_PATH").unwrap_or_else(|| "wishwall.db".into())),
            page_url: non_empty("WISHWALL_PAGE_URL").unwrap_or_else(|| "http://localhost/".into()),
            backend_url: non_empty("WISHWALL_BACKEND_URL"),
            anon_key: non_empty("WISHWALL_ANON_KEY"),
            table: non_empty("WISHWALL_TABLE").unwrap_or_else(|| "wishes".into()),
            wisher_name: lookup("WISHWALL_NAME").unwrap_or_default(),
            lookup_ip: non_empty("WISHWALL_LOOKUP_IP")
                .map(|v| !matches!(v.to_ascii_lowercase().as_str(), "false" | "0" | "no"))
                .unwrap_or(true),
        }
    }

    /// Remote backend settings, if credentials are present and not the
    /// template placeholders.
    pub fn remote(&self) -> Option<RestConfig> {
        let (url, key) = match (&self.backend_url, &self.anon_key) {
            (Some(url), Some(key)) if url != PLACEHOLDER_URL && key != PLACEHOLDER_KEY => (url, key),
            _ => return None,
        };

        match RestConfig::new(url, key, &self.table) {
            Ok(config) => Some(config),
            Err(e) => {
                warn!("Ignoring backend configuration: {}", e);
                None
            }
        }
    }
}
