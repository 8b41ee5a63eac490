use std::path::Path;

use anyhow::{Context, Result};
use mt_core::{ConfigStore, TenancyConfig};

pub const ENV_PREFIX: &str = "MT__";
pub const TENANCY_FILE_VAR: &str = "MT_TENANCY_FILE";

/// Process settings: where to listen, and the tenancy section.
#[derive(Debug, Clone)]
pub struct Settings {
    pub host: String,
    pub port: u16,
    pub tenancy: TenancyConfig,
}

impl Settings {
    /// Defaults, then `MT__*` environment overrides, then the optional
    /// JSON tenancy file named by `MT_TENANCY_FILE`.
    pub fn load() -> Result<Self> {
        let mut store = defaults();
        store.load_env(ENV_PREFIX);
        let file = std::env::var(TENANCY_FILE_VAR).ok();
        Self::from_store(&store, file.as_deref().map(Path::new))
    }

    pub fn from_store(store: &ConfigStore, tenancy_file: Option<&Path>) -> Result<Self> {
        let host = store.get("http.host").unwrap_or("127.0.0.1").to_string();
        let port = store
            .get("http.port")
            .unwrap_or("3030")
            .parse::<u16>()
            .context("http.port must be a port number")?;

        let tenancy = match tenancy_file {
            Some(path) => {
                let raw = std::fs::read_to_string(path)
                    .with_context(|| format!("reading tenancy file {}", path.display()))?;
                TenancyConfig::from_json(&raw)
                    .with_context(|| format!("parsing tenancy file {}", path.display()))?
            }
            None => TenancyConfig::from_store(store),
        };

        Ok(Self { host, port, tenancy })
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

pub fn defaults() -> ConfigStore {
    let mut store = ConfigStore::new();
    store.set("http.host", "127.0.0.1");
    store.set("http.port", "3030");
    store.set("tenancy.header_name", "X-Tenant");
    store.set("tenancy.bypass_prefixes", "/swagger,/health");
    store
}
