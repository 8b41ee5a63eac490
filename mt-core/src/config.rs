//! # Configuration
//!
//! Two layers:
//!
//! - [`ConfigStore`]: a flat string key/value store (`set` / `get`), with
//!   environment overrides. `MT__HTTP__PORT=8080` becomes `http.port`.
//! - [`TenancyConfig`]: the typed tenancy section, read either from JSON
//!   or from the `tenancy.*` keys of a [`ConfigStore`].
//!
//! ```rust
//! use mt_core::{ConfigStore, TenancyConfig};
//!
//! let mut store = ConfigStore::new();
//! store.set("tenancy.header_name", "X-Tenant");
//! store.set("tenancy.tenants.acme.name", "Acme Corp");
//!
//! let tenancy = TenancyConfig::from_store(&store);
//! assert_eq!(tenancy.tenants["acme"].name, "Acme Corp");
//! ```
//!
//! The JSON shape mirrors the store keys:
//!
//! ```json
//! {
//!   "headerName": "X-Tenant",
//!   "tenants": { "acme": { "name": "Acme Corp" } },
//!   "bypassPrefixes": ["/swagger"]
//! }
//! ```

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

pub const DEFAULT_HEADER_NAME: &str = "X-Tenant";

/// Section reported to callers when the tenant set is missing.
pub const TENANTS_SECTION: &str = "tenancy.tenants";

/// Key reported when the configured header name is not a valid HTTP header.
pub const HEADER_NAME_KEY: &str = "tenancy.header_name";

const TENANTS_KEY_PREFIX: &str = "tenancy.tenants.";

#[derive(Debug, Default)]
pub struct ConfigStore {
    values: HashMap<String, String>,
}

impl ConfigStore {
    pub fn new() -> Self {
        Self {
            values: HashMap::new(),
        }
    }

    /// Set a configuration key to a string value.
    pub fn set<K, V>(&mut self, key: K, value: V)
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.values.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(|s| s.as_str())
    }

    /// Keys starting with `prefix`, with their values.
    pub fn with_prefix<'a>(&'a self, prefix: &'a str) -> impl Iterator<Item = (&'a str, &'a str)> + 'a {
        self.values
            .iter()
            .filter(move |(k, _)| k.starts_with(prefix))
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Apply overrides from the process environment.
    pub fn load_env(&mut self, prefix: &str) {
        self.load_vars(prefix, std::env::vars());
    }

    /// Apply `PREFIX__A__B=value` pairs as `a.b = value`.
    pub fn load_vars<I>(&mut self, prefix: &str, vars: I)
    where
        I: IntoIterator<Item = (String, String)>,
    {
        for (key, value) in vars {
            if let Some(stripped) = key.strip_prefix(prefix) {
                let normalized = stripped.to_lowercase().replace("__", ".");
                self.set(normalized, value);
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantEntry {
    #[serde(default)]
    pub name: String,
}

/// The tenancy section: which header carries the tenant, which tenants
/// exist, and which path prefixes skip resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TenancyConfig {
    #[serde(default = "default_header_name")]
    pub header_name: String,
    #[serde(default)]
    pub tenants: BTreeMap<String, TenantEntry>,
    #[serde(default = "default_bypass_prefixes")]
    pub bypass_prefixes: Vec<String>,
}

fn default_header_name() -> String {
    DEFAULT_HEADER_NAME.to_string()
}

fn default_bypass_prefixes() -> Vec<String> {
    vec!["/swagger".to_string()]
}

impl Default for TenancyConfig {
    fn default() -> Self {
        Self {
            header_name: default_header_name(),
            tenants: BTreeMap::new(),
            bypass_prefixes: default_bypass_prefixes(),
        }
    }
}

impl TenancyConfig {
    pub fn from_json(raw: &str) -> anyhow::Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Read `tenancy.header_name`, `tenancy.tenants.<id>.name` and
    /// `tenancy.bypass_prefixes` (comma separated).
    pub fn from_store(store: &ConfigStore) -> Self {
        let mut config = Self::default();

        if let Some(header) = store.get(HEADER_NAME_KEY) {
            config.header_name = header.to_string();
        }

        for (key, value) in store.with_prefix(TENANTS_KEY_PREFIX) {
            let Some(rest) = key.strip_prefix(TENANTS_KEY_PREFIX) else {
                continue;
            };
            if let Some(id) = rest.strip_suffix(".name") {
                if !id.is_empty() {
                    config.tenants.insert(
                        id.to_string(),
                        TenantEntry {
                            name: value.to_string(),
                        },
                    );
                }
            }
        }

        if let Some(raw) = store.get("tenancy.bypass_prefixes") {
            config.bypass_prefixes = raw
                .split(',')
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(str::to_string)
                .collect();
        }

        config
    }

    /// Header name with the blank case falling back to `X-Tenant`.
    pub fn effective_header_name(&self) -> &str {
        let trimmed = self.header_name.trim();
        if trimmed.is_empty() {
            DEFAULT_HEADER_NAME
        } else {
            trimmed
        }
    }

    pub fn with_tenant(mut self, id: impl Into<String>, name: impl Into<String>) -> Self {
        self.tenants.insert(id.into(), TenantEntry { name: name.into() });
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_vars_map_to_dotted_keys() {
        let mut store = ConfigStore::new();
        store.load_vars(
            "MT__",
            vec![
                ("MT__HTTP__PORT".to_string(), "8080".to_string()),
                ("MT__TENANCY__TENANTS__ACME__NAME".to_string(), "Acme Corp".to_string()),
                ("OTHER__HTTP__PORT".to_string(), "1".to_string()),
            ],
        );

        assert_eq!(store.get("http.port"), Some("8080"));
        assert_eq!(store.get("other.http.port"), None);

        let tenancy = TenancyConfig::from_store(&store);
        assert_eq!(tenancy.tenants["acme"].name, "Acme Corp");
        assert_eq!(tenancy.header_name, "X-Tenant");
        assert_eq!(tenancy.bypass_prefixes, vec!["/swagger".to_string()]);
    }

    #[test]
    fn json_uses_camel_case_and_defaults() {
        let cfg = TenancyConfig::from_json(r#"{"tenants":{"acme":{"name":"Acme Corp"}}}"#).unwrap();
        assert_eq!(cfg.effective_header_name(), "X-Tenant");
        assert_eq!(cfg.bypass_prefixes, vec!["/swagger".to_string()]);

        let cfg = TenancyConfig::from_json(
            r#"{"headerName":"  ","tenants":{},"bypassPrefixes":["/docs","/swagger"]}"#,
        )
        .unwrap();
        assert_eq!(cfg.effective_header_name(), "X-Tenant");
        assert_eq!(cfg.bypass_prefixes.len(), 2);
    }

    #[test]
    fn store_bypass_list_is_comma_separated() {
        let mut store = ConfigStore::new();
        store.set("tenancy.bypass_prefixes", "/swagger, /health,");
        let cfg = TenancyConfig::from_store(&store);
        assert_eq!(cfg.bypass_prefixes, vec!["/swagger".to_string(), "/health".to_string()]);
    }
}
