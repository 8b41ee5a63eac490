use std::collections::HashMap;

use crate::config::TenancyConfig;
use crate::tenant::{TenantDefinition, TenantId};

/// The authoritative set of tenants, plus the header that names one.
///
/// Built once at startup and shared read-only (behind an `Arc`) by every
/// request. Lookups ignore case: keys are stored lower-cased, while the
/// definition keeps the id exactly as configured.
#[derive(Debug, Clone)]
pub struct TenantRegistry {
    header_name: String,
    definitions: HashMap<String, TenantDefinition>,
}

impl TenantRegistry {
    /// A registry with no tenants. `is_configured()` is false.
    pub fn empty() -> Self {
        Self {
            header_name: crate::config::DEFAULT_HEADER_NAME.to_string(),
            definitions: HashMap::new(),
        }
    }

    pub fn from_config(config: &TenancyConfig) -> Self {
        let mut registry = Self {
            header_name: config.effective_header_name().to_string(),
            definitions: HashMap::new(),
        };

        for (id, entry) in &config.tenants {
            let id = id.trim();
            if id.is_empty() {
                continue;
            }
            registry.definitions.insert(
                id.to_lowercase(),
                TenantDefinition {
                    id: TenantId::new(id),
                    display_name: entry.name.clone(),
                },
            );
        }

        registry
    }

    /// Look up a tenant by id, ignoring case.
    pub fn lookup(&self, id: &str) -> Option<&TenantDefinition> {
        self.definitions.get(&id.to_lowercase())
    }

    pub fn header_name(&self) -> &str {
        &self.header_name
    }

    /// False when no tenant is defined at all.
    pub fn is_configured(&self) -> bool {
        !self.definitions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

impl Default for TenantRegistry {
    fn default() -> Self {
        Self::empty()
    }
}
