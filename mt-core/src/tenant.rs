//! Core multi-tenant types.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::TenancyError;

/// A tenant identifier, as configured in the registry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TenantId(pub String);

impl TenantId {
    pub fn new<S: Into<String>>(id: S) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TenantId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// An entry of the tenant registry. Immutable for the life of the process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TenantDefinition {
    pub id: TenantId,
    pub display_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct BoundTenant {
    id: TenantId,
    name: String,
}

/// Request-scoped carrier of the resolved tenant identity.
///
/// Starts unbound. Only the tenant resolver binds it, and only once; reading
/// the identity of an unbound context is an error rather than an empty
/// string, so nothing downstream can silently run under "no tenant".
///
/// A context belongs to one request (or one unit of work). It is handed
/// down by reference and dropped with the request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TenantContext {
    bound: Option<BoundTenant>,
}

impl TenantContext {
    pub fn unbound() -> Self {
        Self { bound: None }
    }

    /// Create and bind in one step, for workers and tests that already
    /// know their tenant.
    pub fn bound<I, N>(id: I, name: N) -> Self
    where
        I: Into<String>,
        N: Into<String>,
    {
        Self {
            bound: Some(BoundTenant {
                id: TenantId(id.into()),
                name: name.into(),
            }),
        }
    }

    /// Bind the tenant identity. Fails if already bound.
    pub fn bind<I, N>(&mut self, id: I, name: N) -> Result<(), TenancyError>
    where
        I: Into<String>,
        N: Into<String>,
    {
        if self.bound.is_some() {
            return Err(TenancyError::ContextAlreadyBound);
        }
        self.bound = Some(BoundTenant {
            id: TenantId(id.into()),
            name: name.into(),
        });
        Ok(())
    }

    pub fn is_bound(&self) -> bool {
        self.bound.is_some()
    }

    pub fn tenant_id(&self) -> Result<&TenantId, TenancyError> {
        self.bound
            .as_ref()
            .map(|b| &b.id)
            .ok_or(TenancyError::ContextNotBound)
    }

    pub fn tenant_name(&self) -> Result<&str, TenancyError> {
        self.bound
            .as_ref()
            .map(|b| b.name.as_str())
            .ok_or(TenancyError::ContextNotBound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unbound_context_refuses_reads() {
        let ctx = TenantContext::unbound();
        assert!(!ctx.is_bound());
        assert_eq!(ctx.tenant_id(), Err(TenancyError::ContextNotBound));
        assert_eq!(ctx.tenant_name(), Err(TenancyError::ContextNotBound));
    }

    #[test]
    fn bind_happens_once() {
        let mut ctx = TenantContext::unbound();
        ctx.bind("acme", "Acme Corp").unwrap();
        assert_eq!(ctx.tenant_id().unwrap().as_str(), "acme");
        assert_eq!(ctx.tenant_name().unwrap(), "Acme Corp");

        let again = ctx.bind("globex", "Globex");
        assert_eq!(again, Err(TenancyError::ContextAlreadyBound));
        assert_eq!(ctx.tenant_id().unwrap().as_str(), "acme");
    }
}
