use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;

use crate::errors::MtError;
use crate::tenant::TenantContext;

/// Standard service methods: find, get, create, update, patch, remove.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServiceMethodKind {
    Find,
    Get,
    Create,
    Update,
    Patch,
    Remove,
}

impl ServiceMethodKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceMethodKind::Find => "find",
            ServiceMethodKind::Get => "get",
            ServiceMethodKind::Create => "create",
            ServiceMethodKind::Update => "update",
            ServiceMethodKind::Patch => "patch",
            ServiceMethodKind::Remove => "remove",
        }
    }
}

/// Which methods a service exposes. Transports mount only these.
#[derive(Debug, Clone)]
pub struct ServiceCapabilities {
    pub allowed_methods: Vec<ServiceMethodKind>,
}

impl ServiceCapabilities {
    pub fn standard_crud() -> Self {
        use ServiceMethodKind::*;
        Self {
            allowed_methods: vec![Find, Get, Create, Update, Patch, Remove],
        }
    }

    pub fn from_methods(methods: Vec<ServiceMethodKind>) -> Self {
        Self {
            allowed_methods: methods,
        }
    }

    pub fn allows(&self, method: ServiceMethodKind) -> bool {
        self.allowed_methods.contains(&method)
    }
}

/// Transport-neutral call parameters.
#[derive(Debug, Clone, Default)]
pub struct ServiceParams {
    pub query: HashMap<String, String>,
}

impl ServiceParams {
    pub fn param(&self, key: &str) -> Option<&str> {
        self.query.get(key).map(|v| v.as_str())
    }
}

/// A tenant-aware resource service.
///
/// Every method receives the request's bound [`TenantContext`]. Methods a
/// service does not override answer `MethodNotAllowed`.
#[async_trait]
pub trait TenantService<R>: Send + Sync
where
    R: Send + 'static,
{
    fn capabilities(&self) -> ServiceCapabilities {
        ServiceCapabilities::standard_crud()
    }

    async fn find(&self, _ctx: &TenantContext, _params: ServiceParams) -> Result<Vec<R>> {
        Err(not_implemented(ServiceMethodKind::Find))
    }

    async fn get(&self, _ctx: &TenantContext, _id: &str, _params: ServiceParams) -> Result<R> {
        Err(not_implemented(ServiceMethodKind::Get))
    }

    async fn create(&self, _ctx: &TenantContext, _data: R, _params: ServiceParams) -> Result<R> {
        Err(not_implemented(ServiceMethodKind::Create))
    }

    /// Replace an existing record.
    async fn update(
        &self,
        _ctx: &TenantContext,
        _id: &str,
        _data: R,
        _params: ServiceParams,
    ) -> Result<R> {
        Err(not_implemented(ServiceMethodKind::Update))
    }

    /// Partially update an existing record.
    async fn patch(
        &self,
        _ctx: &TenantContext,
        _id: &str,
        _data: R,
        _params: ServiceParams,
    ) -> Result<R> {
        Err(not_implemented(ServiceMethodKind::Patch))
    }

    async fn remove(&self, _ctx: &TenantContext, _id: &str, _params: ServiceParams) -> Result<R> {
        Err(not_implemented(ServiceMethodKind::Remove))
    }
}

fn not_implemented(method: ServiceMethodKind) -> anyhow::Error {
    MtError::method_not_allowed(format!("Method not implemented: {}", method.as_str())).into_anyhow()
}
