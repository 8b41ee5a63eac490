use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use mt_core::{TenancyError, TenantContext};

use crate::MtAxumError;

/// The request's bound tenant.
///
/// Only available behind [`resolve_tenant`](crate::resolver::resolve_tenant);
/// a handler asking for it on a bypassed or unresolved request gets
/// `ContextNotBound`.
#[derive(Debug, Clone)]
pub struct Tenant(pub TenantContext);

impl<S> FromRequestParts<S> for Tenant
where
    S: Send + Sync,
{
    type Rejection = MtAxumError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<TenantContext>()
            .filter(|ctx| ctx.is_bound())
            .cloned()
            .map(Tenant)
            .ok_or_else(|| {
                tracing::error!(path = parts.uri.path(), "handler read the tenant before resolution");
                MtAxumError::from(TenancyError::ContextNotBound)
            })
    }
}
