//! The tenant gate.
//!
//! Every request passes through [`resolve_tenant`] before any handler runs.
//! It either binds a fresh [`TenantContext`] into the request extensions or
//! answers with the tenancy error itself. Paths on the [`BypassList`] are
//! the only requests that reach handlers unbound.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::{HeaderMap, HeaderName};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use mt_core::config::{HEADER_NAME_KEY, TENANTS_SECTION};
use mt_core::{TenancyConfig, TenancyError, TenantContext, TenantRegistry};

use crate::MtAxumError;

/// Path prefixes that skip tenant resolution (docs, health checks).
///
/// Matching is per path segment: `/swagger` covers `/swagger` and
/// `/swagger/index.html` but not `/swaggerish`.
#[derive(Debug, Clone, Default)]
pub struct BypassList {
    prefixes: Vec<String>,
}

impl BypassList {
    pub fn new<I, S>(prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut list = Self::default();
        for raw in prefixes {
            let trimmed = raw.as_ref().trim().trim_end_matches('/');
            if trimmed.is_empty() {
                // "/" would open the whole gate
                tracing::warn!(prefix = raw.as_ref(), "ignoring empty bypass prefix");
                continue;
            }
            let prefix = if trimmed.starts_with('/') {
                trimmed.to_string()
            } else {
                format!("/{trimmed}")
            };
            if !list.prefixes.contains(&prefix) {
                list.prefixes.push(prefix);
            }
        }
        list
    }

    pub fn none() -> Self {
        Self::default()
    }

    pub fn prefixes(&self) -> &[String] {
        &self.prefixes
    }

    pub fn matches(&self, path: &str) -> bool {
        self.prefixes.iter().any(|prefix| {
            path.strip_prefix(prefix.as_str())
                .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
        })
    }
}

/// Outcome of a successful resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Allow-listed path; proceeds without a tenant.
    Bypass,
    Bound(TenantContext),
}

#[derive(Debug, Clone)]
pub struct TenantResolver {
    registry: Arc<TenantRegistry>,
    bypass: Arc<BypassList>,
    /// `None` when the configured name is not a valid HTTP header name.
    header: Option<HeaderName>,
}

impl TenantResolver {
    pub fn new(registry: Arc<TenantRegistry>, bypass: BypassList) -> Self {
        let header = match HeaderName::from_bytes(registry.header_name().as_bytes()) {
            Ok(name) => Some(name),
            Err(_) => {
                tracing::error!(header = registry.header_name(), "configured tenant header is not a valid header name");
                None
            }
        };
        Self {
            registry,
            bypass: Arc::new(bypass),
            header,
        }
    }

    pub fn from_config(config: &TenancyConfig) -> Self {
        Self::new(
            Arc::new(TenantRegistry::from_config(config)),
            BypassList::new(&config.bypass_prefixes),
        )
    }

    pub fn registry(&self) -> &TenantRegistry {
        &self.registry
    }

    pub fn bypass(&self) -> &BypassList {
        &self.bypass
    }

    /// Decide whether a request may proceed, and as which tenant.
    ///
    /// The bound id is the registry's own id, so the header value's casing
    /// never leaks into stored records.
    pub fn resolve(&self, path: &str, headers: &HeaderMap) -> Result<Resolution, TenancyError> {
        if self.bypass.matches(path) {
            return Ok(Resolution::Bypass);
        }

        if !self.registry.is_configured() {
            return Err(TenancyError::Configuration {
                expected_section: TENANTS_SECTION.to_string(),
            });
        }

        let Some(header) = &self.header else {
            return Err(TenancyError::Configuration {
                expected_section: HEADER_NAME_KEY.to_string(),
            });
        };
        let missing = || TenancyError::MissingTenantIdentifier {
            expected_header: self.registry.header_name().to_string(),
        };

        let mut values = headers.get_all(header).iter();
        let first = values.next().ok_or_else(missing)?;
        if values.next().is_some() {
            // sent twice: ambiguous
            return Err(TenancyError::UnknownTenant);
        }

        let claimed = first
            .to_str()
            .map_err(|_| TenancyError::UnknownTenant)?
            .trim();
        if claimed.is_empty() {
            return Err(missing());
        }

        let definition = self
            .registry
            .lookup(claimed)
            .filter(|d| !d.display_name.trim().is_empty())
            .ok_or(TenancyError::UnknownTenant)?;

        let mut ctx = TenantContext::unbound();
        ctx.bind(definition.id.as_str(), definition.display_name.as_str())?;
        Ok(Resolution::Bound(ctx))
    }
}

/// Axum middleware running [`TenantResolver::resolve`] once per request.
pub async fn resolve_tenant(
    State(resolver): State<TenantResolver>,
    mut req: Request,
    next: Next,
) -> Response {
    if req
        .extensions()
        .get::<TenantContext>()
        .is_some_and(TenantContext::is_bound)
    {
        tracing::error!(path = req.uri().path(), "tenant resolution ran twice for one request");
        return MtAxumError::from(TenancyError::ContextAlreadyBound).into_response();
    }

    match resolver.resolve(req.uri().path(), req.headers()) {
        Ok(Resolution::Bypass) => {
            tracing::trace!(path = req.uri().path(), "tenant resolution bypassed");
            next.run(req).await
        }
        Ok(Resolution::Bound(ctx)) => {
            if let Ok(id) = ctx.tenant_id() {
                tracing::debug!(tenant = %id, path = req.uri().path(), "tenant bound");
            }
            req.extensions_mut().insert(ctx);
            next.run(req).await
        }
        Err(err) => {
            match &err {
                TenancyError::Configuration { .. } => {
                    tracing::error!(error = %err, "tenancy is not configured")
                }
                _ => tracing::warn!(error = %err, path = req.uri().path(), "tenant resolution rejected"),
            }
            MtAxumError::from(err).into_response()
        }
    }
}
