//! # Errors
//!
//! Two families of errors flow through the tenant isolation layer:
//!
//! - [`TenancyError`]: the isolation taxonomy. Configuration faults, caller
//!   faults while resolving a tenant, programmer errors around the request
//!   context, and security refusals on the write path. Each kind carries its
//!   own status and response body.
//! - [`MtError`]: structured errors (name, code, className) for ordinary service
//!   outcomes (not found, bad request, ...).
//!
//! Both can be carried through `anyhow::Error` and are recovered by
//! downcasting at the transport edge.

use std::fmt;

use anyhow::Error as AnyError;
use serde_json::{json, Value};
use thiserror::Error;

/// Error class names + status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    BadRequest,       // 400
    Forbidden,        // 403
    NotFound,         // 404
    MethodNotAllowed, // 405
    Conflict,         // 409
    GeneralError,     // 500
}

impl ErrorKind {
    pub fn status_code(&self) -> u16 {
        match self {
            ErrorKind::BadRequest => 400,
            ErrorKind::Forbidden => 403,
            ErrorKind::NotFound => 404,
            ErrorKind::MethodNotAllowed => 405,
            ErrorKind::Conflict => 409,
            ErrorKind::GeneralError => 500,
        }
    }

    /// Error `name` (e.g. "NotFound")
    pub fn name(&self) -> &'static str {
        match self {
            ErrorKind::BadRequest => "BadRequest",
            ErrorKind::Forbidden => "Forbidden",
            ErrorKind::NotFound => "NotFound",
            ErrorKind::MethodNotAllowed => "MethodNotAllowed",
            ErrorKind::Conflict => "Conflict",
            ErrorKind::GeneralError => "GeneralError",
        }
    }

    /// Error `className` (kebab-cased)
    pub fn class_name(&self) -> &'static str {
        match self {
            ErrorKind::BadRequest => "bad-request",
            ErrorKind::Forbidden => "forbidden",
            ErrorKind::NotFound => "not-found",
            ErrorKind::MethodNotAllowed => "method-not-allowed",
            ErrorKind::Conflict => "conflict",
            ErrorKind::GeneralError => "general-error",
        }
    }
}

/// Failures of the tenant isolation layer.
///
/// Resolution failures (`Configuration`, `MissingTenantIdentifier`,
/// `UnknownTenant`) short-circuit a request before any handler runs.
/// Write-path failures (`TenantContextUnbound`, `CrossTenantWriteBlocked`)
/// abort the whole pending batch.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TenancyError {
    /// Tenancy configuration is absent or empty. Server-side fault.
    #[error("Tenancy configuration is missing or invalid")]
    Configuration { expected_section: String },

    /// The request carried no usable tenant header.
    #[error("Tenant ID is required")]
    MissingTenantIdentifier { expected_header: String },

    /// The claimed tenant is not registered. Never says which ones are.
    #[error("Unknown Tenant")]
    UnknownTenant,

    /// Tenant identity was read before resolution ran.
    #[error("Tenant context is not bound")]
    ContextNotBound,

    /// `bind` was called on a context that is already bound.
    #[error("Tenant context is already bound")]
    ContextAlreadyBound,

    /// A commit was attempted without a bound tenant.
    #[error("TenantContext not set. Refusing to write.")]
    TenantContextUnbound,

    /// A write would touch a record owned by another tenant.
    #[error("Cross-tenant write blocked.")]
    CrossTenantWriteBlocked,
}

impl TenancyError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            TenancyError::MissingTenantIdentifier { .. } => ErrorKind::BadRequest,
            TenancyError::UnknownTenant => ErrorKind::NotFound,
            TenancyError::CrossTenantWriteBlocked => ErrorKind::Forbidden,
            TenancyError::Configuration { .. }
            | TenancyError::ContextNotBound
            | TenancyError::ContextAlreadyBound
            | TenancyError::TenantContextUnbound => ErrorKind::GeneralError,
        }
    }

    pub fn status_code(&self) -> u16 {
        self.kind().status_code()
    }

    /// True for refusals the surrounding system should log as security events.
    pub fn is_security_relevant(&self) -> bool {
        matches!(self, TenancyError::CrossTenantWriteBlocked)
    }

    /// Machine-checkable response body.
    pub fn to_json(&self) -> Value {
        match self {
            TenancyError::Configuration { expected_section } => json!({
                "error": self.to_string(),
                "expectedSection": expected_section,
            }),
            TenancyError::MissingTenantIdentifier { expected_header } => json!({
                "error": self.to_string(),
                "expectedHeader": expected_header,
                "example": format!("{expected_header}: acme"),
            }),
            _ => json!({ "error": self.to_string() }),
        }
    }

    pub fn into_anyhow(self) -> AnyError {
        AnyError::new(self)
    }
}

/// A structured service error that can live inside `anyhow::Error`.
#[derive(Debug)]
pub struct MtError {
    pub kind: ErrorKind,
    pub message: String,
    pub errors: Option<Value>,
    pub source: Option<AnyError>,
}

impl MtError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            errors: None,
            source: None,
        }
    }

    pub fn with_errors(mut self, errors: Value) -> Self {
        self.errors = Some(errors);
        self
    }

    pub fn with_source(mut self, source: AnyError) -> Self {
        self.source = Some(source);
        self
    }

    pub fn code(&self) -> u16 {
        self.kind.status_code()
    }

    pub fn name(&self) -> &'static str {
        self.kind.name()
    }

    pub fn class_name(&self) -> &'static str {
        self.kind.class_name()
    }

    /// Convert into `anyhow::Error` so it flows through service calls.
    pub fn into_anyhow(self) -> AnyError {
        AnyError::new(self)
    }

    /// Downcast an `anyhow::Error` to an `MtError` if possible.
    pub fn from_anyhow(err: &AnyError) -> Option<&MtError> {
        err.downcast_ref::<MtError>()
    }

    /// Copy suitable for returning to clients (drops `source`).
    pub fn sanitize_for_client(&self) -> MtError {
        MtError {
            kind: self.kind,
            message: self.message.clone(),
            errors: self.errors.clone(),
            source: None,
        }
    }

    pub fn to_json(&self) -> Value {
        let mut base = json!({
            "name": self.name(),
            "message": self.message,
            "code": self.code(),
            "className": self.class_name(),
        });

        if let Some(e) = &self.errors {
            base["errors"] = e.clone();
        }
        base
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::BadRequest, msg)
    }
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, msg)
    }
    pub fn method_not_allowed(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::MethodNotAllowed, msg)
    }
    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Conflict, msg)
    }
    pub fn general_error(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::GeneralError, msg)
    }
}

impl fmt::Display for MtError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): {}", self.name(), self.code(), self.message)
    }
}

impl std::error::Error for MtError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

/// Convenience helper for "bail with MtError".
#[macro_export]
macro_rules! bail_mt {
    ($ctor:ident, $msg:expr) => {
        return Err($crate::errors::MtError::$ctor($msg).into_anyhow());
    };
    ($ctor:ident, $fmt:expr, $($arg:tt)*) => {
        return Err($crate::errors::MtError::$ctor(format!($fmt, $($arg)*)).into_anyhow());
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_identifier_body_names_the_header() {
        let err = TenancyError::MissingTenantIdentifier {
            expected_header: "X-Tenant".to_string(),
        };
        assert_eq!(err.status_code(), 400);
        let body = err.to_json();
        assert_eq!(body["error"], "Tenant ID is required");
        assert_eq!(body["expectedHeader"], "X-Tenant");
        assert_eq!(body["example"], "X-Tenant: acme");
    }

    #[test]
    fn unknown_tenant_body_only_has_error() {
        let body = TenancyError::UnknownTenant.to_json();
        assert_eq!(body, json!({ "error": "Unknown Tenant" }));
        assert_eq!(TenancyError::UnknownTenant.status_code(), 404);
    }

    #[test]
    fn client_copy_drops_the_source() {
        let err = MtError::bad_request("Invalid payload")
            .with_errors(json!({ "_schema": ["missing field"] }))
            .with_source(anyhow::anyhow!("serde detail"));
        assert!(std::error::Error::source(&err).is_some());

        let safe = err.sanitize_for_client();
        assert!(safe.source.is_none());
        assert_eq!(
            safe.to_json(),
            json!({
                "name": "BadRequest",
                "message": "Invalid payload",
                "code": 400,
                "className": "bad-request",
                "errors": { "_schema": ["missing field"] },
            })
        );
    }
}
