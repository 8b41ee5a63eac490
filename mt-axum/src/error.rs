use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use mt_core::errors::{MtError, TenancyError};

#[derive(Debug)]
pub struct MtAxumError(pub anyhow::Error);

impl From<anyhow::Error> for MtAxumError {
    fn from(e: anyhow::Error) -> Self {
        Self(e)
    }
}

impl From<TenancyError> for MtAxumError {
    fn from(e: TenancyError) -> Self {
        Self(e.into_anyhow())
    }
}

impl From<MtError> for MtAxumError {
    fn from(e: MtError) -> Self {
        Self(e.into_anyhow())
    }
}

fn status(code: u16) -> StatusCode {
    StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}

impl IntoResponse for MtAxumError {
    fn into_response(self) -> Response {
        // Tenancy errors keep their own body shape, even when wrapped in context
        if let Some(tenancy) = self.0.chain().find_map(|e| e.downcast_ref::<TenancyError>()) {
            if tenancy.is_security_relevant() {
                tracing::warn!(security = true, error = %tenancy, "request refused");
            }
            return (status(tenancy.status_code()), Json(tenancy.to_json())).into_response();
        }

        if let Some(mt) = self.0.chain().find_map(|e| e.downcast_ref::<MtError>()) {
            let safe = mt.sanitize_for_client();
            return (status(safe.code()), Json(safe.to_json())).into_response();
        }

        tracing::error!(error = %self.0, "unhandled service error");
        let safe = MtError::general_error(self.0.to_string());
        (status(safe.code()), Json(safe.to_json())).into_response()
    }
}
