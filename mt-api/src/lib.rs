pub mod app;
pub mod services;

use axum::routing::get;
use axum::Json;
use mt_axum::{MtAxumError, Tenant, TenantApp};
use mt_core::{TenancyConfig, TenantDataSource};
use serde_json::{json, Value};

pub use app::Settings;
pub use services::TodoItem;

/// Build the API over a fresh in-memory store.
pub fn build(tenancy: &TenancyConfig) -> TenantApp {
    build_with_source(tenancy, services::memory_source())
}

pub fn build_with_source(tenancy: &TenancyConfig, source: TenantDataSource<TodoItem>) -> TenantApp {
    let svcs = services::configure(source);

    TenantApp::from_config(tenancy)
        .use_service("/todos", svcs.todos)
        .route("/whoami", get(whoami))
        .route("/health", get(|| async { "ok" }))
}

async fn whoami(Tenant(tenant): Tenant) -> Result<Json<Value>, MtAxumError> {
    Ok(Json(json!({
        "tenantId": tenant.tenant_id()?.as_str(),
        "tenantName": tenant.tenant_name()?,
    })))
}
