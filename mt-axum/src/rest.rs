use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::MethodRouter,
    Json, Router,
};
use mt_core::{MtError, ServiceMethodKind, ServiceParams, TenantService};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};

use crate::{MtAxumError, ServiceState, Tenant};

type QueryMap = Query<HashMap<String, String>>;

fn map_json_rejection(rejection: JsonRejection) -> MtAxumError {
    MtError::bad_request("Failed to parse the request body as JSON")
        .with_errors(json!({"_schema": [rejection.to_string()]}))
        .into()
}

fn params(query: HashMap<String, String>) -> ServiceParams {
    ServiceParams { query }
}

fn record_id<R: Serialize>(record: &R) -> Option<String> {
    match serde_json::to_value(record).ok()?.get("id")? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

async fn find<R>(
    State(state): State<ServiceState<R>>,
    Tenant(tenant): Tenant,
    Query(query): QueryMap,
) -> Result<Json<Vec<R>>, MtAxumError>
where
    R: Serialize + DeserializeOwned + Send + Sync + 'static,
{
    let res = state.service.find(&tenant, params(query)).await?;
    Ok(Json(res))
}

async fn create<R>(
    State(state): State<ServiceState<R>>,
    Tenant(tenant): Tenant,
    Query(query): QueryMap,
    data: Result<Json<R>, JsonRejection>,
) -> Result<Response, MtAxumError>
where
    R: Serialize + DeserializeOwned + Send + Sync + 'static,
{
    let Json(data) = data.map_err(map_json_rejection)?;
    let created = state.service.create(&tenant, data, params(query)).await?;

    let mut res = (StatusCode::CREATED, Json(&created)).into_response();
    if let Some(location) = record_id(&created)
        .and_then(|id| format!("{}/{id}", state.path).parse().ok())
    {
        res.headers_mut().insert(header::LOCATION, location);
    }
    Ok(res)
}

async fn get<R>(
    State(state): State<ServiceState<R>>,
    Tenant(tenant): Tenant,
    Query(query): QueryMap,
    Path(id): Path<String>,
) -> Result<Json<R>, MtAxumError>
where
    R: Serialize + DeserializeOwned + Send + Sync + 'static,
{
    let res = state.service.get(&tenant, &id, params(query)).await?;
    Ok(Json(res))
}

async fn update<R>(
    State(state): State<ServiceState<R>>,
    Tenant(tenant): Tenant,
    Query(query): QueryMap,
    Path(id): Path<String>,
    data: Result<Json<R>, JsonRejection>,
) -> Result<Json<R>, MtAxumError>
where
    R: Serialize + DeserializeOwned + Send + Sync + 'static,
{
    let Json(data) = data.map_err(map_json_rejection)?;
    let res = state.service.update(&tenant, &id, data, params(query)).await?;
    Ok(Json(res))
}

async fn patch<R>(
    State(state): State<ServiceState<R>>,
    Tenant(tenant): Tenant,
    Query(query): QueryMap,
    Path(id): Path<String>,
    data: Result<Json<R>, JsonRejection>,
) -> Result<Json<R>, MtAxumError>
where
    R: Serialize + DeserializeOwned + Send + Sync + 'static,
{
    let Json(data) = data.map_err(map_json_rejection)?;
    let res = state.service.patch(&tenant, &id, data, params(query)).await?;
    Ok(Json(res))
}

async fn remove<R>(
    State(state): State<ServiceState<R>>,
    Tenant(tenant): Tenant,
    Query(query): QueryMap,
    Path(id): Path<String>,
) -> Result<StatusCode, MtAxumError>
where
    R: Serialize + DeserializeOwned + Send + Sync + 'static,
{
    state.service.remove(&tenant, &id, params(query)).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// REST routes for a tenant service, limited to its capabilities:
///
/// - `GET /` → find, `POST /` → create (201)
/// - `GET|PUT|PATCH|DELETE /{id}` → get, update, patch, remove (204)
pub fn service_router<R>(path: &str, service: Arc<dyn TenantService<R>>) -> Router<()>
where
    R: Serialize + DeserializeOwned + Send + Sync + 'static,
{
    use ServiceMethodKind::*;

    let caps = service.capabilities();
    let state = ServiceState::new(path, service);

    let mut collection: MethodRouter<ServiceState<R>> = MethodRouter::new();
    if caps.allows(Find) {
        collection = collection.get(find::<R>);
    }
    if caps.allows(Create) {
        collection = collection.post(create::<R>);
    }

    let mut item: MethodRouter<ServiceState<R>> = MethodRouter::new();
    if caps.allows(Get) {
        item = item.get(get::<R>);
    }
    if caps.allows(Update) {
        item = item.put(update::<R>);
    }
    if caps.allows(Patch) {
        item = item.patch(patch::<R>);
    }
    if caps.allows(Remove) {
        item = item.delete(remove::<R>);
    }

    tracing::debug!(service = state.name(), methods = ?caps.allowed_methods, "mounting service");

    Router::new()
        .route("/", collection)
        .route("/{id}", item)
        .with_state(state)
}
