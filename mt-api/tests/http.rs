use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use mt_api::services::{memory_source, TodoItem};
use mt_api::{build, build_with_source};
use mt_core::{TenancyConfig, TenancyError, TenantContext};
use serde_json::{json, Value};
use tower::ServiceExt;

fn tenancy() -> TenancyConfig {
    let mut cfg = TenancyConfig::from_json(
        r#"{"headerName":"X-Tenant","tenants":{"acme":{"name":"Acme Corp"},"acme2":{"name":"Acme Two"}}}"#,
    )
    .unwrap();
    cfg.bypass_prefixes.push("/health".to_string());
    cfg
}

fn router() -> Router {
    build(&tenancy()).into_router()
}

async fn json_body(res: axum::response::Response) -> Value {
    let bytes = res.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn send(router: &Router, method: &str, uri: &str, tenant: Option<&str>, body: Option<Value>) -> axum::response::Response {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(t) = tenant {
        builder = builder.header("X-Tenant", t);
    }
    let body = match body {
        Some(v) => {
            builder = builder.header("content-type", "application/json");
            Body::from(v.to_string())
        }
        None => Body::empty(),
    };
    router.clone().oneshot(builder.body(body).unwrap()).await.unwrap()
}

async fn create_todo(router: &Router, tenant: &str, title: &str) -> Value {
    let res = send(router, "POST", "/todos", Some(tenant), Some(json!({ "title": title }))).await;
    assert_eq!(res.status(), StatusCode::CREATED);
    json_body(res).await
}

#[tokio::test]
async fn health_is_bypassed() {
    let res = send(&router(), "GET", "/health", None, None).await;
    assert_eq!(res.status(), StatusCode::OK);
    let bytes = res.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(std::str::from_utf8(&bytes).unwrap(), "ok");
}

#[tokio::test]
async fn request_without_tenant_header_is_rejected() {
    let res = send(&router(), "GET", "/todos", None, None).await;

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body = json_body(res).await;
    assert_eq!(body["error"], "Tenant ID is required");
    assert_eq!(body["expectedHeader"], "X-Tenant");
}

#[tokio::test]
async fn unregistered_tenant_is_rejected() {
    let res = send(&router(), "GET", "/todos", Some("globex"), None).await;

    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(json_body(res).await, json!({ "error": "Unknown Tenant" }));
}

#[tokio::test]
async fn client_supplied_tenant_is_overwritten_on_create() {
    let router = router();
    let res = send(
        &router,
        "POST",
        "/todos",
        Some("acme"),
        Some(json!({ "title": "Ship it", "tenantId": "globex" })),
    )
    .await;

    assert_eq!(res.status(), StatusCode::CREATED);
    let location = res.headers().get("location").unwrap().to_str().unwrap().to_string();
    let body = json_body(res).await;
    assert_eq!(body["tenantId"], "acme");
    assert_eq!(body["title"], "Ship it");
    assert_eq!(body["isDone"], json!(false));
    assert_eq!(location, format!("/todos/{}", body["id"].as_str().unwrap()));
}

#[tokio::test]
async fn cross_tenant_delete_is_blocked_and_record_survives() {
    let source = memory_source();
    let router = build_with_source(&tenancy(), source.clone()).into_router();
    let created = create_todo(&router, "acme", "Keep me").await;
    let id = created["id"].as_str().unwrap().to_string();

    // A record obtained under acme, persisted under acme2.
    let acme = TenantContext::bound("acme", "Acme Corp");
    let acme2 = TenantContext::bound("acme2", "Acme Two");
    let record: TodoItem = source.session(&acme).get(&id).await.unwrap().unwrap();

    let mut session = source.session(&acme2);
    session.remove(record);
    let err = session.save_changes().await.unwrap_err();
    assert_eq!(err.downcast_ref::<TenancyError>(), Some(&TenancyError::CrossTenantWriteBlocked));

    // Over HTTP acme2 cannot even see it.
    let res = send(&router, "DELETE", &format!("/todos/{id}"), Some("acme2"), None).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = send(&router, "GET", &format!("/todos/{id}"), Some("acme"), None).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(json_body(res).await["title"], "Keep me");
}

#[tokio::test]
async fn wrong_tenant_lookup_matches_missing_record() {
    let router = router();
    let created = create_todo(&router, "acme", "Private").await;
    let id = created["id"].as_str().unwrap();

    let foreign = send(&router, "GET", &format!("/todos/{id}"), Some("acme2"), None).await;
    let missing = send(&router, "GET", "/todos/00000000-0000-0000-0000-000000000000", Some("acme2"), None).await;
    assert_eq!(foreign.status(), missing.status());

    let foreign = json_body(foreign).await;
    let missing = json_body(missing).await;
    assert_eq!(foreign["name"], missing["name"]);
    assert_eq!(foreign["code"], 404);
    assert_eq!(foreign["message"], format!("Todo not found: {id}"));
}

#[tokio::test]
async fn listing_is_scoped_and_newest_first() {
    let router = router();
    create_todo(&router, "acme", "first").await;
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    create_todo(&router, "acme", "second").await;
    create_todo(&router, "acme2", "other").await;

    let res = send(&router, "GET", "/todos", Some("ACME"), None).await;
    assert_eq!(res.status(), StatusCode::OK);
    let list = json_body(res).await;
    let titles: Vec<&str> = list
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, vec!["second", "first"]);
    assert!(list[0].get("tenantId").is_none());
}

#[tokio::test]
async fn create_requires_a_title() {
    let res = send(&router(), "POST", "/todos", Some("acme"), Some(json!({ "title": "   " }))).await;

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(res).await["message"], "Title is required");
}

#[tokio::test]
async fn update_applies_fields_and_requires_one() {
    let router = router();
    let created = create_todo(&router, "acme", "Draft").await;
    let uri = format!("/todos/{}", created["id"].as_str().unwrap());

    let res = send(&router, "PUT", &uri, Some("acme"), Some(json!({}))).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(res).await["message"], "Provide Title and/or IsDone");

    let res = send(&router, "PATCH", &uri, Some("acme"), Some(json!({ "isDone": true }))).await;
    assert_eq!(res.status(), StatusCode::OK);
    let body = json_body(res).await;
    assert_eq!(body["isDone"], json!(true));
    assert_eq!(body["title"], "Draft");

    let res = send(&router, "PUT", &uri, Some("acme2"), Some(json!({ "title": "Mine now" }))).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = send(&router, "GET", &uri, Some("acme"), None).await;
    assert_eq!(json_body(res).await["title"], "Draft");
}

#[tokio::test]
async fn delete_removes_own_record() {
    let router = router();
    let created = create_todo(&router, "acme", "Done soon").await;
    let uri = format!("/todos/{}", created["id"].as_str().unwrap());

    let res = send(&router, "DELETE", &uri, Some("acme"), None).await;
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    let res = send(&router, "GET", &uri, Some("acme"), None).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn whoami_reports_bound_tenant() {
    let res = send(&router(), "GET", "/whoami", Some("acme2"), None).await;

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(
        json_body(res).await,
        json!({ "tenantId": "acme2", "tenantName": "Acme Two" })
    );
}

#[tokio::test]
async fn client_supplied_id_cannot_target_another_tenants_key() {
    let router = router();
    let theirs = create_todo(&router, "acme", "Theirs").await;
    let taken = theirs["id"].as_str().unwrap();

    let res = send(
        &router,
        "POST",
        "/todos",
        Some("acme2"),
        Some(json!({ "id": taken, "title": "Mine" })),
    )
    .await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let mine = json_body(res).await;
    assert_ne!(mine["id"], theirs["id"]);
    assert_eq!(mine["tenantId"], "acme2");

    let res = send(&router, "GET", &format!("/todos/{taken}"), Some("acme"), None).await;
    assert_eq!(json_body(res).await["title"], "Theirs");
}

#[tokio::test]
async fn listing_can_filter_on_done() {
    let router = router();
    let done = create_todo(&router, "acme", "done").await;
    create_todo(&router, "acme", "open").await;
    let uri = format!("/todos/{}", done["id"].as_str().unwrap());
    let res = send(&router, "PATCH", &uri, Some("acme"), Some(json!({ "isDone": true }))).await;
    assert_eq!(res.status(), StatusCode::OK);

    let res = send(&router, "GET", "/todos?isDone=true", Some("acme"), None).await;
    assert_eq!(res.status(), StatusCode::OK);
    let list = json_body(res).await;
    assert_eq!(list.as_array().unwrap().len(), 1);
    assert_eq!(list[0]["title"], "done");

    let res = send(&router, "GET", "/todos?isDone=false", Some("acme"), None).await;
    assert_eq!(json_body(res).await[0]["title"], "open");

    let res = send(&router, "GET", "/todos?isDone=maybe", Some("acme"), None).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(res).await["message"], "isDone must be true or false");
}
