//! HTTP surface over in-memory collaborators.

mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use common::{row, Harness, RecordingExecutor, ScriptedAccess};
use record_crud::domain::model::DynamicModel;
use record_crud::transport::http::{create_router, AppState};
use record_crud::{CrudOptions, CrudService, ModelRegistry};
use serde_json::{json, Value as JsonValue};
use std::sync::Arc;
use tokio::sync::RwLock;
use tower::ServiceExt;

fn router(h: &Harness, options: CrudOptions, registry: ModelRegistry) -> axum::Router {
    let crud = CrudService::new(h.deps.clone(), options, Arc::new(RwLock::new(registry)));
    create_router(AppState { crud })
}

async fn call(app: axum::Router, method: &str, uri: &str, body: Option<JsonValue>) -> (StatusCode, JsonValue) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(b) => builder
            .header("content-type", "application/json")
            .body(Body::from(b.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(JsonValue::Null);
    (status, json)
}

fn open() -> CrudOptions {
    CrudOptions {
        check_access: false,
        ..Default::default()
    }
}

#[tokio::test]
async fn health_reports_ok() {
    let h = Harness::new(RecordingExecutor::default(), ScriptedAccess::member());
    let (status, body) = call(router(&h, open(), ModelRegistry::new()), "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], json!("ok"));
}

#[tokio::test]
async fn save_creates_through_the_api() {
    let h = Harness::new(RecordingExecutor::default(), ScriptedAccess::member());
    let body = json!({
        "userInfo": {"userId": "u1", "loginName": "ada@example.com", "token": "tok"},
        "actionParams": [{"name": "desk", "unitPrice": 120}]
    });
    let (status, body) = call(router(&h, open(), ModelRegistry::new()), "POST", "/api/crud/orders/save", Some(body)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["data"]["taskType"], json!("create"));
    assert_eq!(body["data"]["recordsCount"], json!(1));
    assert!(h.executor.sql()[0].starts_with("INSERT INTO orders(name, unit_price, created_by, created_at)"));
}

#[tokio::test]
async fn delete_without_selector_is_a_bad_request() {
    let h = Harness::new(RecordingExecutor::default(), ScriptedAccess::admin());
    let (status, body) = call(router(&h, open(), ModelRegistry::new()), "POST", "/api/crud/orders/delete", Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], json!("removeError"));
}

#[tokio::test]
async fn get_uses_the_registered_projection() {
    let rows = vec![row(json!({"id": "a", "unit_price": 120}))];
    let h = Harness::new(RecordingExecutor::with_rows(rows), ScriptedAccess::member());
    let mut registry = ModelRegistry::new();
    registry.register(
        "orders".into(),
        DynamicModel::new("orders".into(), vec!["id".into(), "unitPrice".into()]),
    );
    let (status, body) = call(
        router(&h, open(), registry),
        "POST",
        "/api/crud/orders/get",
        Some(json!({"recordIds": ["a"]})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["records"][0]["unitPrice"], json!(120));
    assert_eq!(body["data"]["stats"]["recordIds"], json!(["a"]));
    assert_eq!(h.executor.sql()[1], "SELECT id, unit_price FROM orders WHERE id=$1 LIMIT 10000");
}

#[tokio::test]
async fn denial_maps_to_unauthorized() {
    let h = Harness::new(RecordingExecutor::default(), ScriptedAccess::member());
    let body = json!({"userInfo": {"userId": "u1"}, "recordIds": ["a"]});
    let (status, body) = call(
        router(&h, CrudOptions::default(), ModelRegistry::new()),
        "POST",
        "/api/crud/orders/get",
        Some(body),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], json!("unAuthorized"));
    assert_eq!(body["data"]["ok"], json!(false));
}

#[tokio::test]
async fn malformed_body_is_unprocessable() {
    let h = Harness::new(RecordingExecutor::default(), ScriptedAccess::member());
    let (status, _) = call(
        router(&h, open(), ModelRegistry::new()),
        "POST",
        "/api/crud/orders/save",
        Some(json!({"actionParams": "not-a-list"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn models_lists_registered_tables() {
    let h = Harness::new(RecordingExecutor::default(), ScriptedAccess::member());
    let mut registry = ModelRegistry::new();
    registry.register("orders".into(), DynamicModel::new("orders".into(), vec!["id".into()]));
    let (status, body) = call(router(&h, open(), registry), "GET", "/api/models", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"][0]["tableName"], json!("orders"));
}

#[tokio::test]
async fn session_status_returns_the_user_id() {
    let h = Harness::new(RecordingExecutor::default(), ScriptedAccess::member());
    let body = json!({"userId": "u1", "loginName": "ada@example.com", "token": "tok"});
    let (status, body) = call(router(&h, open(), ModelRegistry::new()), "POST", "/api/session/status", Some(body)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"], json!("u1"));
}

#[tokio::test]
async fn custom_log_reaches_the_audit_sink() {
    let h = Harness::new(RecordingExecutor::default(), ScriptedAccess::member());
    let body = json!({
        "userInfo": {"userId": "u1", "token": "tok"},
        "logRecords": {"note": "manual fix"},
        "logType": "update"
    });
    let (status, body) = call(
        router(&h, CrudOptions::default(), ModelRegistry::new()),
        "POST",
        "/api/audit/custom",
        Some(body),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["ok"], json!(true));
}

fn signed_out() -> ScriptedAccess {
    ScriptedAccess {
        status: None,
        ..ScriptedAccess::member()
    }
}

#[tokio::test]
async fn custom_log_requires_a_known_user() {
    let h = Harness::new(RecordingExecutor::default(), signed_out());
    let body = json!({"logBy": "u1", "logRecords": {"note": "forged"}});
    let (status, body) = call(
        router(&h, CrudOptions::default(), ModelRegistry::new()),
        "POST",
        "/api/audit/custom",
        Some(body),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], json!("unAuthorized"));
}

#[tokio::test]
async fn lookup_refuses_tables_outside_the_allow_list() {
    let h = Harness::new(RecordingExecutor::default(), signed_out());
    let (status, body) = call(
        router(&h, CrudOptions::default(), ModelRegistry::new()),
        "POST",
        "/api/crud/accesses/lookup",
        Some(json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], json!("unAuthorized"));
    assert!(h.executor.sql().is_empty());
}

#[tokio::test]
async fn lookup_serves_allow_listed_tables_without_a_session() {
    let rows = vec![row(json!({"code": "FR", "name": "France"}))];
    let h = Harness::new(RecordingExecutor::with_rows(rows), signed_out());
    let options = CrudOptions {
        lookup_tables: vec!["countries".into()],
        ..Default::default()
    };
    let (status, body) = call(
        router(&h, options, ModelRegistry::new()),
        "POST",
        "/api/crud/countries/lookup",
        Some(json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["records"][0]["code"], json!("FR"));
    assert!(h.executor.sql()[1].starts_with("SELECT * FROM countries"));
}

#[tokio::test]
async fn count_requires_table_read_access() {
    let h = Harness::new(RecordingExecutor::default(), signed_out());
    let body = json!({"userInfo": {"userId": "ghost"}});
    let (status, body) = call(
        router(&h, CrudOptions::default(), ModelRegistry::new()),
        "POST",
        "/api/crud/orders/count",
        Some(body),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], json!("unAuthorized"));
    assert!(h.executor.sql().is_empty());
}
