//! Router-level tests: the full middleware stack with in-memory collaborators.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
};
use chrono::DateTime;
use serde_json::{Value, json};
use tower::ServiceExt;
use uuid::Uuid;
use vendorkit::{
    chat::{ChatBackend, ChatError},
    config::AppConfig,
    provisioning::MemorySchemaStore,
    registry::{RegistryError, VendorRegistration, VendorRegistry},
    server::{AppState, create_app},
};

#[derive(Default)]
struct InMemoryRegistry {
    rows: Mutex<Vec<VendorRegistration>>,
}

#[async_trait]
impl VendorRegistry for InMemoryRegistry {
    async fn register(&self, registration: VendorRegistration) -> Result<Value, RegistryError> {
        let mut rows = self.rows.lock().unwrap();
        let row = json!({
            "id": rows.len() + 1,
            "user_id": registration.user_id,
            "slug": registration.slug,
            "schema": registration.schema,
        });
        rows.push(registration);
        Ok(row)
    }
}

struct CannedChat(&'static str);

#[async_trait]
impl ChatBackend for CannedChat {
    async fn send_message(&self, _message: &str) -> Result<String, ChatError> {
        Ok(self.0.to_string())
    }
}

struct TestApp {
    router: Router,
    store: Arc<MemorySchemaStore>,
    registry: Arc<InMemoryRegistry>,
}

fn test_app() -> TestApp {
    let store = Arc::new(MemorySchemaStore::default());
    let registry = Arc::new(InMemoryRegistry::default());
    let state = AppState {
        config: Arc::new(AppConfig::default()),
        schema_store: store.clone(),
        registry: registry.clone(),
        chat: Arc::new(CannedChat("Here are some tables")),
    };
    TestApp {
        router: create_app(state),
        store,
        registry,
    }
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn read_json(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn health_returns_ok_and_timestamp() {
    let app = test_app();
    let response = app
        .router
        .oneshot(Request::get("/api/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let trace_id = response
        .headers()
        .get("x-trace-id")
        .expect("trace id header")
        .to_str()
        .unwrap()
        .to_string();
    assert!(Uuid::parse_str(&trace_id).is_ok());

    let body = read_json(response).await;
    assert_eq!(body["status"], "OK");
    assert!(DateTime::parse_from_rfc3339(body["timestamp"].as_str().unwrap()).is_ok());
}

#[tokio::test]
async fn chat_without_message_is_rejected() {
    let app = test_app();
    let response = app
        .router
        .oneshot(post_json("/api/chat", json!({})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let trace_header = response.headers().get("x-trace-id").cloned().unwrap();
    let body = read_json(response).await;
    assert_eq!(body["error"], "No message provided");
    assert_eq!(body["trace_id"], trace_header.to_str().unwrap());
}

#[tokio::test]
async fn chat_returns_reply() {
    let app = test_app();
    let response = app
        .router
        .oneshot(post_json("/api/chat", json!({ "message": "hi", "context": [] })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["response"], "Here are some tables");
}

#[tokio::test]
async fn malformed_json_is_bad_request() {
    let app = test_app();
    let request = Request::builder()
        .method("POST")
        .uri("/api/deployTables")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{ not json"))
        .unwrap();

    let response = app.router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = read_json(response).await;
    assert!(body["error"].as_str().unwrap().starts_with("JSON syntax error"));
}

#[tokio::test]
async fn deploy_with_non_list_tables_is_rejected() {
    let app = test_app();
    let response = app
        .router
        .oneshot(post_json(
            "/api/deployTables",
            json!({ "slug": "acme", "user_id": "u1", "schema": { "tables": "orders" } }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(app.store.table_count(), 0);
    assert!(app.registry.rows.lock().unwrap().is_empty());
}

#[tokio::test]
async fn deploy_provisions_and_registers() {
    let app = test_app();
    let schema = json!({
        "tables": [
            { "name": "authors", "fields": [{ "name": "name", "type": "string", "required": true }] },
            { "name": "books", "fields": [
                { "name": "title", "type": "text" },
                { "name": "published", "type": "date" },
                { "name": "rating", "type": "stars" },
                { "name": "author_id", "type": "uuid", "relation": { "type": "belongsTo", "table": "authors" } }
            ]},
            { "name": "tags" }
        ]
    });

    let response = app
        .router
        .clone()
        .oneshot(post_json(
            "/api/deployTables",
            json!({ "slug": "book-shop", "user_id": "u-42", "schema": schema.clone() }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["message"], "Tables created and vendor registered");
    assert_eq!(body["tablesCreated"], 3);

    assert_eq!(
        app.store.tables(),
        vec!["book_shop_authors", "book_shop_books", "book_shop_tags"]
    );
    assert_eq!(
        app.store.operations().last().map(String::as_str),
        Some("create_foreign_key book_shop_books_author_id_fkey")
    );

    let rows = app.registry.rows.lock().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].slug, "book-shop");
    assert_eq!(rows[0].schema, schema);
}

#[tokio::test]
async fn redeploy_creates_nothing_new() {
    let app = test_app();
    let payload = json!({
        "slug": "acme",
        "user_id": "u1",
        "schema": { "tables": [
            { "name": "customers", "fields": [] },
            { "name": "orders", "fields": [
                { "name": "customer_id", "type": "uuid", "relation": { "type": "belongsTo", "table": "customers" } }
            ]}
        ]}
    });

    for _ in 0..2 {
        let response = app
            .router
            .clone()
            .oneshot(post_json("/api/deployTables", payload.clone()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    assert_eq!(app.store.operations().len(), 3);
    assert_eq!(app.store.table_count(), 2);
    assert_eq!(app.store.constraint_count(), 1);
}

#[tokio::test]
async fn deploy_with_colliding_long_names_is_rejected() {
    let app = test_app();
    let long = "x".repeat(60);
    let response = app
        .router
        .oneshot(post_json(
            "/api/deployTables",
            json!({
                "slug": "acme",
                "user_id": "u1",
                "schema": { "tables": [
                    { "name": format!("{long}_a") },
                    { "name": format!("{long}_b") }
                ]}
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = read_json(response).await;
    assert!(body["error"].as_str().unwrap().starts_with("Invalid schema"));
    assert_eq!(app.store.table_count(), 0);
    assert!(app.registry.rows.lock().unwrap().is_empty());
}

#[tokio::test]
async fn cors_allows_configured_origin_only() {
    let app = test_app();
    let preflight = |origin: &str| {
        Request::builder()
            .method("OPTIONS")
            .uri("/api/chat")
            .header(header::ORIGIN, origin)
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
            .body(Body::empty())
            .unwrap()
    };

    let allowed = app
        .router
        .clone()
        .oneshot(preflight("http://localhost:5173"))
        .await
        .unwrap();
    assert_eq!(
        allowed
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .unwrap(),
        "http://localhost:5173"
    );

    let denied = app
        .router
        .oneshot(preflight("https://evil.example"))
        .await
        .unwrap();
    assert!(
        denied
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .is_none()
    );
}

#[tokio::test]
async fn openapi_document_lists_routes() {
    let app = test_app();
    let response = app
        .router
        .oneshot(Request::get("/openapi.json").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let doc = read_json(response).await;
    for path in ["/api/chat", "/api/health", "/api/deployTables"] {
        assert!(doc["paths"].get(path).is_some(), "missing {path}");
    }
}
