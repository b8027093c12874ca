//! Router Integration Tests
//!
//! Drives the full Axum router against in-memory stores:
//! - method and body validation
//! - dispatch to the store named in the path
//! - the uniform response shape and error mapping

use api_lib::web::{create_router, AppState};
use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use store_bench_core::domain::{Database, InsertCount};
use store_bench_core::ports::{BenchmarkStore, PortError, PortResult};
use tower::ServiceExt; // for oneshot

const OPERATIONS: [&str; 4] = ["insert", "deleteAll", "update", "addNotification"];
const STORES: [&str; 2] = ["postgres", "mongo"];

/// Records every call and optionally fails all of them.
struct FakeStore {
    database: Database,
    fail: bool,
    calls: Mutex<Vec<String>>,
}

impl FakeStore {
    fn new(database: Database, fail: bool) -> Arc<Self> {
        Arc::new(Self {
            database,
            fail,
            calls: Mutex::new(Vec::new()),
        })
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String, affected: u64) -> PortResult<u64> {
        self.calls.lock().unwrap().push(call);
        if self.fail {
            Err(PortError::Store("connection refused".to_string()))
        } else {
            Ok(affected)
        }
    }
}

#[async_trait]
impl BenchmarkStore for FakeStore {
    fn database(&self) -> Database {
        self.database
    }

    async fn insert_users(&self, count: InsertCount) -> PortResult<u64> {
        self.record(format!("insert:{}", count.get()), u64::from(count.get()))
    }

    async fn delete_all_users(&self) -> PortResult<u64> {
        self.record("delete".to_string(), 10)
    }

    async fn update_passwords(&self) -> PortResult<u64> {
        self.record("update".to_string(), 10)
    }

    async fn add_notifications(&self) -> PortResult<u64> {
        self.record("notify".to_string(), 10)
    }
}

struct TestApp {
    router: Router,
    postgres: Arc<FakeStore>,
    mongo: Arc<FakeStore>,
}

fn create_test_app(fail: bool) -> TestApp {
    let postgres = FakeStore::new(Database::PostgreSql, fail);
    let mongo = FakeStore::new(Database::MongoDb, fail);
    let state = Arc::new(AppState {
        postgres: postgres.clone(),
        mongo: mongo.clone(),
    });
    TestApp {
        router: create_router(state),
        postgres,
        mongo,
    }
}

fn post(uri: &str, body: Body) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("Content-Type", "application/json")
        .body(body)
        .unwrap()
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .unwrap();
    (status, body.to_vec())
}

fn as_json(body: &[u8]) -> Value {
    serde_json::from_slice(body).unwrap()
}

// ============================================================================
// Successful Runs
// ============================================================================

#[tokio::test]
async fn test_insert_dispatches_count_to_the_named_store() {
    let app = create_test_app(false);

    let (status, body) = send(
        &app.router,
        post("/test/postgres/users/insert", Body::from(json!({ "count": 3 }).to_string())),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let json = as_json(&body);
    assert_eq!(json["operation"], "CREATE");
    assert_eq!(json["database"], "PostgreSQL");
    assert!(json["duration"].as_f64().unwrap() >= 0.0);
    assert_eq!(app.postgres.calls(), vec!["insert:3"]);
    assert!(app.mongo.calls().is_empty());
}

#[tokio::test]
async fn test_every_operation_reports_its_tag_and_database() {
    let app = create_test_app(false);
    let expected = [
        ("deleteAll", "DELETE"),
        ("update", "UPDATE"),
        ("addNotification", "ADD_NOTIFICATIONS"),
    ];

    for (store, label) in [("postgres", "PostgreSQL"), ("mongo", "MongoDB")] {
        for (path, tag) in expected {
            let uri = format!("/test/{}/users/{}", store, path);
            let (status, body) = send(&app.router, post(&uri, Body::empty())).await;
            assert_eq!(status, StatusCode::OK, "{}", uri);

            let json = as_json(&body);
            assert_eq!(json["operation"], tag);
            assert_eq!(json["database"], label);
            assert!(json["duration"].as_f64().unwrap() >= 0.0);
            assert_eq!(json.as_object().unwrap().len(), 3);
        }
    }

    assert_eq!(app.postgres.calls(), vec!["delete", "update", "notify"]);
    assert_eq!(app.mongo.calls(), vec!["delete", "update", "notify"]);
}

#[tokio::test]
async fn test_insert_accepts_a_body_without_content_type() {
    let app = create_test_app(false);
    let request = Request::builder()
        .method("POST")
        .uri("/test/mongo/users/insert")
        .body(Body::from(r#"{"count": 2}"#))
        .unwrap();

    let (status, body) = send(&app.router, request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(as_json(&body)["database"], "MongoDB");
    assert_eq!(app.mongo.calls(), vec!["insert:2"]);
}

// ============================================================================
// Rejected Requests
// ============================================================================

#[tokio::test]
async fn test_non_post_verbs_are_rejected_without_touching_a_store() {
    let app = create_test_app(false);

    for store in STORES {
        for operation in OPERATIONS {
            for method in ["GET", "PUT", "DELETE"] {
                let uri = format!("/test/{}/users/{}", store, operation);
                let request = Request::builder()
                    .method(method)
                    .uri(&uri)
                    .body(Body::empty())
                    .unwrap();
                let (status, body) = send(&app.router, request).await;

                assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED, "{} {}", method, uri);
                assert_eq!(String::from_utf8(body).unwrap(), "Only POST method is allowed");
            }
        }
    }

    assert!(app.postgres.calls().is_empty());
    assert!(app.mongo.calls().is_empty());
}

#[tokio::test]
async fn test_invalid_insert_bodies_are_bad_requests() {
    let app = create_test_app(false);
    let cases = [
        ("", "Invalid request body"),
        ("not json", "Invalid request body"),
        (r#"{"count": "three"}"#, "Invalid request body"),
        (r#"{"count": 0}"#, "Count must be a positive integer"),
        (r#"{"count": -4}"#, "Count must be a positive integer"),
        ("{}", "Count must be a positive integer"),
    ];

    for store in STORES {
        for (raw, message) in cases {
            let uri = format!("/test/{}/users/insert", store);
            let (status, body) = send(&app.router, post(&uri, Body::from(raw))).await;

            assert_eq!(status, StatusCode::BAD_REQUEST, "body {:?}", raw);
            assert_eq!(String::from_utf8(body).unwrap(), message);
        }
    }

    assert!(app.postgres.calls().is_empty());
    assert!(app.mongo.calls().is_empty());
}

#[tokio::test]
async fn test_unknown_store_is_not_found() {
    let app = create_test_app(false);

    let (status, body) = send(&app.router, post("/test/redis/users/update", Body::empty())).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(String::from_utf8(body).unwrap(), "Unknown store: redis");
}

// ============================================================================
// Store Failures
// ============================================================================

#[tokio::test]
async fn test_store_failures_map_to_operation_specific_messages() {
    let app = create_test_app(true);
    let expected = [
        ("insert", "Error inserting users"),
        ("deleteAll", "Error deleting users"),
        ("update", "Error updating user passwords"),
        ("addNotification", "Error generating notifications"),
    ];

    for (operation, message) in expected {
        let uri = format!("/test/postgres/users/{}", operation);
        let body = Body::from(json!({ "count": 1 }).to_string());
        let (status, body) = send(&app.router, post(&uri, body)).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR, "{}", uri);
        let text = String::from_utf8(body).unwrap();
        assert_eq!(text, message);
        assert!(!text.contains("connection refused"));
    }

    assert_eq!(app.postgres.calls().len(), 4);
}
