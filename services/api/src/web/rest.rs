//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for the benchmark endpoints and the master
//! definition for the OpenAPI specification.

use crate::web::state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::{future::Future, sync::Arc, time::Instant};
use store_bench_core::domain::{Database, InsertCount, Operation};
use store_bench_core::ports::{BenchmarkStore, PortError, PortResult};
use tracing::{error, info, info_span, Instrument};
use utoipa::{OpenApi, ToSchema};
use uuid::Uuid;

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        insert_users_handler,
        delete_all_users_handler,
        update_passwords_handler,
        add_notifications_handler,
    ),
    components(
        schemas(InsertUsersRequest, BenchmarkResponse)
    ),
    tags(
        (name = "Store Benchmark API", description = "Timed CRUD workloads against PostgreSQL and MongoDB.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// API Response and Payload Structs
//=========================================================================================

/// Body of an insert request. A missing `count` reads as zero and is rejected.
#[derive(Debug, Deserialize, ToSchema)]
pub struct InsertUsersRequest {
    #[serde(default)]
    pub count: i64,
}

/// The uniform response for every successful benchmark run.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct BenchmarkResponse {
    /// One of `CREATE`, `DELETE`, `UPDATE`, `ADD_NOTIFICATIONS`.
    pub operation: String,
    /// `PostgreSQL` or `MongoDB`.
    pub database: String,
    /// Wall-clock seconds spent in the store.
    pub duration: f64,
}

type HandlerError = (StatusCode, String);

//=========================================================================================
// Shared Helpers
//=========================================================================================

fn resolve_store(
    app_state: &AppState,
    name: &str,
) -> Result<Arc<dyn BenchmarkStore>, HandlerError> {
    app_state
        .store(name)
        .ok_or_else(|| (StatusCode::NOT_FOUND, format!("Unknown store: {}", name)))
}

fn failure_message(operation: Operation) -> &'static str {
    match operation {
        Operation::Create => "Error inserting users",
        Operation::Delete => "Error deleting users",
        Operation::Update => "Error updating user passwords",
        Operation::AddNotifications => "Error generating notifications",
    }
}

/// Maps a port error onto the plain-text HTTP error. Store internals stay in the logs.
fn rejection(database: Database, operation: Operation, err: PortError) -> HandlerError {
    match err {
        PortError::Validation(message) => (StatusCode::BAD_REQUEST, message),
        other => {
            error!("{} against {} failed: {}", operation, database, other);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                failure_message(operation).to_string(),
            )
        }
    }
}

/// Runs one store operation under a fresh `run_id` span and times it.
async fn run_benchmark(
    database: Database,
    operation: Operation,
    work: impl Future<Output = PortResult<u64>>,
) -> Result<Json<BenchmarkResponse>, HandlerError> {
    let span = info_span!(
        "benchmark",
        run_id = %Uuid::new_v4(),
        database = %database,
        operation = %operation,
    );

    async move {
        let start = Instant::now();
        let affected = work
            .await
            .map_err(|e| rejection(database, operation, e))?;
        let duration = start.elapsed().as_secs_f64();
        info!(affected, duration, "Benchmark operation finished");

        Ok(Json(BenchmarkResponse {
            operation: operation.tag().to_string(),
            database: database.label().to_string(),
            duration,
        }))
    }
    .instrument(span)
    .await
}

//=========================================================================================
// REST API Handlers
//=========================================================================================

/// Insert `count` synthetic users with devices and reading histories.
#[utoipa::path(
    post,
    path = "/test/{store}/users/insert",
    request_body = InsertUsersRequest,
    params(
        ("store" = String, Path, description = "`postgres` or `mongo`.")
    ),
    responses(
        (status = 200, description = "Users inserted", body = BenchmarkResponse),
        (status = 400, description = "Invalid request body or non-positive count"),
        (status = 404, description = "Unknown store"),
        (status = 405, description = "Only POST method is allowed"),
        (status = 500, description = "Store failure")
    )
)]
pub async fn insert_users_handler(
    State(app_state): State<Arc<AppState>>,
    Path(store): Path<String>,
    body: Bytes,
) -> Result<impl IntoResponse, HandlerError> {
    let store = resolve_store(&app_state, &store)?;

    let request: InsertUsersRequest = serde_json::from_slice(&body).map_err(|e| {
        info!("Rejected insert request body: {}", e);
        (StatusCode::BAD_REQUEST, "Invalid request body".to_string())
    })?;
    let count = InsertCount::new(request.count)
        .map_err(|e| rejection(store.database(), Operation::Create, e))?;

    run_benchmark(store.database(), Operation::Create, store.insert_users(count)).await
}

/// Delete every user and all user-scoped data.
#[utoipa::path(
    post,
    path = "/test/{store}/users/deleteAll",
    params(
        ("store" = String, Path, description = "`postgres` or `mongo`.")
    ),
    responses(
        (status = 200, description = "User data deleted", body = BenchmarkResponse),
        (status = 404, description = "Unknown store"),
        (status = 405, description = "Only POST method is allowed"),
        (status = 500, description = "Store failure")
    )
)]
pub async fn delete_all_users_handler(
    State(app_state): State<Arc<AppState>>,
    Path(store): Path<String>,
) -> Result<impl IntoResponse, HandlerError> {
    let store = resolve_store(&app_state, &store)?;
    run_benchmark(store.database(), Operation::Delete, store.delete_all_users()).await
}

/// Append `"1"` to every user's password hash.
#[utoipa::path(
    post,
    path = "/test/{store}/users/update",
    params(
        ("store" = String, Path, description = "`postgres` or `mongo`.")
    ),
    responses(
        (status = 200, description = "Password hashes updated", body = BenchmarkResponse),
        (status = 404, description = "Unknown store"),
        (status = 405, description = "Only POST method is allowed"),
        (status = 500, description = "Store failure")
    )
)]
pub async fn update_passwords_handler(
    State(app_state): State<Arc<AppState>>,
    Path(store): Path<String>,
) -> Result<impl IntoResponse, HandlerError> {
    let store = resolve_store(&app_state, &store)?;
    run_benchmark(store.database(), Operation::Update, store.update_passwords()).await
}

/// Notify every user about the book they read last.
#[utoipa::path(
    post,
    path = "/test/{store}/users/addNotification",
    params(
        ("store" = String, Path, description = "`postgres` or `mongo`.")
    ),
    responses(
        (status = 200, description = "Notifications generated", body = BenchmarkResponse),
        (status = 404, description = "Unknown store"),
        (status = 405, description = "Only POST method is allowed"),
        (status = 500, description = "Store failure")
    )
)]
pub async fn add_notifications_handler(
    State(app_state): State<Arc<AppState>>,
    Path(store): Path<String>,
) -> Result<impl IntoResponse, HandlerError> {
    let store = resolve_store(&app_state, &store)?;
    run_benchmark(
        store.database(),
        Operation::AddNotifications,
        store.add_notifications(),
    )
    .await
}

/// Fallback for every non-POST verb on the benchmark routes.
pub async fn method_not_allowed() -> impl IntoResponse {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        "Only POST method is allowed",
    )
}
