//! services/api/src/web/router.rs
//!
//! Builds the complete Axum router: the benchmark routes, the Swagger UI and
//! request tracing.

use crate::web::{
    rest::{
        add_notifications_handler, delete_all_users_handler, insert_users_handler,
        method_not_allowed, update_passwords_handler, ApiDoc,
    },
    state::AppState,
};
use axum::{
    handler::Handler,
    routing::{post, MethodRouter},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// A route that accepts POST only; every other verb gets a plain-text 405.
fn post_only<H, T>(handler: H) -> MethodRouter<Arc<AppState>>
where
    H: Handler<T, Arc<AppState>>,
    T: 'static,
{
    post(handler).fallback(method_not_allowed)
}

/// Creates the application router over the injected store handles.
pub fn create_router(app_state: Arc<AppState>) -> Router {
    let benchmark_routes = Router::new()
        .route("/test/{store}/users/insert", post_only(insert_users_handler))
        .route("/test/{store}/users/deleteAll", post_only(delete_all_users_handler))
        .route("/test/{store}/users/update", post_only(update_passwords_handler))
        .route(
            "/test/{store}/users/addNotification",
            post_only(add_notifications_handler),
        )
        .with_state(app_state);

    Router::new()
        .merge(benchmark_routes)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
}
