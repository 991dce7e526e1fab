pub mod batch;
pub mod docs;
pub mod health;
pub mod stats;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::middleware::{
    auth::require_admin,
    cors::{allowed_headers_everywhere, function_cors},
    rate_limit,
};
use crate::AppState;

/// Full HTTP surface. Admin routes sit behind the admin gate and a request
/// limiter; CORS wraps everything so rejections carry the headers too.
pub fn router(state: AppState, admin_rps: u32) -> Router {
    let admin_api = Router::new()
        .route(
            "/api/admin/batch-generate-quizzes",
            post(batch::batch_generate_quizzes),
        )
        .route("/api/admin/stats", get(stats::admin_stats))
        .route("/api/admin/activity", get(stats::quiz_activity))
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            require_admin,
        ))
        .layer(axum::middleware::from_fn_with_state(
            rate_limit::RequestLimiter::new(admin_rps),
            rate_limit::limit_requests,
        ));

    Router::new()
        .route("/health", get(health::health))
        .route("/api-docs/openapi.json", get(docs::openapi_json))
        .merge(admin_api)
        .with_state(state)
        .layer(allowed_headers_everywhere())
        .layer(function_cors())
        .layer(TraceLayer::new_for_http())
}
