//! API Routes
//!
//! Configures the Axum router with all cache endpoints.

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    delete_handler, get_handler, health_handler, invalidate_handler, set_handler, stats_handler,
    AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `PUT /cache/:namespace/:key` - Store a value
/// - `GET /cache/:namespace/:key` - Retrieve a value
/// - `DELETE /cache/:namespace/:key` - Delete a value
/// - `POST /cache/:namespace/invalidate` - Delete keys matching a glob
/// - `GET /stats` - Get cache statistics
/// - `GET /health` - Health check endpoint
///
/// # Middleware
/// - CORS: Allows any origin (configurable for production)
/// - Tracing: Logs all requests for debugging
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route(
            "/cache/:namespace/:key",
            get(get_handler).put(set_handler).delete(delete_handler),
        )
        .route("/cache/:namespace/invalidate", post(invalidate_handler))
        .route("/stats", get(stats_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
