use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Public Router Module
///
/// Endpoints that never touch the database or the identity service.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /
        // Banner with the current year, used as a liveness check.
        .route("/", get(handlers::banner))
        // GET /api-docs/openapi.json
        .route("/api-docs/openapi.json", get(handlers::openapi_json))
}
