use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{post, put},
};

/// Write-Tier Router Module
///
/// Author mutations. Shares paths with the read tier; the method routers are merged
/// in `create_router` while each keeps its own access check.
pub fn write_routes() -> Router<AppState> {
    Router::new()
        // POST /authors
        .route("/authors", post(handlers::create_author))
        // PUT/DELETE /authors/{id}
        .route(
            "/authors/{id}",
            put(handlers::update_author).delete(handlers::delete_author),
        )
}
