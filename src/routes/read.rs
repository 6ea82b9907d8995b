use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Read-Tier Router Module
///
/// Author lookups. Mounted under `/api/v1` and layered with the read-tier check,
/// which admits the roles `AccessPolicy` lists for `CapabilityTier::Read`.
pub fn read_routes() -> Router<AppState> {
    Router::new()
        // GET /authors?page=&limit=
        .route("/authors", get(handlers::get_all_authors))
        // GET /authors/{id}
        .route("/authors/{id}", get(handlers::get_detail_author))
}
