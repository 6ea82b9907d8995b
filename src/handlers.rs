use crate::{
    AppState,
    error::{AppError, ErrorBody},
    models::{AuthorPage, AuthorRequest, AuthorResponse, Envelope, ListParams, Pagination},
};
use axum::{
    Json,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, PathRejection},
    },
    http::StatusCode,
};
use chrono::{Datelike, Utc};

// --- Input Decoding ---

// Structural decoding only: a rejection becomes a bad request before any use case runs.

fn decode_body(
    payload: Result<Json<AuthorRequest>, JsonRejection>,
) -> Result<AuthorRequest, AppError> {
    payload
        .map(|Json(req)| req)
        .map_err(|rejection| AppError::bad_request(rejection.body_text()))
}

fn decode_id(id: Result<Path<i64>, PathRejection>) -> Result<i64, AppError> {
    id.map(|Path(id)| id)
        .map_err(|rejection| AppError::bad_request(rejection.body_text()))
}

// --- Handlers ---

/// banner
///
/// [Public Route] Liveness banner.
#[utoipa::path(
    get,
    path = "/",
    responses((status = 200, description = "Service banner", body = String))
)]
pub async fn banner() -> Json<String> {
    Json(format!("Library API Author {}", Utc::now().year()))
}

/// get_all_authors
///
/// [Read Tier] Lists authors newest first. `page` and `limit` are optional; invalid
/// values fall back to page 1 and 5 per page.
#[utoipa::path(
    get,
    path = "/api/v1/authors",
    params(ListParams),
    responses(
        (status = 200, description = "A page of authors", body = AuthorPage),
        (status = 401, description = "Missing or invalid credential", body = ErrorBody),
        (status = 403, description = "Role not admitted", body = ErrorBody)
    )
)]
pub async fn get_all_authors(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Envelope<AuthorPage>, AppError> {
    let pagination = Pagination::from_params(&params);
    let page = state.authors.get_all_authors(pagination).await?;

    Ok(Envelope::ok("Success get data authors", page))
}

/// get_detail_author
///
/// [Read Tier] Retrieves one author by identifier.
#[utoipa::path(
    get,
    path = "/api/v1/authors/{id}",
    params(("id" = i64, Path, description = "Author ID")),
    responses(
        (status = 200, description = "Found", body = AuthorResponse),
        (status = 400, description = "Identifier is not an integer", body = ErrorBody),
        (status = 404, description = "No such author", body = ErrorBody)
    )
)]
pub async fn get_detail_author(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Envelope<AuthorResponse>, AppError> {
    let id = decode_id(id)?;
    let author = state.authors.get_detail_author(id).await?;

    Ok(Envelope::ok("Success get detail author", author))
}

/// create_author
///
/// [Write Tier] Creates an author. The response carries the assigned identifier.
#[utoipa::path(
    post,
    path = "/api/v1/authors",
    request_body = AuthorRequest,
    responses(
        (status = 201, description = "Created", body = AuthorResponse),
        (status = 400, description = "Malformed body", body = ErrorBody),
        (status = 403, description = "Role not admitted", body = ErrorBody)
    )
)]
pub async fn create_author(
    State(state): State<AppState>,
    payload: Result<Json<AuthorRequest>, JsonRejection>,
) -> Result<Envelope<AuthorResponse>, AppError> {
    let req = decode_body(payload)?;
    let author = state.authors.create_author(req).await?;

    Ok(Envelope::created("Success create data author", author))
}

/// update_author
///
/// [Write Tier] Replaces the name, biography and owning user of an author.
#[utoipa::path(
    put,
    path = "/api/v1/authors/{id}",
    params(("id" = i64, Path, description = "Author ID")),
    request_body = AuthorRequest,
    responses(
        (status = 200, description = "Updated", body = AuthorResponse),
        (status = 400, description = "Malformed body or identifier", body = ErrorBody),
        (status = 404, description = "No such author", body = ErrorBody)
    )
)]
pub async fn update_author(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
    payload: Result<Json<AuthorRequest>, JsonRejection>,
) -> Result<Envelope<AuthorResponse>, AppError> {
    let id = decode_id(id)?;
    let req = decode_body(payload)?;
    let author = state.authors.update_author(id, req).await?;

    Ok(Envelope::ok("Success update data author", author))
}

/// delete_author
///
/// [Write Tier] Permanently removes an author.
#[utoipa::path(
    delete,
    path = "/api/v1/authors/{id}",
    params(("id" = i64, Path, description = "Author ID")),
    responses(
        (status = 200, description = "Deleted"),
        (status = 404, description = "No such author", body = ErrorBody)
    )
)]
pub async fn delete_author(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Envelope<()>, AppError> {
    let id = decode_id(id)?;
    state.authors.delete_author(id).await?;

    Ok(Envelope::message_only("Success delete data author"))
}

/// openapi_json
///
/// [Public Route] Serves the generated OpenAPI document.
pub async fn openapi_json() -> (StatusCode, Json<utoipa::openapi::OpenApi>) {
    (StatusCode::OK, Json(crate::api_doc()))
}
