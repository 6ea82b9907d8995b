use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::{IntoParams, ToSchema};

// --- Core Application Schemas (Mapped to Database) ---

/// Author
///
/// A row of the `authors` table. The table is the only copy; nothing caches it.
/// `id` and `created_at` never change after insert.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct Author {
    pub id: i64,
    // Opaque reference to the owning user in the identity service.
    pub user_id: i64,
    pub name: String,
    pub bio: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// NewAuthor
///
/// Column values for an insert. Both timestamps are stamped by the use case layer.
#[derive(Debug, Clone)]
pub struct NewAuthor {
    pub user_id: i64,
    pub name: String,
    pub bio: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// AuthorChanges
///
/// The mutable columns of an existing author, addressed by `id`.
#[derive(Debug, Clone)]
pub struct AuthorChanges {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub bio: String,
    pub updated_at: DateTime<Utc>,
}

// --- Request Payloads (Input Schemas) ---

/// AuthorRequest
///
/// Body of POST and PUT `/api/v1/authors`. Only structural decoding is applied:
/// `user_id` and `name` must be present, `bio` may be omitted or blank.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default, PartialEq)]
#[ts(export)]
pub struct AuthorRequest {
    #[schema(example = 7)]
    pub user_id: i64,
    #[schema(example = "Ada")]
    pub name: String,
    #[serde(default)]
    #[schema(example = "math")]
    pub bio: String,
}

/// ListParams
///
/// Raw `page` / `limit` query values. Kept as strings so that garbage input falls
/// back to the defaults instead of rejecting the request.
#[derive(Debug, Clone, Deserialize, Default, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListParams {
    /// 1-based page number (default 1).
    pub page: Option<String>,
    /// Page size (default 5).
    pub limit: Option<String>,
}

// --- Response Payloads (Output Schemas) ---

/// AuthorResponse
///
/// Public view of an author record.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, PartialEq)]
#[ts(export)]
pub struct AuthorResponse {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub bio: String,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

impl From<Author> for AuthorResponse {
    fn from(author: Author) -> Self {
        Self {
            id: author.id,
            user_id: author.user_id,
            name: author.name,
            bio: author.bio,
            created_at: author.created_at,
            updated_at: author.updated_at,
        }
    }
}

/// AuthorPage
///
/// Payload of the list endpoint: one page of authors plus the descriptor it was
/// computed from.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, PartialEq)]
#[ts(export)]
pub struct AuthorPage {
    pub authors: Vec<AuthorResponse>,
    pub pagination: PageMeta,
}

// --- Pagination ---

pub const DEFAULT_PAGE: i64 = 1;
pub const DEFAULT_PAGE_SIZE: i64 = 5;

/// Pagination
///
/// The requested window. Only `page` and `page_size` are stored; `offset` and the
/// page count are always rederived from them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    page: i64,
    page_size: i64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl Pagination {
    /// Clamps `page` to at least 1 and replaces a non-positive `page_size` with the
    /// default.
    pub fn new(page: i64, page_size: i64) -> Self {
        Self {
            page: page.max(DEFAULT_PAGE),
            page_size: if page_size > 0 {
                page_size
            } else {
                DEFAULT_PAGE_SIZE
            },
        }
    }

    /// Non-numeric and non-positive values are ignored in favour of the defaults.
    pub fn from_params(params: &ListParams) -> Self {
        fn positive(raw: Option<&str>) -> Option<i64> {
            raw.and_then(|v| v.trim().parse::<i64>().ok()).filter(|v| *v > 0)
        }

        Self::new(
            positive(params.page.as_deref()).unwrap_or(DEFAULT_PAGE),
            positive(params.limit.as_deref()).unwrap_or(DEFAULT_PAGE_SIZE),
        )
    }

    pub fn page(&self) -> i64 {
        self.page
    }

    pub fn page_size(&self) -> i64 {
        self.page_size
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.page_size)
    }

    /// Describes this window against `total_count` matching rows.
    pub fn describe(&self, total_count: i64) -> PageMeta {
        let total_count = total_count.max(0);
        let page_count =
            total_count / self.page_size + i64::from(total_count % self.page_size != 0);

        PageMeta {
            page: self.page,
            page_size: self.page_size,
            offset: self.offset(),
            total_count,
            page_count,
        }
    }
}

/// PageMeta
///
/// Serialized pagination descriptor returned next to a page of results.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, PartialEq, Eq)]
#[ts(export)]
pub struct PageMeta {
    pub page: i64,
    pub page_size: i64,
    pub offset: i64,
    pub total_count: i64,
    pub page_count: i64,
}

// --- Response Envelope ---

/// Envelope
///
/// The uniform `{status, message, data}` wrapper of every successful response.
/// `status` mirrors the HTTP status code.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub status: u16,
    pub message: String,
    pub data: Option<T>,
}

impl<T> Envelope<T> {
    pub fn new(status: StatusCode, message: impl Into<String>, data: Option<T>) -> Self {
        Self {
            status: status.as_u16(),
            message: message.into(),
            data,
        }
    }

    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self::new(StatusCode::OK, message, Some(data))
    }

    pub fn created(message: impl Into<String>, data: T) -> Self {
        Self::new(StatusCode::CREATED, message, Some(data))
    }
}

impl Envelope<()> {
    pub fn message_only(message: impl Into<String>) -> Self {
        Self::new(StatusCode::OK, message, None)
    }
}

impl<T: Serialize> IntoResponse for Envelope<T> {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status).unwrap_or(StatusCode::OK);
        (status, Json(self)).into_response()
    }
}
