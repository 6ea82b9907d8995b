use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Classification
///
/// The fixed error vocabulary every failure is funnelled into before it leaves the
/// service. Each classification owns exactly one HTTP status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    BadRequest,
    Unauthorized,
    Forbidden,
    NotFound,
    Internal,
}

impl Classification {
    pub fn status(self) -> StatusCode {
        match self {
            Classification::BadRequest => StatusCode::BAD_REQUEST,
            Classification::Unauthorized => StatusCode::UNAUTHORIZED,
            Classification::Forbidden => StatusCode::FORBIDDEN,
            Classification::NotFound => StatusCode::NOT_FOUND,
            Classification::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// AppError
///
/// A categorized, request-scoped error: a classification plus a human-readable
/// message. Returned by middleware, handlers and the use case layer alike.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppError {
    pub classification: Classification,
    pub message: String,
}

impl AppError {
    pub fn new(classification: Classification, message: impl Into<String>) -> Self {
        Self {
            classification,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(Classification::BadRequest, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(Classification::Unauthorized, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(Classification::Forbidden, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(Classification::NotFound, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(Classification::Internal, message)
    }

    pub fn status(&self) -> StatusCode {
        self.classification.status()
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.classification, self.message)
    }
}

impl std::error::Error for AppError {}

/// ErrorBody
///
/// JSON shape of every failed response.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    pub status: u16,
    pub error: Classification,
    pub message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = ErrorBody {
            status: status.as_u16(),
            error: self.classification,
            message: self.message,
        };

        (status, Json(body)).into_response()
    }
}

/// RepositoryError
///
/// What the data access layer can report. "Absent" and "store unavailable" stay
/// distinct here; the use case layer decides how each surfaces over HTTP.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record not found")]
    NotFound,
    /// The store rejected the statement (constraint or data violation).
    #[error("rejected by the store: {0}")]
    Invalid(String),
    #[error("database failure: {0}")]
    Transient(String),
}

impl From<sqlx::Error> for RepositoryError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => RepositoryError::NotFound,
            sqlx::Error::Database(db_err)
                if db_err.is_unique_violation()
                    || db_err.is_foreign_key_violation()
                    || db_err.is_check_violation() =>
            {
                RepositoryError::Invalid(db_err.message().to_string())
            }
            // not_null_violation (23502) and data exceptions (22xxx) have no dedicated
            // accessor on DatabaseError.
            sqlx::Error::Database(db_err)
                if db_err
                    .code()
                    .is_some_and(|code| code == "23502" || code.starts_with("22")) =>
            {
                RepositoryError::Invalid(db_err.message().to_string())
            }
            other => RepositoryError::Transient(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification_status_codes() {
        assert_eq!(Classification::BadRequest.status(), StatusCode::BAD_REQUEST);
        assert_eq!(Classification::Unauthorized.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(Classification::Forbidden.status(), StatusCode::FORBIDDEN);
        assert_eq!(Classification::NotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            Classification::Internal.status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn row_not_found_maps_to_not_found() {
        let err = RepositoryError::from(sqlx::Error::RowNotFound);
        assert!(matches!(err, RepositoryError::NotFound));
    }

    #[test]
    fn pool_failures_are_transient() {
        let err = RepositoryError::from(sqlx::Error::PoolTimedOut);
        assert!(matches!(err, RepositoryError::Transient(_)));
    }

    #[tokio::test]
    async fn error_response_carries_classification_and_message() {
        let response = AppError::not_found("author not found").into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["status"], 404);
        assert_eq!(body["error"], "not_found");
        assert_eq!(body["message"], "author not found");
    }
}
