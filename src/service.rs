use crate::{
    error::{AppError, RepositoryError},
    models::{
        AuthorChanges, AuthorPage, AuthorRequest, AuthorResponse, NewAuthor, Pagination,
    },
    repository::AuthorRepository,
};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{PgPool, Postgres, Transaction};
use std::sync::Arc;

/// AuthorService
///
/// The use case layer. Each method is one unit of work wrapped in its own database
/// transaction, and each failure comes back already classified for HTTP.
///
/// Handlers only see this trait (through `ServiceState`), so tests swap the Postgres
/// implementation for an in-memory mock.
#[async_trait]
pub trait AuthorService: Send + Sync {
    async fn create_author(&self, req: AuthorRequest) -> Result<AuthorResponse, AppError>;
    async fn get_detail_author(&self, id: i64) -> Result<AuthorResponse, AppError>;
    async fn update_author(&self, id: i64, req: AuthorRequest)
    -> Result<AuthorResponse, AppError>;
    async fn delete_author(&self, id: i64) -> Result<(), AppError>;
    async fn get_all_authors(&self, pagination: Pagination) -> Result<AuthorPage, AppError>;
}

/// ServiceState
///
/// The concrete type used to share the use case layer across the application state.
pub type ServiceState = Arc<dyn AuthorService>;

/// PostgresAuthorService
///
/// `AuthorService` backed by a Postgres pool. Opens one transaction per call and
/// commits only when the data access step succeeded.
pub struct PostgresAuthorService {
    pool: PgPool,
}

impl PostgresAuthorService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn begin(&self) -> Result<Transaction<'static, Postgres>, AppError> {
        self.pool.begin().await.map_err(|e| {
            tracing::error!("failed to open transaction: {:?}", e);
            AppError::internal(format!("Failed connection to database: {e}"))
        })
    }
}

/// finish
///
/// Commits when `result` is `Ok`, rolls back otherwise. A failed commit turns a
/// success into a `Transient` error.
async fn finish<T>(
    tx: Transaction<'static, Postgres>,
    result: Result<T, RepositoryError>,
) -> Result<T, RepositoryError> {
    match result {
        Ok(value) => {
            tx.commit().await?;
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback_err) = tx.rollback().await {
                tracing::warn!("rollback failed: {:?}", rollback_err);
            }
            Err(err)
        }
    }
}

/// classify
///
/// Chooses the HTTP-facing classification for a data access failure. `context`
/// prefixes the diagnostic message of internal errors.
fn classify(err: RepositoryError, context: &str) -> AppError {
    match err {
        RepositoryError::NotFound => AppError::not_found("author not found"),
        RepositoryError::Invalid(msg) => AppError::bad_request(format!("{context}: {msg}")),
        RepositoryError::Transient(msg) => {
            tracing::error!("{context}: {msg}");
            AppError::internal(format!("{context}: {msg}"))
        }
    }
}

#[async_trait]
impl AuthorService for PostgresAuthorService {
    async fn create_author(&self, req: AuthorRequest) -> Result<AuthorResponse, AppError> {
        let now = Utc::now();
        let author = NewAuthor {
            user_id: req.user_id,
            name: req.name,
            bio: req.bio,
            created_at: now,
            updated_at: now,
        };

        let mut tx = self.begin().await?;
        let result = AuthorRepository::new(&mut tx).create(&author).await;
        let created = finish(tx, result)
            .await
            .map_err(|e| classify(e, "Failed to create author"))?;

        tracing::info!(author_id = created.id, "author created");
        Ok(created.into())
    }

    async fn get_detail_author(&self, id: i64) -> Result<AuthorResponse, AppError> {
        let mut tx = self.begin().await?;
        let result = AuthorRepository::new(&mut tx).find_by_id(id).await;
        let author = finish(tx, result)
            .await
            .map_err(|e| classify(e, "Failed to fetch author"))?;

        Ok(author.into())
    }

    async fn update_author(
        &self,
        id: i64,
        req: AuthorRequest,
    ) -> Result<AuthorResponse, AppError> {
        let changes = AuthorChanges {
            id,
            user_id: req.user_id,
            name: req.name,
            bio: req.bio,
            updated_at: Utc::now(),
        };

        let mut tx = self.begin().await?;
        let result = AuthorRepository::new(&mut tx).update(&changes).await;
        let updated = finish(tx, result)
            .await
            .map_err(|e| classify(e, "Failed to update author"))?;

        tracing::info!(author_id = id, "author updated");
        Ok(updated.into())
    }

    async fn delete_author(&self, id: i64) -> Result<(), AppError> {
        let mut tx = self.begin().await?;
        let result = AuthorRepository::new(&mut tx).delete(id).await;
        finish(tx, result)
            .await
            .map_err(|e| classify(e, "Failed to delete author"))?;

        tracing::info!(author_id = id, "author deleted");
        Ok(())
    }

    async fn get_all_authors(&self, pagination: Pagination) -> Result<AuthorPage, AppError> {
        let mut tx = self.begin().await?;

        // Count and page are read in one transaction so the descriptor matches the rows.
        let result = {
            let mut repo = AuthorRepository::new(&mut tx);
            match repo.count().await {
                Ok(total) => repo
                    .list_page(&pagination)
                    .await
                    .map(|authors| (total, authors)),
                Err(e) => Err(e),
            }
        };

        let (total, authors) = finish(tx, result)
            .await
            .map_err(|e| classify(e, "Failed to fetch authors"))?;

        Ok(AuthorPage {
            authors: authors.into_iter().map(AuthorResponse::from).collect(),
            pagination: pagination.describe(total),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Classification;

    #[test]
    fn not_found_keeps_its_classification() {
        let err = classify(RepositoryError::NotFound, "Failed to fetch author");
        assert_eq!(err.classification, Classification::NotFound);
        assert_eq!(err.message, "author not found");
    }

    #[test]
    fn transient_failures_become_internal_with_diagnostics() {
        let err = classify(
            RepositoryError::Transient("connection refused".into()),
            "Failed to update author",
        );
        assert_eq!(err.classification, Classification::Internal);
        assert_eq!(err.message, "Failed to update author: connection refused");
    }

    #[test]
    fn store_rejections_become_bad_requests() {
        let err = classify(
            RepositoryError::Invalid("value too long".into()),
            "Failed to create author",
        );
        assert_eq!(err.classification, Classification::BadRequest);
    }
}
