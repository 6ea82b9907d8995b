use crate::{
    error::RepositoryError,
    models::{Author, AuthorChanges, NewAuthor, Pagination},
};
use sqlx::{PgConnection, PgPool};

/// Column list shared by every statement that hands rows back.
const AUTHOR_COLUMNS: &str = "id, user_id, name, bio, created_at, updated_at";

/// The table definition, applied idempotently by `ensure_schema`.
pub const SCHEMA: &str = include_str!("../schema.sql");

/// AuthorRepository
///
/// Data access for the `authors` table. Holds no state of its own: it borrows a
/// connection (normally a transaction, which derefs to one) from the caller, so the
/// caller owns the commit/rollback decision.
///
/// Every statement is parameterized with `bind`; caller-supplied values never reach
/// the SQL text.
pub struct AuthorRepository<'c> {
    conn: &'c mut PgConnection,
}

impl<'c> AuthorRepository<'c> {
    pub fn new(conn: &'c mut PgConnection) -> Self {
        Self { conn }
    }

    /// create
    ///
    /// Inserts a row and returns it, including the identifier the store assigned.
    pub async fn create(&mut self, author: &NewAuthor) -> Result<Author, RepositoryError> {
        let sql = format!(
            "INSERT INTO authors (user_id, name, bio, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {AUTHOR_COLUMNS}"
        );

        let created = sqlx::query_as::<_, Author>(&sql)
            .bind(author.user_id)
            .bind(&author.name)
            .bind(&author.bio)
            .bind(author.created_at)
            .bind(author.updated_at)
            .fetch_one(&mut *self.conn)
            .await?;

        Ok(created)
    }

    /// find_by_id
    ///
    /// `NotFound` when no row matches; any driver failure stays `Transient`.
    pub async fn find_by_id(&mut self, id: i64) -> Result<Author, RepositoryError> {
        let sql = format!("SELECT {AUTHOR_COLUMNS} FROM authors WHERE id = $1");

        sqlx::query_as::<_, Author>(&sql)
            .bind(id)
            .fetch_optional(&mut *self.conn)
            .await?
            .ok_or(RepositoryError::NotFound)
    }

    /// update
    ///
    /// Overwrites the mutable columns. Zero affected rows is reported as `NotFound`
    /// rather than a silent success.
    pub async fn update(&mut self, changes: &AuthorChanges) -> Result<Author, RepositoryError> {
        let sql = format!(
            "UPDATE authors SET user_id = $1, name = $2, bio = $3, updated_at = $4 \
             WHERE id = $5 RETURNING {AUTHOR_COLUMNS}"
        );

        sqlx::query_as::<_, Author>(&sql)
            .bind(changes.user_id)
            .bind(&changes.name)
            .bind(&changes.bio)
            .bind(changes.updated_at)
            .bind(changes.id)
            .fetch_optional(&mut *self.conn)
            .await?
            .ok_or(RepositoryError::NotFound)
    }

    /// delete
    ///
    /// Hard delete. Zero affected rows is reported as `NotFound`.
    pub async fn delete(&mut self, id: i64) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM authors WHERE id = $1")
            .bind(id)
            .execute(&mut *self.conn)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// list_page
    ///
    /// Newest first; `id` breaks ties between rows created in the same instant.
    pub async fn list_page(
        &mut self,
        pagination: &Pagination,
    ) -> Result<Vec<Author>, RepositoryError> {
        let sql = format!(
            "SELECT {AUTHOR_COLUMNS} FROM authors \
             ORDER BY created_at DESC, id DESC LIMIT $1 OFFSET $2"
        );

        let authors = sqlx::query_as::<_, Author>(&sql)
            .bind(pagination.page_size())
            .bind(pagination.offset())
            .fetch_all(&mut *self.conn)
            .await?;

        Ok(authors)
    }

    /// count
    ///
    /// Total number of authors, used to derive the page count.
    pub async fn count(&mut self) -> Result<i64, RepositoryError> {
        let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM authors")
            .fetch_one(&mut *self.conn)
            .await?;

        Ok(total)
    }
}

/// ensure_schema
///
/// Creates the `authors` table when it is missing. Used by the local environment at
/// startup and by the database-backed tests.
pub async fn ensure_schema(pool: &PgPool) -> Result<(), RepositoryError> {
    sqlx::raw_sql(SCHEMA).execute(pool).await?;
    Ok(())
}
