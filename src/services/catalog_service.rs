use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::Result;
use crate::models::book::{Book, Difficulty};
use crate::models::stats::{ActivityCount, AdminStats};

/// Source of books whose content has passed review.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ContentStore: Send + Sync {
    async fn approved_books(&self, limit: usize) -> Result<Vec<Book>>;
}

/// Existing quiz coverage, keyed by book.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CoverageStore: Send + Sync {
    async fn existing_difficulties(&self, book_id: Uuid) -> Result<Vec<Difficulty>>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StatsStore: Send + Sync {
    async fn admin_stats(&self, since: DateTime<Utc>) -> Result<AdminStats>;

    /// Completed quizzes since `since`, counted per UTC day and difficulty.
    async fn quiz_activity(&self, since: DateTime<Utc>) -> Result<Vec<ActivityCount>>;
}

const QUIZZES_SINCE_SQL: &str = "SELECT COUNT(*) FROM quiz_history WHERE completed_at >= $1";

const ACTIVITY_SQL: &str = r#"
    SELECT (completed_at AT TIME ZONE 'UTC')::date AS day,
           difficulty,
           COUNT(*) AS quizzes
    FROM quiz_history
    WHERE completed_at >= $1
    GROUP BY day, difficulty
    ORDER BY day
"#;

#[derive(Clone)]
pub struct CatalogService {
    pool: PgPool,
}

impl CatalogService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ContentStore for CatalogService {
    async fn approved_books(&self, limit: usize) -> Result<Vec<Book>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let books = sqlx::query_as::<_, Book>(
            r#"
            SELECT b.id, b.title, b.author
            FROM book_content bc
            JOIN books b ON b.id = bc.book_id
            WHERE bc.approved = true
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(books)
    }
}

#[async_trait]
impl CoverageStore for CatalogService {
    async fn existing_difficulties(&self, book_id: Uuid) -> Result<Vec<Difficulty>> {
        let raw: Vec<String> =
            sqlx::query_scalar(r#"SELECT difficulty FROM quiz_templates WHERE book_id = $1"#)
                .bind(book_id)
                .fetch_all(&self.pool)
                .await?;

        Ok(raw
            .iter()
            .filter_map(|value| match value.parse::<Difficulty>() {
                Ok(d) => Some(d),
                Err(e) => {
                    tracing::debug!(%book_id, error = %e, "Ignoring quiz with unrecognized difficulty");
                    None
                }
            })
            .collect())
    }
}

#[async_trait]
impl StatsStore for CatalogService {
    async fn admin_stats(&self, since: DateTime<Utc>) -> Result<AdminStats> {
        let (total_users, total_quizzes, total_books, active_today) = tokio::try_join!(
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM profiles").fetch_one(&self.pool),
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM quiz_history").fetch_one(&self.pool),
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM books").fetch_one(&self.pool),
            sqlx::query_scalar::<_, i64>(QUIZZES_SINCE_SQL)
                .bind(since)
                .fetch_one(&self.pool),
        )?;

        Ok(AdminStats {
            total_users,
            total_quizzes,
            total_books,
            active_today,
        })
    }

    async fn quiz_activity(&self, since: DateTime<Utc>) -> Result<Vec<ActivityCount>> {
        let counts = sqlx::query_as::<_, ActivityCount>(ACTIVITY_SQL)
            .bind(since)
            .fetch_all(&self.pool)
            .await?;
        Ok(counts)
    }
}
