//! Postgres-backed record store for the review service.
//!
//! This crate implements [`ReviewStore`] over sqlx with plain runtime-checked
//! queries. Every operation is a single autocommit statement; the service
//! never needs a multi-row transaction because the cache and the search
//! index are reconciled asynchronously, not transactionally.
//!
//! Schema lives in `migrations/` and is embedded at compile time; call
//! [`PostgresReviewStore::migrate`] once at startup.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use async_trait::async_trait;
use review_core::{Review, ReviewReply, ReviewStatus, ReviewStore, StoreError};
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;

/// Connection pool cap.
const MAX_CONNECTIONS: u32 = 20;
/// Idle connections kept warm.
const MIN_CONNECTIONS: u32 = 10;
/// Connections are recycled after this lifetime.
const MAX_LIFETIME: Duration = Duration::from_secs(60 * 60);

/// SQLSTATE for unique constraint violations.
const UNIQUE_VIOLATION: &str = "23505";

const REVIEW_COLUMNS: &str =
    "id, user_id, subject, content, rating, status, audit_reason, audit_by, audit_at, created_at";

/// A row of the `reviews` table in column order.
type ReviewRow = (i64, i64, String, String, i32, String, String, i64, i64, i64);

/// A row of the `review_replies` table in column order.
type ReplyRow = (i64, i64, i64, String, i64);

/// Postgres implementation of the review record store.
///
/// Cloning shares the underlying pool.
#[derive(Clone)]
pub struct PostgresReviewStore {
    pool: PgPool,
}

impl PostgresReviewStore {
    /// Connect with the service's pool settings (20 max / 10 idle /
    /// 60-minute lifetime) and verify the database is reachable.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] if the URL is invalid or the
    /// database cannot be reached.
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .min_connections(MIN_CONNECTIONS)
            .max_lifetime(MAX_LIFETIME)
            .connect(database_url)
            .await
            .map_err(|e| StoreError::Database(format!("failed to connect: {e}")))?;

        Ok(Self { pool })
    }

    /// Wrap an existing pool, for tests and callers that manage pooling.
    #[must_use]
    pub const fn with_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Apply the embedded migrations.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] if a migration fails.
    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| StoreError::Database(format!("migration failed: {e}")))?;
        tracing::info!("database schema is up to date");
        Ok(())
    }

    /// The underlying pool, shared with any other store on the same
    /// database.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn map_sqlx(err: sqlx::Error) -> StoreError {
    match &err {
        sqlx::Error::RowNotFound => StoreError::NotFound,
        sqlx::Error::Database(db) if db.code().as_deref() == Some(UNIQUE_VIOLATION) => {
            StoreError::Conflict("duplicate key".to_string())
        }
        _ => StoreError::Database(err.to_string()),
    }
}

#[allow(clippy::cast_sign_loss)]
fn review_from_row(row: ReviewRow) -> Result<Review, StoreError> {
    let (id, user_id, subject, content, rating, status, audit_reason, audit_by, audit_at, created_at) =
        row;
    let status: ReviewStatus = status
        .parse()
        .map_err(|e: String| StoreError::Database(format!("corrupt status column: {e}")))?;
    Ok(Review {
        id: id as u64,
        user_id: user_id as u64,
        subject,
        content,
        rating,
        status,
        audit_reason,
        audit_by: audit_by as u64,
        audit_at,
        created_at,
    })
}

#[allow(clippy::cast_sign_loss)]
fn reply_from_row(row: ReplyRow) -> ReviewReply {
    let (id, review_id, merchant_id, content, created_at) = row;
    ReviewReply {
        id: id as u64,
        review_id: review_id as u64,
        merchant_id: merchant_id as u64,
        content,
        created_at,
    }
}

#[allow(clippy::cast_possible_wrap)]
const fn as_db_id(id: u64) -> i64 {
    id as i64
}

#[async_trait]
impl ReviewStore for PostgresReviewStore {
    async fn insert(&self, review: &Review) -> Result<Review, StoreError> {
        let created_at = chrono::Utc::now().timestamp();
        let row: ReviewRow = sqlx::query_as(&format!(
            "INSERT INTO reviews (user_id, subject, content, rating, status, created_at)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {REVIEW_COLUMNS}"
        ))
        .bind(as_db_id(review.user_id))
        .bind(&review.subject)
        .bind(&review.content)
        .bind(review.rating)
        .bind(review.status.as_str())
        .bind(created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx)?;

        review_from_row(row)
    }

    async fn update(&self, review: &Review) -> Result<(), StoreError> {
        let result = sqlx::query(
            "UPDATE reviews
             SET subject = $1, content = $2, rating = $3,
                 status = $4, audit_reason = $5, audit_by = $6, audit_at = $7
             WHERE id = $8",
        )
        .bind(&review.subject)
        .bind(&review.content)
        .bind(review.rating)
        .bind(review.status.as_str())
        .bind(&review.audit_reason)
        .bind(as_db_id(review.audit_by))
        .bind(review.audit_at)
        .bind(as_db_id(review.id))
        .execute(&self.pool)
        .await
        .map_err(map_sqlx)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn delete(&self, id: u64) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM reviews WHERE id = $1")
            .bind(as_db_id(id))
            .execute(&self.pool)
            .await
            .map_err(map_sqlx)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn get(&self, id: u64) -> Result<Review, StoreError> {
        let row: Option<ReviewRow> = sqlx::query_as(&format!(
            "SELECT {REVIEW_COLUMNS} FROM reviews WHERE id = $1"
        ))
        .bind(as_db_id(id))
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx)?;

        row.map_or(Err(StoreError::NotFound), review_from_row)
    }

    async fn count(&self) -> Result<u64, StoreError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM reviews")
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx)?;

        #[allow(clippy::cast_sign_loss)]
        let count = count as u64;
        Ok(count)
    }

    async fn list_offset(&self, limit: u64, offset: u64) -> Result<Vec<Review>, StoreError> {
        let rows: Vec<ReviewRow> = sqlx::query_as(&format!(
            "SELECT {REVIEW_COLUMNS} FROM reviews ORDER BY id DESC LIMIT $1 OFFSET $2"
        ))
        .bind(as_db_id(limit))
        .bind(as_db_id(offset))
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx)?;

        rows.into_iter().map(review_from_row).collect()
    }

    async fn list_pending(
        &self,
        limit: u64,
        offset: u64,
    ) -> Result<(Vec<Review>, u64), StoreError> {
        let (total,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM reviews WHERE status = 'pending'")
                .fetch_one(&self.pool)
                .await
                .map_err(map_sqlx)?;

        let rows: Vec<ReviewRow> = sqlx::query_as(&format!(
            "SELECT {REVIEW_COLUMNS} FROM reviews
             WHERE status = 'pending'
             ORDER BY id DESC LIMIT $1 OFFSET $2"
        ))
        .bind(as_db_id(limit))
        .bind(as_db_id(offset))
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx)?;

        let reviews = rows
            .into_iter()
            .map(review_from_row)
            .collect::<Result<Vec<_>, _>>()?;

        #[allow(clippy::cast_sign_loss)]
        let total = total as u64;
        Ok((reviews, total))
    }

    async fn insert_reply(&self, reply: &ReviewReply) -> Result<u64, StoreError> {
        let created_at = chrono::Utc::now().timestamp();
        let (id,): (i64,) = sqlx::query_as(
            "INSERT INTO review_replies (review_id, merchant_id, content, created_at)
             VALUES ($1, $2, $3, $4)
             RETURNING id",
        )
        .bind(as_db_id(reply.review_id))
        .bind(as_db_id(reply.merchant_id))
        .bind(&reply.content)
        .bind(created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match map_sqlx(e) {
            StoreError::Conflict(_) => {
                StoreError::Conflict("reply already exists for this merchant".to_string())
            }
            other => other,
        })?;

        #[allow(clippy::cast_sign_loss)]
        let id = id as u64;
        Ok(id)
    }

    async fn reply_exists(&self, review_id: u64, merchant_id: u64) -> Result<bool, StoreError> {
        let (exists,): (bool,) = sqlx::query_as(
            "SELECT EXISTS(SELECT 1 FROM review_replies WHERE review_id = $1 AND merchant_id = $2)",
        )
        .bind(as_db_id(review_id))
        .bind(as_db_id(merchant_id))
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx)?;

        Ok(exists)
    }

    async fn list_replies(&self, review_id: u64) -> Result<Vec<ReviewReply>, StoreError> {
        let rows: Vec<ReplyRow> = sqlx::query_as(
            "SELECT id, review_id, merchant_id, content, created_at
             FROM review_replies WHERE review_id = $1 ORDER BY id ASC",
        )
        .bind(as_db_id(review_id))
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx)?;

        Ok(rows.into_iter().map(reply_from_row).collect())
    }
}
