//! Repository for the `presentation_tokens` table.

use portfolio_core::types::{DbId, Timestamp};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::presentation::{NewPresentationToken, PresentationToken};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, project_id, issued_by, token_hash, view_role, expires_at, \
    active, access_count, last_accessed_at, created_at";

/// Provides operations for presentation tokens. Tokens are looked up by the
/// SHA-256 of their plaintext; the plaintext itself is never stored.
pub struct PresentationTokenRepo;

impl PresentationTokenRepo {
    /// Insert a new active token, returning the created row.
    pub async fn create(
        pool: &PgPool,
        input: &NewPresentationToken,
    ) -> Result<PresentationToken, sqlx::Error> {
        let query = format!(
            "INSERT INTO presentation_tokens (id, project_id, issued_by, token_hash, view_role, expires_at)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, PresentationToken>(&query)
            .bind(Uuid::now_v7())
            .bind(input.project_id)
            .bind(input.issued_by)
            .bind(&input.token_hash)
            .bind(input.view_role.as_str())
            .bind(input.expires_at)
            .fetch_one(pool)
            .await
    }

    /// Find a token by ID.
    pub async fn find_by_id(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<PresentationToken>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM presentation_tokens WHERE id = $1");
        sqlx::query_as::<_, PresentationToken>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find a token by the SHA-256 hash of its plaintext.
    pub async fn find_by_hash(
        pool: &PgPool,
        token_hash: &str,
    ) -> Result<Option<PresentationToken>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM presentation_tokens WHERE token_hash = $1");
        sqlx::query_as::<_, PresentationToken>(&query)
            .bind(token_hash)
            .fetch_optional(pool)
            .await
    }

    /// Increment the access counter in a single statement.
    ///
    /// `GREATEST` keeps `last_accessed_at` monotonic when concurrent readers
    /// commit out of order.
    pub async fn record_access(
        pool: &PgPool,
        id: DbId,
        now: Timestamp,
    ) -> Result<Option<PresentationToken>, sqlx::Error> {
        let query = format!(
            "UPDATE presentation_tokens SET
                access_count = access_count + 1,
                last_accessed_at = GREATEST(COALESCE(last_accessed_at, $2), $2)
             WHERE id = $1 AND active
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, PresentationToken>(&query)
            .bind(id)
            .bind(now)
            .fetch_optional(pool)
            .await
    }

    /// Deactivate a token. Returns `true` if an active token was deactivated.
    pub async fn deactivate(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE presentation_tokens SET active = FALSE WHERE id = $1 AND active",
        )
        .bind(id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
