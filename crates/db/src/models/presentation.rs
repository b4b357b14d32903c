//! Presentation token model and DTOs.

use portfolio_core::roles::Role;
use portfolio_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// A row from the `presentation_tokens` table.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct PresentationToken {
    pub id: DbId,
    pub project_id: DbId,
    pub issued_by: DbId,
    /// SHA-256 of the plaintext token. Never serialized.
    #[serde(skip_serializing)]
    pub token_hash: String,
    /// Profile the project is shown under when the link is opened.
    #[sqlx(try_from = "String")]
    pub view_role: Role,
    pub expires_at: Timestamp,
    pub active: bool,
    pub access_count: i64,
    pub last_accessed_at: Option<Timestamp>,
    pub created_at: Timestamp,
}

/// DTO for storing a freshly generated token.
#[derive(Debug, Clone)]
pub struct NewPresentationToken {
    pub project_id: DbId,
    pub issued_by: DbId,
    pub token_hash: String,
    pub view_role: Role,
    pub expires_at: Timestamp,
}

/// Request body for issuing a token.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct IssueTokenRequest {
    /// Defaults to the issuer's own role.
    pub view_role: Option<Role>,
}
