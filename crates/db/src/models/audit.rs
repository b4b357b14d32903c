//! Audit entry model and DTOs.

use portfolio_core::audit::{AuditAction, AuditOrigin};
use portfolio_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `audit_entries` table. Rows are never updated or deleted.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct AuditEntry {
    pub id: i64,
    /// Not a foreign key: entries outlive the project they describe.
    pub project_id: DbId,
    pub actor_id: DbId,
    #[sqlx(try_from = "String")]
    pub action: AuditAction,
    pub old_values: Option<serde_json::Value>,
    pub new_values: Option<serde_json::Value>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub created_at: Timestamp,
}

/// DTO for appending an audit entry.
#[derive(Debug, Clone, PartialEq)]
pub struct NewAuditEntry {
    pub project_id: DbId,
    pub actor_id: DbId,
    pub action: AuditAction,
    pub old_values: Option<serde_json::Value>,
    pub new_values: Option<serde_json::Value>,
    pub origin: AuditOrigin,
}

/// Pagination for a project's history.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct AuditPage {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl AuditPage {
    pub const DEFAULT_LIMIT: i64 = 50;
    pub const MAX_LIMIT: i64 = 500;

    /// Clamp to `1..=MAX_LIMIT`, defaulting to [`Self::DEFAULT_LIMIT`].
    pub fn limit(&self) -> i64 {
        self.limit
            .unwrap_or(Self::DEFAULT_LIMIT)
            .clamp(1, Self::MAX_LIMIT)
    }

    pub fn offset(&self) -> i64 {
        self.offset.unwrap_or(0).max(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_defaults_and_caps() {
        assert_eq!(AuditPage::default().limit(), 50);
        assert_eq!(AuditPage { limit: Some(10_000), offset: None }.limit(), 500);
        assert_eq!(AuditPage { limit: Some(0), offset: Some(-3) }.limit(), 1);
        assert_eq!(AuditPage { limit: None, offset: Some(-3) }.offset(), 0);
    }
}
