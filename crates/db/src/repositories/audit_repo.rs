//! Repository for the append-only `audit_entries` table.

use portfolio_core::types::DbId;
use sqlx::PgPool;

use crate::models::audit::{AuditEntry, AuditPage, NewAuditEntry};

/// Column list for `audit_entries` SELECT queries.
const COLUMNS: &str = "\
    id, project_id, actor_id, action, old_values, new_values, \
    ip_address, user_agent, created_at";

/// Column list for INSERT (excludes auto-generated `id`, `created_at`).
const INSERT_COLUMNS: &str = "\
    project_id, actor_id, action, old_values, new_values, ip_address, user_agent";

const INSERT_ARITY: u32 = 7;

/// Provides insert and query operations for audit entries.
pub struct AuditEntryRepo;

impl AuditEntryRepo {
    /// Batch insert multiple audit entries.
    ///
    /// Uses a single INSERT with multiple value rows.
    pub async fn batch_insert(
        pool: &PgPool,
        entries: &[NewAuditEntry],
    ) -> Result<Vec<AuditEntry>, sqlx::Error> {
        if entries.is_empty() {
            return Ok(Vec::new());
        }

        let rows: Vec<String> = (0..entries.len() as u32)
            .map(|row| {
                let params: Vec<String> = (1..=INSERT_ARITY)
                    .map(|col| format!("${}", row * INSERT_ARITY + col))
                    .collect();
                format!("({})", params.join(", "))
            })
            .collect();
        let query = format!(
            "INSERT INTO audit_entries ({INSERT_COLUMNS}) VALUES {} RETURNING {COLUMNS}",
            rows.join(", ")
        );

        let mut q = sqlx::query_as::<_, AuditEntry>(&query);
        for entry in entries {
            q = q
                .bind(entry.project_id)
                .bind(entry.actor_id)
                .bind(entry.action.as_str())
                .bind(&entry.old_values)
                .bind(&entry.new_values)
                .bind(&entry.origin.ip_address)
                .bind(&entry.origin.user_agent);
        }
        q.fetch_all(pool).await
    }

    /// A project's history, newest first.
    pub async fn list_by_project(
        pool: &PgPool,
        project_id: DbId,
        page: AuditPage,
    ) -> Result<Vec<AuditEntry>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM audit_entries WHERE project_id = $1 \
             ORDER BY created_at DESC, id DESC \
             LIMIT $2 OFFSET $3"
        );
        sqlx::query_as::<_, AuditEntry>(&query)
            .bind(project_id)
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(pool)
            .await
    }
}
