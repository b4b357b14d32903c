//! Repository for the `risks` table.

use portfolio_core::types::DbId;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::risk::{NewRisk, Risk};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "\
    id, project_id, title, description, category, probability, impact, risk_level, \
    status, mitigation_plan, responsible_id, identified_date, resolved_date, \
    created_at, updated_at";

/// Provides CRUD operations for risks.
pub struct RiskRepo;

impl RiskRepo {
    /// Insert a new risk, returning the created row.
    pub async fn create(pool: &PgPool, input: &NewRisk) -> Result<Risk, sqlx::Error> {
        let query = format!(
            "INSERT INTO risks (
                id, project_id, title, description, category, probability, impact,
                risk_level, status, mitigation_plan, responsible_id, identified_date)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Risk>(&query)
            .bind(Uuid::now_v7())
            .bind(input.project_id)
            .bind(&input.title)
            .bind(&input.description)
            .bind(input.category.as_str())
            .bind(input.probability)
            .bind(input.impact)
            .bind(input.risk_level)
            .bind(input.status.as_str())
            .bind(&input.mitigation_plan)
            .bind(input.responsible_id)
            .bind(input.identified_date)
            .fetch_one(pool)
            .await
    }

    /// Find a risk by ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Risk>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM risks WHERE id = $1");
        sqlx::query_as::<_, Risk>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List a project's risks, highest level first.
    pub async fn list_by_project(pool: &PgPool, project_id: DbId) -> Result<Vec<Risk>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM risks WHERE project_id = $1 \
             ORDER BY risk_level DESC, identified_date, id"
        );
        sqlx::query_as::<_, Risk>(&query)
            .bind(project_id)
            .fetch_all(pool)
            .await
    }

    /// List the risks of several projects at once.
    pub async fn list_by_projects(
        pool: &PgPool,
        project_ids: &[DbId],
    ) -> Result<Vec<Risk>, sqlx::Error> {
        if project_ids.is_empty() {
            return Ok(Vec::new());
        }
        let query = format!(
            "SELECT {COLUMNS} FROM risks WHERE project_id = ANY($1) \
             ORDER BY project_id, risk_level DESC, id"
        );
        sqlx::query_as::<_, Risk>(&query)
            .bind(project_ids)
            .fetch_all(pool)
            .await
    }

    /// Write every editable column. Returns `None` if the row is gone.
    pub async fn update(pool: &PgPool, risk: &Risk) -> Result<Option<Risk>, sqlx::Error> {
        let query = format!(
            "UPDATE risks SET
                title = $2, description = $3, category = $4, probability = $5,
                impact = $6, risk_level = $7, status = $8, mitigation_plan = $9,
                responsible_id = $10, resolved_date = $11
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Risk>(&query)
            .bind(risk.id)
            .bind(&risk.title)
            .bind(&risk.description)
            .bind(risk.category.as_str())
            .bind(risk.probability)
            .bind(risk.impact)
            .bind(risk.risk_level)
            .bind(risk.status.as_str())
            .bind(&risk.mitigation_plan)
            .bind(risk.responsible_id)
            .bind(risk.resolved_date)
            .fetch_optional(pool)
            .await
    }

    /// Delete a risk by ID. Returns `true` if a row was removed.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM risks WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
