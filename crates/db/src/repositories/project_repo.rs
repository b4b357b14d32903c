//! Repository for the `projects` table.
//!
//! Listing and lookup take a [`ProjectScope`] which becomes part of the
//! `WHERE` clause, so out-of-scope rows never leave the database.

use portfolio_core::classification::CriticalityLevel;
use portfolio_core::scope::ProjectScope;
use portfolio_core::types::DbId;
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::project::{NewProject, Project, ProjectFilters, ProjectRow};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "\
    id, name, description, status, criticality_score, criticality_level, \
    start_date, planned_end_date, actual_end_date, progress_percentage, \
    manager_id, team_member_ids, initial_budget, current_budget, realized_cost, \
    projected_revenue, realized_revenue, projected_roi, actual_roi, \
    milestones, documents, created_by, created_at, updated_at";

/// Provides CRUD operations for projects.
pub struct ProjectRepo;

impl ProjectRepo {
    /// Insert a new project, returning the created row.
    pub async fn create(pool: &PgPool, input: &NewProject) -> Result<Project, sqlx::Error> {
        let query = format!(
            "INSERT INTO projects (
                id, name, description, status, criticality_score, criticality_level,
                start_date, planned_end_date, progress_percentage, manager_id, team_member_ids,
                initial_budget, current_budget, realized_cost, projected_revenue,
                realized_revenue, projected_roi, actual_roi, milestones, documents, created_by)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15,
                     $16, $17, $18, $19, $20, $21)
             RETURNING {COLUMNS}"
        );
        let f = &input.financials;
        sqlx::query_as::<_, ProjectRow>(&query)
            .bind(Uuid::now_v7())
            .bind(&input.name)
            .bind(&input.description)
            .bind(input.status.as_str())
            .bind(input.criticality_score)
            .bind(input.criticality_level.as_str())
            .bind(input.start_date)
            .bind(input.planned_end_date)
            .bind(input.progress_percentage)
            .bind(input.manager_id)
            .bind(&input.team_member_ids)
            .bind(f.initial_budget)
            .bind(f.current_budget)
            .bind(f.realized_cost)
            .bind(f.projected_revenue)
            .bind(f.realized_revenue)
            .bind(f.projected_roi)
            .bind(f.actual_roi)
            .bind(Json(&input.milestones))
            .bind(Json(&input.documents))
            .bind(input.created_by)
            .fetch_one(pool)
            .await
            .map(Project::from)
    }

    /// Find a project by ID within `scope`.
    pub async fn find_by_id(
        pool: &PgPool,
        id: DbId,
        scope: ProjectScope,
    ) -> Result<Option<Project>, sqlx::Error> {
        let mut filter = QueryFilter::starting_at(2);
        filter.push_scope(scope);
        let query = format!(
            "SELECT {COLUMNS} FROM projects WHERE id = $1{}",
            filter.and_clause()
        );
        let q = sqlx::query_as::<_, ProjectRow>(&query).bind(id);
        filter
            .bind_all(q)
            .fetch_optional(pool)
            .await
            .map(|row| row.map(Project::from))
    }

    /// List projects within `scope` that match `filters`, ordered by name.
    pub async fn list(
        pool: &PgPool,
        scope: ProjectScope,
        filters: &ProjectFilters,
    ) -> Result<Vec<Project>, sqlx::Error> {
        let mut filter = QueryFilter::starting_at(1);
        filter.push_scope(scope);
        filter.push_filters(filters);
        let query = format!(
            "SELECT {COLUMNS} FROM projects{} ORDER BY name, id",
            filter.where_clause()
        );
        let q = sqlx::query_as::<_, ProjectRow>(&query);
        let rows = filter.bind_all(q).fetch_all(pool).await?;
        Ok(rows.into_iter().map(Project::from).collect())
    }

    /// Write every editable column. Returns `None` if the row is gone.
    pub async fn update(pool: &PgPool, project: &Project) -> Result<Option<Project>, sqlx::Error> {
        let query = format!(
            "UPDATE projects SET
                name = $2, description = $3, status = $4, start_date = $5,
                planned_end_date = $6, actual_end_date = $7, progress_percentage = $8,
                manager_id = $9, team_member_ids = $10,
                initial_budget = $11, current_budget = $12, realized_cost = $13,
                projected_revenue = $14, realized_revenue = $15, projected_roi = $16,
                actual_roi = $17, milestones = $18, documents = $19
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        let f = project.financials.unwrap_or_default();
        sqlx::query_as::<_, ProjectRow>(&query)
            .bind(project.id)
            .bind(&project.name)
            .bind(&project.description)
            .bind(project.status.as_str())
            .bind(project.start_date)
            .bind(project.planned_end_date)
            .bind(project.actual_end_date)
            .bind(project.progress_percentage)
            .bind(project.manager_id)
            .bind(&project.team_member_ids)
            .bind(f.initial_budget)
            .bind(f.current_budget)
            .bind(f.realized_cost)
            .bind(f.projected_revenue)
            .bind(f.realized_revenue)
            .bind(f.projected_roi)
            .bind(f.actual_roi)
            .bind(Json(&project.milestones))
            .bind(Json(&project.documents))
            .fetch_optional(pool)
            .await
            .map(|row| row.map(Project::from))
    }

    /// Overwrite the cached criticality. Returns `true` if a row was updated.
    pub async fn set_criticality(
        pool: &PgPool,
        id: DbId,
        score: i32,
        level: CriticalityLevel,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE projects SET criticality_score = $2, criticality_level = $3 WHERE id = $1",
        )
        .bind(id)
        .bind(score)
        .bind(level.as_str())
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Permanently delete a project by ID. Returns `true` if a row was removed.
    pub async fn hard_delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM projects WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

// ---------------------------------------------------------------------------
// Internal helpers for dynamic query building
// ---------------------------------------------------------------------------

/// Typed bind value for dynamically-built project queries.
enum BindValue {
    Id(DbId),
    Text(String),
    TextArray(Vec<String>),
}

/// Accumulates conditions and their bind values, numbering placeholders
/// from a given starting index.
struct QueryFilter {
    conditions: Vec<String>,
    bind_values: Vec<BindValue>,
    bind_idx: u32,
}

impl QueryFilter {
    fn starting_at(bind_idx: u32) -> Self {
        Self {
            conditions: Vec::new(),
            bind_values: Vec::new(),
            bind_idx,
        }
    }

    fn push(&mut self, condition: impl FnOnce(u32) -> String, value: BindValue) {
        self.conditions.push(condition(self.bind_idx));
        self.bind_values.push(value);
        self.bind_idx += 1;
    }

    fn push_scope(&mut self, scope: ProjectScope) {
        match scope {
            ProjectScope::Unrestricted => {}
            ProjectScope::ManagedBy(user_id) => {
                self.push(|i| format!("manager_id = ${i}"), BindValue::Id(user_id));
            }
            ProjectScope::TeamMember(user_id) => {
                self.push(|i| format!("${i} = ANY(team_member_ids)"), BindValue::Id(user_id));
            }
        }
    }

    fn push_filters(&mut self, filters: &ProjectFilters) {
        if !filters.statuses.is_empty() {
            let values = filters.statuses.iter().map(|s| s.as_str().to_string()).collect();
            self.push(|i| format!("status = ANY(${i})"), BindValue::TextArray(values));
        }
        if !filters.levels.is_empty() {
            let values = filters.levels.iter().map(|l| l.as_str().to_string()).collect();
            self.push(
                |i| format!("criticality_level = ANY(${i})"),
                BindValue::TextArray(values),
            );
        }
        if let Some(manager_id) = filters.manager_id {
            self.push(|i| format!("manager_id = ${i}"), BindValue::Id(manager_id));
        }
        if let Some(search) = filters.search.as_deref().filter(|s| !s.trim().is_empty()) {
            let pattern = format!("%{}%", escape_like(search.trim()));
            self.push(|i| format!("name ILIKE ${i}"), BindValue::Text(pattern));
        }
    }

    /// `""` or `" WHERE a AND b"`.
    fn where_clause(&self) -> String {
        if self.conditions.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", self.conditions.join(" AND "))
        }
    }

    /// `""` or `" AND a AND b"`, for queries that already have a `WHERE`.
    fn and_clause(&self) -> String {
        self.conditions
            .iter()
            .map(|c| format!(" AND {c}"))
            .collect()
    }

    fn bind_all<'q>(
        &'q self,
        mut q: sqlx::query::QueryAs<'q, sqlx::Postgres, ProjectRow, sqlx::postgres::PgArguments>,
    ) -> sqlx::query::QueryAs<'q, sqlx::Postgres, ProjectRow, sqlx::postgres::PgArguments> {
        for val in &self.bind_values {
            q = match val {
                BindValue::Id(v) => q.bind(*v),
                BindValue::Text(v) => q.bind(v),
                BindValue::TextArray(v) => q.bind(v),
            };
        }
        q
    }
}

/// Escape `%`, `_` and `\` so user input matches literally inside ILIKE.
fn escape_like(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
