//! Project entity model and DTOs.

use portfolio_core::classification::CriticalityLevel;
use portfolio_core::criticality::CriticalityInput;
use portfolio_core::dashboard::DashboardItem;
use portfolio_core::error::CoreError;
use portfolio_core::field_filter::{FinancialFields, ProjectFinancials};
use portfolio_core::project::{self, DocumentRef, Milestone, ProjectStatus};
use portfolio_core::types::{Date, DbId, Timestamp};
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use validator::Validate;

/// A project as handed to callers.
///
/// `financials` is `None` once the record has been filtered for a viewer
/// without financial access; the seven keys are then absent from the JSON.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Project {
    pub id: DbId,
    pub name: String,
    pub description: Option<String>,
    pub status: ProjectStatus,
    pub criticality_score: i32,
    pub criticality_level: CriticalityLevel,
    pub start_date: Date,
    pub planned_end_date: Option<Date>,
    pub actual_end_date: Option<Date>,
    pub progress_percentage: i16,
    pub manager_id: DbId,
    pub team_member_ids: Vec<DbId>,
    #[serde(flatten)]
    pub financials: Option<ProjectFinancials>,
    pub milestones: Vec<Milestone>,
    pub documents: Vec<DocumentRef>,
    pub created_by: Option<DbId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Project {
    /// The fields the criticality calculator reads.
    pub fn criticality_input(&self) -> CriticalityInput {
        let financials = self.financials.unwrap_or_default();
        CriticalityInput {
            start_date: self.start_date,
            planned_end_date: self.planned_end_date,
            progress_percentage: f64::from(self.progress_percentage),
            initial_budget: financials.initial_budget,
            realized_cost: financials.realized_cost,
        }
    }

    /// Overwrite the cached score and its band.
    pub fn set_criticality(&mut self, score: i32) {
        self.criticality_score = score;
        self.criticality_level = CriticalityLevel::classify(score);
    }

    /// JSON image used for audit snapshots.
    pub fn snapshot(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

impl FinancialFields for Project {
    fn strip_financials(&mut self) {
        self.financials = None;
    }
}

impl DashboardItem for Project {
    fn id(&self) -> DbId {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn status(&self) -> ProjectStatus {
        self.status
    }

    fn criticality_score(&self) -> i32 {
        self.criticality_score
    }

    fn financials(&self) -> Option<&ProjectFinancials> {
        self.financials.as_ref()
    }
}

/// A row from the `projects` table.
#[derive(Debug, Clone, FromRow)]
pub(crate) struct ProjectRow {
    pub id: DbId,
    pub name: String,
    pub description: Option<String>,
    #[sqlx(try_from = "String")]
    pub status: ProjectStatus,
    pub criticality_score: i32,
    #[sqlx(try_from = "String")]
    pub criticality_level: CriticalityLevel,
    pub start_date: Date,
    pub planned_end_date: Option<Date>,
    pub actual_end_date: Option<Date>,
    pub progress_percentage: i16,
    pub manager_id: DbId,
    pub team_member_ids: Vec<DbId>,
    pub initial_budget: Option<f64>,
    pub current_budget: Option<f64>,
    pub realized_cost: Option<f64>,
    pub projected_revenue: Option<f64>,
    pub realized_revenue: Option<f64>,
    pub projected_roi: Option<f64>,
    pub actual_roi: Option<f64>,
    pub milestones: Json<Vec<Milestone>>,
    pub documents: Json<Vec<DocumentRef>>,
    pub created_by: Option<DbId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl From<ProjectRow> for Project {
    fn from(row: ProjectRow) -> Self {
        Project {
            id: row.id,
            name: row.name,
            description: row.description,
            status: row.status,
            criticality_score: row.criticality_score,
            criticality_level: row.criticality_level,
            start_date: row.start_date,
            planned_end_date: row.planned_end_date,
            actual_end_date: row.actual_end_date,
            progress_percentage: row.progress_percentage,
            manager_id: row.manager_id,
            team_member_ids: row.team_member_ids,
            financials: Some(ProjectFinancials {
                initial_budget: row.initial_budget,
                current_budget: row.current_budget,
                realized_cost: row.realized_cost,
                projected_revenue: row.projected_revenue,
                realized_revenue: row.realized_revenue,
                projected_roi: row.projected_roi,
                actual_roi: row.actual_roi,
            }),
            milestones: row.milestones.0,
            documents: row.documents.0,
            created_by: row.created_by,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

// ---------------------------------------------------------------------------
// Request DTOs
// ---------------------------------------------------------------------------

/// DTO for creating a new project.
///
/// Criticality fields are derived and therefore not accepted.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct CreateProject {
    #[validate(length(min = 3, max = 255))]
    pub name: String,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    /// Defaults to Planning if omitted.
    pub status: Option<ProjectStatus>,
    pub start_date: Date,
    pub planned_end_date: Option<Date>,
    /// Defaults to the creating user.
    pub manager_id: Option<DbId>,
    #[serde(default)]
    pub team_member_ids: Vec<DbId>,
    pub initial_budget: Option<f64>,
    pub current_budget: Option<f64>,
    pub realized_cost: Option<f64>,
    pub projected_revenue: Option<f64>,
    pub realized_revenue: Option<f64>,
    pub projected_roi: Option<f64>,
    pub actual_roi: Option<f64>,
    #[serde(default)]
    pub milestones: Vec<Milestone>,
    #[serde(default)]
    pub documents: Vec<DocumentRef>,
}

impl CreateProject {
    pub fn financials(&self) -> ProjectFinancials {
        ProjectFinancials {
            initial_budget: self.initial_budget,
            current_budget: self.current_budget,
            realized_cost: self.realized_cost,
            projected_revenue: self.projected_revenue,
            realized_revenue: self.realized_revenue,
            projected_roi: self.projected_roi,
            actual_roi: self.actual_roi,
        }
    }

    /// Rules the derive cannot express.
    pub fn check(&self) -> Result<(), CoreError> {
        project::validate_schedule(self.start_date, self.planned_end_date)?;
        validate_financials(&self.financials())?;
        project::validate_milestones(&self.milestones)
    }
}

/// DTO for updating an existing project. Absent fields keep their stored
/// value. Nullable columns are `Option<Option<T>>`: an explicit JSON `null`
/// arrives as `Some(None)` and clears the column.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct UpdateProject {
    #[validate(length(min = 3, max = 255))]
    pub name: Option<String>,
    #[validate(length(max = 2000))]
    #[serde(default, deserialize_with = "nullable")]
    pub description: Option<Option<String>>,
    pub status: Option<ProjectStatus>,
    pub start_date: Option<Date>,
    #[serde(default, deserialize_with = "nullable")]
    pub planned_end_date: Option<Option<Date>>,
    #[serde(default, deserialize_with = "nullable")]
    pub actual_end_date: Option<Option<Date>>,
    #[validate(range(min = 0, max = 100))]
    pub progress_percentage: Option<i16>,
    pub manager_id: Option<DbId>,
    pub team_member_ids: Option<Vec<DbId>>,
    #[serde(default, deserialize_with = "nullable")]
    pub initial_budget: Option<Option<f64>>,
    #[serde(default, deserialize_with = "nullable")]
    pub current_budget: Option<Option<f64>>,
    #[serde(default, deserialize_with = "nullable")]
    pub realized_cost: Option<Option<f64>>,
    #[serde(default, deserialize_with = "nullable")]
    pub projected_revenue: Option<Option<f64>>,
    #[serde(default, deserialize_with = "nullable")]
    pub realized_revenue: Option<Option<f64>>,
    #[serde(default, deserialize_with = "nullable")]
    pub projected_roi: Option<Option<f64>>,
    #[serde(default, deserialize_with = "nullable")]
    pub actual_roi: Option<Option<f64>>,
    pub milestones: Option<Vec<Milestone>>,
    pub documents: Option<Vec<DocumentRef>>,
}

/// A present key, `null` included, deserializes to `Some`.
fn nullable<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

impl UpdateProject {
    /// Whether the patch touches any field the criticality score reads.
    pub fn affects_criticality(&self) -> bool {
        self.start_date.is_some()
            || self.planned_end_date.is_some()
            || self.progress_percentage.is_some()
            || self.initial_budget.is_some()
            || self.realized_cost.is_some()
    }

    /// Whether the patch sets any financial field.
    pub fn touches_financials(&self) -> bool {
        self.initial_budget.is_some()
            || self.current_budget.is_some()
            || self.realized_cost.is_some()
            || self.projected_revenue.is_some()
            || self.realized_revenue.is_some()
            || self.projected_roi.is_some()
            || self.actual_roi.is_some()
    }

    /// Apply the patch to `project` and validate the merged record.
    pub fn apply_to(&self, project: &mut Project) -> Result<(), CoreError> {
        if let Some(v) = &self.name {
            project.name = v.clone();
        }
        if let Some(v) = &self.description {
            project.description = v.clone();
        }
        if let Some(v) = self.status {
            project.status = v;
        }
        if let Some(v) = self.start_date {
            project.start_date = v;
        }
        if let Some(v) = self.planned_end_date {
            project.planned_end_date = v;
        }
        if let Some(v) = self.actual_end_date {
            project.actual_end_date = v;
        }
        if let Some(v) = self.progress_percentage {
            project::validate_progress(v)?;
            project.progress_percentage = v;
        }
        if let Some(v) = self.manager_id {
            project.manager_id = v;
        }
        if let Some(v) = &self.team_member_ids {
            project.team_member_ids = v.clone();
        }
        if self.touches_financials() {
            let f = project.financials.get_or_insert_with(ProjectFinancials::default);
            merge(&mut f.initial_budget, self.initial_budget);
            merge(&mut f.current_budget, self.current_budget);
            merge(&mut f.realized_cost, self.realized_cost);
            merge(&mut f.projected_revenue, self.projected_revenue);
            merge(&mut f.realized_revenue, self.realized_revenue);
            merge(&mut f.projected_roi, self.projected_roi);
            merge(&mut f.actual_roi, self.actual_roi);
        }
        if let Some(v) = &self.milestones {
            project.milestones = v.clone();
        }
        if let Some(v) = &self.documents {
            project.documents = v.clone();
        }

        project::validate_schedule(project.start_date, project.planned_end_date)?;
        if let Some(f) = &project.financials {
            validate_financials(f)?;
        }
        project::validate_milestones(&project.milestones)
    }
}

fn merge(slot: &mut Option<f64>, patch: Option<Option<f64>>) {
    if let Some(value) = patch {
        *slot = value;
    }
}

/// Budget, cost and revenue must be non-negative. ROI may be negative.
fn validate_financials(f: &ProjectFinancials) -> Result<(), CoreError> {
    project::validate_amount("initial_budget", f.initial_budget)?;
    project::validate_amount("current_budget", f.current_budget)?;
    project::validate_amount("realized_cost", f.realized_cost)?;
    project::validate_amount("projected_revenue", f.projected_revenue)?;
    project::validate_amount("realized_revenue", f.realized_revenue)
}

// ---------------------------------------------------------------------------
// Store DTOs
// ---------------------------------------------------------------------------

/// A fully resolved project insert.
#[derive(Debug, Clone)]
pub struct NewProject {
    pub name: String,
    pub description: Option<String>,
    pub status: ProjectStatus,
    pub criticality_score: i32,
    pub criticality_level: CriticalityLevel,
    pub start_date: Date,
    pub planned_end_date: Option<Date>,
    pub progress_percentage: i16,
    pub manager_id: DbId,
    pub team_member_ids: Vec<DbId>,
    pub financials: ProjectFinancials,
    pub milestones: Vec<Milestone>,
    pub documents: Vec<DocumentRef>,
    pub created_by: DbId,
}

/// Optional narrowing applied on top of the role scope.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProjectFilters {
    pub statuses: Vec<ProjectStatus>,
    pub levels: Vec<CriticalityLevel>,
    pub manager_id: Option<DbId>,
    /// Case-insensitive substring of the project name.
    pub search: Option<String>,
}

impl ProjectFilters {
    /// In-process form of the filter, for stores without a query language.
    pub fn matches(&self, project: &Project) -> bool {
        (self.statuses.is_empty() || self.statuses.contains(&project.status))
            && (self.levels.is_empty() || self.levels.contains(&project.criticality_level))
            && self.manager_id.is_none_or(|m| m == project.manager_id)
            && self.search.as_deref().is_none_or(|q| {
                project.name.to_lowercase().contains(&q.to_lowercase())
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};
    use uuid::Uuid;

    fn project() -> Project {
        let now = Utc::now();
        Project {
            id: Uuid::now_v7(),
            name: "ERP rollout".into(),
            description: Some("Phase one".into()),
            status: ProjectStatus::InProgress,
            criticality_score: 0,
            criticality_level: CriticalityLevel::Green,
            start_date: NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
            planned_end_date: NaiveDate::from_ymd_opt(2026, 12, 31),
            actual_end_date: None,
            progress_percentage: 20,
            manager_id: Uuid::now_v7(),
            team_member_ids: Vec::new(),
            financials: Some(ProjectFinancials {
                initial_budget: Some(1000.0),
                realized_cost: Some(250.0),
                ..Default::default()
            }),
            milestones: Vec::new(),
            documents: Vec::new(),
            created_by: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn patch(body: serde_json::Value) -> UpdateProject {
        serde_json::from_value(body).unwrap()
    }

    #[test]
    fn absent_keys_leave_columns_alone() {
        let mut p = project();
        patch(serde_json::json!({ "name": "ERP rollout v2" }))
            .apply_to(&mut p)
            .unwrap();

        assert_eq!(p.name, "ERP rollout v2");
        assert_eq!(p.description.as_deref(), Some("Phase one"));
        assert!(p.planned_end_date.is_some());
        assert_eq!(p.financials.unwrap().initial_budget, Some(1000.0));
    }

    #[test]
    fn explicit_null_clears_nullable_columns() {
        let input = patch(serde_json::json!({
            "description": null,
            "planned_end_date": null,
            "initial_budget": null,
        }));
        assert!(input.touches_financials());
        assert!(input.affects_criticality());

        let mut p = project();
        input.apply_to(&mut p).unwrap();

        assert_eq!(p.description, None);
        assert_eq!(p.planned_end_date, None);
        let f = p.financials.unwrap();
        assert_eq!(f.initial_budget, None);
        assert_eq!(f.realized_cost, Some(250.0));
    }

    #[test]
    fn null_on_required_columns_is_a_no_op() {
        let input = patch(serde_json::json!({ "name": null, "start_date": null }));
        assert!(input.name.is_none());
        assert!(input.start_date.is_none());
        assert!(!input.affects_criticality());
    }
}
