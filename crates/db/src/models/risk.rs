//! Risk entity model and DTOs.

use portfolio_core::error::CoreError;
use portfolio_core::risk::{self, RiskCategory, RiskStatus};
use portfolio_core::types::{Date, DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// A row from the `risks` table.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct Risk {
    pub id: DbId,
    pub project_id: DbId,
    pub title: String,
    pub description: Option<String>,
    #[sqlx(try_from = "String")]
    pub category: RiskCategory,
    pub probability: i16,
    pub impact: i16,
    /// Always `probability * impact`.
    pub risk_level: i32,
    #[sqlx(try_from = "String")]
    pub status: RiskStatus,
    pub mitigation_plan: Option<String>,
    pub responsible_id: Option<DbId>,
    pub identified_date: Date,
    pub resolved_date: Option<Date>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Risk {
    /// JSON image used for audit snapshots.
    pub fn snapshot(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

/// DTO for creating a risk under a project.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct CreateRisk {
    #[validate(length(min = 5, max = 255))]
    pub title: String,
    #[validate(length(max = 1000))]
    pub description: Option<String>,
    pub category: RiskCategory,
    #[validate(range(min = 1, max = 5))]
    pub probability: i16,
    #[validate(range(min = 1, max = 5))]
    pub impact: i16,
    pub mitigation_plan: Option<String>,
    pub responsible_id: Option<DbId>,
}

/// DTO for updating a risk. All fields are optional.
///
/// `risk_level` is not accepted; it follows probability and impact.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct UpdateRisk {
    #[validate(length(min = 5, max = 255))]
    pub title: Option<String>,
    #[validate(length(max = 1000))]
    pub description: Option<String>,
    pub category: Option<RiskCategory>,
    #[validate(range(min = 1, max = 5))]
    pub probability: Option<i16>,
    #[validate(range(min = 1, max = 5))]
    pub impact: Option<i16>,
    pub status: Option<RiskStatus>,
    pub mitigation_plan: Option<String>,
    pub responsible_id: Option<DbId>,
}

impl UpdateRisk {
    /// Apply the patch, recomputing `risk_level` from the merged factors.
    ///
    /// Moving a risk to a resolved status stamps `resolved_date` with `today`
    /// unless it already has one.
    pub fn apply_to(&self, risk: &mut Risk, today: Date) -> Result<(), CoreError> {
        if let Some(v) = &self.title {
            risk.title = v.clone();
        }
        if let Some(v) = &self.description {
            risk.description = Some(v.clone());
        }
        if let Some(v) = self.category {
            risk.category = v;
        }
        if let Some(v) = self.probability {
            risk.probability = v;
        }
        if let Some(v) = self.impact {
            risk.impact = v;
        }
        if let Some(v) = &self.mitigation_plan {
            risk.mitigation_plan = Some(v.clone());
        }
        if let Some(v) = self.responsible_id {
            risk.responsible_id = Some(v);
        }
        if let Some(status) = self.status {
            risk.status = status;
            if status.is_resolved() && risk.resolved_date.is_none() {
                risk.resolved_date = Some(today);
            }
        }
        risk.risk_level = risk::risk_level(risk.probability, risk.impact)?;
        Ok(())
    }
}

/// A fully resolved risk insert.
#[derive(Debug, Clone)]
pub struct NewRisk {
    pub project_id: DbId,
    pub title: String,
    pub description: Option<String>,
    pub category: RiskCategory,
    pub probability: i16,
    pub impact: i16,
    pub risk_level: i32,
    pub status: RiskStatus,
    pub mitigation_plan: Option<String>,
    pub responsible_id: Option<DbId>,
    pub identified_date: Date,
}

impl NewRisk {
    /// Build an Open risk identified on `today`.
    pub fn open(project_id: DbId, input: &CreateRisk, today: Date) -> Result<Self, CoreError> {
        Ok(NewRisk {
            project_id,
            title: input.title.clone(),
            description: input.description.clone(),
            category: input.category,
            probability: input.probability,
            impact: input.impact,
            risk_level: risk::risk_level(input.probability, input.impact)?,
            status: RiskStatus::Open,
            mitigation_plan: input.mitigation_plan.clone(),
            responsible_id: input.responsible_id,
            identified_date: today,
        })
    }
}
