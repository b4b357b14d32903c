//! Financial field filtering.
//!
//! Every project record leaving the service passes through
//! [`filter_project_fields`] with the role the record is being shown to. For
//! presentation links that is the token's viewing profile, not the caller.

use serde::{Deserialize, Serialize};

use crate::permissions::can_access_financial_data;
use crate::roles::Role;

/// The seven financial keys, in their serialized spelling.
pub const FINANCIAL_FIELDS: [&str; 7] = [
    "initial_budget",
    "current_budget",
    "realized_cost",
    "projected_revenue",
    "realized_revenue",
    "projected_roi",
    "actual_roi",
];

/// Budget, cost, revenue and ROI figures of a project. Each is optional.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectFinancials {
    pub initial_budget: Option<f64>,
    pub current_budget: Option<f64>,
    pub realized_cost: Option<f64>,
    pub projected_revenue: Option<f64>,
    pub realized_revenue: Option<f64>,
    pub projected_roi: Option<f64>,
    pub actual_roi: Option<f64>,
}

/// A record carrying financial fields that can be removed wholesale.
pub trait FinancialFields {
    /// Remove every financial field so that it is absent once serialized.
    fn strip_financials(&mut self);
}

/// Return a copy of `project` with financial fields removed unless `role` may
/// see them. The input is never modified.
pub fn filter_project_fields<P>(project: &P, role: Role) -> P
where
    P: FinancialFields + Clone,
{
    let mut out = project.clone();
    if !can_access_financial_data(role) {
        out.strip_financials();
    }
    out
}

/// Filter a whole collection for one viewer.
pub fn filter_all<P>(projects: &[P], role: Role) -> Vec<P>
where
    P: FinancialFields + Clone,
{
    projects
        .iter()
        .map(|p| filter_project_fields(p, role))
        .collect()
}

/// Remove financial keys from a JSON snapshot (shallow, top-level keys only).
///
/// Audit snapshots are stored whole and filtered at read time with this.
pub fn strip_financial_keys(value: &serde_json::Value) -> serde_json::Value {
    match value {
        serde_json::Value::Object(map) => {
            let kept = map
                .iter()
                .filter(|(key, _)| !FINANCIAL_FIELDS.contains(&key.as_str()))
                .map(|(key, val)| (key.clone(), val.clone()))
                .collect();
            serde_json::Value::Object(kept)
        }
        other => other.clone(),
    }
}

/// Snapshot form of [`filter_project_fields`].
pub fn filter_snapshot(value: &serde_json::Value, role: Role) -> serde_json::Value {
    if can_access_financial_data(role) {
        value.clone()
    } else {
        strip_financial_keys(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Clone, PartialEq, Serialize)]
    struct Record {
        name: String,
        #[serde(flatten)]
        financials: Option<ProjectFinancials>,
    }

    impl FinancialFields for Record {
        fn strip_financials(&mut self) {
            self.financials = None;
        }
    }

    fn record() -> Record {
        Record {
            name: "ERP".into(),
            financials: Some(ProjectFinancials {
                initial_budget: Some(1000.0),
                realized_cost: Some(250.0),
                ..Default::default()
            }),
        }
    }

    #[test]
    fn restricted_roles_lose_every_financial_key() {
        for role in [Role::Gp, Role::Me] {
            let filtered = serde_json::to_value(filter_project_fields(&record(), role)).unwrap();
            let obj = filtered.as_object().unwrap();
            for key in FINANCIAL_FIELDS {
                assert!(!obj.contains_key(key), "{role} still sees {key}");
            }
            assert_eq!(obj["name"], "ERP");
        }
    }

    #[test]
    fn admin_sees_all_keys_unchanged() {
        let original = record();
        let filtered = filter_project_fields(&original, Role::Admin);
        assert_eq!(filtered, original);
        let value = serde_json::to_value(filtered).unwrap();
        for key in FINANCIAL_FIELDS {
            assert!(value.as_object().unwrap().contains_key(key));
        }
        assert_eq!(value["initial_budget"], 1000.0);
        assert_eq!(value["current_budget"], serde_json::Value::Null);
    }

    #[test]
    fn input_is_never_mutated() {
        let original = record();
        let _ = filter_project_fields(&original, Role::Me);
        assert!(original.financials.is_some());
    }

    #[test]
    fn snapshot_stripping_is_shallow() {
        let snapshot = json!({
            "name": "ERP",
            "initial_budget": 10,
            "actual_roi": 0.2,
            "milestones": [{ "initial_budget": 5 }]
        });
        let out = filter_snapshot(&snapshot, Role::Gp);
        assert_eq!(out, json!({ "name": "ERP", "milestones": [{ "initial_budget": 5 }] }));
        assert_eq!(filter_snapshot(&snapshot, Role::Dir), snapshot);
    }

    #[test]
    fn null_snapshot_passes_through() {
        assert_eq!(strip_financial_keys(&serde_json::Value::Null), serde_json::Value::Null);
    }
}
