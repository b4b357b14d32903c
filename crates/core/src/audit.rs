//! Audit trail vocabulary and snapshot diffing.
//!
//! This module lives in `core` (zero internal deps) so the action
//! classification can be unit-tested without a store or a server.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::field_filter::FINANCIAL_FIELDS;

// ---------------------------------------------------------------------------
// Actions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AuditAction {
    Create,
    Update,
    Delete,
    StatusChange,
    FinancialChange,
    RiskChange,
}

impl AuditAction {
    pub const ALL: [AuditAction; 6] = [
        AuditAction::Create,
        AuditAction::Update,
        AuditAction::Delete,
        AuditAction::StatusChange,
        AuditAction::FinancialChange,
        AuditAction::RiskChange,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            AuditAction::Create => "Create",
            AuditAction::Update => "Update",
            AuditAction::Delete => "Delete",
            AuditAction::StatusChange => "StatusChange",
            AuditAction::FinancialChange => "FinancialChange",
            AuditAction::RiskChange => "RiskChange",
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AuditAction {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AuditAction::ALL
            .into_iter()
            .find(|a| a.as_str() == s)
            .ok_or_else(|| CoreError::Validation(format!("Unknown audit action '{s}'")))
    }
}

impl TryFrom<String> for AuditAction {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Where a mutating request came from, when known.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditOrigin {
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

// ---------------------------------------------------------------------------
// Diffing
// ---------------------------------------------------------------------------

/// Keys maintained by the system rather than the editor; changes to them
/// alone do not make an update.
pub const DERIVED_FIELDS: &[&str] = &[
    "criticality_score",
    "criticality_level",
    "updated_at",
    "created_at",
];

/// Top-level keys whose values differ between two object snapshots,
/// ignoring [`DERIVED_FIELDS`]. Keys are returned sorted.
pub fn changed_fields(old: &serde_json::Value, new: &serde_json::Value) -> Vec<String> {
    let empty = serde_json::Map::new();
    let old = old.as_object().unwrap_or(&empty);
    let new = new.as_object().unwrap_or(&empty);

    let mut keys: Vec<String> = old
        .keys()
        .chain(new.keys())
        .filter(|k| !DERIVED_FIELDS.contains(&k.as_str()))
        .filter(|k| old.get(*k) != new.get(*k))
        .cloned()
        .collect();
    keys.sort();
    keys.dedup();
    keys
}

/// Classify a project update from its before/after snapshots.
///
/// Any financial change wins; a change touching only `status` is a status
/// change; everything else is a plain update.
pub fn classify_update(old: &serde_json::Value, new: &serde_json::Value) -> AuditAction {
    let changed = changed_fields(old, new);
    if changed
        .iter()
        .any(|k| FINANCIAL_FIELDS.contains(&k.as_str()))
    {
        AuditAction::FinancialChange
    } else if changed.len() == 1 && changed[0] == "status" {
        AuditAction::StatusChange
    } else {
        AuditAction::Update
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn status_only_change() {
        let old = json!({ "name": "ERP", "status": "Planning", "criticality_score": 10 });
        let new = json!({ "name": "ERP", "status": "InProgress", "criticality_score": 40 });
        assert_eq!(classify_update(&old, &new), AuditAction::StatusChange);
    }

    #[test]
    fn financial_change_wins_over_status() {
        let old = json!({ "status": "Planning", "realized_cost": 10.0 });
        let new = json!({ "status": "InProgress", "realized_cost": 20.0 });
        assert_eq!(classify_update(&old, &new), AuditAction::FinancialChange);
    }

    #[test]
    fn other_edits_are_plain_updates() {
        let old = json!({ "name": "ERP", "status": "Planning" });
        let new = json!({ "name": "ERP v2", "status": "InProgress" });
        assert_eq!(classify_update(&old, &new), AuditAction::Update);
    }

    #[test]
    fn derived_fields_are_ignored() {
        let old = json!({ "updated_at": "a", "criticality_level": "Green" });
        let new = json!({ "updated_at": "b", "criticality_level": "Red" });
        assert!(changed_fields(&old, &new).is_empty());
        assert_eq!(classify_update(&old, &new), AuditAction::Update);
    }

    #[test]
    fn added_and_removed_keys_count_as_changes() {
        let old = json!({ "a": 1 });
        let new = json!({ "b": 2 });
        assert_eq!(changed_fields(&old, &new), vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn action_names_round_trip() {
        for a in AuditAction::ALL {
            assert_eq!(a.as_str().parse::<AuditAction>().unwrap(), a);
        }
    }
}
