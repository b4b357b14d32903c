//! Project lifecycle status, milestones and field-level validation rules.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::Date;

pub const MIN_PROGRESS: i16 = 0;
pub const MAX_PROGRESS: i16 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ProjectStatus {
    Planning,
    InProgress,
    Paused,
    Done,
    Cancelled,
}

impl ProjectStatus {
    pub const ALL: [ProjectStatus; 5] = [
        ProjectStatus::Planning,
        ProjectStatus::InProgress,
        ProjectStatus::Paused,
        ProjectStatus::Done,
        ProjectStatus::Cancelled,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ProjectStatus::Planning => "Planning",
            ProjectStatus::InProgress => "InProgress",
            ProjectStatus::Paused => "Paused",
            ProjectStatus::Done => "Done",
            ProjectStatus::Cancelled => "Cancelled",
        }
    }
}

impl fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProjectStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ProjectStatus::ALL
            .into_iter()
            .find(|st| st.as_str() == s)
            .ok_or_else(|| CoreError::Validation(format!("Unknown project status '{s}'")))
    }
}

impl TryFrom<String> for ProjectStatus {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// A dated checkpoint in a project's plan. Stored in order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Milestone {
    pub name: String,
    pub planned_date: Date,
    pub actual_date: Option<Date>,
    #[serde(default)]
    pub done: bool,
}

/// Attachment metadata. The file bytes live outside this system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentRef {
    pub name: String,
    pub url: String,
    pub content_type: Option<String>,
    pub size_bytes: Option<i64>,
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

pub fn validate_progress(progress: i16) -> Result<(), CoreError> {
    if (MIN_PROGRESS..=MAX_PROGRESS).contains(&progress) {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "progress_percentage must be between {MIN_PROGRESS} and {MAX_PROGRESS}, got {progress}"
        )))
    }
}

/// The planned end may equal the start but never precede it.
pub fn validate_schedule(start: Date, planned_end: Option<Date>) -> Result<(), CoreError> {
    match planned_end {
        Some(end) if end < start => Err(CoreError::Validation(format!(
            "planned_end_date {end} is before start_date {start}"
        ))),
        _ => Ok(()),
    }
}

/// Monetary amounts may be absent but never negative.
pub fn validate_amount(field: &str, value: Option<f64>) -> Result<(), CoreError> {
    match value {
        Some(v) if !v.is_finite() || v < 0.0 => Err(CoreError::Validation(format!(
            "{field} must be a non-negative amount"
        ))),
        _ => Ok(()),
    }
}

/// Milestones must be listed in planned-date order.
pub fn validate_milestones(milestones: &[Milestone]) -> Result<(), CoreError> {
    if milestones.iter().any(|m| m.name.trim().is_empty()) {
        return Err(CoreError::Validation("milestone name must not be empty".into()));
    }
    let ordered = milestones
        .windows(2)
        .all(|w| w[0].planned_date <= w[1].planned_date);
    if ordered {
        Ok(())
    } else {
        Err(CoreError::Validation(
            "milestones must be ordered by planned_date".into(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn d(y: i32, m: u32, day: u32) -> Date {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn status_wire_names_round_trip() {
        for st in ProjectStatus::ALL {
            assert_eq!(st.as_str().parse::<ProjectStatus>().unwrap(), st);
            assert_eq!(serde_json::to_value(st).unwrap(), st.as_str());
        }
    }

    #[test]
    fn progress_bounds() {
        assert!(validate_progress(0).is_ok());
        assert!(validate_progress(100).is_ok());
        assert!(validate_progress(101).is_err());
        assert!(validate_progress(-1).is_err());
    }

    #[test]
    fn end_before_start_is_rejected() {
        assert!(validate_schedule(d(2026, 1, 10), Some(d(2026, 1, 9))).is_err());
        assert!(validate_schedule(d(2026, 1, 10), Some(d(2026, 1, 10))).is_ok());
        assert!(validate_schedule(d(2026, 1, 10), None).is_ok());
    }

    #[test]
    fn negative_or_nan_amounts_are_rejected() {
        assert!(validate_amount("initial_budget", Some(-1.0)).is_err());
        assert!(validate_amount("initial_budget", Some(f64::NAN)).is_err());
        assert!(validate_amount("initial_budget", Some(0.0)).is_ok());
        assert!(validate_amount("initial_budget", None).is_ok());
    }

    #[test]
    fn milestones_must_be_ordered() {
        let m = |name: &str, date| Milestone {
            name: name.into(),
            planned_date: date,
            actual_date: None,
            done: false,
        };
        assert!(validate_milestones(&[m("a", d(2026, 1, 1)), m("b", d(2026, 2, 1))]).is_ok());
        assert!(validate_milestones(&[m("b", d(2026, 2, 1)), m("a", d(2026, 1, 1))]).is_err());
        assert!(validate_milestones(&[m(" ", d(2026, 1, 1))]).is_err());
    }
}
