//! Risk vocabulary: categories, statuses and the derived risk level.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Lower bound for probability and impact.
pub const MIN_FACTOR: i16 = 1;
/// Upper bound for probability and impact.
pub const MAX_FACTOR: i16 = 5;
/// Highest attainable `risk_level` (5 × 5).
pub const MAX_RISK_LEVEL: i32 = 25;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RiskCategory {
    Technical,
    Financial,
    Schedule,
    Resources,
    External,
}

impl RiskCategory {
    pub const ALL: [RiskCategory; 5] = [
        RiskCategory::Technical,
        RiskCategory::Financial,
        RiskCategory::Schedule,
        RiskCategory::Resources,
        RiskCategory::External,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            RiskCategory::Technical => "Technical",
            RiskCategory::Financial => "Financial",
            RiskCategory::Schedule => "Schedule",
            RiskCategory::Resources => "Resources",
            RiskCategory::External => "External",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RiskStatus {
    Open,
    Mitigated,
    Closed,
}

impl RiskStatus {
    pub const ALL: [RiskStatus; 3] = [RiskStatus::Open, RiskStatus::Mitigated, RiskStatus::Closed];

    pub fn as_str(self) -> &'static str {
        match self {
            RiskStatus::Open => "Open",
            RiskStatus::Mitigated => "Mitigated",
            RiskStatus::Closed => "Closed",
        }
    }

    /// Mitigated and Closed risks carry a resolution date.
    pub fn is_resolved(self) -> bool {
        !matches!(self, RiskStatus::Open)
    }
}

macro_rules! str_enum_impls {
    ($ty:ident, $label:literal) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = CoreError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                $ty::ALL
                    .into_iter()
                    .find(|v| v.as_str() == s)
                    .ok_or_else(|| CoreError::Validation(format!("Unknown {} '{s}'", $label)))
            }
        }

        impl TryFrom<String> for $ty {
            type Error = CoreError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                value.parse()
            }
        }
    };
}

str_enum_impls!(RiskCategory, "risk category");
str_enum_impls!(RiskStatus, "risk status");

/// `probability × impact`, validating both factors first.
pub fn risk_level(probability: i16, impact: i16) -> Result<i32, CoreError> {
    validate_factor("probability", probability)?;
    validate_factor("impact", impact)?;
    Ok(i32::from(probability) * i32::from(impact))
}

/// Check that a probability or impact value lies in `1..=5`.
pub fn validate_factor(name: &str, value: i16) -> Result<(), CoreError> {
    if (MIN_FACTOR..=MAX_FACTOR).contains(&value) {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "{name} must be between {MIN_FACTOR} and {MAX_FACTOR}, got {value}"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_is_product_of_factors() {
        assert_eq!(risk_level(1, 1).unwrap(), 1);
        assert_eq!(risk_level(3, 4).unwrap(), 12);
        assert_eq!(risk_level(5, 5).unwrap(), MAX_RISK_LEVEL);
    }

    #[test]
    fn factors_outside_range_are_rejected() {
        assert!(matches!(risk_level(0, 3), Err(CoreError::Validation(_))));
        assert!(matches!(risk_level(3, 6), Err(CoreError::Validation(_))));
    }

    #[test]
    fn only_open_is_unresolved() {
        assert!(!RiskStatus::Open.is_resolved());
        assert!(RiskStatus::Mitigated.is_resolved());
        assert!(RiskStatus::Closed.is_resolved());
    }

    #[test]
    fn category_parses_from_wire_name() {
        assert_eq!("Resources".parse::<RiskCategory>().unwrap(), RiskCategory::Resources);
        assert!("Legal".parse::<RiskCategory>().is_err());
    }
}
