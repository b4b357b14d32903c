//! Score → criticality band.
//!
//! Bands are closed and inclusive at the upper bound:
//! `[0, 33]` Green, `[34, 66]` Yellow, `[67, 100]` Red.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Highest score still classified Green.
pub const GREEN_MAX: i32 = 33;
/// Highest score still classified Yellow.
pub const YELLOW_MAX: i32 = 66;
/// Scores strictly above this value count as critical on the dashboard.
pub const CRITICAL_THRESHOLD: i32 = YELLOW_MAX;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CriticalityLevel {
    Green,
    Yellow,
    Red,
}

impl CriticalityLevel {
    pub const ALL: [CriticalityLevel; 3] = [
        CriticalityLevel::Green,
        CriticalityLevel::Yellow,
        CriticalityLevel::Red,
    ];

    /// Classify a score. Total over `i32`: values below 0 are Green and values
    /// above 100 are Red.
    pub fn classify(score: i32) -> Self {
        if score <= GREEN_MAX {
            CriticalityLevel::Green
        } else if score <= YELLOW_MAX {
            CriticalityLevel::Yellow
        } else {
            CriticalityLevel::Red
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CriticalityLevel::Green => "Green",
            CriticalityLevel::Yellow => "Yellow",
            CriticalityLevel::Red => "Red",
        }
    }

    /// Rendering color token for the band.
    pub fn color(self) -> &'static str {
        match self {
            CriticalityLevel::Green => "#22c55e",
            CriticalityLevel::Yellow => "#f59e0b",
            CriticalityLevel::Red => "#ef4444",
        }
    }

    /// Inclusive score range covered by the band.
    pub fn bounds(self) -> (i32, i32) {
        match self {
            CriticalityLevel::Green => (0, GREEN_MAX),
            CriticalityLevel::Yellow => (GREEN_MAX + 1, YELLOW_MAX),
            CriticalityLevel::Red => (YELLOW_MAX + 1, 100),
        }
    }
}

impl fmt::Display for CriticalityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CriticalityLevel {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CriticalityLevel::ALL
            .into_iter()
            .find(|l| l.as_str() == s)
            .ok_or_else(|| CoreError::Validation(format!("Unknown criticality level '{s}'")))
    }
}

impl TryFrom<String> for CriticalityLevel {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Free-function form of [`CriticalityLevel::classify`].
pub fn classify(score: i32) -> CriticalityLevel {
    CriticalityLevel::classify(score)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn band_edges() {
        assert_eq!(classify(0), CriticalityLevel::Green);
        assert_eq!(classify(33), CriticalityLevel::Green);
        assert_eq!(classify(34), CriticalityLevel::Yellow);
        assert_eq!(classify(66), CriticalityLevel::Yellow);
        assert_eq!(classify(67), CriticalityLevel::Red);
        assert_eq!(classify(100), CriticalityLevel::Red);
    }

    #[test]
    fn bands_partition_the_score_range() {
        for score in 0..=100 {
            let hits = CriticalityLevel::ALL
                .into_iter()
                .filter(|l| {
                    let (lo, hi) = l.bounds();
                    (lo..=hi).contains(&score)
                })
                .count();
            assert_eq!(hits, 1, "score {score} covered {hits} times");
            let (lo, hi) = classify(score).bounds();
            assert!((lo..=hi).contains(&score));
        }
    }

    #[test]
    fn out_of_range_scores_still_classify() {
        assert_eq!(classify(-5), CriticalityLevel::Green);
        assert_eq!(classify(250), CriticalityLevel::Red);
    }

    #[test]
    fn level_names_parse_back() {
        for level in CriticalityLevel::ALL {
            assert_eq!(level.as_str().parse::<CriticalityLevel>().unwrap(), level);
        }
        assert!("Verde".parse::<CriticalityLevel>().is_err());
    }
}
