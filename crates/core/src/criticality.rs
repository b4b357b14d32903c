//! Criticality scoring engine.
//!
//! A project's health score is a weighted sum of three independent
//! sub-scores, each normalised to `[0, 100]` before weighting:
//!
//! | Component | Weight | Signal |
//! |-----------|--------|--------|
//! | Risk      | 0.4    | mean `risk_level` over the project's risks, divided by 25 |
//! | Schedule  | 0.3    | elapsed-time fraction minus progress fraction, ×200 |
//! | Budget    | 0.3    | cost/budget ratio minus progress fraction, ×200 |
//!
//! The calculator is pure: the caller supplies today's date. The stored
//! `criticality_score` is only a cache of this function's output.

use serde::Serialize;

use crate::classification::CriticalityLevel;
use crate::risk::MAX_RISK_LEVEL;
use crate::types::Date;

pub const RISK_WEIGHT: f64 = 0.4;
pub const SCHEDULE_WEIGHT: f64 = 0.3;
pub const BUDGET_WEIGHT: f64 = 0.3;

/// Gap multiplier shared by the schedule and budget components.
const GAP_SCALE: f64 = 200.0;

pub const MIN_SCORE: i32 = 0;
pub const MAX_SCORE: i32 = 100;

/// The project fields the score depends on.
#[derive(Debug, Clone, PartialEq)]
pub struct CriticalityInput {
    pub start_date: Date,
    pub planned_end_date: Option<Date>,
    /// Delivery progress, 0–100.
    pub progress_percentage: f64,
    pub initial_budget: Option<f64>,
    pub realized_cost: Option<f64>,
}

/// Per-component view of a score, as shown in the criticality detail panel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CriticalityBreakdown {
    /// Risk sub-score before weighting, 0–100.
    pub risk: f64,
    /// Schedule sub-score before weighting, 0–100.
    pub schedule: f64,
    /// Budget sub-score before weighting, 0–100.
    pub budget: f64,
    pub score: i32,
    pub level: CriticalityLevel,
}

/// Compute the 0–100 criticality score.
pub fn compute_criticality(input: &CriticalityInput, risk_levels: &[i32], today: Date) -> i32 {
    compute_breakdown(input, risk_levels, today).score
}

/// Compute the score together with its unweighted components.
pub fn compute_breakdown(
    input: &CriticalityInput,
    risk_levels: &[i32],
    today: Date,
) -> CriticalityBreakdown {
    let risk = risk_sub_score(risk_levels);
    let schedule = schedule_sub_score(input, today);
    let budget = budget_sub_score(input);

    let weighted = risk * RISK_WEIGHT + schedule * SCHEDULE_WEIGHT + budget * BUDGET_WEIGHT;
    let score = (weighted.round() as i32).clamp(MIN_SCORE, MAX_SCORE);

    CriticalityBreakdown {
        risk,
        schedule,
        budget,
        score,
        level: CriticalityLevel::classify(score),
    }
}

/// Mean risk level scaled to 0–100; zero when there are no risks.
pub fn risk_sub_score(risk_levels: &[i32]) -> f64 {
    if risk_levels.is_empty() {
        return 0.0;
    }
    let total: i64 = risk_levels.iter().map(|&l| i64::from(l)).sum();
    let mean = total as f64 / risk_levels.len() as f64;
    (mean / f64::from(MAX_RISK_LEVEL) * 100.0).clamp(0.0, 100.0)
}

/// How far delivery trails the calendar; zero without a planned end date.
pub fn schedule_sub_score(input: &CriticalityInput, today: Date) -> f64 {
    let Some(planned_end) = input.planned_end_date else {
        return 0.0;
    };
    let elapsed = elapsed_fraction(input.start_date, planned_end, today);
    let gap = elapsed - progress_fraction(input.progress_percentage);
    if gap > 0.0 {
        (gap * GAP_SCALE).min(100.0)
    } else {
        0.0
    }
}

/// How far spending outpaces delivery; zero unless both budget figures exist.
pub fn budget_sub_score(input: &CriticalityInput) -> f64 {
    let (Some(budget), Some(cost)) = (input.initial_budget, input.realized_cost) else {
        return 0.0;
    };
    if budget <= 0.0 {
        return 0.0;
    }
    let usage = cost / budget;
    let progress = progress_fraction(input.progress_percentage);
    if usage > progress {
        ((usage - progress) * GAP_SCALE).min(100.0)
    } else {
        0.0
    }
}

/// Fraction of the planned window already consumed, clamped to `[0, 1]`.
///
/// A zero-length window counts as fully consumed from its end date onwards.
pub fn elapsed_fraction(start: Date, planned_end: Date, today: Date) -> f64 {
    let total_days = (planned_end - start).num_days();
    let elapsed_days = (today - start).num_days().max(0);
    if total_days <= 0 {
        return if today >= planned_end { 1.0 } else { 0.0 };
    }
    (elapsed_days as f64 / total_days as f64).clamp(0.0, 1.0)
}

fn progress_fraction(progress_percentage: f64) -> f64 {
    progress_percentage.clamp(0.0, 100.0) / 100.0
}
