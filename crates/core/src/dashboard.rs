//! Portfolio dashboard aggregation.
//!
//! Folds an already role-scoped, already field-filtered project collection
//! into summary metrics. The `core` crate has no database dependencies; the
//! caller passes the projects in through [`DashboardItem`].

use std::collections::BTreeMap;

use serde::Serialize;

use crate::classification::{CriticalityLevel, CRITICAL_THRESHOLD};
use crate::field_filter::ProjectFinancials;
use crate::project::ProjectStatus;
use crate::types::DbId;

/// Number of entries in the top-critical list.
pub const TOP_CRITICAL_LIMIT: usize = 5;

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// The view of a project the aggregator needs.
pub trait DashboardItem {
    fn id(&self) -> DbId;
    fn name(&self) -> &str;
    fn status(&self) -> ProjectStatus;
    fn criticality_score(&self) -> i32;
    /// `None` when the financial fields were filtered out for the viewer.
    fn financials(&self) -> Option<&ProjectFinancials>;
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardMetrics {
    pub total: usize,
    /// Every status appears, including those with no projects.
    pub by_status: BTreeMap<ProjectStatus, usize>,
    /// Projects scoring strictly above [`CRITICAL_THRESHOLD`].
    pub critical_count: usize,
    /// Done projects over all projects, in `[0, 1]`.
    pub success_rate: f64,
    pub mean_criticality: f64,
    pub top_critical: Vec<CriticalProject>,
    /// Absent unless every project's financials were visible to the viewer.
    pub financials: Option<FinancialTotals>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CriticalProject {
    pub id: DbId,
    pub name: String,
    pub criticality_score: i32,
    pub criticality_level: CriticalityLevel,
}

/// Sums of the additive financial figures. ROI values are ratios and are
/// not summed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct FinancialTotals {
    pub initial_budget: f64,
    pub current_budget: f64,
    pub realized_cost: f64,
    pub projected_revenue: f64,
    pub realized_revenue: f64,
}

// ---------------------------------------------------------------------------
// Aggregation
// ---------------------------------------------------------------------------

/// Compute dashboard metrics over `projects`.
///
/// `financial_access` is the viewer's access level. Financial totals are only
/// produced when it is granted and no project in the collection had its
/// financials filtered out, so a partial sum is never reported as a total.
pub fn aggregate<P: DashboardItem>(projects: &[P], financial_access: bool) -> DashboardMetrics {
    let total = projects.len();

    let mut by_status: BTreeMap<ProjectStatus, usize> =
        ProjectStatus::ALL.into_iter().map(|s| (s, 0)).collect();
    for p in projects {
        *by_status.entry(p.status()).or_insert(0) += 1;
    }

    let done = by_status.get(&ProjectStatus::Done).copied().unwrap_or(0);
    let success_rate = ratio(done as f64, total);

    let score_sum: i64 = projects.iter().map(|p| i64::from(p.criticality_score())).sum();
    let mean_criticality = ratio(score_sum as f64, total);

    let mut critical: Vec<&P> = projects
        .iter()
        .filter(|p| p.criticality_score() > CRITICAL_THRESHOLD)
        .collect();
    let critical_count = critical.len();
    critical.sort_by(|a, b| {
        b.criticality_score()
            .cmp(&a.criticality_score())
            .then_with(|| a.name().cmp(b.name()))
            .then_with(|| a.id().cmp(&b.id()))
    });
    let top_critical = critical
        .into_iter()
        .take(TOP_CRITICAL_LIMIT)
        .map(|p| CriticalProject {
            id: p.id(),
            name: p.name().to_string(),
            criticality_score: p.criticality_score(),
            criticality_level: CriticalityLevel::classify(p.criticality_score()),
        })
        .collect();

    let financials = if financial_access {
        sum_financials(projects)
    } else {
        None
    };

    DashboardMetrics {
        total,
        by_status,
        critical_count,
        success_rate,
        mean_criticality,
        top_critical,
        financials,
    }
}

fn sum_financials<P: DashboardItem>(projects: &[P]) -> Option<FinancialTotals> {
    let mut totals = FinancialTotals::default();
    for p in projects {
        let f = p.financials()?;
        totals.initial_budget += f.initial_budget.unwrap_or(0.0);
        totals.current_budget += f.current_budget.unwrap_or(0.0);
        totals.realized_cost += f.realized_cost.unwrap_or(0.0);
        totals.projected_revenue += f.projected_revenue.unwrap_or(0.0);
        totals.realized_revenue += f.realized_revenue.unwrap_or(0.0);
    }
    Some(totals)
}

fn ratio(numerator: f64, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        numerator / total as f64
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    struct Item {
        id: DbId,
        name: String,
        status: ProjectStatus,
        score: i32,
        financials: Option<ProjectFinancials>,
    }

    impl DashboardItem for Item {
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
            self.score
        }
        fn financials(&self) -> Option<&ProjectFinancials> {
            self.financials.as_ref()
        }
    }

    fn item(name: &str, status: ProjectStatus, score: i32) -> Item {
        Item {
            id: Uuid::new_v4(),
            name: name.into(),
            status,
            score,
            financials: Some(ProjectFinancials {
                initial_budget: Some(100.0),
                realized_cost: Some(40.0),
                ..Default::default()
            }),
        }
    }

    #[test]
    fn empty_collection_yields_zeros() {
        let m = aggregate::<Item>(&[], true);
        assert_eq!(m.total, 0);
        assert_eq!(m.critical_count, 0);
        assert_eq!(m.success_rate, 0.0);
        assert_eq!(m.mean_criticality, 0.0);
        assert!(m.top_critical.is_empty());
        assert_eq!(m.by_status.len(), ProjectStatus::ALL.len());
        assert!(m.by_status.values().all(|&n| n == 0));
        assert_eq!(m.financials, Some(FinancialTotals::default()));
    }

    #[test]
    fn counts_rates_and_means() {
        let items = vec![
            item("A", ProjectStatus::Done, 10),
            item("B", ProjectStatus::InProgress, 70),
            item("C", ProjectStatus::Done, 66),
            item("D", ProjectStatus::Paused, 90),
        ];
        let m = aggregate(&items, false);
        assert_eq!(m.total, 4);
        assert_eq!(m.by_status[&ProjectStatus::Done], 2);
        assert_eq!(m.by_status[&ProjectStatus::Planning], 0);
        assert_eq!(m.critical_count, 2);
        assert_eq!(m.success_rate, 0.5);
        assert_eq!(m.mean_criticality, 59.0);
        assert_eq!(m.financials, None);
    }

    #[test]
    fn top_critical_is_sorted_and_capped() {
        let items: Vec<Item> = [("F", 67), ("E", 99), ("D", 80), ("C", 80), ("B", 70), ("A", 75), ("Z", 20)]
            .into_iter()
            .map(|(n, s)| item(n, ProjectStatus::InProgress, s))
            .collect();
        let m = aggregate(&items, false);
        assert_eq!(m.critical_count, 6);
        let names: Vec<&str> = m.top_critical.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["E", "C", "D", "A", "B"]);
        assert!(m.top_critical.iter().all(|c| c.criticality_level == CriticalityLevel::Red));
    }

    #[test]
    fn financial_totals_sum_visible_figures() {
        let items = vec![
            item("A", ProjectStatus::Done, 0),
            item("B", ProjectStatus::Done, 0),
        ];
        let totals = aggregate(&items, true).financials.unwrap();
        assert_eq!(totals.initial_budget, 200.0);
        assert_eq!(totals.realized_cost, 80.0);
        assert_eq!(totals.current_budget, 0.0);
    }

    #[test]
    fn any_hidden_financials_suppress_totals() {
        let mut hidden = item("B", ProjectStatus::Done, 0);
        hidden.financials = None;
        let items = vec![item("A", ProjectStatus::Done, 0), hidden];
        assert_eq!(aggregate(&items, true).financials, None);
    }
}
