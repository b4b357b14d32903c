//! Which read views a mutation makes stale.
//!
//! Every cached read is keyed by a [`ViewKey`]. Adding a new event variant
//! forces a new arm in [`invalidated_views`], so no mutation can silently
//! leave a view stale.

use portfolio_core::types::DbId;
use serde::Serialize;

use crate::bus::PortfolioEvent;

/// A read view that may be cached per user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "view", content = "project_id", rename_all = "snake_case")]
pub enum ViewKey {
    ProjectList,
    ProjectDetail(DbId),
    ProjectRisks(DbId),
    ProjectHistory(DbId),
    Dashboard,
}

/// Views invalidated by `event`.
pub fn invalidated_views(event: &PortfolioEvent) -> Vec<ViewKey> {
    use ViewKey::*;

    match *event {
        PortfolioEvent::ProjectCreated { project_id } => {
            vec![ProjectList, ProjectHistory(project_id), Dashboard]
        }
        PortfolioEvent::ProjectUpdated { project_id } => vec![
            ProjectList,
            ProjectDetail(project_id),
            ProjectHistory(project_id),
            Dashboard,
        ],
        PortfolioEvent::ProjectDeleted { project_id } => vec![
            ProjectList,
            ProjectDetail(project_id),
            ProjectRisks(project_id),
            ProjectHistory(project_id),
            Dashboard,
        ],
        // The dashboard scores from live risk levels even when the stored
        // score does not move.
        PortfolioEvent::RiskChanged { project_id, .. } => vec![
            ProjectList,
            ProjectRisks(project_id),
            ProjectDetail(project_id),
            ProjectHistory(project_id),
            Dashboard,
        ],
        PortfolioEvent::CriticalityRecomputed { project_id, .. } => {
            vec![ProjectList, ProjectDetail(project_id), Dashboard]
        }
        // Token state is not part of any cached view.
        PortfolioEvent::TokenIssued { .. } | PortfolioEvent::TokenRevoked { .. } => Vec::new(),
    }
}
