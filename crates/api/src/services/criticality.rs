//! Criticality recomputation against the store.
//!
//! Two paths use the calculator. [`refresh`] and [`refresh_all`] recompute
//! for display and never write. [`recompute_and_store`] runs after a
//! triggering mutation and writes the cached score back.

use std::collections::HashMap;

use chrono::Utc;
use portfolio_core::criticality::{compute_breakdown, CriticalityBreakdown};
use portfolio_core::error::CoreError;
use portfolio_core::types::{Date, DbId};
use portfolio_db::models::project::Project;
use portfolio_db::models::risk::Risk;
use portfolio_events::PortfolioEvent;

use crate::state::AppState;

/// The calendar date scores are computed for.
pub fn today() -> Date {
    Utc::now().date_naive()
}

/// Breakdown for `project` given its risks, without touching the project.
pub fn breakdown(project: &Project, risks: &[Risk], today: Date) -> CriticalityBreakdown {
    let levels: Vec<i32> = risks.iter().map(|r| r.risk_level).collect();
    compute_breakdown(&project.criticality_input(), &levels, today)
}

/// Replace the cached score on `project` with a fresh one.
pub fn refresh(project: &mut Project, risks: &[Risk], today: Date) -> CriticalityBreakdown {
    let fresh = breakdown(project, risks, today);
    project.set_criticality(fresh.score);
    fresh
}

/// Refresh every project in one store round trip for the risks.
pub async fn refresh_all(state: &AppState, projects: &mut [Project]) -> Result<(), CoreError> {
    if projects.is_empty() {
        return Ok(());
    }
    let ids: Vec<DbId> = projects.iter().map(|p| p.id).collect();
    let mut by_project: HashMap<DbId, Vec<Risk>> = HashMap::new();
    for risk in state.store.list_risks_for_projects(&ids).await? {
        by_project.entry(risk.project_id).or_default().push(risk);
    }
    let today = today();
    for project in projects.iter_mut() {
        let risks = by_project.get(&project.id).map(Vec::as_slice).unwrap_or(&[]);
        refresh(project, risks, today);
    }
    Ok(())
}

/// Recompute from the stored risks and persist the result.
///
/// Publishes [`PortfolioEvent::CriticalityRecomputed`] when the cached score
/// changed, and updates `project` in place.
pub async fn recompute_and_store(
    state: &AppState,
    actor_id: DbId,
    project: &mut Project,
) -> Result<CriticalityBreakdown, CoreError> {
    let risks = state.store.list_risks(project.id).await?;
    let fresh = breakdown(project, &risks, today());

    if fresh.score != project.criticality_score || fresh.level != project.criticality_level {
        let updated = state
            .store
            .set_criticality(project.id, fresh.score, fresh.level)
            .await?;
        if !updated {
            return Err(CoreError::not_found("Project", project.id));
        }
        tracing::info!(
            project_id = %project.id,
            old_score = project.criticality_score,
            new_score = fresh.score,
            level = %fresh.level,
            "Criticality recomputed"
        );
        project.set_criticality(fresh.score);
        state.publish(
            actor_id,
            PortfolioEvent::CriticalityRecomputed {
                project_id: project.id,
                score: fresh.score,
                level: fresh.level,
            },
        );
    }
    Ok(fresh)
}
