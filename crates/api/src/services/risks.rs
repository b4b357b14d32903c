//! Risk operations.
//!
//! A risk is visible exactly when its parent project is. Every mutation
//! recomputes the parent's criticality and records a `RiskChange` entry
//! against the parent project.

use portfolio_core::audit::{AuditAction, AuditOrigin};
use portfolio_core::error::CoreError;
use portfolio_core::permissions::Permission;
use portfolio_core::types::DbId;
use portfolio_db::models::project::Project;
use portfolio_db::models::risk::{CreateRisk, NewRisk, Risk, UpdateRisk};
use portfolio_events::PortfolioEvent;

use super::criticality::{self, today};
use super::projects::visible_project;
use crate::middleware::actor::Actor;
use crate::state::AppState;

/// Risks of a visible project, highest level first.
pub async fn list(state: &AppState, actor: &Actor, project_id: DbId) -> Result<Vec<Risk>, CoreError> {
    actor.require(Permission::RiskRead)?;
    visible_project(state, actor, project_id).await?;
    Ok(state.store.list_risks(project_id).await?)
}

pub async fn create(
    state: &AppState,
    actor: &Actor,
    origin: AuditOrigin,
    project_id: DbId,
    input: &CreateRisk,
) -> Result<Risk, CoreError> {
    actor.require(Permission::RiskCreate)?;
    let mut project = visible_project(state, actor, project_id).await?;

    let new = NewRisk::open(project_id, input, today())?;
    let risk = state.store.create_risk(&new).await?;
    criticality::recompute_and_store(state, actor.id, &mut project).await?;

    tracing::info!(
        risk_id = %risk.id,
        project_id = %project_id,
        risk_level = risk.risk_level,
        "Risk created"
    );
    state.audit.record(
        project_id,
        actor.id,
        AuditAction::RiskChange,
        None,
        Some(risk.snapshot()),
        origin,
    );
    state.publish(
        actor.id,
        PortfolioEvent::RiskChanged {
            project_id,
            risk_id: risk.id,
        },
    );
    Ok(risk)
}

pub async fn update(
    state: &AppState,
    actor: &Actor,
    origin: AuditOrigin,
    risk_id: DbId,
    input: &UpdateRisk,
) -> Result<Risk, CoreError> {
    actor.require(Permission::RiskUpdate)?;
    let (existing, mut project) = visible_risk(state, actor, risk_id).await?;

    let mut patched = existing.clone();
    input.apply_to(&mut patched, today())?;
    let risk = state
        .store
        .update_risk(&patched)
        .await?
        .ok_or_else(|| CoreError::not_found("Risk", risk_id))?;
    criticality::recompute_and_store(state, actor.id, &mut project).await?;

    tracing::info!(
        risk_id = %risk_id,
        project_id = %risk.project_id,
        risk_level = risk.risk_level,
        status = %risk.status,
        "Risk updated"
    );
    state.audit.record(
        risk.project_id,
        actor.id,
        AuditAction::RiskChange,
        Some(existing.snapshot()),
        Some(risk.snapshot()),
        origin,
    );
    state.publish(
        actor.id,
        PortfolioEvent::RiskChanged {
            project_id: risk.project_id,
            risk_id,
        },
    );
    Ok(risk)
}

pub async fn delete(
    state: &AppState,
    actor: &Actor,
    origin: AuditOrigin,
    risk_id: DbId,
) -> Result<(), CoreError> {
    actor.require(Permission::RiskDelete)?;
    let (existing, mut project) = visible_risk(state, actor, risk_id).await?;

    if !state.store.delete_risk(risk_id).await? {
        return Err(CoreError::not_found("Risk", risk_id));
    }
    criticality::recompute_and_store(state, actor.id, &mut project).await?;

    tracing::info!(risk_id = %risk_id, project_id = %project.id, "Risk deleted");
    state.audit.record(
        project.id,
        actor.id,
        AuditAction::RiskChange,
        Some(existing.snapshot()),
        None,
        origin,
    );
    state.publish(
        actor.id,
        PortfolioEvent::RiskChanged {
            project_id: project.id,
            risk_id,
        },
    );
    Ok(())
}

/// A risk together with its parent project, if the actor can see the parent.
async fn visible_risk(
    state: &AppState,
    actor: &Actor,
    risk_id: DbId,
) -> Result<(Risk, Project), CoreError> {
    let risk = state
        .store
        .find_risk(risk_id)
        .await?
        .ok_or_else(|| CoreError::not_found("Risk", risk_id))?;
    let project = visible_project(state, actor, risk.project_id)
        .await
        .map_err(|e| match e {
            CoreError::NotFound { .. } => CoreError::not_found("Risk", risk_id),
            other => other,
        })?;
    Ok((risk, project))
}
