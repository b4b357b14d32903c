//! Project operations: scoped reads, edits, and criticality on demand.
//!
//! Every read runs under the actor's [`ProjectScope`](portfolio_core::scope::ProjectScope)
//! and returns records passed through the field filter. A project outside
//! the scope is reported as not found, never as forbidden.

use portfolio_core::audit::{classify_update, AuditAction, AuditOrigin};
use portfolio_core::criticality::{compute_breakdown, CriticalityBreakdown, CriticalityInput};
use portfolio_core::error::CoreError;
use portfolio_core::field_filter::{filter_all, filter_project_fields, ProjectFinancials};
use portfolio_core::permissions::{can_access_financial_data, can_edit_project, Permission};
use portfolio_core::project::ProjectStatus;
use portfolio_core::roles::Role;
use portfolio_core::scope::ProjectScope;
use portfolio_core::types::DbId;
use portfolio_db::models::project::{
    CreateProject, NewProject, Project, ProjectFilters, UpdateProject,
};
use portfolio_events::PortfolioEvent;

use super::criticality::{self, today};
use crate::middleware::actor::Actor;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Reads
// ---------------------------------------------------------------------------

/// A project the actor can see, as stored.
pub async fn visible_project(
    state: &AppState,
    actor: &Actor,
    id: DbId,
) -> Result<Project, CoreError> {
    actor.require(Permission::ProjectRead)?;
    state
        .store
        .find_project(id, actor.scope())
        .await?
        .ok_or_else(|| CoreError::not_found("Project", id))
}

/// Projects in the actor's scope matching `filters`, with fresh scores.
///
/// The criticality level filter matches the stored level.
pub async fn list(
    state: &AppState,
    actor: &Actor,
    filters: &ProjectFilters,
) -> Result<Vec<Project>, CoreError> {
    actor.require(Permission::ProjectRead)?;
    let mut projects = state.store.list_projects(actor.scope(), filters).await?;
    criticality::refresh_all(state, &mut projects).await?;
    Ok(filter_all(&projects, actor.role))
}

pub async fn get(state: &AppState, actor: &Actor, id: DbId) -> Result<Project, CoreError> {
    let mut project = visible_project(state, actor, id).await?;
    let risks = state.store.list_risks(id).await?;
    criticality::refresh(&mut project, &risks, today());
    Ok(filter_project_fields(&project, actor.role))
}

/// Per-component breakdown of the project's current score.
pub async fn breakdown(
    state: &AppState,
    actor: &Actor,
    id: DbId,
) -> Result<CriticalityBreakdown, CoreError> {
    let project = visible_project(state, actor, id).await?;
    let risks = state.store.list_risks(id).await?;
    Ok(criticality::breakdown(&project, &risks, today()))
}

// ---------------------------------------------------------------------------
// Mutations
// ---------------------------------------------------------------------------

/// Create a project. A GP always manages what they create; an ADMIN may
/// name another manager.
pub async fn create(
    state: &AppState,
    actor: &Actor,
    origin: AuditOrigin,
    input: &CreateProject,
) -> Result<Project, CoreError> {
    actor.require(Permission::ProjectCreate)?;
    input.check()?;
    let financials = input.financials();
    if financials != ProjectFinancials::default() && !can_access_financial_data(actor.role) {
        return Err(CoreError::Forbidden(format!(
            "Role {} cannot set financial fields",
            actor.role
        )));
    }

    let manager_id = match (actor.role, input.manager_id) {
        (Role::Admin, requested) => requested.unwrap_or(actor.id),
        (_, Some(requested)) if requested != actor.id => {
            return Err(CoreError::Forbidden(
                "Only an administrator can assign another manager".into(),
            ));
        }
        _ => actor.id,
    };
    ensure_user_exists(state, manager_id).await?;

    let initial = compute_breakdown(
        &CriticalityInput {
            start_date: input.start_date,
            planned_end_date: input.planned_end_date,
            progress_percentage: 0.0,
            initial_budget: financials.initial_budget,
            realized_cost: financials.realized_cost,
        },
        &[],
        today(),
    );

    let new = NewProject {
        name: input.name.clone(),
        description: input.description.clone(),
        status: input.status.unwrap_or(ProjectStatus::Planning),
        criticality_score: initial.score,
        criticality_level: initial.level,
        start_date: input.start_date,
        planned_end_date: input.planned_end_date,
        progress_percentage: 0,
        manager_id,
        team_member_ids: input.team_member_ids.clone(),
        financials,
        milestones: input.milestones.clone(),
        documents: input.documents.clone(),
        created_by: actor.id,
    };
    let project = state.store.create_project(&new).await?;

    tracing::info!(
        project_id = %project.id,
        user_id = %actor.id,
        score = project.criticality_score,
        "Project created"
    );
    state.audit.record(
        project.id,
        actor.id,
        AuditAction::Create,
        None,
        Some(project.snapshot()),
        origin,
    );
    state.publish(actor.id, PortfolioEvent::ProjectCreated { project_id: project.id });

    Ok(filter_project_fields(&project, actor.role))
}

pub async fn update(
    state: &AppState,
    actor: &Actor,
    origin: AuditOrigin,
    id: DbId,
    input: &UpdateProject,
) -> Result<Project, CoreError> {
    actor.require(Permission::ProjectUpdate)?;
    let existing = visible_project(state, actor, id).await?;

    if !can_edit_project(actor.role, existing.manager_id, actor.id) {
        return Err(CoreError::Forbidden(
            "Only the project manager or an administrator can edit this project".into(),
        ));
    }
    if input.touches_financials() && !can_access_financial_data(actor.role) {
        return Err(CoreError::Forbidden(format!(
            "Role {} cannot change financial fields",
            actor.role
        )));
    }
    if let Some(manager_id) = input.manager_id {
        if manager_id != existing.manager_id {
            if actor.role != Role::Admin && manager_id != actor.id {
                return Err(CoreError::Forbidden(
                    "Only an administrator can assign another manager".into(),
                ));
            }
            ensure_user_exists(state, manager_id).await?;
        }
    }

    let mut patched = existing.clone();
    input.apply_to(&mut patched)?;

    let mut project = state
        .store
        .update_project(&patched)
        .await?
        .ok_or_else(|| CoreError::not_found("Project", id))?;

    if input.affects_criticality() {
        criticality::recompute_and_store(state, actor.id, &mut project).await?;
    }

    let old = existing.snapshot();
    let new = project.snapshot();
    let action = classify_update(&old, &new);
    tracing::info!(project_id = %id, user_id = %actor.id, action = %action, "Project updated");
    state
        .audit
        .record(id, actor.id, action, Some(old), Some(new), origin);
    state.publish(actor.id, PortfolioEvent::ProjectUpdated { project_id: id });

    let risks = state.store.list_risks(id).await?;
    criticality::refresh(&mut project, &risks, today());
    Ok(filter_project_fields(&project, actor.role))
}

/// Hard delete. Risks and presentation tokens go with the project.
pub async fn delete(
    state: &AppState,
    actor: &Actor,
    origin: AuditOrigin,
    id: DbId,
) -> Result<(), CoreError> {
    actor.require(Permission::ProjectDelete)?;
    let existing = state
        .store
        .find_project(id, ProjectScope::Unrestricted)
        .await?
        .ok_or_else(|| CoreError::not_found("Project", id))?;

    if !state.store.delete_project(id).await? {
        return Err(CoreError::not_found("Project", id));
    }

    tracing::info!(project_id = %id, user_id = %actor.id, "Project deleted");
    state.audit.record(
        id,
        actor.id,
        AuditAction::Delete,
        Some(existing.snapshot()),
        None,
        origin,
    );
    state.publish(actor.id, PortfolioEvent::ProjectDeleted { project_id: id });
    Ok(())
}

/// Recompute and store the score now, for editors of the project.
pub async fn force_recompute(
    state: &AppState,
    actor: &Actor,
    id: DbId,
) -> Result<CriticalityBreakdown, CoreError> {
    actor.require(Permission::ProjectUpdate)?;
    let mut project = visible_project(state, actor, id).await?;
    if !can_edit_project(actor.role, project.manager_id, actor.id) {
        return Err(CoreError::Forbidden(
            "Only the project manager or an administrator can recompute criticality".into(),
        ));
    }
    tracing::debug!(project_id = %id, user_id = %actor.id, "Forced criticality recompute");
    criticality::recompute_and_store(state, actor.id, &mut project).await
}

async fn ensure_user_exists(state: &AppState, user_id: DbId) -> Result<(), CoreError> {
    match state.store.find_user(user_id).await? {
        Some(user) if user.active => Ok(()),
        _ => Err(CoreError::Validation(format!(
            "manager_id: {user_id} is not an active user"
        ))),
    }
}
