//! Presentation links: issue, anonymous resolve, revoke.
//!
//! The plaintext token leaves the server once, in the issue response. Every
//! later lookup goes through its SHA-256 hash.

use chrono::Utc;
use portfolio_core::criticality::CriticalityBreakdown;
use portfolio_core::error::CoreError;
use portfolio_core::field_filter::filter_project_fields;
use portfolio_core::permissions::{require_permission, Permission};
use portfolio_core::presentation::{
    can_revoke, check_token_window, expiry_for, generate_token, hash_token, is_well_formed,
    resolve_view_role,
};
use portfolio_core::roles::Role;
use portfolio_core::scope::ProjectScope;
use portfolio_core::types::{DbId, Timestamp};
use portfolio_db::models::presentation::{IssueTokenRequest, NewPresentationToken, PresentationToken};
use portfolio_db::models::project::Project;
use portfolio_db::models::risk::Risk;
use portfolio_events::PortfolioEvent;
use serde::Serialize;

use super::criticality::{self, today};
use super::projects::visible_project;
use crate::middleware::actor::Actor;
use crate::state::AppState;

/// Returned once to the issuer. `token` is never shown again.
#[derive(Debug, Serialize)]
pub struct IssuedToken {
    pub id: DbId,
    pub token: String,
    pub project_id: DbId,
    pub view_role: Role,
    pub expires_at: Timestamp,
}

/// What an anonymous holder of a valid token sees.
#[derive(Debug, Serialize)]
pub struct PresentationView {
    /// Filtered for `presentation.view_role`.
    pub project: Project,
    pub criticality: CriticalityBreakdown,
    pub risks: Vec<Risk>,
    pub presentation: PresentationToken,
}

pub async fn issue(
    state: &AppState,
    actor: &Actor,
    project_id: DbId,
    request: &IssueTokenRequest,
) -> Result<IssuedToken, CoreError> {
    actor.require(Permission::PresentationCreate)?;
    visible_project(state, actor, project_id).await?;
    let view_role = resolve_view_role(actor.role, request.view_role)?;

    let generated = generate_token();
    let stored = state
        .store
        .insert_token(&NewPresentationToken {
            project_id,
            issued_by: actor.id,
            token_hash: generated.hash,
            view_role,
            expires_at: expiry_for(Utc::now()),
        })
        .await?;

    tracing::info!(
        token_id = %stored.id,
        project_id = %project_id,
        user_id = %actor.id,
        view_role = %view_role,
        "Presentation token issued"
    );
    state.publish(
        actor.id,
        PortfolioEvent::TokenIssued {
            project_id,
            token_id: stored.id,
        },
    );

    Ok(IssuedToken {
        id: stored.id,
        token: generated.plaintext,
        project_id,
        view_role,
        expires_at: stored.expires_at,
    })
}

/// Open a presentation link. No actor: the token is the credential.
///
/// Unknown, malformed and revoked tokens are all `TokenInvalid`, so a caller
/// cannot tell which it holds. Only an expired token is reported as such.
pub async fn resolve(state: &AppState, token: &str) -> Result<PresentationView, CoreError> {
    if !is_well_formed(token) {
        return Err(CoreError::TokenInvalid);
    }
    let found = state
        .store
        .find_token_by_hash(&hash_token(token))
        .await?
        .ok_or(CoreError::TokenInvalid)?;

    let now = Utc::now();
    check_token_window(found.active, found.expires_at, now)?;
    require_permission(found.view_role, Permission::PresentationAccess)?;

    let presentation = state
        .store
        .record_token_access(found.id, now)
        .await?
        .ok_or(CoreError::TokenInvalid)?;

    let mut project = state
        .store
        .find_project(presentation.project_id, ProjectScope::Unrestricted)
        .await?
        .ok_or(CoreError::TokenInvalid)?;
    let risks = state.store.list_risks(project.id).await?;
    let breakdown = criticality::refresh(&mut project, &risks, today());

    tracing::info!(
        token_id = %presentation.id,
        project_id = %project.id,
        access_count = presentation.access_count,
        "Presentation resolved"
    );

    Ok(PresentationView {
        project: filter_project_fields(&project, presentation.view_role),
        criticality: breakdown,
        risks,
        presentation,
    })
}

/// Deactivate a token. Revoking an already inactive token succeeds.
pub async fn revoke(state: &AppState, actor: &Actor, token_id: DbId) -> Result<(), CoreError> {
    actor.require(Permission::PresentationCreate)?;
    let token = state
        .store
        .find_token(token_id)
        .await?
        .ok_or_else(|| CoreError::not_found("PresentationToken", token_id))?;

    if !can_revoke(actor.role, token.issued_by, actor.id) {
        return Err(CoreError::Forbidden(
            "Only the issuer or an administrator can revoke this presentation".into(),
        ));
    }

    if state.store.deactivate_token(token_id).await? {
        tracing::info!(token_id = %token_id, user_id = %actor.id, "Presentation token revoked");
        state.publish(
            actor.id,
            PortfolioEvent::TokenRevoked {
                project_id: token.project_id,
                token_id,
            },
        );
    }
    Ok(())
}
