//! Role-based access control (RBAC) extractors.
//!
//! Each extractor wraps [`Actor`] and rejects requests whose role lacks the
//! named permission. Services repeat the check, so these only turn a
//! guaranteed 403 into an early one at the routing layer.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use portfolio_core::permissions::Permission;

use super::actor::Actor;
use crate::error::AppError;
use crate::state::AppState;

/// Requires `user:read_all`, `user:create` and `user:update` (user
/// administration). Rejects with 403 Forbidden otherwise.
///
/// ```ignore
/// async fn admin_only(RequireUserAdmin(actor): RequireUserAdmin) -> AppResult<Json<()>> {
///     Ok(Json(()))
/// }
/// ```
pub struct RequireUserAdmin(pub Actor);

impl FromRequestParts<AppState> for RequireUserAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let actor = Actor::from_request_parts(parts, state).await?;
        actor.require(Permission::UserReadAll)?;
        actor.require(Permission::UserCreate)?;
        actor.require(Permission::UserUpdate)?;
        Ok(RequireUserAdmin(actor))
    }
}

/// Requires `project:update`: the roles that can edit at least some projects.
/// Whether the actor may edit a particular project is decided by the service.
pub struct RequireEditor(pub Actor);

impl FromRequestParts<AppState> for RequireEditor {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let actor = Actor::from_request_parts(parts, state).await?;
        actor.require(Permission::ProjectUpdate)?;
        Ok(RequireEditor(actor))
    }
}
