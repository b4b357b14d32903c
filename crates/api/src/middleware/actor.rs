//! The acting user, resolved from the store.
//!
//! Every service operation takes an [`Actor`] explicitly; nothing reads an
//! ambient "current user".

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use portfolio_core::error::CoreError;
use portfolio_core::permissions::{require_permission, Permission};
use portfolio_core::roles::Role;
use portfolio_core::scope::ProjectScope;
use portfolio_core::types::DbId;
use portfolio_db::models::user::User;

use super::auth::AuthUser;
use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Clone, PartialEq)]
pub struct Actor {
    pub id: DbId,
    pub role: Role,
    pub email: String,
    pub full_name: String,
}

impl Actor {
    /// Turn a store record into an actor. Inactive users are not actors.
    pub fn from_user(user: User) -> Result<Self, CoreError> {
        if !user.active {
            return Err(CoreError::Unauthenticated("User is deactivated".into()));
        }
        Ok(Actor {
            id: user.id,
            role: user.role,
            email: user.email,
            full_name: user.full_name,
        })
    }

    /// The project scope this actor's queries run under.
    pub fn scope(&self) -> ProjectScope {
        ProjectScope::for_actor(self.role, self.id)
    }

    pub fn require(&self, permission: Permission) -> Result<(), CoreError> {
        require_permission(self.role, permission)
    }
}

impl FromRequestParts<AppState> for Actor {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth = AuthUser::from_request_parts(parts, state).await?;
        let user = state
            .store
            .find_user(auth.user_id)
            .await?
            .ok_or_else(|| CoreError::Unauthenticated("Unknown user".into()))?;
        let actor = Actor::from_user(user)?;
        tracing::debug!(user_id = %actor.id, role = %actor.role, "Resolved actor");
        Ok(actor)
    }
}
