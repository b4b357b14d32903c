//! User directory operations.
//!
//! Users come from the identity store; nothing here touches credentials.

use portfolio_core::error::CoreError;
use portfolio_core::permissions::{can_access_financial_data, role_permissions, Permission};
use portfolio_core::roles::Role;
use portfolio_core::types::DbId;
use portfolio_db::models::user::{CreateUser, UpdateUser, User};
use portfolio_db::{PortfolioStore, StoreError};
use serde::Serialize;

use crate::middleware::actor::Actor;
use crate::state::AppState;

/// The acting user as the client shell needs it.
#[derive(Debug, Serialize)]
pub struct Profile {
    pub id: DbId,
    pub email: String,
    pub full_name: String,
    pub role: Role,
    pub role_label: &'static str,
    pub role_color: &'static str,
    pub permissions: Vec<Permission>,
    pub financial_access: bool,
}

pub fn me(actor: &Actor) -> Profile {
    Profile {
        id: actor.id,
        email: actor.email.clone(),
        full_name: actor.full_name.clone(),
        role: actor.role,
        role_label: actor.role.label(),
        role_color: actor.role.color(),
        permissions: role_permissions(actor.role).to_vec(),
        financial_access: can_access_financial_data(actor.role),
    }
}

pub async fn list(state: &AppState, actor: &Actor) -> Result<Vec<User>, CoreError> {
    actor.require(Permission::UserReadAll)?;
    Ok(state.store.list_users().await?)
}

pub async fn create(state: &AppState, actor: &Actor, input: &CreateUser) -> Result<User, CoreError> {
    actor.require(Permission::UserCreate)?;
    let user = state.store.create_user(input).await?;
    tracing::info!(user_id = %user.id, role = %user.role, created_by = %actor.id, "User created");
    Ok(user)
}

/// Change a user's name, role, department or active flag.
///
/// Cached views are per user and shaped by role, so every successful update
/// drops the whole view cache.
pub async fn update(
    state: &AppState,
    actor: &Actor,
    id: DbId,
    input: &UpdateUser,
) -> Result<User, CoreError> {
    actor.require(Permission::UserUpdate)?;
    if id == actor.id && input.active == Some(false) {
        return Err(CoreError::Validation(
            "active: you cannot deactivate your own account".into(),
        ));
    }

    let user = state
        .store
        .update_user(id, input)
        .await?
        .ok_or_else(|| CoreError::not_found("User", id))?;
    state.view_cache.clear();

    tracing::info!(
        user_id = %id,
        role = %user.role,
        active = user.active,
        updated_by = %actor.id,
        "User updated"
    );
    Ok(user)
}

/// Create the first administrator when the store has no users at all.
pub async fn bootstrap_admin(
    store: &dyn PortfolioStore,
    email: &str,
) -> Result<Option<User>, StoreError> {
    if !store.list_users().await?.is_empty() {
        return Ok(None);
    }
    let user = store
        .create_user(&CreateUser {
            email: email.to_string(),
            full_name: "Administrator".to_string(),
            role: Role::Admin,
            department: None,
        })
        .await?;
    tracing::info!(user_id = %user.id, email = %user.email, "Bootstrap administrator created");
    Ok(Some(user))
}
