//! Handlers for the current user and the user directory.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use portfolio_core::types::DbId;
use portfolio_db::models::user::{CreateUser, UpdateUser, User};

use crate::error::AppResult;
use crate::middleware::actor::Actor;
use crate::middleware::json::ValidatedJson;
use crate::middleware::rbac::RequireUserAdmin;
use crate::response::DataResponse;
use crate::services;
use crate::services::users::Profile;
use crate::state::AppState;

/// GET /api/v1/me
pub async fn me(actor: Actor) -> Json<DataResponse<Profile>> {
    Json(DataResponse {
        data: services::users::me(&actor),
    })
}

/// GET /api/v1/users
pub async fn list(
    actor: Actor,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Vec<User>>>> {
    let users = services::users::list(&state, &actor).await?;
    Ok(Json(DataResponse { data: users }))
}

/// POST /api/v1/users
pub async fn create(
    RequireUserAdmin(actor): RequireUserAdmin,
    State(state): State<AppState>,
    ValidatedJson(input): ValidatedJson<CreateUser>,
) -> AppResult<(StatusCode, Json<DataResponse<User>>)> {
    let user = services::users::create(&state, &actor, &input).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: user })))
}

/// PATCH /api/v1/users/{id}
pub async fn update(
    RequireUserAdmin(actor): RequireUserAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    ValidatedJson(input): ValidatedJson<UpdateUser>,
) -> AppResult<Json<DataResponse<User>>> {
    let user = services::users::update(&state, &actor, id, &input).await?;
    Ok(Json(DataResponse { data: user }))
}
