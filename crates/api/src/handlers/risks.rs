//! Handlers for risks, nested under projects and addressed directly by id.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use portfolio_core::types::DbId;
use portfolio_db::models::risk::{CreateRisk, Risk, UpdateRisk};

use crate::error::AppResult;
use crate::middleware::actor::Actor;
use crate::middleware::json::ValidatedJson;
use crate::middleware::origin::ClientOrigin;
use crate::response::DataResponse;
use crate::services;
use crate::state::AppState;

/// GET /api/v1/projects/{project_id}/risks
pub async fn list_by_project(
    actor: Actor,
    State(state): State<AppState>,
    Path(project_id): Path<DbId>,
) -> AppResult<Json<DataResponse<Vec<Risk>>>> {
    let risks = services::risks::list(&state, &actor, project_id).await?;
    Ok(Json(DataResponse { data: risks }))
}

/// POST /api/v1/projects/{project_id}/risks
pub async fn create(
    actor: Actor,
    State(state): State<AppState>,
    Path(project_id): Path<DbId>,
    ClientOrigin(origin): ClientOrigin,
    ValidatedJson(input): ValidatedJson<CreateRisk>,
) -> AppResult<(StatusCode, Json<DataResponse<Risk>>)> {
    let risk = services::risks::create(&state, &actor, origin, project_id, &input).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: risk })))
}

/// PUT /api/v1/risks/{id}
pub async fn update(
    actor: Actor,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    ClientOrigin(origin): ClientOrigin,
    ValidatedJson(input): ValidatedJson<UpdateRisk>,
) -> AppResult<Json<DataResponse<Risk>>> {
    let risk = services::risks::update(&state, &actor, origin, id, &input).await?;
    Ok(Json(DataResponse { data: risk }))
}

/// DELETE /api/v1/risks/{id}
pub async fn delete(
    actor: Actor,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    ClientOrigin(origin): ClientOrigin,
) -> AppResult<StatusCode> {
    services::risks::delete(&state, &actor, origin, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
