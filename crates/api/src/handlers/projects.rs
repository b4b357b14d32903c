//! Handlers for the `/projects` resource.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use portfolio_core::criticality::CriticalityBreakdown;
use portfolio_core::types::DbId;
use portfolio_db::models::audit::AuditEntry;
use portfolio_db::models::project::{CreateProject, Project, UpdateProject};

use crate::error::AppResult;
use crate::middleware::actor::Actor;
use crate::middleware::json::ValidatedJson;
use crate::middleware::origin::ClientOrigin;
use crate::middleware::rbac::RequireEditor;
use crate::query::{PaginationParams, ProjectListParams};
use crate::response::DataResponse;
use crate::services;
use crate::state::AppState;

/// GET /api/v1/projects
pub async fn list(
    actor: Actor,
    State(state): State<AppState>,
    Query(params): Query<ProjectListParams>,
) -> AppResult<Json<DataResponse<Vec<Project>>>> {
    let filters = params.into_filters()?;
    let projects = services::projects::list(&state, &actor, &filters).await?;
    Ok(Json(DataResponse { data: projects }))
}

/// POST /api/v1/projects
pub async fn create(
    actor: Actor,
    State(state): State<AppState>,
    ClientOrigin(origin): ClientOrigin,
    ValidatedJson(input): ValidatedJson<CreateProject>,
) -> AppResult<(StatusCode, Json<DataResponse<Project>>)> {
    let project = services::projects::create(&state, &actor, origin, &input).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: project })))
}

/// GET /api/v1/projects/{id}
pub async fn get_by_id(
    actor: Actor,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Project>>> {
    let project = services::projects::get(&state, &actor, id).await?;
    Ok(Json(DataResponse { data: project }))
}

/// PUT /api/v1/projects/{id}
pub async fn update(
    RequireEditor(actor): RequireEditor,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    ClientOrigin(origin): ClientOrigin,
    ValidatedJson(input): ValidatedJson<UpdateProject>,
) -> AppResult<Json<DataResponse<Project>>> {
    let project = services::projects::update(&state, &actor, origin, id, &input).await?;
    Ok(Json(DataResponse { data: project }))
}

/// DELETE /api/v1/projects/{id}
pub async fn delete(
    actor: Actor,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    ClientOrigin(origin): ClientOrigin,
) -> AppResult<StatusCode> {
    services::projects::delete(&state, &actor, origin, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/projects/{id}/criticality
pub async fn criticality(
    actor: Actor,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<CriticalityBreakdown>>> {
    let breakdown = services::projects::breakdown(&state, &actor, id).await?;
    Ok(Json(DataResponse { data: breakdown }))
}

/// POST /api/v1/projects/{id}/criticality/recompute
pub async fn recompute_criticality(
    RequireEditor(actor): RequireEditor,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<CriticalityBreakdown>>> {
    let breakdown = services::projects::force_recompute(&state, &actor, id).await?;
    Ok(Json(DataResponse { data: breakdown }))
}

/// GET /api/v1/projects/{id}/history
pub async fn history(
    actor: Actor,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Query(params): Query<PaginationParams>,
) -> AppResult<Json<DataResponse<Vec<AuditEntry>>>> {
    let entries = services::audit::history(&state, &actor, id, params.into()).await?;
    Ok(Json(DataResponse { data: entries }))
}
