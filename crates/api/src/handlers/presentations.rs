//! Handlers for presentation links.
//!
//! `GET /presentations/{token}` is the only unauthenticated endpoint under
//! `/api/v1`; the token itself is the credential.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use portfolio_core::types::DbId;
use portfolio_db::models::presentation::IssueTokenRequest;

use crate::error::AppResult;
use crate::middleware::actor::Actor;
use crate::middleware::json::ValidatedJson;
use crate::response::DataResponse;
use crate::services;
use crate::services::presentations::{IssuedToken, PresentationView};
use crate::state::AppState;

/// POST /api/v1/projects/{project_id}/presentations
pub async fn issue(
    actor: Actor,
    State(state): State<AppState>,
    Path(project_id): Path<DbId>,
    ValidatedJson(input): ValidatedJson<IssueTokenRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<IssuedToken>>)> {
    let issued = services::presentations::issue(&state, &actor, project_id, &input).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: issued })))
}

/// GET /api/v1/presentations/{token}
pub async fn resolve(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> AppResult<Json<DataResponse<PresentationView>>> {
    let view = services::presentations::resolve(&state, &token).await?;
    Ok(Json(DataResponse { data: view }))
}

/// DELETE /api/v1/presentations/{id}
pub async fn revoke(
    actor: Actor,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    services::presentations::revoke(&state, &actor, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
