//! Handler for the portfolio dashboard.

use axum::extract::State;
use axum::Json;

use crate::error::AppResult;
use crate::middleware::actor::Actor;
use crate::response::DataResponse;
use crate::services;
use crate::state::AppState;

/// GET /api/v1/dashboard
pub async fn metrics(
    actor: Actor,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<serde_json::Value>>> {
    let metrics = services::dashboard::metrics(&state, &actor).await?;
    Ok(Json(DataResponse { data: metrics }))
}
