//! Dashboard metrics, served through the view cache.

use portfolio_core::dashboard::aggregate;
use portfolio_core::error::CoreError;
use portfolio_core::field_filter::filter_all;
use portfolio_core::permissions::{can_access_financial_data, Permission};
use portfolio_db::models::project::ProjectFilters;
use portfolio_events::ViewKey;
use serde_json::Value;

use super::criticality;
use crate::middleware::actor::Actor;
use crate::state::AppState;

/// Aggregated metrics over every project the actor can see.
///
/// A cached copy is returned while no relevant mutation has happened since
/// it was computed. A fresh result computed while a mutation landed is
/// returned to this caller but not cached.
pub async fn metrics(state: &AppState, actor: &Actor) -> Result<Value, CoreError> {
    actor.require(Permission::ProjectRead)?;

    if let Some(cached) = state.view_cache.get(actor.id, ViewKey::Dashboard) {
        tracing::debug!(user_id = %actor.id, "Dashboard served from cache");
        return Ok(cached);
    }

    let ticket = state.view_cache.ticket(actor.id, ViewKey::Dashboard);
    let mut projects = state
        .store
        .list_projects(actor.scope(), &ProjectFilters::default())
        .await?;
    criticality::refresh_all(state, &mut projects).await?;

    let visible = filter_all(&projects, actor.role);
    let metrics = aggregate(&visible, can_access_financial_data(actor.role));
    let value =
        serde_json::to_value(&metrics).map_err(|e| CoreError::Internal(e.to_string()))?;

    if !state.view_cache.complete(ticket, value.clone()) {
        tracing::debug!(user_id = %actor.id, "Dashboard invalidated during fetch, not cached");
    }
    Ok(value)
}
