//! Route definitions for risks addressed by their own id.

use axum::routing::put;
use axum::Router;

use crate::handlers::risks;
use crate::state::AppState;

/// Routes mounted at `/risks`.
///
/// ```text
/// PUT    /{id}                              -> update
/// DELETE /{id}                              -> delete
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/{id}", put(risks::update).delete(risks::delete))
}
