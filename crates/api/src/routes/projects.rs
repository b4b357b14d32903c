//! Route definitions for the `/projects` resource.
//!
//! Also nests the project-scoped risk and presentation routes under
//! `/projects/{id}/...`.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::{presentations, projects, risks};
use crate::state::AppState;

/// Routes mounted at `/projects`.
///
/// ```text
/// GET    /                                  -> list
/// POST   /                                  -> create
/// GET    /{id}                              -> get_by_id
/// PUT    /{id}                              -> update
/// DELETE /{id}                              -> delete
/// GET    /{id}/criticality                  -> criticality
/// POST   /{id}/criticality/recompute        -> recompute_criticality
/// GET    /{id}/history                      -> history
/// GET    /{id}/risks                        -> risks::list_by_project
/// POST   /{id}/risks                        -> risks::create
/// POST   /{id}/presentations                -> presentations::issue
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(projects::list).post(projects::create))
        .route(
            "/{id}",
            get(projects::get_by_id)
                .put(projects::update)
                .delete(projects::delete),
        )
        .route("/{id}/criticality", get(projects::criticality))
        .route(
            "/{id}/criticality/recompute",
            post(projects::recompute_criticality),
        )
        .route("/{id}/history", get(projects::history))
        .route(
            "/{id}/risks",
            get(risks::list_by_project).post(risks::create),
        )
        .route("/{id}/presentations", post(presentations::issue))
}
