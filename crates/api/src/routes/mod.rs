pub mod health;
pub mod presentations;
pub mod projects;
pub mod risks;
pub mod users;

use axum::routing::get;
use axum::Router;

use crate::handlers;
use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /me                                              current actor profile (GET)
///
/// /users                                           list, create (GET, POST)
/// /users/{id}                                      update role/active (PATCH)
///
/// /projects                                        scoped list, create (GET, POST)
/// /projects/{id}                                   get, update, delete
/// /projects/{id}/criticality                       breakdown (GET)
/// /projects/{id}/criticality/recompute             force recompute (POST)
/// /projects/{id}/history                           audit trail (GET)
/// /projects/{id}/risks                             list, create (GET, POST)
/// /projects/{id}/presentations                     issue link (POST)
///
/// /risks/{id}                                      update, delete (PUT, DELETE)
///
/// /presentations/{token}                           resolve (GET, anonymous)
/// /presentations/{id}                              revoke (DELETE)
///
/// /dashboard                                       aggregated metrics (GET)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/me", get(handlers::users::me))
        .route("/dashboard", get(handlers::dashboard::metrics))
        .nest("/users", users::router())
        .nest("/projects", projects::router())
        .nest("/risks", risks::router())
        .nest("/presentations", presentations::router())
}
