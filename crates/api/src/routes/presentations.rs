//! Route definitions for presentation links.

use axum::routing::get;
use axum::Router;

use crate::handlers::presentations;
use crate::state::AppState;

/// Routes mounted at `/presentations`.
///
/// The path segment is the plaintext token for `GET` and the token id for
/// `DELETE`.
///
/// ```text
/// GET    /{token}                           -> resolve (anonymous)
/// DELETE /{token}                           -> revoke
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route(
        "/{token}",
        get(presentations::resolve).delete(presentations::revoke),
    )
}
