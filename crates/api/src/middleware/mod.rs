//! Request extractors for identity, authorization and request metadata, plus
//! the request deadline layer.
//!
//! - [`auth::AuthUser`] -- Validates the JWT Bearer token.
//! - [`actor::Actor`] -- Resolves the token subject to an active user in the store.
//! - [`rbac::RequireUserAdmin`] -- Requires user administration permissions.
//! - [`rbac::RequireEditor`] -- Requires `project:update`.
//! - [`origin::ClientOrigin`] -- Client IP and user agent for audit entries.
//! - [`json::ValidatedJson`] -- JSON body parsed and validated, with JSON errors.
//! - [`deadline::request_deadline`] -- Bounds each request; overruns become `UPSTREAM_FAILURE`.

pub mod actor;
pub mod auth;
pub mod deadline;
pub mod json;
pub mod origin;
pub mod rbac;
