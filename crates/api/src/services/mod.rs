//! Domain operations behind the handlers.
//!
//! Each function takes the [`Actor`](crate::middleware::actor::Actor)
//! explicitly and returns [`CoreError`](portfolio_core::error::CoreError).
//! Mutations run in a fixed order: primary write, criticality recompute,
//! audit enqueue, then event publish.

pub mod audit;
pub mod criticality;
pub mod dashboard;
pub mod presentations;
pub mod projects;
pub mod risks;
pub mod users;
