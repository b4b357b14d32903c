//! Portfolio event bus and view invalidation contract.
//!
//! - [`EventBus`]: in-process publish/subscribe hub backed by
//!   `tokio::sync::broadcast`.
//! - [`PortfolioEvent`]: what a completed mutation announces.
//! - [`ViewKey`] and [`invalidated_views`]: which cached read views each
//!   event makes stale.
//! - [`EventLog`]: background subscriber writing each event to the log.

pub mod bus;
pub mod invalidation;
pub mod log;

pub use bus::{EventBus, EventEnvelope, PortfolioEvent};
pub use invalidation::{invalidated_views, ViewKey};
pub use log::EventLog;
