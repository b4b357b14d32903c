use std::sync::Arc;

use portfolio_core::types::DbId;
use portfolio_db::SharedStore;
use portfolio_events::{EventBus, EventEnvelope, PortfolioEvent};

use crate::cache::ViewCache;
use crate::config::ServerConfig;
use crate::services::audit::AuditRecorder;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable: every field is an `Arc` or a channel handle.
#[derive(Clone)]
pub struct AppState {
    /// The persistent store collaborator.
    pub store: SharedStore,
    pub config: Arc<ServerConfig>,
    /// Fan-out of completed mutations.
    pub event_bus: Arc<EventBus>,
    /// Queue in front of the audit writer task.
    pub audit: AuditRecorder,
    pub view_cache: Arc<ViewCache>,
}

impl AppState {
    /// Announce a completed mutation. Cached views it invalidates are dropped
    /// before the event is broadcast, so a read issued after the mutation
    /// returns never sees them.
    pub fn publish(&self, actor_id: DbId, event: PortfolioEvent) {
        self.view_cache.apply(&event);
        self.event_bus
            .publish(EventEnvelope::new(event).with_actor(actor_id));
    }
}
