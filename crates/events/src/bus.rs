//! In-process event bus backed by a `tokio::sync::broadcast` channel.
//!
//! [`EventBus`] is shared via `Arc<EventBus>` across the application. Services
//! publish once their write, recompute and audit steps are done; the view
//! cache listens and drops whatever the event invalidates.

use chrono::{DateTime, Utc};
use portfolio_core::classification::CriticalityLevel;
use portfolio_core::types::DbId;
use serde::Serialize;
use tokio::sync::broadcast;

// ---------------------------------------------------------------------------
// PortfolioEvent
// ---------------------------------------------------------------------------

/// A completed mutation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PortfolioEvent {
    ProjectCreated {
        project_id: DbId,
    },
    ProjectUpdated {
        project_id: DbId,
    },
    ProjectDeleted {
        project_id: DbId,
    },
    /// A risk under the project was created, updated or deleted.
    RiskChanged {
        project_id: DbId,
        risk_id: DbId,
    },
    CriticalityRecomputed {
        project_id: DbId,
        score: i32,
        level: CriticalityLevel,
    },
    TokenIssued {
        project_id: DbId,
        token_id: DbId,
    },
    TokenRevoked {
        project_id: DbId,
        token_id: DbId,
    },
}

impl PortfolioEvent {
    /// Dot-separated event name, e.g. `"project.created"`.
    pub fn name(&self) -> &'static str {
        match self {
            PortfolioEvent::ProjectCreated { .. } => "project.created",
            PortfolioEvent::ProjectUpdated { .. } => "project.updated",
            PortfolioEvent::ProjectDeleted { .. } => "project.deleted",
            PortfolioEvent::RiskChanged { .. } => "risk.changed",
            PortfolioEvent::CriticalityRecomputed { .. } => "criticality.recomputed",
            PortfolioEvent::TokenIssued { .. } => "presentation.issued",
            PortfolioEvent::TokenRevoked { .. } => "presentation.revoked",
        }
    }

    /// The project every event is about.
    pub fn project_id(&self) -> DbId {
        match self {
            PortfolioEvent::ProjectCreated { project_id }
            | PortfolioEvent::ProjectUpdated { project_id }
            | PortfolioEvent::ProjectDeleted { project_id }
            | PortfolioEvent::RiskChanged { project_id, .. }
            | PortfolioEvent::CriticalityRecomputed { project_id, .. }
            | PortfolioEvent::TokenIssued { project_id, .. }
            | PortfolioEvent::TokenRevoked { project_id, .. } => *project_id,
        }
    }
}

/// An event together with who caused it and when.
#[derive(Debug, Clone, Serialize)]
pub struct EventEnvelope {
    #[serde(flatten)]
    pub event: PortfolioEvent,
    pub actor_id: Option<DbId>,
    pub timestamp: DateTime<Utc>,
}

impl EventEnvelope {
    pub fn new(event: PortfolioEvent) -> Self {
        Self {
            event,
            actor_id: None,
            timestamp: Utc::now(),
        }
    }

    /// Attach the acting user.
    pub fn with_actor(mut self, user_id: DbId) -> Self {
        self.actor_id = Some(user_id);
        self
    }
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 1024;

/// In-process fan-out event bus.
///
/// ```rust
/// use portfolio_events::bus::{EventBus, EventEnvelope, PortfolioEvent};
///
/// let bus = EventBus::default();
/// let mut rx = bus.subscribe();
///
/// bus.publish(EventEnvelope::new(PortfolioEvent::ProjectCreated {
///     project_id: Default::default(),
/// }));
/// ```
pub struct EventBus {
    sender: broadcast::Sender<EventEnvelope>,
}

impl EventBus {
    /// Create a bus with a specific channel capacity.
    ///
    /// When the buffer is full the oldest unconsumed messages are dropped and
    /// slow receivers observe `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all current subscribers.
    ///
    /// With no subscribers the event is dropped.
    pub fn publish(&self, envelope: EventEnvelope) {
        tracing::debug!(
            event = envelope.event.name(),
            project_id = %envelope.event.project_id(),
            "Publishing event"
        );
        // A SendError only means there are zero receivers.
        let _ = self.sender.send(envelope);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<EventEnvelope> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
