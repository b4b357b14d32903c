//! Structured event log.
//!
//! [`EventLog`] subscribes to the [`EventBus`](crate::bus::EventBus) and
//! writes one `tracing` record per event, so every mutation leaves a trace in
//! the service log independent of the audit table. It shuts down when the bus
//! is dropped.

use tokio::sync::broadcast;

use crate::bus::EventEnvelope;
use crate::invalidation::invalidated_views;

pub struct EventLog;

impl EventLog {
    /// Run the logging loop until the channel closes.
    pub async fn run(mut receiver: broadcast::Receiver<EventEnvelope>) {
        loop {
            match receiver.recv().await {
                Ok(envelope) => {
                    tracing::info!(
                        event = envelope.event.name(),
                        project_id = %envelope.event.project_id(),
                        actor_id = ?envelope.actor_id,
                        invalidated = invalidated_views(&envelope.event).len(),
                        "Portfolio event"
                    );
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(skipped = n, "Event log lagged, some events were not logged");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::info!("Event bus closed, event log shutting down");
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::{EventBus, PortfolioEvent};
    use uuid::Uuid;

    #[tokio::test]
    async fn exits_when_bus_is_dropped() {
        let bus = EventBus::default();
        let handle = tokio::spawn(EventLog::run(bus.subscribe()));
        bus.publish(EventEnvelope::new(PortfolioEvent::ProjectCreated {
            project_id: Uuid::now_v7(),
        }));
        drop(bus);
        tokio::time::timeout(std::time::Duration::from_secs(5), handle)
            .await
            .expect("event log should stop")
            .unwrap();
    }
}
