//! Per-user cache of read views with a stale-fetch guard.
//!
//! Each [`ViewKey`] carries a generation counter that every invalidation
//! bumps. A reader takes a [`FetchTicket`] before going to the store and
//! hands it back with the result; if the view was invalidated in between, the
//! result is discarded instead of being cached over fresher data.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use portfolio_core::types::DbId;
use portfolio_events::{invalidated_views, PortfolioEvent, ViewKey};
use serde_json::Value;
use tokio_util::sync::CancellationToken;

struct Entry {
    generation: u64,
    stored_at: Instant,
    value: Value,
}

#[derive(Default)]
struct CacheState {
    /// Bumped by [`ViewCache::clear`]; invalidates every outstanding ticket.
    epoch: u64,
    generations: HashMap<ViewKey, u64>,
    entries: HashMap<(DbId, ViewKey), Entry>,
}

impl CacheState {
    fn generation(&self, key: ViewKey) -> u64 {
        self.generations.get(&key).copied().unwrap_or(0)
    }
}

/// Proof of when a fetch started, relative to invalidations of its view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket {
    user_id: DbId,
    key: ViewKey,
    epoch: u64,
    generation: u64,
}

pub struct ViewCache {
    state: Mutex<CacheState>,
    ttl: Duration,
}

impl ViewCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            state: Mutex::new(CacheState::default()),
            ttl,
        }
    }

    /// A cached value that is neither invalidated nor older than the TTL.
    pub fn get(&self, user_id: DbId, key: ViewKey) -> Option<Value> {
        let state = self.lock();
        let current = state.generation(key);
        state
            .entries
            .get(&(user_id, key))
            .filter(|e| e.generation == current && e.stored_at.elapsed() < self.ttl)
            .map(|e| e.value.clone())
    }

    /// Start a fetch of `key` for `user_id`.
    pub fn ticket(&self, user_id: DbId, key: ViewKey) -> FetchTicket {
        let state = self.lock();
        FetchTicket {
            user_id,
            key,
            epoch: state.epoch,
            generation: state.generation(key),
        }
    }

    /// Store a fetched value. Returns `false`, storing nothing, when the view
    /// was invalidated after the ticket was taken.
    pub fn complete(&self, ticket: FetchTicket, value: Value) -> bool {
        let mut state = self.lock();
        if state.epoch != ticket.epoch || state.generation(ticket.key) != ticket.generation {
            tracing::debug!(view = ?ticket.key, "Discarding stale fetch");
            return false;
        }
        state.entries.insert(
            (ticket.user_id, ticket.key),
            Entry {
                generation: ticket.generation,
                stored_at: Instant::now(),
                value,
            },
        );
        true
    }

    /// Invalidate `keys` for every user.
    pub fn invalidate(&self, keys: &[ViewKey]) {
        if keys.is_empty() {
            return;
        }
        let mut state = self.lock();
        for key in keys {
            *state.generations.entry(*key).or_insert(0) += 1;
        }
        state.entries.retain(|(_, key), _| !keys.contains(key));
    }

    /// Apply the invalidation contract for one event.
    pub fn apply(&self, event: &PortfolioEvent) {
        self.invalidate(&invalidated_views(event));
    }

    /// Drop every entry, e.g. after a user's role changed and every scoped
    /// view of theirs may differ.
    pub fn clear(&self) {
        let mut state = self.lock();
        state.epoch += 1;
        state.entries.clear();
    }

    /// Drop entries older than the TTL. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let mut state = self.lock();
        let before = state.entries.len();
        let ttl = self.ttl;
        state.entries.retain(|_, e| e.stored_at.elapsed() < ttl);
        before - state.entries.len()
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, CacheState> {
        // The state is left consistent after every operation, so a poisoned
        // lock is still usable.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Periodically purge expired entries until `cancel` fires.
pub async fn run_sweeper(cache: Arc<ViewCache>, every: Duration, cancel: CancellationToken) {
    let mut interval = tokio::time::interval(every);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    loop {
        tokio::select! {
            () = cancel.cancelled() => break,
            _ = interval.tick() => {
                let purged = cache.purge_expired();
                if purged > 0 {
                    tracing::debug!(purged, remaining = cache.len(), "Purged expired views");
                }
            }
        }
    }
    tracing::info!("View cache sweeper stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use uuid::Uuid;

    fn cache() -> ViewCache {
        ViewCache::new(Duration::from_secs(60))
    }

    #[test]
    fn completed_fetch_is_served() {
        let cache = cache();
        let user = Uuid::now_v7();
        let ticket = cache.ticket(user, ViewKey::Dashboard);
        assert!(cache.complete(ticket, json!({"total": 1})));
        assert_eq!(cache.get(user, ViewKey::Dashboard), Some(json!({"total": 1})));
        assert!(cache.get(Uuid::now_v7(), ViewKey::Dashboard).is_none());
    }

    #[test]
    fn fetch_overtaken_by_invalidation_is_discarded() {
        let cache = cache();
        let user = Uuid::now_v7();
        let ticket = cache.ticket(user, ViewKey::Dashboard);

        cache.apply(&PortfolioEvent::ProjectCreated {
            project_id: Uuid::now_v7(),
        });

        assert!(!cache.complete(ticket, json!({"total": 0})));
        assert!(cache.get(user, ViewKey::Dashboard).is_none());
    }

    #[test]
    fn invalidation_drops_existing_entries_only_for_its_views() {
        let cache = cache();
        let user = Uuid::now_v7();
        let project = Uuid::now_v7();
        let t1 = cache.ticket(user, ViewKey::Dashboard);
        let t2 = cache.ticket(user, ViewKey::ProjectRisks(project));
        cache.complete(t1, json!(1));
        cache.complete(t2, json!(2));

        cache.apply(&PortfolioEvent::RiskChanged {
            project_id: project,
            risk_id: Uuid::now_v7(),
        });

        assert_eq!(cache.get(user, ViewKey::Dashboard), Some(json!(1)));
        assert!(cache.get(user, ViewKey::ProjectRisks(project)).is_none());
    }

    #[test]
    fn entries_expire_after_ttl() {
        let cache = ViewCache::new(Duration::ZERO);
        let user = Uuid::now_v7();
        let ticket = cache.ticket(user, ViewKey::ProjectList);
        cache.complete(ticket, json!([]));
        assert!(cache.get(user, ViewKey::ProjectList).is_none());
    }

    #[test]
    fn clear_empties_and_invalidates_in_flight_fetches() {
        let cache = cache();
        let user = Uuid::now_v7();
        let first = cache.ticket(user, ViewKey::Dashboard);
        cache.complete(first, json!(1));
        let in_flight = cache.ticket(user, ViewKey::ProjectList);

        cache.clear();

        assert!(cache.is_empty());
        assert!(!cache.complete(in_flight, json!(2)));
    }

    #[test]
    fn purge_removes_only_expired_entries() {
        let cache = ViewCache::new(Duration::ZERO);
        let ticket = cache.ticket(Uuid::now_v7(), ViewKey::Dashboard);
        cache.complete(ticket, json!(1));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.purge_expired(), 1);
        assert!(cache.is_empty());

        let fresh = ViewCache::new(Duration::from_secs(60));
        let ticket = fresh.ticket(Uuid::now_v7(), ViewKey::Dashboard);
        fresh.complete(ticket, json!(1));
        assert_eq!(fresh.purge_expired(), 0);
    }

    #[tokio::test]
    async fn sweeper_stops_on_cancel() {
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(run_sweeper(
            Arc::new(cache()),
            Duration::from_millis(10),
            cancel.clone(),
        ));
        cancel.cancel();
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("sweeper did not stop")
            .unwrap();
    }
}
