//! Best-effort audit trail.
//!
//! [`AuditRecorder::record`] enqueues an entry and returns immediately; a
//! background writer drains the queue in batches into the store. A failed
//! write is logged and dropped. It never reaches the mutation that produced
//! the entry.

use portfolio_core::audit::{AuditAction, AuditOrigin};
use portfolio_core::error::CoreError;
use portfolio_core::field_filter::filter_snapshot;
use portfolio_core::permissions::{has_permission, require_permission, Permission};
use portfolio_core::types::DbId;
use portfolio_db::models::audit::{AuditEntry, AuditPage, NewAuditEntry};
use portfolio_db::SharedStore;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::middleware::actor::Actor;
use crate::state::AppState;

/// Entries buffered before `record` starts dropping them.
pub const AUDIT_QUEUE_CAPACITY: usize = 4096;

/// Upper bound on entries written in one store call.
const MAX_BATCH: usize = 256;

enum Command {
    Record(NewAuditEntry),
    Flush(oneshot::Sender<()>),
}

/// Handle to the audit writer. Cheap to clone.
#[derive(Clone)]
pub struct AuditRecorder {
    tx: mpsc::Sender<Command>,
}

impl AuditRecorder {
    /// Start the writer task. It stops once every handle has been dropped and
    /// the queue is drained.
    pub fn spawn(store: SharedStore) -> (Self, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(AUDIT_QUEUE_CAPACITY);
        let handle = tokio::spawn(run_writer(store, rx));
        (Self { tx }, handle)
    }

    /// Queue an entry. Never blocks and never fails the caller.
    pub fn record(
        &self,
        project_id: DbId,
        actor_id: DbId,
        action: AuditAction,
        old_values: Option<serde_json::Value>,
        new_values: Option<serde_json::Value>,
        origin: AuditOrigin,
    ) {
        let entry = NewAuditEntry {
            project_id,
            actor_id,
            action,
            old_values,
            new_values,
            origin,
        };
        if let Err(e) = self.tx.try_send(Command::Record(entry)) {
            tracing::warn!(
                project_id = %project_id,
                action = %action,
                error = %e,
                "Audit queue unavailable, entry dropped"
            );
        }
    }

    /// Wait until everything queued before this call has been written (or
    /// failed).
    pub async fn flush(&self) {
        let (done_tx, done_rx) = oneshot::channel();
        if self.tx.send(Command::Flush(done_tx)).await.is_ok() {
            let _ = done_rx.await;
        }
    }
}

async fn run_writer(store: SharedStore, mut rx: mpsc::Receiver<Command>) {
    let mut batch: Vec<NewAuditEntry> = Vec::new();
    let mut waiters: Vec<oneshot::Sender<()>> = Vec::new();

    while let Some(first) = rx.recv().await {
        let mut next = Some(first);
        while let Some(cmd) = next.take() {
            match cmd {
                Command::Record(entry) => batch.push(entry),
                Command::Flush(done) => waiters.push(done),
            }
            if batch.len() < MAX_BATCH {
                next = rx.try_recv().ok();
            }
        }

        write_batch(&store, &mut batch).await;
        for done in waiters.drain(..) {
            let _ = done.send(());
        }
    }

    tracing::info!("Audit writer shutting down");
}

async fn write_batch(store: &SharedStore, batch: &mut Vec<NewAuditEntry>) {
    if batch.is_empty() {
        return;
    }
    match store.append_audit(batch).await {
        Ok(written) => {
            tracing::debug!(count = written.len(), "Audit entries written");
        }
        Err(e) => {
            tracing::error!(
                error = %e,
                count = batch.len(),
                "Failed to write audit entries"
            );
        }
    }
    batch.clear();
}

// ---------------------------------------------------------------------------
// Reading
// ---------------------------------------------------------------------------

/// A project's history, newest first, with snapshots filtered for the reader.
///
/// Readers holding `audit:read_all` may read the history of any project id,
/// including deleted ones. Everyone else needs the project to be visible
/// under their scope.
pub async fn history(
    state: &AppState,
    actor: &Actor,
    project_id: DbId,
    page: AuditPage,
) -> Result<Vec<AuditEntry>, CoreError> {
    require_permission(actor.role, Permission::AuditRead)?;

    if !has_permission(actor.role, Permission::AuditReadAll) {
        state
            .store
            .find_project(project_id, actor.scope())
            .await?
            .ok_or_else(|| CoreError::not_found("Project", project_id))?;
    }

    let entries = state.store.list_audit(project_id, page).await?;
    Ok(entries
        .into_iter()
        .map(|mut e| {
            e.old_values = e.old_values.as_ref().map(|v| filter_snapshot(v, actor.role));
            e.new_values = e.new_values.as_ref().map(|v| filter_snapshot(v, actor.role));
            e
        })
        .collect())
}
