//! History service: snapshot persistence and undo/redo for one page.
//!
//! DESIGN
//! ======
//! Snapshots are written in three phases: capture under the page lock,
//! write with the lock released, then reconcile under the lock again. The
//! reconcile step checks two counters captured in phase one:
//!
//! - the store revision: if it moved, an edit landed during the write and
//!   the page goes back to `Dirty` so the next debounce picks it up;
//! - the history epoch: if it moved, undo/redo ran during the write and the
//!   snapshot no longer belongs at the cursor, so it is dropped locally and
//!   its remote row is deleted.
//!
//! ERROR HANDLING
//! ==============
//! A failed write never rolls back local elements. Remote deletions of
//! stale snapshots are best effort: failures are logged and forgotten.

#[cfg(test)]
#[path = "history_test.rs"]
mod history_test;

use serde_json::Value;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::backend::{BackendError, Collection, Order, Query, RecordStore};
use crate::doc::Element;
use crate::history::{HistoryLog, HistoryStatus, Snapshot};
use crate::notice::{ErrorCode, NoticeLevel};
use crate::state::BuilderState;

#[derive(Debug, thiserror::Error)]
pub enum HistoryError {
    #[error("sign in to keep edit history")]
    NoSession,
    #[error(transparent)]
    Backend(#[from] BackendError),
    #[error("snapshot could not be encoded: {0}")]
    Encode(String),
}

impl ErrorCode for HistoryError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::NoSession => "E_NO_SESSION",
            Self::Backend(e) => e.error_code(),
            Self::Encode(_) => "E_SNAPSHOT_ENCODE",
        }
    }

    fn retryable(&self) -> bool {
        matches!(self, Self::Backend(e) if e.retryable())
    }

    fn level(&self) -> NoticeLevel {
        match self {
            Self::NoSession => NoticeLevel::Warning,
            Self::Backend(_) | Self::Encode(_) => NoticeLevel::Error,
        }
    }
}

fn require_session(state: &BuilderState) -> Result<(), HistoryError> {
    if state.session.is_signed_in() { Ok(()) } else { Err(HistoryError::NoSession) }
}

fn page_query(page_id: Uuid) -> Query {
    Query::new().eq("page_id", page_id.to_string())
}

/// Persisted snapshots of a page, oldest first. Undecodable rows are skipped.
///
/// # Errors
///
/// Returns `Backend` when the read fails.
pub async fn fetch_snapshots(backend: &dyn RecordStore, page_id: Uuid) -> Result<Vec<Snapshot>, HistoryError> {
    let rows = backend
        .select(Collection::History, &page_query(page_id).order_by("created_at", Order::Asc))
        .await?;
    let total = rows.len();
    let snapshots: Vec<Snapshot> = rows
        .into_iter()
        .filter_map(|row| serde_json::from_value(row).ok())
        .collect();
    if snapshots.len() < total {
        warn!(%page_id, skipped = total - snapshots.len(), "skipped undecodable history rows");
    }
    Ok(snapshots)
}

/// Best-effort removal of snapshot rows from the remote log.
async fn forget_remote(state: &BuilderState, ids: Vec<Uuid>) {
    if ids.is_empty() {
        return;
    }
    let count = ids.len();
    let query = Query::new().is_in("id", ids.iter().map(Uuid::to_string));
    if let Err(e) = state.backend.delete(Collection::History, &query).await {
        warn!(page_id = %state.page_id, error = %e, count, "stale snapshot cleanup failed");
    }
}

async fn write_snapshot(state: &BuilderState, snapshot: &Snapshot) -> Result<(), HistoryError> {
    let row = serde_json::to_value(snapshot).map_err(|e| HistoryError::Encode(e.to_string()))?;
    state.backend.insert(Collection::History, vec![row]).await?;
    Ok(())
}

/// Load the page's history and put the cursor on the newest snapshot.
///
/// When the remote log is empty, a baseline snapshot of the current
/// elements is recorded so undo can return to the loaded state. Returns
/// the number of snapshots now in the log.
///
/// # Errors
///
/// Returns `NoSession` when signed out and `Backend` when the read fails;
/// the local log is left as it was in both cases. A failed baseline write
/// still records the baseline locally.
pub async fn load_history(state: &BuilderState) -> Result<usize, HistoryError> {
    require_session(state)?;
    let snapshots = fetch_snapshots(state.backend.as_ref(), state.page_id)
        .await
        .inspect_err(|e| warn!(page_id = %state.page_id, error = %e, "history load failed"))?;

    if !snapshots.is_empty() {
        let (evicted, len) = {
            let mut page = state.page.write().await;
            let evicted = page.history.load(snapshots);
            (evicted, page.history.len())
        };
        forget_remote(state, evicted).await;
        info!(page_id = %state.page_id, count = len, "history loaded");
        return Ok(len);
    }

    let baseline = {
        let mut page = state.page.write().await;
        let baseline = Snapshot::capture(state.page_id, page.store.snapshot());
        page.history.load(vec![baseline.clone()]);
        baseline
    };
    info!(page_id = %state.page_id, "history empty; recording baseline");
    if let Err(e) = write_snapshot(state, &baseline).await {
        error!(page_id = %state.page_id, error = %e, "baseline snapshot write failed");
        return Err(e);
    }
    Ok(1)
}

/// Persist a snapshot of the current elements if the page is dirty.
///
/// Returns `Ok(true)` when a snapshot was appended to the history,
/// `Ok(false)` when there was nothing to record or the snapshot was
/// superseded by undo/redo during the write.
///
/// # Errors
///
/// Returns `NoSession` when signed out (the page stays dirty) and `Backend`
/// or `Encode` when the write fails (the page goes idle, elements are kept).
pub async fn commit_snapshot(state: &BuilderState) -> Result<bool, HistoryError> {
    require_session(state)?;

    // PHASE: CAPTURE
    let (snapshot, revision, epoch) = {
        let mut page = state.page.write().await;
        if page.status != HistoryStatus::Dirty {
            return Ok(false);
        }
        page.status = HistoryStatus::Persisting;
        (Snapshot::capture(state.page_id, page.store.snapshot()), page.store.revision(), page.history_epoch)
    };

    // PHASE: WRITE
    let written = write_snapshot(state, &snapshot).await;

    // PHASE: RECONCILE
    let mut stale = Vec::new();
    let recorded = {
        let mut page = state.page.write().await;
        page.status = if page.store.revision() == revision { HistoryStatus::Idle } else { HistoryStatus::Dirty };
        match &written {
            Err(_) => false,
            Ok(()) if page.history_epoch != epoch => {
                stale.push(snapshot.id);
                false
            }
            Ok(()) => {
                let outcome = page.history.push(snapshot);
                stale = outcome.stale_ids();
                true
            }
        }
    };

    if let Err(e) = written {
        error!(page_id = %state.page_id, error = %e, "snapshot write failed");
        return Err(e);
    }
    forget_remote(state, stale).await;
    Ok(recorded)
}

/// Step the cursor back and restore that snapshot. `false` at the start.
pub async fn undo(state: &BuilderState) -> bool {
    travel(state, |history| history.undo().map(|s| s.elements.clone())).await
}

/// Step the cursor forward and restore that snapshot. `false` at the end.
pub async fn redo(state: &BuilderState) -> bool {
    travel(state, |history| history.redo().map(|s| s.elements.clone())).await
}

async fn travel(state: &BuilderState, step: impl FnOnce(&mut HistoryLog) -> Option<Vec<Element>>) -> bool {
    let mut page = state.page.write().await;
    let Some(elements) = step(&mut page.history) else {
        return false;
    };
    page.store.replace_all(elements);
    page.history_epoch += 1;
    // Any pending debounce described the state we just left.
    page.status = HistoryStatus::Idle;
    true
}

pub async fn can_undo(state: &BuilderState) -> bool {
    state.page.read().await.history.can_undo()
}

pub async fn can_redo(state: &BuilderState) -> bool {
    state.page.read().await.history.can_redo()
}

/// Summary row for listing snapshots.
#[must_use]
pub fn describe(snapshot: &Snapshot) -> Value {
    serde_json::json!({
        "id": snapshot.id,
        "created_at": snapshot.timestamp,
        "elements": snapshot.elements.len(),
    })
}
