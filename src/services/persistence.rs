//! Persistence service: debounced history snapshots.
//!
//! DESIGN
//! ======
//! One background task per page watches the store revision. The first
//! change arms a timer; every further change restarts it. When the page has
//! been quiet for the debounce interval the task writes one snapshot. There
//! is never more than one write in flight per page because the task awaits
//! the write before it listens again; changes that land meanwhile are
//! remembered by the watch channel and arm the next round immediately.
//!
//! ERROR HANDLING
//! ==============
//! Failed writes are logged and the loop continues. Elements are never
//! rolled back; the next edit schedules a fresh attempt.

use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::notice::ErrorCode;
use crate::services::history::{HistoryError, commit_snapshot};
use crate::state::BuilderState;

/// Spawn the history task for `state`'s page. Returns a handle for shutdown.
pub fn spawn_history_task(state: BuilderState) -> JoinHandle<()> {
    let debounce = state.config.history_debounce();
    let mut changes = state.subscribe_changes();
    info!(page_id = %state.page_id, debounce_ms = state.config.history_debounce_ms, "history persistence configured");

    tokio::spawn(async move {
        loop {
            if changes.changed().await.is_err() {
                break;
            }
            loop {
                tokio::select! {
                    changed = changes.changed() => {
                        if changed.is_err() {
                            return;
                        }
                    }
                    () = tokio::time::sleep(debounce) => break,
                }
            }

            match commit_snapshot(&state).await {
                Ok(true) => debug!(page_id = %state.page_id, "snapshot recorded"),
                Ok(false) => debug!(page_id = %state.page_id, "nothing to snapshot"),
                Err(HistoryError::NoSession) => warn!(page_id = %state.page_id, "snapshot skipped: signed out"),
                Err(e) => error!(page_id = %state.page_id, error = %e, code = e.error_code(), "snapshot failed"),
            }
        }
    })
}
