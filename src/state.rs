//! Shared builder state.
//!
//! DESIGN
//! ======
//! `BuilderState` is the injected context for one open page. It is cheap to
//! clone: every field is Arc-wrapped or Clone. Page-local data (elements,
//! history, persistence status) sits behind one async lock; the clipboard
//! is shared by every page of the process. Each store mutation bumps the
//! store revision and announces it on a watch channel, which the history
//! worker debounces into snapshot writes.

use std::sync::Arc;

use tokio::sync::{RwLock, watch};
use uuid::Uuid;

use crate::backend::RecordStore;
use crate::clipboard::Clipboard;
use crate::config::BuilderConfig;
use crate::doc::ElementStore;
use crate::history::{HistoryLog, HistoryStatus};
use crate::session::SessionHandle;

// =============================================================================
// PAGE STATE
// =============================================================================

/// Live state of one page. Kept in memory; snapshots flow to the remote log.
#[derive(Debug)]
pub struct PageState {
    pub store: ElementStore,
    pub history: HistoryLog,
    pub status: HistoryStatus,
    /// Bumped by undo/redo. A snapshot write that started under an older
    /// epoch no longer describes the cursor position and is discarded.
    pub history_epoch: u64,
}

impl PageState {
    #[must_use]
    pub fn new(history_cap: usize) -> Self {
        Self { store: ElementStore::new(), history: HistoryLog::new(history_cap), status: HistoryStatus::Idle, history_epoch: 0 }
    }
}

// =============================================================================
// BUILDER STATE
// =============================================================================

#[derive(Clone)]
pub struct BuilderState {
    pub project_id: Uuid,
    pub page_id: Uuid,
    pub page: Arc<RwLock<PageState>>,
    pub clipboard: Arc<RwLock<Clipboard>>,
    pub backend: Arc<dyn RecordStore>,
    pub session: SessionHandle,
    pub config: BuilderConfig,
    changes: Arc<watch::Sender<u64>>,
}

impl BuilderState {
    #[must_use]
    pub fn new(
        project_id: Uuid,
        page_id: Uuid,
        backend: Arc<dyn RecordStore>,
        session: SessionHandle,
        config: BuilderConfig,
    ) -> Self {
        let (tx, _rx) = watch::channel(0);
        Self {
            project_id,
            page_id,
            page: Arc::new(RwLock::new(PageState::new(config.history_cap))),
            clipboard: Arc::new(RwLock::new(Clipboard::new())),
            backend,
            session,
            config,
            changes: Arc::new(tx),
        }
    }

    /// Context for another page of the same project. The clipboard, backend
    /// and session are shared; elements and history are not.
    #[must_use]
    pub fn for_page(&self, page_id: Uuid) -> Self {
        let (tx, _rx) = watch::channel(0);
        Self {
            project_id: self.project_id,
            page_id,
            page: Arc::new(RwLock::new(PageState::new(self.config.history_cap))),
            clipboard: Arc::clone(&self.clipboard),
            backend: Arc::clone(&self.backend),
            session: self.session.clone(),
            config: self.config.clone(),
            changes: Arc::new(tx),
        }
    }

    /// Run a store mutation under the page lock.
    ///
    /// When the revision moves, the page is marked dirty (unless a write is
    /// in flight, which re-marks it when it lands) and the new revision is
    /// announced to the history worker.
    pub async fn mutate_store<R>(&self, f: impl FnOnce(&mut ElementStore) -> R) -> R {
        let (result, revision) = {
            let mut page = self.page.write().await;
            let before = page.store.revision();
            let result = f(&mut page.store);
            let after = page.store.revision();
            if after == before {
                return result;
            }
            if page.status != HistoryStatus::Persisting {
                page.status = HistoryStatus::Dirty;
            }
            (result, after)
        };
        self.changes.send_replace(revision);
        result
    }

    /// Receiver that wakes with the store revision after each mutation.
    #[must_use]
    pub fn subscribe_changes(&self) -> watch::Receiver<u64> {
        self.changes.subscribe()
    }

    pub async fn status(&self) -> HistoryStatus {
        self.page.read().await.status
    }

    pub async fn revision(&self) -> u64 {
        self.page.read().await.store.revision()
    }
}

// =============================================================================
// TEST HELPERS
// =============================================================================


#[cfg(test)]
mod tests {
    use super::test_helpers::*;
    use super::*;

    #[tokio::test]
    async fn mutation_marks_dirty_and_announces_revision() {
        let (state, _backend) = test_builder_state();
        let mut rx = state.subscribe_changes();
        state.mutate_store(|s| s.add(dummy_draft())).await;
        assert_eq!(state.status().await, HistoryStatus::Dirty);
        assert!(rx.has_changed().unwrap());
        assert_eq!(*rx.borrow_and_update(), 1);
    }

    #[tokio::test]
    async fn noop_mutation_stays_idle_and_silent() {
        let (state, _backend) = test_builder_state();
        let rx = state.subscribe_changes();
        let found = state.mutate_store(|s| s.delete("missing")).await;
        assert!(found.is_none());
        assert_eq!(state.status().await, HistoryStatus::Idle);
        assert!(!rx.has_changed().unwrap());
    }

    #[tokio::test]
    async fn mutation_during_write_keeps_persisting() {
        let (state, _backend) = test_builder_state();
        state.page.write().await.status = HistoryStatus::Persisting;
        state.mutate_store(|s| s.add(dummy_draft())).await;
        assert_eq!(state.status().await, HistoryStatus::Persisting);
    }

    #[tokio::test]
    async fn other_pages_share_clipboard_only() {
        let (state, _backend) = test_builder_state();
        let other = state.for_page(Uuid::new_v4());
        state.mutate_store(|s| s.add(dummy_draft())).await;
        assert_eq!(other.revision().await, 0);
        assert!(Arc::ptr_eq(&state.clipboard, &other.clipboard));
        assert!(!Arc::ptr_eq(&state.page, &other.page));
    }
}
