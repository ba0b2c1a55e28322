//! Linear undo history: snapshots of a page's elements with a cursor.
//!
//! DESIGN
//! ======
//! One list, one cursor. Pushing while the cursor sits behind the tip drops
//! everything after it (the stale redo branch) before appending, so history
//! never forks. The cap bounds undo depth: the list holds at most `cap`
//! steps on top of the oldest snapshot, and the oldest are evicted first.
//! `push` and `load` report the ids they dropped so the caller can remove
//! the same rows from the remote log.

#[cfg(test)]
#[path = "history_test.rs"]
mod history_test;

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::consts::DEFAULT_HISTORY_CAP;
use crate::doc::Element;

/// Full copy of a page's elements at one point in time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub id: Uuid,
    pub page_id: Uuid,
    pub elements: Vec<Element>,
    /// Milliseconds since Unix epoch. Stored remotely as `created_at`.
    #[serde(rename = "created_at")]
    pub timestamp: i64,
}

impl Snapshot {
    /// Capture `elements` now under a fresh id.
    #[must_use]
    pub fn capture(page_id: Uuid, elements: Vec<Element>) -> Self {
        Self { id: Uuid::new_v4(), page_id, elements, timestamp: now_ms() }
    }
}

/// Persistence state of the page relative to its history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HistoryStatus {
    /// Everything local is captured by the snapshot at the cursor.
    #[default]
    Idle,
    /// Elements changed since the last snapshot; a write is pending.
    Dirty,
    /// A snapshot write is in flight.
    Persisting,
}

/// Snapshot ids removed by a push or load.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PushOutcome {
    /// Redo-branch snapshots dropped because the cursor was behind the tip.
    pub truncated: Vec<Uuid>,
    /// Oldest snapshots dropped to respect the cap.
    pub evicted: Vec<Uuid>,
}

impl PushOutcome {
    /// Every id the remote log should forget.
    #[must_use]
    pub fn stale_ids(&self) -> Vec<Uuid> {
        self.truncated.iter().chain(&self.evicted).copied().collect()
    }
}

#[derive(Debug, Clone)]
pub struct HistoryLog {
    snapshots: Vec<Snapshot>,
    cursor: Option<usize>,
    cap: usize,
}

impl Default for HistoryLog {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAP)
    }
}

impl HistoryLog {
    /// Empty log allowing at most `cap` undo steps (minimum 1), so it keeps
    /// up to `cap + 1` snapshots.
    #[must_use]
    pub fn new(cap: usize) -> Self {
        Self { snapshots: Vec::new(), cursor: None, cap: cap.max(1) }
    }

    /// Replace the log with persisted snapshots, oldest first. The cursor
    /// lands on the newest one. Returns ids evicted by the cap.
    pub fn load(&mut self, mut snapshots: Vec<Snapshot>) -> Vec<Uuid> {
        snapshots.sort_by_key(|s| s.timestamp);
        self.snapshots = snapshots;
        let evicted = self.evict_excess();
        self.cursor = self.snapshots.len().checked_sub(1);
        evicted
    }

    /// Append a snapshot after the cursor and move the cursor onto it.
    pub fn push(&mut self, snapshot: Snapshot) -> PushOutcome {
        let keep = self.cursor.map_or(0, |c| c + 1);
        let truncated = self
            .snapshots
            .drain(keep..)
            .map(|s| s.id)
            .collect();
        self.snapshots.push(snapshot);
        let evicted = self.evict_excess();
        self.cursor = Some(self.snapshots.len() - 1);
        PushOutcome { truncated, evicted }
    }

    /// Step back one snapshot and return it. `None` at the first snapshot.
    pub fn undo(&mut self) -> Option<&Snapshot> {
        let cursor = self.cursor?;
        if cursor == 0 {
            return None;
        }
        self.cursor = Some(cursor - 1);
        self.snapshots.get(cursor - 1)
    }

    /// Step forward one snapshot and return it. `None` at the last snapshot.
    pub fn redo(&mut self) -> Option<&Snapshot> {
        let next = self.cursor? + 1;
        if next >= self.snapshots.len() {
            return None;
        }
        self.cursor = Some(next);
        self.snapshots.get(next)
    }

    #[must_use]
    pub fn can_undo(&self) -> bool {
        self.cursor.is_some_and(|c| c > 0)
    }

    #[must_use]
    pub fn can_redo(&self) -> bool {
        self.cursor.is_some_and(|c| c + 1 < self.snapshots.len())
    }

    /// Snapshot under the cursor.
    #[must_use]
    pub fn current(&self) -> Option<&Snapshot> {
        self.cursor.and_then(|c| self.snapshots.get(c))
    }

    #[must_use]
    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    #[must_use]
    pub fn snapshots(&self) -> &[Snapshot] {
        &self.snapshots
    }

    #[must_use]
    pub fn cap(&self) -> usize {
        self.cap
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    fn evict_excess(&mut self) -> Vec<Uuid> {
        let excess = self.snapshots.len().saturating_sub(self.cap + 1);
        self.snapshots.drain(..excess).map(|s| s.id).collect()
    }
}

/// Current time as milliseconds since Unix epoch.
pub(crate) fn now_ms() -> i64 {
    let Ok(dur) = SystemTime::now().duration_since(UNIX_EPOCH) else {
        return 0;
    };
    i64::try_from(dur.as_millis()).unwrap_or(0)
}
