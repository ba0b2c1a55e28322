//! In-process record store.
//!
//! Rows live in a map of collections behind a std mutex; nothing is held
//! across an await. Reads and writes can be made to fail on demand, and
//! functions answer with canned responses, so services can be exercised
//! against every failure path without a network.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde_json::{Map, Value};
use uuid::Uuid;

use super::{BackendError, Collection, FunctionResponse, Query, RecordStore};

#[derive(Default)]
struct Inner {
    rows: HashMap<Collection, Vec<Value>>,
    functions: HashMap<String, FunctionResponse>,
    invocations: Vec<(String, Value)>,
}

#[derive(Default)]
pub struct MemoryBackend {
    inner: Mutex<Inner>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
}

impl MemoryBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Make every subsequent `select` fail until reset.
    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Make every subsequent `insert`, `update` and `delete` fail until reset.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Seed rows directly, bypassing failure injection.
    pub fn seed(&self, collection: Collection, rows: impl IntoIterator<Item = Value>) {
        let mut inner = self.lock();
        inner
            .rows
            .entry(collection)
            .or_default()
            .extend(rows.into_iter().map(with_id));
    }

    /// All rows of a collection in insertion order.
    #[must_use]
    pub fn rows(&self, collection: Collection) -> Vec<Value> {
        self.lock()
            .rows
            .get(&collection)
            .cloned()
            .unwrap_or_default()
    }

    /// Answer calls to `function` with `response`.
    pub fn respond(&self, function: &str, response: FunctionResponse) {
        self.lock()
            .functions
            .insert(function.to_string(), response);
    }

    /// Every function call so far as `(function, body)`.
    #[must_use]
    pub fn invocations(&self) -> Vec<(String, Value)> {
        self.lock().invocations.clone()
    }

    fn check_read(&self) -> Result<(), BackendError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(BackendError::Unavailable("reads disabled".into()));
        }
        Ok(())
    }

    fn check_write(&self) -> Result<(), BackendError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(BackendError::Unavailable("writes disabled".into()));
        }
        Ok(())
    }
}

/// Give a row an `id` when it has none, like the hosted service does.
fn with_id(mut row: Value) -> Value {
    if let Some(map) = row.as_object_mut() {
        map.entry("id")
            .or_insert_with(|| Value::String(Uuid::new_v4().to_string()));
    }
    row
}

fn merge(row: &mut Value, patch: &Map<String, Value>) {
    if let Some(map) = row.as_object_mut() {
        for (k, v) in patch {
            map.insert(k.clone(), v.clone());
        }
    }
}

#[async_trait::async_trait]
impl RecordStore for MemoryBackend {
    async fn select(&self, collection: Collection, query: &Query) -> Result<Vec<Value>, BackendError> {
        self.check_read()?;
        let matching = self
            .lock()
            .rows
            .get(&collection)
            .map(|rows| rows.iter().filter(|r| query.matches(r)).cloned().collect())
            .unwrap_or_default();
        Ok(query.arrange(matching))
    }

    async fn insert(&self, collection: Collection, rows: Vec<Value>) -> Result<Vec<Value>, BackendError> {
        self.check_write()?;
        if let Some(bad) = rows.iter().find(|r| !r.is_object()) {
            return Err(BackendError::Status { status: 400, body: format!("row is not an object: {bad}") });
        }
        let stored: Vec<Value> = rows.into_iter().map(with_id).collect();
        self.lock()
            .rows
            .entry(collection)
            .or_default()
            .extend(stored.iter().cloned());
        Ok(stored)
    }

    async fn upsert(&self, collection: Collection, rows: Vec<Value>) -> Result<Vec<Value>, BackendError> {
        self.check_write()?;
        if let Some(bad) = rows.iter().find(|r| !r.is_object()) {
            return Err(BackendError::Status { status: 400, body: format!("row is not an object: {bad}") });
        }
        let stored: Vec<Value> = rows.into_iter().map(with_id).collect();
        let mut inner = self.lock();
        let table = inner.rows.entry(collection).or_default();
        for row in &stored {
            match table.iter_mut().find(|r| r.get("id") == row.get("id")) {
                Some(existing) => *existing = row.clone(),
                None => table.push(row.clone()),
            }
        }
        Ok(stored)
    }

    async fn update(&self, collection: Collection, query: &Query, patch: Value) -> Result<Vec<Value>, BackendError> {
        self.check_write()?;
        let Some(patch) = patch.as_object() else {
            return Err(BackendError::Status { status: 400, body: "patch is not an object".into() });
        };
        let mut inner = self.lock();
        let Some(rows) = inner.rows.get_mut(&collection) else {
            return Ok(Vec::new());
        };
        let mut updated = Vec::new();
        for row in rows.iter_mut().filter(|r| query.matches(r)) {
            merge(row, patch);
            updated.push(row.clone());
        }
        Ok(updated)
    }

    async fn delete(&self, collection: Collection, query: &Query) -> Result<usize, BackendError> {
        self.check_write()?;
        let mut inner = self.lock();
        let Some(rows) = inner.rows.get_mut(&collection) else {
            return Ok(0);
        };
        let before = rows.len();
        rows.retain(|r| !query.matches(r));
        Ok(before - rows.len())
    }

    async fn invoke(&self, function: &str, body: Value) -> Result<FunctionResponse, BackendError> {
        let mut inner = self.lock();
        inner.invocations.push((function.to_string(), body));
        inner
            .functions
            .get(function)
            .cloned()
            .ok_or_else(|| BackendError::Status { status: 404, body: format!("function {function} not found") })
    }
}
