//! Element service: store mutations for one page plus element persistence.
//!
//! Mutations go through [`BuilderState::mutate_store`] so the history worker
//! sees them. Input is validated before the lock is taken; lookup misses are
//! silent and surface as `None`/`false`.

#[cfg(test)]
#[path = "element_test.rs"]
mod element_test;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};
use uuid::Uuid;

use crate::backend::{BackendError, Collection, Order, Query};
use crate::doc::{Element, ElementDraft, PartialElement, Position};
use crate::notice::{ErrorCode, NoticeLevel};
use crate::state::BuilderState;

#[derive(Debug, thiserror::Error)]
pub enum ElementError {
    #[error("element properties must be a JSON object")]
    InvalidProperties,
    #[error("sign in to save or load elements")]
    NoSession,
    #[error(transparent)]
    Backend(#[from] BackendError),
}

impl ErrorCode for ElementError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidProperties => "E_INVALID_PROPERTIES",
            Self::NoSession => "E_NO_SESSION",
            Self::Backend(e) => e.error_code(),
        }
    }

    fn retryable(&self) -> bool {
        matches!(self, Self::Backend(e) if e.retryable())
    }

    fn level(&self) -> NoticeLevel {
        match self {
            Self::InvalidProperties | Self::NoSession => NoticeLevel::Warning,
            Self::Backend(_) => NoticeLevel::Error,
        }
    }
}

/// Element as stored in the `elements` collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ElementRow {
    id: String,
    page_id: Uuid,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    properties: Value,
    position: Position,
    #[serde(default)]
    sort_order: usize,
}

impl ElementRow {
    fn into_element(self) -> Element {
        let properties = if self.properties.is_object() { self.properties } else { Value::Object(serde_json::Map::new()) };
        Element { id: self.id, kind: self.kind, properties, position: self.position }
    }
}

// =============================================================================
// STORE OPERATIONS
// =============================================================================

/// Add an element with a fresh id.
///
/// # Errors
///
/// Returns `InvalidProperties` if the draft's properties are not an object.
pub async fn add_element(state: &BuilderState, draft: ElementDraft) -> Result<Element, ElementError> {
    if !draft.properties.is_object() {
        return Err(ElementError::InvalidProperties);
    }
    Ok(state.mutate_store(|store| store.add(draft)).await)
}

/// Merge a partial update into an element. `Ok(false)` when it doesn't exist.
///
/// # Errors
///
/// Returns `InvalidProperties` if the properties patch is not an object.
pub async fn update_element(state: &BuilderState, id: &str, partial: &PartialElement) -> Result<bool, ElementError> {
    if partial.properties.as_ref().is_some_and(|p| !p.is_object()) {
        return Err(ElementError::InvalidProperties);
    }
    Ok(state.mutate_store(|store| store.update(id, partial)).await)
}

pub async fn delete_element(state: &BuilderState, id: &str) -> Option<Element> {
    state.mutate_store(|store| store.delete(id)).await
}

/// Duplicate an element (+20/+20) and select the copy.
pub async fn duplicate_element(state: &BuilderState, id: &str) -> Option<Element> {
    state.mutate_store(|store| store.duplicate(id)).await
}

pub async fn select_element(state: &BuilderState, id: &str) -> bool {
    state.page.write().await.store.select(id)
}

pub async fn deselect(state: &BuilderState) {
    state.page.write().await.store.deselect();
}

pub async fn selected_element(state: &BuilderState) -> Option<Element> {
    state.page.read().await.store.selected().cloned()
}

pub async fn find_element(state: &BuilderState, id: &str) -> Option<Element> {
    state.page.read().await.store.find(id).cloned()
}

/// All elements in insertion order.
pub async fn elements(state: &BuilderState) -> Vec<Element> {
    state.page.read().await.store.snapshot()
}

// =============================================================================
// PERSISTENCE
// =============================================================================

/// Replace the page's elements with the persisted ones. Returns the count.
///
/// Hydration is not an edit: it does not mark the page dirty. Rows that
/// fail to decode are skipped.
///
/// # Errors
///
/// Returns `NoSession` when signed out, `Backend` when the read fails; the
/// store is left untouched in both cases.
pub async fn load_elements(state: &BuilderState) -> Result<usize, ElementError> {
    if !state.session.is_signed_in() {
        return Err(ElementError::NoSession);
    }
    let query = Query::new()
        .eq("page_id", state.page_id.to_string())
        .order_by("sort_order", Order::Asc);
    let rows = state
        .backend
        .select(Collection::Elements, &query)
        .await
        .inspect_err(|e| warn!(page_id = %state.page_id, error = %e, "element load failed"))?;

    let total = rows.len();
    let loaded: Vec<Element> = rows
        .into_iter()
        .filter_map(|row| serde_json::from_value::<ElementRow>(row).ok())
        .map(ElementRow::into_element)
        .collect();
    if loaded.len() < total {
        warn!(page_id = %state.page_id, skipped = total - loaded.len(), "skipped undecodable element rows");
    }

    let count = loaded.len();
    state.page.write().await.store.replace_all(loaded);
    info!(page_id = %state.page_id, count, "elements loaded");
    Ok(count)
}

/// Overwrite the persisted elements of the page with the live ones.
///
/// Live rows are upserted first; rows of elements no longer on the page are
/// deleted afterwards.
///
/// # Errors
///
/// Returns `NoSession` when signed out, `Backend` when a write fails. Local
/// elements are never rolled back.
pub async fn save_elements(state: &BuilderState) -> Result<usize, ElementError> {
    if !state.session.is_signed_in() {
        return Err(ElementError::NoSession);
    }
    let elements = elements(state).await;
    let ids: Vec<String> = elements.iter().map(|e| e.id.clone()).collect();
    let rows: Vec<Value> = elements
        .into_iter()
        .enumerate()
        .filter_map(|(sort_order, e)| {
            let row = ElementRow {
                id: e.id,
                page_id: state.page_id,
                kind: e.kind,
                properties: e.properties,
                position: e.position,
                sort_order,
            };
            serde_json::to_value(row).ok()
        })
        .collect();
    let count = rows.len();

    // Upsert before pruning: a failed write must not remove remote rows.
    let result = async {
        let mut stale = Query::new().eq("page_id", state.page_id.to_string());
        if !rows.is_empty() {
            stale = stale.not_in("id", ids);
            state.backend.upsert(Collection::Elements, rows).await?;
        }
        state.backend.delete(Collection::Elements, &stale).await
    }
    .await;

    if let Err(e) = result {
        warn!(page_id = %state.page_id, error = %e, "element save failed");
        return Err(e.into());
    }
    info!(page_id = %state.page_id, count, "elements saved");
    Ok(count)
}
