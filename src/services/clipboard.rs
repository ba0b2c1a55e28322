//! Clipboard service: copy the selected element, paste it into a page.
//!
//! Lock order is page, then clipboard. Paste releases the clipboard before
//! it takes the page lock.

use tracing::debug;

use crate::clipboard::ClipboardError;
use crate::doc::{Element, ElementDraft};
use crate::state::BuilderState;

/// Copy the selected element of the page into the shared clipboard.
///
/// # Errors
///
/// Returns `NothingSelected` when no element is selected.
pub async fn copy_selected(state: &BuilderState) -> Result<ElementDraft, ClipboardError> {
    let page = state.page.read().await;
    let mut clipboard = state.clipboard.write().await;
    let draft = clipboard.copy_selected(&page.store)?.clone();
    debug!(page_id = %state.page_id, kind = %draft.kind, "element copied");
    Ok(draft)
}

/// Paste the clipboard payload into the page, offset +20/+20. The selection
/// is left as it was.
///
/// # Errors
///
/// Returns `Empty` when nothing has been copied.
pub async fn paste(state: &BuilderState) -> Result<Element, ClipboardError> {
    let clipboard = state.clipboard.read().await.clone();
    if clipboard.is_empty() {
        return Err(ClipboardError::Empty);
    }
    let pasted = state.mutate_store(|store| clipboard.paste(store)).await?;
    debug!(page_id = %state.page_id, id = %pasted.id, "element pasted");
    Ok(pasted)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::float_cmp)]

    use uuid::Uuid;

    use super::*;
    use crate::doc::Position;
    use crate::history::HistoryStatus;
    use crate::services::element::{add_element, elements, select_element, selected_element};
    use crate::state::test_helpers::{dummy_draft, test_builder_state};

    #[tokio::test]
    async fn copy_paste_scenario() {
        let (state, _backend) = test_builder_state();
        let button = add_element(&state, dummy_draft()).await.unwrap();
        select_element(&state, &button.id).await;

        copy_selected(&state).await.unwrap();
        let pasted = paste(&state).await.unwrap();

        assert_ne!(pasted.id, button.id);
        assert_eq!(pasted.position, Position::new(20.0, 20.0, 100.0, 40.0));
        assert_eq!(pasted.props().content(), "Click");
        assert_eq!(elements(&state).await.len(), 2);
        assert_eq!(selected_element(&state).await.map(|e| e.id), Some(button.id));
        assert_eq!(state.status().await, HistoryStatus::Dirty);
    }

    #[tokio::test]
    async fn copy_without_selection_is_a_notice() {
        let (state, _backend) = test_builder_state();
        add_element(&state, dummy_draft()).await.unwrap();
        assert_eq!(copy_selected(&state).await, Err(ClipboardError::NothingSelected));
    }

    #[tokio::test]
    async fn paste_empty_leaves_page_clean() {
        let (state, _backend) = test_builder_state();
        assert_eq!(paste(&state).await, Err(ClipboardError::Empty));
        assert_eq!(state.status().await, HistoryStatus::Idle);
    }

    #[tokio::test]
    async fn clipboard_survives_page_switch() {
        let (state, _backend) = test_builder_state();
        let button = add_element(&state, dummy_draft()).await.unwrap();
        select_element(&state, &button.id).await;
        copy_selected(&state).await.unwrap();

        let other = state.for_page(Uuid::new_v4());
        let pasted = paste(&other).await.unwrap();
        assert_eq!(pasted.kind, "button");
        assert_eq!(elements(&other).await.len(), 1);
    }
}
