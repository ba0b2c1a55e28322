//! Single-slot clipboard for elements.
//!
//! The slot holds an id-less copy of one element and is overwritten by each
//! copy. It outlives page switches and is cleared only when the process
//! exits.

use crate::consts::DUPLICATE_OFFSET;
use crate::doc::{Element, ElementDraft, ElementStore};
use crate::notice::{ErrorCode, NoticeLevel};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClipboardError {
    #[error("select an element to copy first")]
    NothingSelected,
    #[error("nothing to paste: the clipboard is empty")]
    Empty,
}

impl ErrorCode for ClipboardError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::NothingSelected => "E_NOTHING_SELECTED",
            Self::Empty => "E_CLIPBOARD_EMPTY",
        }
    }

    fn level(&self) -> NoticeLevel {
        NoticeLevel::Warning
    }
}

#[derive(Debug, Clone, Default)]
pub struct Clipboard {
    slot: Option<ElementDraft>,
}

impl Clipboard {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy the store's selected element into the slot.
    ///
    /// # Errors
    ///
    /// Returns `NothingSelected` when the store has no selection; the slot is
    /// left as it was.
    pub fn copy_selected(&mut self, store: &ElementStore) -> Result<&ElementDraft, ClipboardError> {
        let selected = store.selected().ok_or(ClipboardError::NothingSelected)?;
        Ok(self.slot.insert(selected.to_draft()))
    }

    /// Add the slot's payload to `store`, offset like a duplicate.
    ///
    /// # Errors
    ///
    /// Returns `Empty` when nothing has been copied yet.
    pub fn paste(&self, store: &mut ElementStore) -> Result<Element, ClipboardError> {
        let draft = self.slot.clone().ok_or(ClipboardError::Empty)?;
        Ok(store.add(draft.offset(DUPLICATE_OFFSET, DUPLICATE_OFFSET)))
    }

    /// The payload a paste would add, before offsetting.
    #[must_use]
    pub fn peek(&self) -> Option<&ElementDraft> {
        self.slot.as_ref()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slot.is_none()
    }
}
