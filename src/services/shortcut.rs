//! Keyboard shortcut dispatch onto builder services.

use tracing::debug;

use crate::notice::Notice;
use crate::services::{clipboard, element, history};
use crate::shortcuts::{self, KeyEvent, ShortcutAction};
use crate::state::BuilderState;

/// Run the command bound to `action`.
///
/// # Errors
///
/// Returns a notice for user-visible failures (copy with nothing selected,
/// paste with an empty clipboard). Commands with nothing to act on, such
/// as delete without a selection, do nothing.
pub async fn handle_shortcut(state: &BuilderState, action: ShortcutAction) -> Result<(), Notice> {
    debug!(page_id = %state.page_id, ?action, "shortcut");
    match action {
        ShortcutAction::Copy => {
            clipboard::copy_selected(state)
                .await
                .map_err(|e| Notice::from_error(&e))?;
        }
        ShortcutAction::Paste => {
            clipboard::paste(state)
                .await
                .map_err(|e| Notice::from_error(&e))?;
        }
        ShortcutAction::Duplicate => {
            if let Some(selected) = element::selected_element(state).await {
                element::duplicate_element(state, &selected.id).await;
            }
        }
        ShortcutAction::Delete => {
            if let Some(selected) = element::selected_element(state).await {
                element::delete_element(state, &selected.id).await;
            }
        }
        ShortcutAction::Undo => {
            history::undo(state).await;
        }
        ShortcutAction::Redo => {
            history::redo(state).await;
        }
        ShortcutAction::Deselect => element::deselect(state).await,
    }
    Ok(())
}

/// Resolve a key press and run its command. Returns the command that ran,
/// `None` when the key is unbound or focus is in a text input.
///
/// # Errors
///
/// See [`handle_shortcut`].
pub async fn handle_key(state: &BuilderState, event: &KeyEvent) -> Result<Option<ShortcutAction>, Notice> {
    let Some(action) = shortcuts::resolve(event) else {
        return Ok(None);
    };
    handle_shortcut(state, action).await?;
    Ok(Some(action))
}
