//! Undo / Redo handling.
//!
//! Delegates to the snapshot history inside `EditorState`; restoring a
//! snapshot always moves the cursor to the end and clears the selection.

use super::DispatchResult;
use core_state::EditorState;

pub(crate) fn handle_undo(state: &mut EditorState) -> DispatchResult {
    if state.undo() {
        tracing::trace!(target: "actions.dispatch", op = "undo", index = state.history().index(), "undo");
        DispatchResult::edited()
    } else {
        DispatchResult::clean()
    }
}

pub(crate) fn handle_redo(state: &mut EditorState) -> DispatchResult {
    if state.redo() {
        tracing::trace!(target: "actions.dispatch", op = "redo", index = state.history().index(), "redo");
        DispatchResult::edited()
    } else {
        DispatchResult::clean()
    }
}
