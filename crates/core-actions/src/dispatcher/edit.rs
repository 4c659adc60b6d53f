//! Text edit action handling (insert/delete/clipboard/clear).
//!
//! Every mutation goes through `EditorState` primitives, which clamp
//! positions and commit history. Handlers only classify the outcome.

use super::DispatchResult;
use crate::DeleteDirection;
use core_state::EditorState;

/// Classify an edit by comparing the content revision and caret before/after.
fn outcome(state: &mut EditorState, apply: impl FnOnce(&mut EditorState)) -> DispatchResult {
    let revision = state.revision();
    let caret = (state.cursor(), *state.selection());
    apply(state);
    if state.revision() != revision {
        DispatchResult::edited()
    } else if (state.cursor(), *state.selection()) != caret {
        DispatchResult::dirty()
    } else {
        DispatchResult::clean()
    }
}

pub(crate) fn handle_insert(text: &str, state: &mut EditorState) -> DispatchResult {
    let result = outcome(state, |st| {
        st.insert(text);
    });
    tracing::trace!(target: "actions.dispatch", op = "insert", chars = text.chars().count(), cursor = state.cursor(), "edit");
    result
}

pub(crate) fn handle_delete(
    direction: DeleteDirection,
    word: bool,
    state: &mut EditorState,
) -> DispatchResult {
    let result = outcome(state, |st| {
        match direction {
            DeleteDirection::Backward => st.delete_backward(word),
            DeleteDirection::Forward => st.delete_forward(word),
        };
    });
    tracing::trace!(target: "actions.dispatch", op = "delete", ?direction, word, cursor = state.cursor(), "edit");
    result
}

pub(crate) fn handle_cut(state: &mut EditorState) -> DispatchResult {
    outcome(state, |st| {
        st.cut();
    })
}

pub(crate) fn handle_copy(state: &mut EditorState) -> DispatchResult {
    // Copy only touches the clipboard, which the caret comparison cannot see.
    if state.copy() {
        DispatchResult::dirty()
    } else {
        DispatchResult::clean()
    }
}

pub(crate) fn handle_paste(state: &mut EditorState) -> DispatchResult {
    outcome(state, |st| {
        st.paste();
    })
}

pub(crate) fn handle_clear(state: &mut EditorState) -> DispatchResult {
    outcome(state, EditorState::clear)
}
