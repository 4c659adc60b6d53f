//! Cursor movement sub-dispatch.
//!
//! Targets are computed here and applied through `EditorState::move_cursor`,
//! so Shift extension always re-derives the selection from its anchor.

use super::DispatchResult;
use crate::NavKey;
use core_state::EditorState;
use core_text::motion;
use core_text::Direction;

/// Cursor and selection, compared before/after to decide dirtiness.
fn caret(state: &EditorState) -> (usize, core_state::Selection) {
    (state.cursor(), *state.selection())
}

fn target(key: NavKey, extend: bool, jump: bool, state: &EditorState) -> usize {
    let buf = state.buffer();
    let cursor = state.cursor();
    let collapse_to = state.selection().range().filter(|_| !extend);
    match key {
        NavKey::Left if jump => motion::word_boundary(buf, cursor, Direction::Backward),
        NavKey::Left => match collapse_to {
            Some((start, _)) => start,
            None => motion::left(buf, cursor),
        },
        NavKey::Right if jump => motion::word_boundary(buf, cursor, Direction::Forward),
        NavKey::Right => match collapse_to {
            Some((_, end)) => end,
            None => motion::right(buf, cursor),
        },
        NavKey::Home if jump => 0,
        NavKey::Home => motion::line_start(buf, cursor),
        NavKey::End if jump => buf.len(),
        NavKey::End => motion::line_end(buf, cursor),
    }
}

pub(crate) fn handle_navigate(
    key: NavKey,
    extend: bool,
    jump: bool,
    state: &mut EditorState,
) -> DispatchResult {
    let before = caret(state);
    let to = target(key, extend, jump, state);
    state.move_cursor(to, extend);
    tracing::trace!(target: "actions.dispatch", op = "navigate", ?key, extend, jump, from = before.0, to, "motion");
    if caret(state) != before {
        DispatchResult::dirty()
    } else {
        DispatchResult::clean()
    }
}

pub(crate) fn handle_select_all(state: &mut EditorState) -> DispatchResult {
    let before = caret(state);
    state.select_all();
    if caret(state) != before {
        DispatchResult::dirty()
    } else {
        DispatchResult::clean()
    }
}
