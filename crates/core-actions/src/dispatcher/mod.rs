//! Dispatcher applying `Action` to mutable editor state.
//!
//! Sub-modules:
//! * `motion` - cursor movement and selection extension
//! * `edit`   - insertion, deletion, clipboard and clear
//! * `undo`   - undo / redo
//!
//! Each handler reports whether anything observable changed (`dirty`) and
//! whether the text content changed (`text_changed`).

use crate::{Action, ActionObserver};
use core_state::EditorState;

mod edit;
mod motion;
mod undo;

/// Result of dispatching a single `Action`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DispatchResult {
    /// Cursor, selection, clipboard or text changed.
    pub dirty: bool,
    /// Text content changed (a subset of `dirty`).
    pub text_changed: bool,
}

impl DispatchResult {
    pub fn dirty() -> Self {
        Self {
            dirty: true,
            text_changed: false,
        }
    }
    pub fn clean() -> Self {
        Self {
            dirty: false,
            text_changed: false,
        }
    }
    pub fn edited() -> Self {
        Self {
            dirty: true,
            text_changed: true,
        }
    }

    /// Combine results of several actions applied in sequence.
    pub fn merge(self, other: Self) -> Self {
        Self {
            dirty: self.dirty || other.dirty,
            text_changed: self.text_changed || other.text_changed,
        }
    }
}

/// Apply an action to editor state.
pub fn dispatch(
    action: Action,
    state: &mut EditorState,
    observers: &[Box<dyn ActionObserver>],
) -> DispatchResult {
    for obs in observers {
        obs.on_action(&action);
    }

    let label = action.label();
    let result = match action {
        Action::Navigate { key, extend, jump } => motion::handle_navigate(key, extend, jump, state),
        Action::Delete { direction, word } => edit::handle_delete(direction, word, state),
        Action::Insert(text) => edit::handle_insert(&text, state),
        Action::Cut => edit::handle_cut(state),
        Action::Copy => edit::handle_copy(state),
        Action::Paste => edit::handle_paste(state),
        Action::SelectAll => motion::handle_select_all(state),
        Action::Clear => edit::handle_clear(state),
        Action::Undo => undo::handle_undo(state),
        Action::Redo => undo::handle_redo(state),
    };
    tracing::trace!(target: "actions.dispatch", action = label, dirty = result.dirty, text_changed = result.text_changed, cursor = state.cursor(), "dispatch");
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DeleteDirection, NavKey};
    use pretty_assertions::assert_eq;
    use std::sync::{Arc, Mutex};

    fn state_with(text: &str, cursor: usize) -> EditorState {
        let mut st = EditorState::new();
        st.insert(text);
        st.set_cursor(cursor);
        st
    }

    fn nav(key: NavKey, extend: bool, jump: bool) -> Action {
        Action::Navigate { key, extend, jump }
    }

    fn run(st: &mut EditorState, action: Action) -> DispatchResult {
        dispatch(action, st, &[])
    }

    #[test]
    fn ctrl_shift_right_then_cut() {
        let mut st = state_with("hello world", 5);
        let r = run(&mut st, nav(NavKey::Right, true, true));
        assert_eq!(r, DispatchResult::dirty());
        assert_eq!(st.selection().range(), Some((5, 11)));
        assert_eq!(st.cursor(), 11);
        let r = run(&mut st, Action::Cut);
        assert_eq!(r, DispatchResult::edited());
        assert_eq!(st.text(), "hello");
        assert_eq!(st.clipboard(), " world");
    }

    #[test]
    fn arrows_collapse_selection_to_its_edges() {
        let mut st = state_with("abcdef", 0);
        st.set_selection(2, 4);
        run(&mut st, nav(NavKey::Left, false, false));
        assert_eq!(st.cursor(), 2);
        assert!(!st.has_selection());
        st.set_selection(4, 2);
        run(&mut st, nav(NavKey::Right, false, false));
        assert_eq!(st.cursor(), 4);
        assert!(!st.has_selection());
    }

    #[test]
    fn home_end_use_line_or_document_edges() {
        let mut st = state_with("one\ntwo\nthree", 5);
        run(&mut st, nav(NavKey::Home, false, false));
        assert_eq!(st.cursor(), 4);
        run(&mut st, nav(NavKey::End, true, false));
        assert_eq!(st.selection().range(), Some((4, 7)));
        run(&mut st, nav(NavKey::End, false, true));
        assert_eq!(st.cursor(), 13);
        run(&mut st, nav(NavKey::Home, false, true));
        assert_eq!(st.cursor(), 0);
    }

    #[test]
    fn motion_at_edge_is_clean() {
        let mut st = state_with("ab", 0);
        assert_eq!(run(&mut st, nav(NavKey::Left, false, false)), DispatchResult::clean());
        assert_eq!(run(&mut st, nav(NavKey::Left, false, true)), DispatchResult::clean());
    }

    #[test]
    fn word_deletion() {
        let mut st = state_with("foo bar", 7);
        let r = run(
            &mut st,
            Action::Delete {
                direction: DeleteDirection::Backward,
                word: true,
            },
        );
        assert!(r.text_changed);
        assert_eq!(st.text(), "foo ");
        let r = run(
            &mut st,
            Action::Delete {
                direction: DeleteDirection::Forward,
                word: false,
            },
        );
        assert_eq!(r, DispatchResult::clean());
    }

    #[test]
    fn undo_redo_and_clear_report_text_changes() {
        let mut st = state_with("abc", 3);
        assert_eq!(run(&mut st, Action::Undo), DispatchResult::edited());
        assert_eq!(st.text(), "");
        assert_eq!(run(&mut st, Action::Undo), DispatchResult::clean());
        assert_eq!(run(&mut st, Action::Redo), DispatchResult::edited());
        assert_eq!(run(&mut st, Action::Clear), DispatchResult::edited());
        assert_eq!(run(&mut st, Action::Clear), DispatchResult::clean());
    }

    #[test]
    fn copy_paste_and_select_all() {
        let mut st = state_with("xy", 2);
        assert_eq!(run(&mut st, Action::Copy), DispatchResult::clean());
        assert_eq!(run(&mut st, Action::SelectAll), DispatchResult::dirty());
        assert_eq!(run(&mut st, Action::Copy), DispatchResult::dirty());
        run(&mut st, nav(NavKey::End, false, true));
        assert_eq!(run(&mut st, Action::Paste), DispatchResult::edited());
        assert_eq!(st.text(), "xyxy");
    }

    struct Recorder(Arc<Mutex<Vec<&'static str>>>);

    impl ActionObserver for Recorder {
        fn on_action(&self, action: &Action) {
            self.0.lock().unwrap().push(action.label());
        }
    }

    #[test]
    fn observers_see_every_action() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let observers: Vec<Box<dyn ActionObserver>> = vec![Box::new(Recorder(seen.clone()))];
        let mut st = EditorState::new();
        dispatch(Action::Insert("hi".into()), &mut st, &observers);
        dispatch(Action::Undo, &mut st, &observers);
        assert_eq!(*seen.lock().unwrap(), vec!["insert", "undo"]);
    }
}
