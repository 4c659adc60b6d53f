//! Editing state for one session: text buffer, cursor, selection, history and
//! clipboard.
//!
//! `EditorState` is the only holder of mutable editing state. Both the
//! per-tick dispatcher and the repeat path go through the primitives below,
//! so the invariants hold regardless of the trigger:
//! * `0 <= cursor <= len` (every position argument is clamped).
//! * An active selection satisfies `start <= end <= len`.
//! * After a committing primitive, the realized history snapshot equals the
//!   buffer content.
//!
//! Log events carry lengths and positions only, never typed text.

use core_text::motion::{self, Direction};
use core_text::TextBuffer;
use tracing::trace;

pub mod clipboard;
pub mod selection;
pub mod undo;

pub use clipboard::Clipboard;
pub use selection::Selection;
pub use undo::{History, MAX_HISTORY};

#[derive(Default)]
pub struct EditorState {
    buffer: TextBuffer,
    cursor: usize,
    selection: Selection,
    history: History,
    clipboard: Clipboard,
    /// Bumped on every content mutation (edits, undo/redo, clear).
    revision: u64,
}

impl EditorState {
    pub fn new() -> Self {
        Self::default()
    }

    // --- queries -------------------------------------------------------------------------------

    pub fn text(&self) -> String {
        self.buffer.text()
    }

    pub fn buffer(&self) -> &TextBuffer {
        &self.buffer
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn has_selection(&self) -> bool {
        self.selection.is_active()
    }

    /// Selected substring, empty without a selection.
    pub fn selected_text(&self) -> String {
        match self.selection.range() {
            Some((s, e)) => self.buffer.slice(s, e),
            None => String::new(),
        }
    }

    pub fn clipboard(&self) -> &str {
        self.clipboard.text()
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn find_word_boundary(&self, pos: usize, forward: bool) -> usize {
        let dir = if forward {
            Direction::Forward
        } else {
            Direction::Backward
        };
        motion::word_boundary(&self.buffer, pos, dir)
    }

    /// Human-readable dump for diagnostics. Contains the text itself; do not log it.
    pub fn debug_info(&self) -> String {
        let mut info = format!(
            "Text: \"{}\"\nCursor: {}\nHistory: {}/{}",
            self.buffer,
            self.cursor,
            self.history.index() + 1,
            self.history.len()
        );
        if let Some((s, e)) = self.selection.range() {
            info.push_str(&format!(
                "\nSelection: {s}-{e} (\"{}\")\nAnchor: {}",
                self.buffer.slice(s, e),
                self.selection.anchor()
            ));
        }
        info.push_str(&format!("\nClipboard: \"{}\"", self.clipboard.text()));
        info
    }

    // --- internal splice helpers ---------------------------------------------------------------

    /// Remove `[start, end)` without committing. `None` when the range is empty.
    fn splice_out(&mut self, start: usize, end: usize) -> Option<String> {
        let (s, e) = self.buffer.clamp_range(start, end);
        if s == e {
            return None;
        }
        let removed = self.buffer.remove(s, e);
        self.cursor = s;
        self.selection.clear();
        self.revision += 1;
        Some(removed)
    }

    fn commit(&mut self) -> bool {
        self.history.record(&self.buffer)
    }

    fn restore(&mut self, content: &str) {
        self.buffer.set_text(content);
        self.cursor = self.buffer.len();
        self.selection.clear();
        self.revision += 1;
    }

    // --- committing primitives -----------------------------------------------------------------

    /// Replace an active selection (if any) with `text` and advance the cursor past it.
    /// One history commit. Empty `text` is a no-op.
    pub fn insert(&mut self, text: &str) -> bool {
        if text.is_empty() {
            return false;
        }
        if let Some((s, e)) = self.selection.range() {
            self.splice_out(s, e);
            self.selection.clear();
        }
        self.cursor = self.buffer.insert(self.cursor, text);
        self.revision += 1;
        trace!(target: "state.edit", op = "insert", chars = text.chars().count(), cursor = self.cursor);
        self.commit();
        true
    }

    pub fn delete_range(&mut self, start: usize, end: usize) -> bool {
        match self.splice_out(start, end) {
            Some(removed) => {
                trace!(target: "state.edit", op = "delete_range", chars = removed.chars().count(), cursor = self.cursor);
                self.commit();
                true
            }
            None => false,
        }
    }

    /// Delete the selected range. Without a non-empty selection this only clears it.
    pub fn delete_selection(&mut self) -> bool {
        match self.selection.range() {
            Some((s, e)) if s < e => self.delete_range(s, e),
            _ => {
                self.selection.clear();
                false
            }
        }
    }

    pub fn delete_backward(&mut self, word: bool) -> bool {
        if self.selection.is_active() {
            return self.delete_selection();
        }
        if self.cursor == 0 {
            return false;
        }
        let start = if word {
            motion::word_boundary(&self.buffer, self.cursor, Direction::Backward)
        } else {
            self.cursor - 1
        };
        self.delete_range(start, self.cursor)
    }

    pub fn delete_forward(&mut self, word: bool) -> bool {
        if self.selection.is_active() {
            return self.delete_selection();
        }
        if self.cursor >= self.buffer.len() {
            return false;
        }
        let end = if word {
            motion::word_boundary(&self.buffer, self.cursor, Direction::Forward)
        } else {
            self.cursor + 1
        };
        self.delete_range(self.cursor, end)
    }

    // --- cursor and selection ------------------------------------------------------------------

    /// Move the cursor to `pos` (clamped). With `extend` the selection keeps the
    /// anchor where extension began and its free end follows the cursor;
    /// otherwise any selection collapses.
    pub fn move_cursor(&mut self, pos: usize, extend: bool) {
        let pos = self.buffer.clamp(pos);
        if extend {
            self.selection.extend_to(self.cursor, pos);
        } else {
            self.selection.clear();
        }
        self.cursor = pos;
        trace!(target: "state.edit", op = "move_cursor", cursor = pos, extend);
    }

    /// Relative motion; collapses any selection.
    pub fn move_cursor_by(&mut self, delta: isize) {
        let target = self.cursor.saturating_add_signed(delta);
        self.move_cursor(target, false);
    }

    pub fn set_cursor(&mut self, pos: usize) {
        self.move_cursor(pos, false);
    }

    /// Select `[start, end)` with the anchor at `start`; the cursor goes to `end`.
    pub fn set_selection(&mut self, start: usize, end: usize) {
        let (a, b) = (self.buffer.clamp(start), self.buffer.clamp(end));
        if a == b {
            self.move_cursor(b, false);
            return;
        }
        self.selection.set(a, b);
        self.cursor = b;
        trace!(target: "state.edit", op = "set_selection", start = a.min(b), end = a.max(b));
    }

    pub fn select_all(&mut self) {
        self.set_selection(0, self.buffer.len());
    }

    pub fn select_current_line(&mut self) {
        let start = motion::line_start(&self.buffer, self.cursor);
        let end = motion::line_end(&self.buffer, self.cursor);
        self.set_selection(start, end);
    }

    /// Select the word under the cursor; no-op when the char at the cursor is
    /// not a word character.
    pub fn select_word_at_cursor(&mut self) {
        if let Some((s, e)) = motion::word_range_at(&self.buffer, self.cursor) {
            self.set_selection(s, e);
        }
    }

    pub fn extend_selection_to_next_word(&mut self) {
        let target = motion::word_boundary(&self.buffer, self.cursor, Direction::Forward);
        self.move_cursor(target, true);
    }

    pub fn extend_selection_to_previous_word(&mut self) {
        let target = motion::word_boundary(&self.buffer, self.cursor, Direction::Backward);
        self.move_cursor(target, true);
    }

    // --- clipboard -----------------------------------------------------------------------------

    pub fn copy(&mut self) -> bool {
        match self.selection.range() {
            Some((s, e)) if s < e => {
                self.clipboard.set(self.buffer.slice(s, e));
                trace!(target: "state.edit", op = "copy", chars = e - s);
                true
            }
            _ => false,
        }
    }

    pub fn cut(&mut self) -> bool {
        self.copy() && self.delete_selection()
    }

    pub fn paste(&mut self) -> bool {
        if self.clipboard.is_empty() {
            return false;
        }
        let text = self.clipboard.text().to_owned();
        self.insert(&text)
    }

    pub fn set_clipboard<S: Into<String>>(&mut self, text: S) {
        self.clipboard.set(text);
    }

    // --- history -------------------------------------------------------------------------------

    pub fn undo(&mut self) -> bool {
        let Some(content) = self.history.undo().map(str::to_owned) else {
            return false;
        };
        self.restore(&content);
        true
    }

    pub fn redo(&mut self) -> bool {
        let Some(content) = self.history.redo().map(str::to_owned) else {
            return false;
        };
        self.restore(&content);
        true
    }

    /// Reset content, cursor, selection and history. The clipboard survives.
    pub fn clear(&mut self) {
        if !self.buffer.is_empty() {
            self.revision += 1;
        }
        self.buffer = TextBuffer::new();
        self.cursor = 0;
        self.selection.clear();
        self.history.reset();
        trace!(target: "state.edit", op = "clear");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn state_with(text: &str) -> EditorState {
        let mut st = EditorState::new();
        st.insert(text);
        st
    }

    #[test]
    fn insert_replaces_selection_in_one_commit() {
        let mut st = state_with("hello world");
        st.set_selection(6, 11);
        let depth = st.history().len();
        assert!(st.insert("there"));
        assert_eq!(st.text(), "hello there");
        assert_eq!(st.cursor(), 11);
        assert!(!st.has_selection());
        assert_eq!(st.history().len(), depth + 1);
    }

    #[test]
    fn delete_selection_twice_is_noop_second_time() {
        let mut st = state_with("abcdef");
        st.set_selection(1, 4);
        assert!(st.delete_selection());
        assert_eq!(st.text(), "aef");
        let rev = st.revision();
        assert!(!st.delete_selection());
        assert_eq!(st.text(), "aef");
        assert_eq!(st.revision(), rev);
    }

    #[test]
    fn deletion_at_edges_is_noop() {
        let mut st = state_with("ab");
        assert!(!st.delete_forward(false));
        st.set_cursor(0);
        assert!(!st.delete_backward(false));
        assert!(!st.delete_backward(true));
        assert_eq!(st.text(), "ab");
    }

    #[test]
    fn empty_active_selection_swallows_deletion() {
        let mut st = state_with("abc");
        st.move_cursor(2, true);
        st.move_cursor(3, true);
        assert!(st.selection().is_active());
        assert!(!st.delete_backward(false));
        assert_eq!(st.text(), "abc");
        assert!(!st.has_selection());

        st.set_cursor(1);
        st.move_cursor(2, true);
        st.move_cursor(1, true);
        assert_eq!(st.selection().range(), Some((1, 1)));
        assert!(!st.delete_forward(true));
        assert_eq!(st.text(), "abc");
        assert_eq!(st.cursor(), 1);
        assert_eq!(st.history().len(), 2);
    }

    #[test]
    fn word_deletes_use_boundaries() {
        let mut st = state_with("foo bar baz");
        assert!(st.delete_backward(true));
        assert_eq!(st.text(), "foo bar ");
        st.set_cursor(0);
        assert!(st.delete_forward(true));
        assert_eq!(st.text(), " bar ");
        assert_eq!(st.cursor(), 0);
    }

    #[test]
    fn shift_extension_keeps_anchor() {
        let mut st = state_with("hello world");
        st.set_cursor(5);
        st.move_cursor(11, true);
        assert_eq!(st.selection().range(), Some((5, 11)));
        st.move_cursor(2, true);
        assert_eq!(st.selection().range(), Some((2, 5)));
        assert_eq!(st.selection().anchor(), 5);
        assert_eq!(st.cursor(), 2);
        st.move_cursor(4, false);
        assert!(!st.has_selection());
    }

    #[test]
    fn positions_are_clamped() {
        let mut st = state_with("abc");
        st.set_cursor(100);
        assert_eq!(st.cursor(), 3);
        st.move_cursor_by(-10);
        assert_eq!(st.cursor(), 0);
        st.set_selection(1, 50);
        assert_eq!(st.selection().range(), Some((1, 3)));
        assert!(st.delete_range(2, 99));
        assert_eq!(st.text(), "ab");
    }

    #[test]
    fn cut_then_paste_restores_content() {
        let mut st = state_with("hello world");
        st.set_selection(5, 11);
        assert!(st.cut());
        assert_eq!(st.text(), "hello");
        assert_eq!(st.clipboard(), " world");
        assert!(st.paste());
        assert_eq!(st.text(), "hello world");
    }

    #[test]
    fn copy_without_selection_keeps_clipboard() {
        let mut st = state_with("abc");
        st.set_clipboard("keep");
        assert!(!st.copy());
        assert!(!st.cut());
        assert_eq!(st.clipboard(), "keep");
    }

    #[test]
    fn undo_redo_restore_content_and_move_cursor_to_end() {
        let mut st = EditorState::new();
        st.insert("one");
        st.insert(" two");
        st.set_cursor(1);
        assert!(st.undo());
        assert_eq!(st.text(), "one");
        assert_eq!(st.cursor(), 3);
        assert!(st.undo());
        assert_eq!(st.text(), "");
        assert!(!st.undo());
        assert!(st.redo());
        assert!(st.redo());
        assert_eq!(st.text(), "one two");
        assert!(!st.redo());
    }

    #[test]
    fn select_helpers() {
        let mut st = state_with("first line\nsecond_word here");
        st.set_cursor(14);
        st.select_word_at_cursor();
        assert_eq!(st.selected_text(), "second_word");
        assert_eq!(st.cursor(), 22);
        st.set_cursor(14);
        st.select_current_line();
        assert_eq!(st.selected_text(), "second_word here");
        st.set_cursor(5);
        st.select_word_at_cursor();
        assert!(!st.has_selection());
        st.select_all();
        assert_eq!(st.selection().range(), Some((0, st.len())));
    }

    #[test]
    fn extend_to_word_routes_through_anchor() {
        let mut st = state_with("hello world");
        st.set_cursor(5);
        st.extend_selection_to_next_word();
        assert_eq!(st.selection().range(), Some((5, 11)));
        st.extend_selection_to_previous_word();
        st.extend_selection_to_previous_word();
        assert_eq!(st.selection().range(), Some((0, 5)));
        assert_eq!(st.selection().anchor(), 5);
    }

    #[test]
    fn clear_resets_history_but_keeps_clipboard() {
        let mut st = state_with("abc");
        st.select_all();
        st.copy();
        st.clear();
        assert_eq!(st.text(), "");
        assert_eq!(st.cursor(), 0);
        assert_eq!(st.history().len(), 1);
        assert_eq!(st.clipboard(), "abc");
        assert!(!st.undo());
    }

    #[test]
    fn debug_info_lists_selection_and_clipboard() {
        let mut st = state_with("hello");
        st.set_selection(4, 1);
        st.set_clipboard("x");
        assert_eq!(
            st.debug_info(),
            "Text: \"hello\"\nCursor: 1\nHistory: 2/2\nSelection: 1-4 (\"ell\")\nAnchor: 4\nClipboard: \"x\""
        );
        st.set_cursor(0);
        assert_eq!(
            st.debug_info(),
            "Text: \"hello\"\nCursor: 0\nHistory: 2/2\nClipboard: \"x\""
        );
    }

    #[test]
    fn find_word_boundary_examples() {
        let st = state_with("foo bar");
        assert_eq!(st.find_word_boundary(0, true), 3);
        assert_eq!(st.find_word_boundary(3, true), 7);
        assert_eq!(st.find_word_boundary(7, false), 4);
    }
}
