//! Cursor motion helpers.
//!
//! These operate purely on a `TextBuffer` + position pair and are free of
//! editor state, so both the dispatcher and selection commands share them.

use crate::TextBuffer;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

/// Word characters are ASCII letters, digits and underscore.
#[inline]
pub fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn word_at(buf: &TextBuffer, idx: usize) -> bool {
    buf.char_at(idx).is_some_and(is_word_char)
}

/// One unit left, saturating at 0.
pub fn left(buf: &TextBuffer, pos: usize) -> usize {
    buf.clamp(pos).saturating_sub(1)
}

/// One unit right, saturating at the buffer end.
pub fn right(buf: &TextBuffer, pos: usize) -> usize {
    buf.clamp(pos.saturating_add(1))
}

/// Word boundary search crossing exactly one word plus its separator run.
///
/// Forward skips the separator run at `pos`, then the word that follows,
/// landing on the end of that word (`"foo bar"`: 0 -> 3, 3 -> 7). Backward
/// skips separators to the left of `pos`, then the word before them, landing
/// on that word's start.
pub fn word_boundary(buf: &TextBuffer, pos: usize, dir: Direction) -> usize {
    let len = buf.len();
    let mut i = buf.clamp(pos);
    match dir {
        Direction::Forward => {
            while i < len && !word_at(buf, i) {
                i += 1;
            }
            while i < len && word_at(buf, i) {
                i += 1;
            }
        }
        Direction::Backward => {
            while i > 0 && !word_at(buf, i - 1) {
                i -= 1;
            }
            while i > 0 && word_at(buf, i - 1) {
                i -= 1;
            }
        }
    }
    i
}

/// Maximal run of word characters containing the char at `pos`.
///
/// Returns `None` when the char at `pos` is not a word character (or `pos`
/// is at the end of the buffer).
pub fn word_range_at(buf: &TextBuffer, pos: usize) -> Option<(usize, usize)> {
    if !word_at(buf, pos) {
        return None;
    }
    let mut start = pos;
    while start > 0 && word_at(buf, start - 1) {
        start -= 1;
    }
    let mut end = pos;
    while end < buf.len() && word_at(buf, end) {
        end += 1;
    }
    Some((start, end))
}

/// Start of the line containing `pos` (index after the previous `\n`, or 0).
pub fn line_start(buf: &TextBuffer, pos: usize) -> usize {
    let mut i = buf.clamp(pos);
    while i > 0 && buf.char_at(i - 1) != Some('\n') {
        i -= 1;
    }
    i
}

/// End of the line containing `pos` (index of the next `\n`, or the buffer end).
pub fn line_end(buf: &TextBuffer, pos: usize) -> usize {
    let len = buf.len();
    let mut i = buf.clamp(pos);
    while i < len && buf.char_at(i) != Some('\n') {
        i += 1;
    }
    i
}
