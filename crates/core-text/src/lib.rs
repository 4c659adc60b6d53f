//! Rope-based text buffer abstraction.
//!
//! Positions are char indices (Unicode scalar values) into the whole buffer.
//! Every method clamps its position arguments into `[0, len]` so callers never
//! have to pre-validate indices coming from key handling.

use ropey::Rope;
use std::fmt;

pub mod motion;

pub use motion::{Direction, is_word_char};

/// A single-document text buffer backed by a `ropey::Rope`.
#[derive(Clone, Default)]
pub struct TextBuffer {
    rope: Rope,
}

impl TextBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Construct a buffer holding `content`.
    pub fn from_text(content: &str) -> Self {
        Self {
            rope: Rope::from_str(content),
        }
    }

    /// Length in chars.
    pub fn len(&self) -> usize {
        self.rope.len_chars()
    }

    pub fn is_empty(&self) -> bool {
        self.rope.len_chars() == 0
    }

    #[inline]
    pub fn clamp(&self, pos: usize) -> usize {
        pos.min(self.len())
    }

    /// Clamp both ends and order them so `start <= end`.
    pub fn clamp_range(&self, a: usize, b: usize) -> (usize, usize) {
        let (a, b) = (self.clamp(a), self.clamp(b));
        if a <= b { (a, b) } else { (b, a) }
    }

    pub fn char_at(&self, idx: usize) -> Option<char> {
        if idx < self.len() {
            Some(self.rope.char(idx))
        } else {
            None
        }
    }

    /// Owned copy of `[start, end)` after clamping.
    pub fn slice(&self, start: usize, end: usize) -> String {
        let (s, e) = self.clamp_range(start, end);
        self.rope.slice(s..e).to_string()
    }

    /// Insert `text` at `pos` (clamped). Returns the position just after the insertion.
    pub fn insert(&mut self, pos: usize, text: &str) -> usize {
        let at = self.clamp(pos);
        self.rope.insert(at, text);
        at + text.chars().count()
    }

    /// Remove `[start, end)` (clamped, ordered). Returns the removed text.
    pub fn remove(&mut self, start: usize, end: usize) -> String {
        let (s, e) = self.clamp_range(start, end);
        if s == e {
            return String::new();
        }
        let removed = self.rope.slice(s..e).to_string();
        self.rope.remove(s..e);
        removed
    }

    /// Replace the whole content.
    pub fn set_text(&mut self, content: &str) {
        self.rope = Rope::from_str(content);
    }

    /// Cheap equality check against a string without materializing the rope.
    pub fn text_eq(&self, other: &str) -> bool {
        self.rope == other
    }

    pub fn text(&self) -> String {
        self.rope.to_string()
    }
}

impl fmt::Display for TextBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for chunk in self.rope.chunks() {
            f.write_str(chunk)?;
        }
        Ok(())
    }
}

impl fmt::Debug for TextBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TextBuffer")
            .field("len", &self.len())
            .finish()
    }
}
