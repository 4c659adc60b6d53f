//! Anchor-relative selection range.
//!
//! The anchor is the fixed end; the other end follows the cursor. All
//! mutation goes through [`Selection::extend_to`] / [`Selection::set`], which
//! re-derive `start`/`end` from the anchor so `start <= end` always holds.

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Selection {
    anchor: usize,
    start: usize,
    end: usize,
    active: bool,
}

impl Selection {
    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn anchor(&self) -> usize {
        self.anchor
    }

    pub fn start(&self) -> usize {
        self.start
    }

    pub fn end(&self) -> usize {
        self.end
    }

    /// `(start, end)` when active.
    pub fn range(&self) -> Option<(usize, usize)> {
        self.active.then_some((self.start, self.end))
    }

    /// Start a selection at `from` if none is active, then move its free end to `to`.
    pub(crate) fn extend_to(&mut self, from: usize, to: usize) {
        if !self.active {
            self.anchor = from;
            self.active = true;
        }
        self.derive(to);
    }

    /// Replace the selection with `anchor..head` (either order).
    pub(crate) fn set(&mut self, anchor: usize, head: usize) {
        self.anchor = anchor;
        self.active = true;
        self.derive(head);
    }

    pub(crate) fn clear(&mut self) {
        *self = Self::default();
    }

    fn derive(&mut self, head: usize) {
        (self.start, self.end) = if head < self.anchor {
            (head, self.anchor)
        } else {
            (self.anchor, head)
        };
    }
}
