use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};

use core_text::TextBuffer;
use tracing::trace;

/// Maximum number of snapshots retained in history.
pub const MAX_HISTORY: usize = 99;

/// Linear snapshot history.
///
/// `snapshots[index]` is the realized content. Recording a new snapshot
/// truncates the redo tail; the oldest snapshot is evicted once the bound is
/// exceeded. A session starts with one empty snapshot.
pub struct History {
    snapshots: VecDeque<String>,
    index: usize,
    /// Commits skipped because content matched the realized snapshot.
    snapshots_skipped: AtomicU64,
}

impl Default for History {
    fn default() -> Self {
        Self::new()
    }
}

impl History {
    pub fn new() -> Self {
        let mut snapshots = VecDeque::with_capacity(MAX_HISTORY);
        snapshots.push_back(String::new());
        Self {
            snapshots,
            index: 0,
            snapshots_skipped: AtomicU64::new(0),
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn can_undo(&self) -> bool {
        self.index > 0
    }

    pub fn can_redo(&self) -> bool {
        self.index + 1 < self.snapshots.len()
    }

    pub fn snapshots_skipped(&self) -> u64 {
        self.snapshots_skipped.load(Ordering::Relaxed)
    }

    /// Realized snapshot.
    pub fn current(&self) -> &str {
        self.snapshots.get(self.index).map_or("", String::as_str)
    }

    /// Push the buffer content if it differs from the realized snapshot.
    /// Returns true when a snapshot was recorded.
    pub fn record(&mut self, buffer: &TextBuffer) -> bool {
        if buffer.text_eq(self.current()) {
            self.snapshots_skipped.fetch_add(1, Ordering::Relaxed);
            trace!(target: "state.undo", index = self.index, depth = self.snapshots.len(), "snapshot_dedupe_skip");
            return false;
        }
        let dropped = self.snapshots.len() - (self.index + 1);
        self.snapshots.truncate(self.index + 1);
        if dropped > 0 {
            trace!(target: "state.undo", dropped, "redo_tail_truncated");
        }
        self.snapshots.push_back(buffer.text());
        if self.snapshots.len() > MAX_HISTORY {
            self.snapshots.pop_front();
            trace!(target: "state.undo", "oldest_snapshot_evicted");
        }
        self.index = self.snapshots.len() - 1;
        trace!(target: "state.undo", index = self.index, depth = self.snapshots.len(), chars = buffer.len(), "push_snapshot");
        true
    }

    /// Step back one snapshot, returning the content to restore.
    pub fn undo(&mut self) -> Option<&str> {
        if !self.can_undo() {
            return None;
        }
        self.index -= 1;
        trace!(target: "state.undo", index = self.index, depth = self.snapshots.len(), "undo_step");
        Some(self.current())
    }

    /// Step forward one snapshot, returning the content to restore.
    pub fn redo(&mut self) -> Option<&str> {
        if !self.can_redo() {
            return None;
        }
        self.index += 1;
        trace!(target: "state.undo", index = self.index, depth = self.snapshots.len(), "redo_step");
        Some(self.current())
    }

    /// Drop everything and re-seed with one empty snapshot.
    pub fn reset(&mut self) {
        self.snapshots.clear();
        self.snapshots.push_back(String::new());
        self.index = 0;
        trace!(target: "state.undo", "history_reset");
    }
}
