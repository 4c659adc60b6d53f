//! Edge detection over sampled key state.

use crate::KeyOracle;
use core_events::{KEY_EDGES_TOTAL, KeySet, LogicalKey};
use std::sync::atomic::Ordering;
use tracing::trace;

/// One sampling result. All sets are ordered modifiers first, then by name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyEdges {
    /// Keys down this tick.
    pub current: KeySet,
    /// Keys down this tick that were up on the previous tick.
    pub newly_pressed: KeySet,
    /// Keys up this tick that were down on the previous tick.
    pub released: KeySet,
}

impl KeyEdges {
    pub fn is_idle(&self) -> bool {
        self.current.is_empty() && self.newly_pressed.is_empty() && self.released.is_empty()
    }
}

/// Turns continuous "is down" sampling into press/release edges.
///
/// A key is reported in `newly_pressed` exactly once per press: it cannot
/// re-appear until a sample has seen it up.
#[derive(Debug, Clone)]
pub struct KeyEdgeDetector {
    previous: [bool; LogicalKey::COUNT],
}

impl Default for KeyEdgeDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyEdgeDetector {
    pub fn new() -> Self {
        Self {
            previous: [false; LogicalKey::COUNT],
        }
    }

    pub fn sample(&mut self, oracle: &dyn KeyOracle) -> KeyEdges {
        let mut current = Vec::new();
        let mut newly = Vec::new();
        let mut released = Vec::new();
        for &key in LogicalKey::ALL {
            let down = oracle.is_key_down(key);
            let was = std::mem::replace(&mut self.previous[key.index()], down);
            if down {
                current.push(key);
                if !was {
                    newly.push(key);
                }
            } else if was {
                released.push(key);
            }
        }
        let edges = KeyEdges {
            current: current.into_iter().collect(),
            newly_pressed: newly.into_iter().collect(),
            released: released.into_iter().collect(),
        };
        if !edges.newly_pressed.is_empty() || !edges.released.is_empty() {
            KEY_EDGES_TOTAL.fetch_add(edges.newly_pressed.len() as u64, Ordering::Relaxed);
            trace!(target: "input.edge", held = edges.current.len(), pressed = ?edges.newly_pressed.as_slice(), released = ?edges.released.as_slice(), "key_edges");
        }
        edges
    }

    /// Keys seen down by the last sample.
    pub fn previous(&self) -> KeySet {
        LogicalKey::ALL
            .iter()
            .copied()
            .filter(|k| self.previous[k.index()])
            .collect()
    }

    /// Forget all previous samples (every held key counts as newly pressed next time).
    pub fn reset(&mut self) {
        self.previous = [false; LogicalKey::COUNT];
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use LogicalKey::*;

    fn keys(keys: &[LogicalKey]) -> KeySet {
        keys.iter().copied().collect()
    }

    #[test]
    fn press_is_reported_once_until_release() {
        let mut det = KeyEdgeDetector::new();
        let down = keys(&[A]);
        assert_eq!(det.sample(&down).newly_pressed, keys(&[A]));
        assert!(det.sample(&down).newly_pressed.is_empty());
        let edges = det.sample(&KeySet::new());
        assert_eq!(edges.released, keys(&[A]));
        assert_eq!(det.sample(&down).newly_pressed, keys(&[A]));
    }

    #[test]
    fn current_orders_modifiers_first_then_names() {
        let mut det = KeyEdgeDetector::new();
        let edges = det.sample(&keys(&[Z, Meta, Digit1, Shift, ArrowLeft, Ctrl]));
        assert_eq!(
            edges.current.as_slice(),
            &[Shift, Ctrl, Meta, Digit1, ArrowLeft, Z]
        );
    }

    #[test]
    fn newly_pressed_excludes_held_keys() {
        let mut det = KeyEdgeDetector::new();
        det.sample(&keys(&[Shift]));
        let edges = det.sample(&keys(&[Shift, H]));
        assert_eq!(edges.current, keys(&[Shift, H]));
        assert_eq!(edges.newly_pressed, keys(&[H]));
        assert!(edges.released.is_empty());
        assert_eq!(det.previous(), keys(&[Shift, H]));
    }

    #[test]
    fn reset_makes_held_keys_new_again() {
        let mut det = KeyEdgeDetector::new();
        det.sample(&keys(&[Q]));
        det.reset();
        assert_eq!(det.sample(&keys(&[Q])).newly_pressed, keys(&[Q]));
    }
}
