//! Key oracle for hosts that learn key state from events.
//!
//! Terminals report transitions, not levels. `HeldKeys` folds `InputEvent`s
//! into a per-key down table that the edge detector can sample. Terminals
//! without release reporting send `KeyTap`s; a tapped key reads as down for
//! [`KEY_TAP_HOLD`] (extended by every further tap) so at least one dispatch
//! tick observes it.

use crate::KeyOracle;
use core_events::{InputEvent, KeySet, LogicalKey};
use std::time::{Duration, Instant};
use tracing::trace;

/// How long a tapped key stays down without a release report.
pub const KEY_TAP_HOLD: Duration = Duration::from_millis(60);

#[derive(Debug, Clone)]
pub struct HeldKeys {
    down: [bool; LogicalKey::COUNT],
    /// Release deadline for keys that only ever got a tap.
    tap_expiry: [Option<Instant>; LogicalKey::COUNT],
}

impl Default for HeldKeys {
    fn default() -> Self {
        Self::new()
    }
}

impl HeldKeys {
    pub fn new() -> Self {
        Self {
            down: [false; LogicalKey::COUNT],
            tap_expiry: [None; LogicalKey::COUNT],
        }
    }

    pub fn apply(&mut self, event: InputEvent, now: Instant) {
        match event {
            InputEvent::KeyDown(key) => {
                self.down[key.index()] = true;
                self.tap_expiry[key.index()] = None;
            }
            InputEvent::KeyUp(key) => {
                self.down[key.index()] = false;
                self.tap_expiry[key.index()] = None;
            }
            InputEvent::KeyTap(key) => {
                self.down[key.index()] = true;
                self.tap_expiry[key.index()] = Some(now + KEY_TAP_HOLD);
            }
        }
    }

    /// Release tapped keys whose hold window has passed.
    pub fn expire(&mut self, now: Instant) {
        for &key in LogicalKey::ALL {
            let idx = key.index();
            if let Some(deadline) = self.tap_expiry[idx]
                && deadline <= now
            {
                self.down[idx] = false;
                self.tap_expiry[idx] = None;
                trace!(target: "input.edge", %key, "tap_expired");
            }
        }
    }

    /// Release everything (focus loss, reset).
    pub fn release_all(&mut self) {
        self.down = [false; LogicalKey::COUNT];
        self.tap_expiry = [None; LogicalKey::COUNT];
    }

    pub fn snapshot(&self) -> KeySet {
        LogicalKey::ALL
            .iter()
            .copied()
            .filter(|k| self.down[k.index()])
            .collect()
    }
}

impl KeyOracle for HeldKeys {
    fn is_key_down(&self, key: LogicalKey) -> bool {
        self.down[key.index()]
    }
}
