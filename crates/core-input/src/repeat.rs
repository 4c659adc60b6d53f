//! Key repeat scheduling.
//!
//! Arming a key schedules a one-shot `RepeatDelayElapsed` after
//! `KEY_REPEAT_DELAY`; when that arrives a recurring `RepeatFired` is
//! scheduled every `KEY_REPEAT_RATE`. Each firing re-checks the oracle: a key
//! that is still down yields itself (the caller resolves and dispatches its
//! action), a released key cancels its own timers.
//!
//! Every arming gets a fresh generation. Timer messages carry the generation
//! they were scheduled with, so a message already queued when its handle was
//! cancelled or re-armed is dropped instead of acting on the new press.

use crate::edge::KeyEdges;
use crate::{KeyOracle, TimerHost};
use core_events::{
    KEY_REPEAT_DELAY, KEY_REPEAT_RATE, LogicalKey, REPEAT_FIRES_TOTAL, REPEAT_STALE_DROPS,
    TimerEvent, TimerId,
};
use std::sync::atomic::Ordering;
use tracing::{debug, trace};

#[derive(Debug, Clone, Copy, Default)]
struct RepeatHandle {
    armed: bool,
    delay_timer: Option<TimerId>,
    repeat_timer: Option<TimerId>,
    generation: u64,
}

#[derive(Debug, Clone)]
pub struct RepeatScheduler {
    handles: [RepeatHandle; LogicalKey::COUNT],
    next_generation: u64,
}

impl Default for RepeatScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl RepeatScheduler {
    pub fn new() -> Self {
        Self {
            handles: [RepeatHandle::default(); LogicalKey::COUNT],
            next_generation: 1,
        }
    }

    pub fn is_armed(&self, key: LogicalKey) -> bool {
        self.handles[key.index()].armed
    }

    /// True once the delay elapsed and the recurring timer is running.
    pub fn is_repeating(&self, key: LogicalKey) -> bool {
        self.handles[key.index()].repeat_timer.is_some()
    }

    pub fn armed_count(&self) -> usize {
        self.handles.iter().filter(|h| h.armed).count()
    }

    /// Cancel any existing timers for `key`, then schedule the initial delay.
    /// Modifiers are never armed.
    pub fn arm(&mut self, key: LogicalKey, timers: &mut dyn TimerHost) {
        if key.is_modifier() {
            return;
        }
        self.cancel(key, timers);
        let generation = self.next_generation;
        self.next_generation += 1;
        let id = timers.schedule_after(
            KEY_REPEAT_DELAY,
            TimerEvent::RepeatDelayElapsed { key, generation },
        );
        self.handles[key.index()] = RepeatHandle {
            armed: true,
            delay_timer: Some(id),
            repeat_timer: None,
            generation,
        };
        trace!(target: "input.repeat", %key, generation, "armed");
    }

    /// Clear both timers for `key`. Safe to call when nothing is armed.
    pub fn cancel(&mut self, key: LogicalKey, timers: &mut dyn TimerHost) {
        let handle = &mut self.handles[key.index()];
        let was_armed = handle.armed;
        if let Some(id) = handle.delay_timer.take() {
            timers.cancel(id);
        }
        if let Some(id) = handle.repeat_timer.take() {
            timers.cancel(id);
        }
        handle.armed = false;
        if was_armed {
            trace!(target: "input.repeat", %key, generation = handle.generation, "cancelled");
        }
    }

    pub fn cancel_all(&mut self, timers: &mut dyn TimerHost) {
        for &key in LogicalKey::ALL {
            self.cancel(key, timers);
        }
    }

    /// Cancel released keys, then arm newly pressed non-modifier keys.
    pub fn apply_edges(&mut self, edges: &KeyEdges, timers: &mut dyn TimerHost) {
        for key in edges.released.iter() {
            self.cancel(key, timers);
        }
        for key in edges.newly_pressed.iter() {
            self.arm(key, timers);
        }
    }

    /// Handle a timer message. Returns the key whose action should repeat now.
    pub fn on_timer(
        &mut self,
        event: TimerEvent,
        oracle: &dyn KeyOracle,
        timers: &mut dyn TimerHost,
    ) -> Option<LogicalKey> {
        let key = event.key();
        let handle = self.handles[key.index()];
        if !handle.armed || handle.generation != event.generation() {
            REPEAT_STALE_DROPS.fetch_add(1, Ordering::Relaxed);
            debug!(target: "input.repeat", %key, generation = event.generation(), current = handle.generation, "stale_timer_dropped");
            return None;
        }
        if !oracle.is_key_down(key) {
            self.cancel(key, timers);
            return None;
        }
        match event {
            TimerEvent::RepeatDelayElapsed { generation, .. } => {
                let id =
                    timers.schedule_every(KEY_REPEAT_RATE, TimerEvent::RepeatFired { key, generation });
                let handle = &mut self.handles[key.index()];
                handle.delay_timer = None;
                handle.repeat_timer = Some(id);
                trace!(target: "input.repeat", %key, generation, "repeat_started");
                None
            }
            TimerEvent::RepeatFired { .. } => {
                REPEAT_FIRES_TOTAL.fetch_add(1, Ordering::Relaxed);
                Some(key)
            }
        }
    }
}
