//! Key sampling, repeat scheduling and host input plumbing.
//!
//! The core consumes two narrow host seams:
//! * [`KeyOracle`] - "is this key down right now" sampling.
//! * [`TimerHost`] - one-shot and recurring timers whose firings come back as
//!   `Event::Timer` messages instead of callbacks.
//!
//! Everything else in this crate either builds on those seams
//! ([`KeyEdgeDetector`], [`RepeatScheduler`]) or implements them for a
//! concrete host ([`HeldKeys`], [`VirtualTimers`], [`TokioTimers`], and the
//! crossterm input task).

mod async_service;
pub mod edge;
pub mod held;
mod key_token;
pub mod repeat;
pub mod tokio_timers;
pub mod virtual_clock;

pub use async_service::AsyncInputShutdown;
pub use edge::{KeyEdgeDetector, KeyEdges};
pub use held::{HeldKeys, KEY_TAP_HOLD};
pub use repeat::RepeatScheduler;
pub use tokio_timers::TokioTimers;
pub use virtual_clock::VirtualTimers;

use async_service::spawn_async_event_task;
use core_events::{Event, KeySet, LogicalKey, TimerEvent, TimerId};
use std::time::Duration;
use tokio::task::JoinHandle;

/// Point-in-time key sampling supplied by the host.
pub trait KeyOracle {
    fn is_key_down(&self, key: LogicalKey) -> bool;
}

impl<F> KeyOracle for F
where
    F: Fn(LogicalKey) -> bool,
{
    fn is_key_down(&self, key: LogicalKey) -> bool {
        self(key)
    }
}

impl KeyOracle for KeySet {
    fn is_key_down(&self, key: LogicalKey) -> bool {
        self.contains(key)
    }
}

/// Cancellable timers. Firings are delivered back to the session as
/// `Event::Timer(event)` through the host's event path.
pub trait TimerHost {
    fn schedule_after(&mut self, delay: Duration, event: TimerEvent) -> TimerId;
    fn schedule_every(&mut self, interval: Duration, event: TimerEvent) -> TimerId;
    /// Idempotent; unknown or already-finished ids are ignored.
    fn cancel(&mut self, id: TimerId);
}

/// Spawn the async input service backed by `crossterm::EventStream`.
///
/// `release_events` tells the task whether the terminal reports key releases
/// (keyboard enhancement active). Without them every press becomes a
/// `KeyTap` held for [`KEY_TAP_HOLD`].
///
/// Returns the `JoinHandle` for the background task alongside a shutdown handle
/// that can be used to request immediate termination.
pub fn spawn_async_input(
    sender: tokio::sync::mpsc::Sender<Event>,
    release_events: bool,
) -> (JoinHandle<()>, AsyncInputShutdown) {
    spawn_async_event_task(sender, release_events)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closures_and_key_sets_are_oracles() {
        let only_a = |k: LogicalKey| k == LogicalKey::A;
        assert!(only_a.is_key_down(LogicalKey::A));
        assert!(!only_a.is_key_down(LogicalKey::B));

        let set: KeySet = [LogicalKey::Shift, LogicalKey::B].into_iter().collect();
        assert!(set.is_key_down(LogicalKey::B));
        assert!(!set.is_key_down(LogicalKey::A));
    }
}
