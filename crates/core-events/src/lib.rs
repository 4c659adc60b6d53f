//! Core event types and channel helpers for livekey.
//!
//! Every trigger source (frame tick, observation tick, repeat timer, host
//! input, reset button) is reduced to one [`Event`] so a session has a single
//! entry point that mutates editing state.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::mpsc::Sender;
use tokio::task::JoinHandle;

pub mod key;
pub use key::{KeyParseError, KeySet, LogicalKey, ModMask};

// -------------------------------------------------------------------------------------------------
// Timing
// -------------------------------------------------------------------------------------------------
/// Hold time before a held key starts auto-repeating.
pub const KEY_REPEAT_DELAY: Duration = Duration::from_millis(450);
/// Interval between auto-repeat firings once repeating.
pub const KEY_REPEAT_RATE: Duration = Duration::from_millis(30);
/// Cadence at which `on_text_changed` observers are polled.
pub const OBSERVE_INTERVAL: Duration = Duration::from_millis(100);
/// Default dispatch tick cadence (roughly 60 frames per second).
pub const DEFAULT_FRAME_INTERVAL: Duration = Duration::from_millis(16);

// -------------------------------------------------------------------------------------------------
// Channel Policy
// -------------------------------------------------------------------------------------------------
// The live runtime uses a bounded mpsc channel sized by `EVENT_CHANNEL_CAP`. Producers (input
// task, interval sources, timer tasks) await `send`, which parks them under backpressure rather
// than dropping key transitions.
// -------------------------------------------------------------------------------------------------
pub const EVENT_CHANNEL_CAP: usize = 1024;

// -------------------------------------------------------------------------------------------------
// Telemetry
// -------------------------------------------------------------------------------------------------
pub static CHANNEL_SEND_FAILURES: AtomicU64 = AtomicU64::new(0);
pub static KEY_EDGES_TOTAL: AtomicU64 = AtomicU64::new(0); // newly pressed keys observed by edge detection
pub static REPEAT_FIRES_TOTAL: AtomicU64 = AtomicU64::new(0); // repeat firings that produced an action
pub static REPEAT_STALE_DROPS: AtomicU64 = AtomicU64::new(0); // timer messages from cancelled handles

/// Point-in-time copy of the counters above, for shutdown and replay logs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CounterSnapshot {
    pub channel_send_failures: u64,
    pub key_edges: u64,
    pub repeat_fires: u64,
    pub repeat_stale_drops: u64,
}

impl CounterSnapshot {
    pub fn take() -> Self {
        Self {
            channel_send_failures: CHANNEL_SEND_FAILURES.load(Ordering::Relaxed),
            key_edges: KEY_EDGES_TOTAL.load(Ordering::Relaxed),
            repeat_fires: REPEAT_FIRES_TOTAL.load(Ordering::Relaxed),
            repeat_stale_drops: REPEAT_STALE_DROPS.load(Ordering::Relaxed),
        }
    }

    /// Counts accumulated since `earlier`.
    pub fn since(&self, earlier: &CounterSnapshot) -> CounterSnapshot {
        let delta = |now: u64, then: u64| now.saturating_sub(then);
        CounterSnapshot {
            channel_send_failures: delta(
                self.channel_send_failures,
                earlier.channel_send_failures,
            ),
            key_edges: delta(self.key_edges, earlier.key_edges),
            repeat_fires: delta(self.repeat_fires, earlier.repeat_fires),
            repeat_stale_drops: delta(self.repeat_stale_drops, earlier.repeat_stale_drops),
        }
    }
}

/// Top-level event enum consumed by a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// Host key transition; only hosts that learn key state from events need it.
    Input(InputEvent),
    /// Dispatch tick: sample keys, detect edges, run the command dispatcher.
    Tick,
    /// Observation tick: report content changes to text observers.
    Observe,
    /// A repeat timer scheduled through a `TimerHost` came due.
    Timer(TimerEvent),
    /// Host-side clear trigger (menu button, F2 in the terminal host).
    ResetRequested,
    Shutdown,
}

/// Key transitions reported by event-driven hosts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputEvent {
    KeyDown(LogicalKey),
    KeyUp(LogicalKey),
    /// Press without a matching release report (terminals lacking release events).
    KeyTap(LogicalKey),
}

/// Messages delivered by repeat timers.
///
/// `generation` identifies the arming that scheduled the timer so a message
/// that was already in flight when its handle got cancelled can be dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerEvent {
    RepeatDelayElapsed { key: LogicalKey, generation: u64 },
    RepeatFired { key: LogicalKey, generation: u64 },
}

impl TimerEvent {
    pub fn key(&self) -> LogicalKey {
        match self {
            TimerEvent::RepeatDelayElapsed { key, .. } | TimerEvent::RepeatFired { key, .. } => *key,
        }
    }

    pub fn generation(&self) -> u64 {
        match self {
            TimerEvent::RepeatDelayElapsed { generation, .. }
            | TimerEvent::RepeatFired { generation, .. } => *generation,
        }
    }
}

/// Handle returned by a timer host; only meaningful to the host that issued it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(pub u64);

// -------------------------------------------------------------------------------------------------
// Async Event Sources
// -------------------------------------------------------------------------------------------------
/// Trait implemented by any async event producer. Implementors usually hold configuration and
/// spawn one background task that pushes `Event`s into the shared channel.
pub trait AsyncEventSource: Send + 'static {
    /// Human-readable stable identifier (used for logging / diagnostics).
    fn name(&self) -> &'static str;
    /// Consume self and spawn the background task. Implementors stop when `tx.send(..).await`
    /// returns Err (channel closed).
    fn spawn(self: Box<Self>, tx: Sender<Event>) -> JoinHandle<()>;
}

/// Registry of event sources spawned together at startup.
pub struct EventSourceRegistry {
    sources: Vec<Box<dyn AsyncEventSource>>,
}

impl Default for EventSourceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSourceRegistry {
    pub fn new() -> Self {
        Self {
            sources: Vec::new(),
        }
    }

    pub fn register<S: AsyncEventSource>(&mut self, src: S) {
        self.sources.push(Box::new(src));
    }

    /// Spawn all registered sources, returning their JoinHandles. Each source receives its own
    /// `Sender` clone; the caller drops its final clone during shutdown so sources observe the
    /// closed channel and exit.
    pub fn spawn_all(&mut self, tx: &Sender<Event>) -> Vec<JoinHandle<()>> {
        let mut out = Vec::with_capacity(self.sources.len());
        for src in self.sources.drain(..) {
            let name = src.name();
            tracing::info!(target: "runtime.events", source = name, "spawning event source");
            out.push(src.spawn(tx.clone()));
        }
        out
    }
}

/// Emits a fixed event on a fixed interval (frame ticks, observation ticks).
pub struct IntervalEventSource {
    name: &'static str,
    interval: Duration,
    event: Event,
}

impl IntervalEventSource {
    pub fn new(name: &'static str, interval: Duration, event: Event) -> Self {
        Self {
            name,
            interval,
            event,
        }
    }

    pub fn frames(interval: Duration) -> Self {
        Self::new("frame_tick", interval, Event::Tick)
    }

    pub fn observations(interval: Duration) -> Self {
        Self::new("observe_tick", interval, Event::Observe)
    }
}

impl AsyncEventSource for IntervalEventSource {
    fn name(&self) -> &'static str {
        self.name
    }

    fn spawn(self: Box<Self>, tx: Sender<Event>) -> JoinHandle<()> {
        let IntervalEventSource {
            interval, event, ..
        } = *self;
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                if tx.send(event.clone()).await.is_err() {
                    break;
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};
    use tokio::sync::mpsc;

    #[test]
    fn timer_event_accessors() {
        let ev = TimerEvent::RepeatFired {
            key: LogicalKey::Backspace,
            generation: 7,
        };
        assert_eq!(ev.key(), LogicalKey::Backspace);
        assert_eq!(ev.generation(), 7);
    }

    #[test]
    fn counter_snapshot_reports_deltas() {
        let before = CounterSnapshot::take();
        REPEAT_STALE_DROPS.fetch_add(2, Ordering::Relaxed);
        KEY_EDGES_TOTAL.fetch_add(3, Ordering::Relaxed);
        let delta = CounterSnapshot::take().since(&before);
        // Other tests may bump the shared counters concurrently.
        assert!(delta.repeat_stale_drops >= 2);
        assert!(delta.key_edges >= 3);
        assert_eq!(before.since(&CounterSnapshot::take()), CounterSnapshot::default());
    }

    #[test]
    fn repeat_delay_exceeds_rate() {
        assert!(KEY_REPEAT_DELAY > KEY_REPEAT_RATE);
        assert_eq!(KEY_REPEAT_DELAY.as_millis(), 450);
        assert_eq!(KEY_REPEAT_RATE.as_millis(), 30);
    }

    #[tokio::test]
    async fn registry_spawns_interval_sources() {
        let (tx, mut rx) = mpsc::channel::<Event>(8);
        let mut reg = EventSourceRegistry::new();
        reg.register(IntervalEventSource::frames(Duration::from_millis(5)));
        reg.register(IntervalEventSource::observations(Duration::from_millis(5)));
        let handles = reg.spawn_all(&tx);

        let mut got_tick = false;
        let mut got_observe = false;
        let start = std::time::Instant::now();
        while start.elapsed() < Duration::from_millis(200) && (!got_tick || !got_observe) {
            if let Ok(Some(ev)) = tokio::time::timeout(Duration::from_millis(20), rx.recv()).await {
                match ev {
                    Event::Tick => got_tick = true,
                    Event::Observe => got_observe = true,
                    _ => {}
                }
            }
        }
        assert!(got_tick, "expected frame source to emit ticks");
        assert!(got_observe, "expected observation source to emit");

        drop(tx);
        drop(rx);
        for handle in handles {
            let _ = tokio::time::timeout(Duration::from_millis(50), handle).await;
        }
    }

    struct MockCloseSource {
        flag: Arc<AtomicBool>,
    }

    impl AsyncEventSource for MockCloseSource {
        fn name(&self) -> &'static str {
            "mock_close"
        }

        fn spawn(self: Box<Self>, tx: Sender<Event>) -> JoinHandle<()> {
            let flag = self.flag;
            tokio::spawn(async move {
                tx.closed().await;
                flag.store(true, Ordering::SeqCst);
            })
        }
    }

    #[tokio::test]
    async fn registry_sources_exit_on_channel_drop() {
        let (tx, rx) = mpsc::channel::<Event>(8);
        let mut reg = EventSourceRegistry::new();
        let flag = Arc::new(AtomicBool::new(false));
        reg.register(MockCloseSource { flag: flag.clone() });
        reg.register(IntervalEventSource::frames(Duration::from_millis(1)));
        let handles = reg.spawn_all(&tx);

        drop(tx);
        drop(rx);

        for handle in handles {
            match tokio::time::timeout(Duration::from_millis(100), handle).await {
                Ok(join_res) => join_res.expect("source task should exit cleanly"),
                Err(_) => panic!("source task did not observe channel closure"),
            }
        }

        assert!(flag.load(Ordering::SeqCst));
    }
}
