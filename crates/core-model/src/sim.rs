use crate::EditorSession;
use core_actions::DispatchResult;
use core_config::Config;
use core_events::{DEFAULT_FRAME_INTERVAL, Event, KeySet, LogicalKey, OBSERVE_INTERVAL};
use core_input::VirtualTimers;
use std::time::Duration;
use tracing::trace;

/// Host loop on a virtual clock.
///
/// Frame ticks start at t=0 and recur every frame interval; observation ticks
/// start one observation interval in. When a frame tick, a timer and an
/// observation fall on the same instant they run in that order.
pub struct SimulatedRuntime {
    session: EditorSession,
    keys: KeySet,
    timers: VirtualTimers,
    frame_interval: Duration,
    observe_interval: Duration,
    next_frame: Duration,
    next_observe: Duration,
}

enum Due {
    Frame,
    Timer,
    Observe,
}

impl SimulatedRuntime {
    pub fn new(session: EditorSession, frame_interval: Duration, observe_interval: Duration) -> Self {
        let frame_interval = frame_interval.max(Duration::from_millis(1));
        let observe_interval = observe_interval.max(Duration::from_millis(1));
        Self {
            session,
            keys: KeySet::new(),
            timers: VirtualTimers::new(),
            frame_interval,
            observe_interval,
            next_frame: Duration::ZERO,
            next_observe: observe_interval,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            EditorSession::new(config.editing()),
            config.frame_interval(),
            config.observe_interval(),
        )
    }

    pub fn now(&self) -> Duration {
        self.timers.now()
    }

    pub fn session(&self) -> &EditorSession {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut EditorSession {
        &mut self.session
    }

    pub fn held(&self) -> &KeySet {
        &self.keys
    }

    pub fn timers(&self) -> &VirtualTimers {
        &self.timers
    }

    /// Key goes down at the current instant; the next frame tick sees it.
    pub fn press(&mut self, key: LogicalKey) {
        self.keys.insert(key);
    }

    pub fn release(&mut self, key: LogicalKey) {
        self.keys.remove(key);
    }

    pub fn release_all(&mut self) {
        self.keys = KeySet::new();
    }

    /// Deliver `ResetRequested` at the current instant.
    pub fn reset(&mut self) -> DispatchResult {
        self.session
            .handle(&Event::ResetRequested, &self.keys, &mut self.timers)
    }

    /// Run every frame tick, timer and observation due up to and including `t`.
    pub fn run_until(&mut self, t: Duration) -> DispatchResult {
        let mut result = DispatchResult::clean();
        while let Some((at, due)) = self.next_due(t) {
            self.timers.advance_to(at);
            let event = match due {
                Due::Frame => {
                    self.next_frame += self.frame_interval;
                    Event::Tick
                }
                Due::Timer => match self.timers.pop_due(at) {
                    Some((_, timer)) => Event::Timer(timer),
                    None => continue,
                },
                Due::Observe => {
                    self.next_observe += self.observe_interval;
                    Event::Observe
                }
            };
            trace!(target: "runtime", at_ms = at.as_millis() as u64, ?event, "sim_event");
            result = result.merge(self.session.handle(&event, &self.keys, &mut self.timers));
        }
        self.timers.advance_to(t);
        result
    }

    pub fn run_for(&mut self, d: Duration) -> DispatchResult {
        self.run_until(self.now() + d)
    }

    /// Press and hold for one frame, then release and let a frame observe it.
    pub fn tap(&mut self, key: LogicalKey) -> DispatchResult {
        self.press(key);
        let down = self.run_for(self.frame_interval);
        self.release(key);
        down.merge(self.run_for(self.frame_interval))
    }

    fn next_due(&self, until: Duration) -> Option<(Duration, Due)> {
        let timer = self.timers.next_due().unwrap_or(Duration::MAX);
        let (at, due) = if self.next_frame <= timer && self.next_frame <= self.next_observe {
            (self.next_frame, Due::Frame)
        } else if timer <= self.next_observe {
            (timer, Due::Timer)
        } else {
            (self.next_observe, Due::Observe)
        };
        (at <= until).then_some((at, due))
    }
}

impl Default for SimulatedRuntime {
    fn default() -> Self {
        Self::new(EditorSession::default(), DEFAULT_FRAME_INTERVAL, OBSERVE_INTERVAL)
    }
}
