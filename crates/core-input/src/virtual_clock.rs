//! Deterministic timer host driven by a virtual clock.
//!
//! Time only moves when the owner pops due timers or advances the clock, so
//! tests and replays reproduce exact firing times. Ties between timers due at
//! the same instant resolve in scheduling order.

use crate::TimerHost;
use core_events::{TimerEvent, TimerId};
use std::collections::BTreeMap;
use std::time::Duration;

#[derive(Debug, Clone, Copy)]
struct Scheduled {
    due: Duration,
    every: Option<Duration>,
    event: TimerEvent,
}

#[derive(Debug, Default)]
pub struct VirtualTimers {
    now: Duration,
    next_id: u64,
    // Ordered by id so equal deadlines pop in scheduling order.
    entries: BTreeMap<TimerId, Scheduled>,
}

impl VirtualTimers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now(&self) -> Duration {
        self.now
    }

    /// Move the clock forward (never backwards).
    pub fn advance_to(&mut self, t: Duration) {
        self.now = self.now.max(t);
    }

    pub fn pending(&self) -> usize {
        self.entries.len()
    }

    /// Earliest deadline among live timers.
    pub fn next_due(&self) -> Option<Duration> {
        self.entries.values().map(|s| s.due).min()
    }

    /// Pop the earliest timer due at or before `until`, moving the clock to
    /// its deadline. Recurring timers are rescheduled one interval later.
    pub fn pop_due(&mut self, until: Duration) -> Option<(Duration, TimerEvent)> {
        let (&id, &scheduled) = self
            .entries
            .iter()
            .filter(|(_, s)| s.due <= until)
            .min_by_key(|(id, s)| (s.due, **id))?;
        self.advance_to(scheduled.due);
        match scheduled.every {
            Some(every) => {
                if let Some(entry) = self.entries.get_mut(&id) {
                    entry.due = scheduled.due + every;
                }
            }
            None => {
                self.entries.remove(&id);
            }
        }
        Some((scheduled.due, scheduled.event))
    }

    fn insert(&mut self, due: Duration, every: Option<Duration>, event: TimerEvent) -> TimerId {
        self.next_id += 1;
        let id = TimerId(self.next_id);
        self.entries.insert(id, Scheduled { due, every, event });
        id
    }
}

impl TimerHost for VirtualTimers {
    fn schedule_after(&mut self, delay: Duration, event: TimerEvent) -> TimerId {
        self.insert(self.now + delay, None, event)
    }

    fn schedule_every(&mut self, interval: Duration, event: TimerEvent) -> TimerId {
        // A zero interval would never let time advance.
        let interval = interval.max(Duration::from_millis(1));
        self.insert(self.now + interval, Some(interval), event)
    }

    fn cancel(&mut self, id: TimerId) {
        self.entries.remove(&id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_events::LogicalKey;

    fn ev(generation: u64) -> TimerEvent {
        TimerEvent::RepeatFired {
            key: LogicalKey::A,
            generation,
        }
    }

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn one_shot_fires_once_and_moves_clock() {
        let mut t = VirtualTimers::new();
        t.schedule_after(ms(10), ev(1));
        assert_eq!(t.pop_due(ms(5)), None);
        assert_eq!(t.pop_due(ms(10)), Some((ms(10), ev(1))));
        assert_eq!(t.now(), ms(10));
        assert_eq!(t.pop_due(ms(100)), None);
        assert_eq!(t.pending(), 0);
    }

    #[test]
    fn recurring_timer_reschedules_until_cancelled() {
        let mut t = VirtualTimers::new();
        let id = t.schedule_every(ms(30), ev(2));
        let mut fired = Vec::new();
        while let Some((at, _)) = t.pop_due(ms(100)) {
            fired.push(at);
        }
        assert_eq!(fired, vec![ms(30), ms(60), ms(90)]);
        assert_eq!(t.next_due(), Some(ms(120)));
        t.cancel(id);
        t.cancel(id);
        assert_eq!(t.next_due(), None);
    }

    #[test]
    fn ties_pop_in_scheduling_order() {
        let mut t = VirtualTimers::new();
        t.schedule_after(ms(5), ev(1));
        t.schedule_after(ms(5), ev(2));
        assert_eq!(t.pop_due(ms(5)).map(|(_, e)| e), Some(ev(1)));
        assert_eq!(t.pop_due(ms(5)).map(|(_, e)| e), Some(ev(2)));
    }

    #[test]
    fn clock_never_moves_backwards() {
        let mut t = VirtualTimers::new();
        t.advance_to(ms(50));
        t.advance_to(ms(20));
        assert_eq!(t.now(), ms(50));
        t.schedule_after(ms(1), ev(1));
        assert_eq!(t.next_due(), Some(ms(51)));
    }
}
