//! Timer host backed by Tokio tasks.
//!
//! Each timer is a spawned task that posts `Event::Timer` into the runtime
//! channel, so firings are serialized with ticks and input on the single
//! event loop. Cancelling aborts the task; a message that was already queued
//! is filtered out by the repeat scheduler's generation check.

use crate::TimerHost;
use core_events::{CHANNEL_SEND_FAILURES, Event, TimerEvent, TimerId};
use std::collections::HashMap;
use std::sync::atomic::Ordering;
use std::time::Duration;
use tokio::sync::mpsc::Sender;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::trace;

pub struct TokioTimers {
    tx: Sender<Event>,
    next_id: u64,
    tasks: HashMap<TimerId, JoinHandle<()>>,
}

impl TokioTimers {
    /// Must be created and used from within a Tokio runtime.
    pub fn new(tx: Sender<Event>) -> Self {
        Self {
            tx,
            next_id: 0,
            tasks: HashMap::new(),
        }
    }

    pub fn active(&self) -> usize {
        self.tasks.values().filter(|h| !h.is_finished()).count()
    }

    fn track(&mut self, handle: JoinHandle<()>) -> TimerId {
        self.tasks.retain(|_, h| !h.is_finished());
        self.next_id += 1;
        let id = TimerId(self.next_id);
        self.tasks.insert(id, handle);
        id
    }
}

async fn post(tx: &Sender<Event>, event: TimerEvent) -> bool {
    if tx.send(Event::Timer(event)).await.is_err() {
        CHANNEL_SEND_FAILURES.fetch_add(1, Ordering::Relaxed);
        return false;
    }
    true
}

impl TimerHost for TokioTimers {
    fn schedule_after(&mut self, delay: Duration, event: TimerEvent) -> TimerId {
        let tx = self.tx.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            post(&tx, event).await;
        });
        self.track(handle)
    }

    fn schedule_every(&mut self, interval: Duration, event: TimerEvent) -> TimerId {
        let tx = self.tx.clone();
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if !post(&tx, event).await {
                    break;
                }
            }
        });
        self.track(handle)
    }

    fn cancel(&mut self, id: TimerId) {
        if let Some(handle) = self.tasks.remove(&id) {
            handle.abort();
            trace!(target: "input.repeat", timer = id.0, "timer_task_aborted");
        }
    }
}

impl Drop for TokioTimers {
    fn drop(&mut self) {
        for (_, handle) in self.tasks.drain() {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_events::LogicalKey;
    use tokio::sync::mpsc;

    fn fired(generation: u64) -> TimerEvent {
        TimerEvent::RepeatFired {
            key: LogicalKey::Delete,
            generation,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn one_shot_posts_after_delay() {
        let (tx, mut rx) = mpsc::channel(8);
        let mut timers = TokioTimers::new(tx);
        let start = Instant::now();
        timers.schedule_after(Duration::from_millis(450), fired(1));
        let ev = rx.recv().await;
        assert_eq!(ev, Some(Event::Timer(fired(1))));
        assert!(start.elapsed() >= Duration::from_millis(450));
    }

    #[tokio::test(start_paused = true)]
    async fn recurring_timer_stops_when_cancelled() {
        let (tx, mut rx) = mpsc::channel(8);
        let mut timers = TokioTimers::new(tx);
        let id = timers.schedule_every(Duration::from_millis(30), fired(2));
        for _ in 0..3 {
            assert_eq!(rx.recv().await, Some(Event::Timer(fired(2))));
        }
        timers.cancel(id);
        timers.cancel(id);
        let next = tokio::time::timeout(Duration::from_millis(200), rx.recv()).await;
        assert!(next.is_err(), "cancelled timer kept firing");
        assert_eq!(timers.active(), 0);
    }
}
