//! Terminal input task.
//!
//! Pumps crossterm's `EventStream` into the runtime channel as key
//! transitions (or reserved control events) until the stream ends, the
//! channel closes, or the owner asks it to stop.

use crate::key_token::{control_event, key_transitions};
use core_events::{CHANNEL_SEND_FAILURES, Event};
use crossterm::event::{Event as CEvent, EventStream, KeyEvent as CKeyEvent};
use std::fmt;
use std::io;
use std::sync::Arc;
use std::sync::atomic::Ordering;
use tokio::sync::{Notify, mpsc::Sender};
use tokio::task::{self, JoinHandle};
use tokio_stream::{Stream, StreamExt};
use tracing::{Instrument, info, trace, warn};

/// Asks the input task to stop. Cloneable; any clone may signal.
#[derive(Clone, Debug)]
pub struct AsyncInputShutdown {
    notify: Arc<Notify>,
}

impl AsyncInputShutdown {
    fn new() -> Self {
        Self {
            notify: Arc::new(Notify::new()),
        }
    }

    pub fn signal(&self) {
        // notify_one stores a permit, so a signal sent before the task
        // reaches its select is not lost.
        self.notify.notify_one();
    }
}

pub(crate) fn spawn_async_event_task(
    sender: Sender<Event>,
    release_events: bool,
) -> (JoinHandle<()>, AsyncInputShutdown) {
    let shutdown = AsyncInputShutdown::new();
    let stop = shutdown.notify.clone();
    let span = tracing::debug_span!(target: "input.thread", "terminal_input", release_events);
    let handle = task::spawn(
        async move {
            InputPump::new(sender, EventStream::new(), stop, release_events)
                .run()
                .await;
        }
        .instrument(span),
    );
    (handle, shutdown)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum StopReason {
    Signalled,
    ChannelClosed,
    StreamEnded,
    StreamError(io::ErrorKind),
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::Signalled => f.write_str("signalled"),
            StopReason::ChannelClosed => f.write_str("channel_closed"),
            StopReason::StreamEnded => f.write_str("stream_ended"),
            StopReason::StreamError(_) => f.write_str("stream_error"),
        }
    }
}

struct InputPump<S> {
    sender: Sender<Event>,
    stream: S,
    stop: Arc<Notify>,
    release_events: bool,
}

impl<S> InputPump<S>
where
    S: Stream<Item = io::Result<CEvent>> + Send + Unpin + 'static,
{
    fn new(sender: Sender<Event>, stream: S, stop: Arc<Notify>, release_events: bool) -> Self {
        Self {
            sender,
            stream,
            stop,
            release_events,
        }
    }

    async fn run(mut self) {
        info!(target: "input.thread", release_events = self.release_events, "input_task_started");
        let reason = self.pump().await;
        if let StopReason::StreamError(kind) = reason {
            warn!(target: "input.thread", error_kind = ?kind, "input_stream_failed");
        }
        info!(target: "input.thread", %reason, "input_task_stopped");
    }

    async fn pump(&mut self) -> StopReason {
        loop {
            let next = tokio::select! {
                biased;
                _ = self.stop.notified() => return StopReason::Signalled,
                next = self.stream.next() => next,
            };
            match next {
                None => return StopReason::StreamEnded,
                Some(Err(err)) => return StopReason::StreamError(err.kind()),
                Some(Ok(CEvent::Key(key))) => {
                    if !self.forward_key(key).await {
                        return StopReason::ChannelClosed;
                    }
                }
                Some(Ok(other)) => {
                    trace!(target: "input.event", ?other, "ignored_terminal_event");
                }
            }
        }
    }

    /// Returns false once the receiving side is gone.
    async fn forward_key(&self, key: CKeyEvent) -> bool {
        if let Some(control) = control_event(&key) {
            trace!(target: "input.event", ?control, "control_key");
            return self.send(control).await;
        }
        let transitions = key_transitions(&key, self.release_events);
        if transitions.is_empty() {
            trace!(target: "input.event", code = ?key.code, "unmapped_key");
        }
        for input in transitions {
            trace!(target: "input.event", ?input, "key_transition");
            if !self.send(Event::Input(input)).await {
                return false;
            }
        }
        true
    }

    async fn send(&self, event: Event) -> bool {
        if self.sender.send(event).await.is_ok() {
            return true;
        }
        CHANNEL_SEND_FAILURES.fetch_add(1, Ordering::Relaxed);
        false
    }
}
