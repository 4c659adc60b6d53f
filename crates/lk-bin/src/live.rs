//! Live terminal host.
//!
//! Key transitions from the crossterm task fold into a `HeldKeys` oracle;
//! frame and observation ticks come from interval sources; repeat timers are
//! Tokio tasks. Everything arrives on one channel and is handled in order.

use anyhow::Result;
use core_config::Config;
use core_events::{
    CounterSnapshot, EVENT_CHANNEL_CAP, Event, EventSourceRegistry, IntervalEventSource,
};
use core_input::{AsyncInputShutdown, HeldKeys, TokioTimers};
use core_model::EditorSession;
use core_state::EditorState;
use core_terminal::{CrosstermBackend, TerminalBackend, TerminalCapabilities, TerminalGuard};
use crossterm::{
    cursor::MoveTo,
    queue,
    style::Print,
    terminal::{Clear, ClearType},
};
use std::fmt;
use std::io::{Write, stdout};
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, trace, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ShutdownReason {
    ShutdownEvent,
    ChannelClosed,
}

impl ShutdownReason {
    fn as_str(&self) -> &'static str {
        match self {
            ShutdownReason::ShutdownEvent => "shutdown_event",
            ShutdownReason::ChannelClosed => "channel_closed",
        }
    }
}

impl fmt::Display for ShutdownReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

enum LoopControl {
    Continue { redraw: bool },
    Break { reason: ShutdownReason },
}

struct LiveRuntime<'a> {
    session: EditorSession,
    held: HeldKeys,
    timers: TokioTimers,
    rx: mpsc::Receiver<Event>,
    source_handles: Vec<JoinHandle<()>>,
    input_task: Option<JoinHandle<()>>,
    input_shutdown: Option<AsyncInputShutdown>,
    last_keybind: String,
    _terminal_guard: TerminalGuard<'a>,
}

pub async fn run(config: Config) -> Result<()> {
    let mut backend = CrosstermBackend::new(TerminalCapabilities::detect());
    backend.set_title("livekey")?;
    let guard = backend.enter_guard()?;
    let release_events = guard.backend().reports_key_release();

    let (tx, rx) = mpsc::channel::<Event>(EVENT_CHANNEL_CAP);
    let (input_task, input_shutdown) = core_input::spawn_async_input(tx.clone(), release_events);
    let mut registry = EventSourceRegistry::new();
    registry.register(IntervalEventSource::frames(config.frame_interval()));
    registry.register(IntervalEventSource::observations(config.observe_interval()));
    let source_handles = registry.spawn_all(&tx);
    let timers = TokioTimers::new(tx);

    let mut session = EditorSession::new(config.editing());
    session.on_text_changed(|text| {
        debug!(target: "runtime", chars = text.chars().count(), "text_observed");
    });
    info!(
        target: "runtime",
        release_events,
        frame_ms = config.frame_interval().as_millis() as u64,
        observe_ms = config.observe_interval().as_millis() as u64,
        "live_session_started"
    );

    let mut runtime = LiveRuntime {
        session,
        held: HeldKeys::new(),
        timers,
        rx,
        source_handles,
        input_task: Some(input_task),
        input_shutdown: Some(input_shutdown),
        last_keybind: String::new(),
        _terminal_guard: guard,
    };
    runtime.run().await
}

impl LiveRuntime<'_> {
    async fn run(&mut self) -> Result<()> {
        self.draw();
        let mut shutdown_reason = ShutdownReason::ChannelClosed;
        while let Some(event) = self.rx.recv().await {
            match self.handle_event(&event) {
                LoopControl::Break { reason } => {
                    shutdown_reason = reason;
                    break;
                }
                LoopControl::Continue { redraw } => {
                    if redraw {
                        self.draw();
                    }
                }
            }
        }
        self.rx.close();
        self.finalize_shutdown(shutdown_reason).await;
        Ok(())
    }

    fn handle_event(&mut self, event: &Event) -> LoopControl {
        match event {
            Event::Input(input) => {
                self.held.apply(*input, Instant::now());
                LoopControl::Continue { redraw: false }
            }
            Event::Shutdown => LoopControl::Break {
                reason: ShutdownReason::ShutdownEvent,
            },
            Event::Tick => {
                self.held.expire(Instant::now());
                let result = self.session.handle(event, &self.held, &mut self.timers);
                let keybind = self.session.current_keybind();
                let keys_changed = keybind != self.last_keybind;
                self.last_keybind = keybind;
                LoopControl::Continue {
                    redraw: result.dirty || keys_changed,
                }
            }
            Event::Timer(_) | Event::Observe | Event::ResetRequested => {
                let result = self.session.handle(event, &self.held, &mut self.timers);
                LoopControl::Continue {
                    redraw: result.dirty,
                }
            }
        }
    }

    fn draw(&self) {
        if let Err(e) = draw_frame(self.session.state(), &self.last_keybind) {
            error!(target: "runtime", ?e, "draw_failed");
        }
    }

    async fn finalize_shutdown(&mut self, reason: ShutdownReason) {
        info!(target: "runtime.shutdown", %reason, stage = "begin", "shutdown_stage");
        self.session.shutdown(&mut self.timers);

        while let Some(handle) = self.source_handles.pop() {
            match tokio::time::timeout(Duration::from_millis(200), handle).await {
                Ok(Ok(_)) => trace!(target: "runtime.shutdown", "event_source_task_stopped"),
                Ok(Err(err)) if err.is_cancelled() => {
                    trace!(target: "runtime.shutdown", "event_source_task_cancelled")
                }
                Ok(Err(err)) => error!(target: "runtime.shutdown", ?err, "event_source_task_error"),
                Err(_) => warn!(target: "runtime.shutdown", "event_source_task_timeout"),
            }
        }

        if let Some(shutdown) = self.input_shutdown.take() {
            shutdown.signal();
        }
        if let Some(handle) = self.input_task.take() {
            match handle.await {
                Ok(_) => trace!(target: "runtime.shutdown", "input_task_joined"),
                Err(err) if err.is_cancelled() => {
                    trace!(target: "runtime.shutdown", "input_task_cancelled")
                }
                Err(err) => error!(target: "runtime.shutdown", ?err, "input_task_join_failed"),
            }
        }
        let counters = CounterSnapshot::take();
        info!(
            target: "runtime.shutdown",
            %reason,
            stage = "complete",
            key_edges = counters.key_edges,
            repeat_fires = counters.repeat_fires,
            stale_drops = counters.repeat_stale_drops,
            send_failures = counters.channel_send_failures,
            "shutdown_stage"
        );
    }
}

/// One-line view of the field: `|` marks the cursor, `[..]` a non-empty selection.
pub fn field_line(state: &EditorState) -> String {
    let selection = state.selection().range().filter(|(s, e)| s < e);
    let cursor = state.cursor();
    let mut out = String::with_capacity(state.len() + 3);
    let mark = |out: &mut String, i: usize| {
        if selection.is_some_and(|(_, e)| e == i) {
            out.push(']');
        }
        if cursor == i {
            out.push('|');
        }
        if selection.is_some_and(|(s, _)| s == i) {
            out.push('[');
        }
    };
    let text = state.text();
    let mut len = 0;
    for (i, ch) in text.chars().enumerate() {
        mark(&mut out, i);
        match ch {
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
        len = i + 1;
    }
    mark(&mut out, len);
    out
}

fn draw_frame(state: &EditorState, keybind: &str) -> Result<()> {
    let mut out = stdout();
    queue!(
        out,
        MoveTo(0, 0),
        Clear(ClearType::All),
        Print("livekey | Esc quits, F2 clears"),
        MoveTo(0, 2),
        Print(field_line(state)),
        MoveTo(0, 4),
        Print(format!("Keys: {keybind}")),
        MoveTo(0, 5),
        Print(format!(
            "History: {}/{}  Clipboard: {} chars",
            state.history().index() + 1,
            state.history().len(),
            state.clipboard().chars().count()
        )),
    )?;
    out.flush()?;
    Ok(())
}
