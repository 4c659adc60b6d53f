use core_actions::{Action, ActionObserver, DispatchResult, KeyTranslator, convert_keybind, dispatch};
use core_config::EditingConfig;
use core_events::{Event, KeySet, LogicalKey, ModMask};
use core_input::{KeyEdgeDetector, KeyOracle, RepeatScheduler, TimerHost};
use core_state::EditorState;
use tracing::{debug, trace};

/// Callback receiving the full content after it changed.
pub type TextObserver = Box<dyn FnMut(&str) + Send>;

pub struct EditorSession {
    detector: KeyEdgeDetector,
    repeat: RepeatScheduler,
    state: EditorState,
    translator: KeyTranslator,
    text_observers: Vec<TextObserver>,
    action_observers: Vec<Box<dyn ActionObserver>>,
    last_observed: String,
    current_keys: KeySet,
}

impl Default for EditorSession {
    fn default() -> Self {
        Self::new(EditingConfig::default())
    }
}

impl EditorSession {
    pub fn new(editing: EditingConfig) -> Self {
        Self {
            detector: KeyEdgeDetector::new(),
            repeat: RepeatScheduler::new(),
            state: EditorState::new(),
            translator: KeyTranslator::new(editing),
            text_observers: Vec::new(),
            action_observers: Vec::new(),
            last_observed: String::new(),
            current_keys: KeySet::new(),
        }
    }

    pub fn state(&self) -> &EditorState {
        &self.state
    }

    /// Direct access for the command surface (set cursor, set selection,
    /// select word/line, set clipboard). These bypass key handling.
    pub fn state_mut(&mut self) -> &mut EditorState {
        &mut self.state
    }

    pub fn text(&self) -> String {
        self.state.text()
    }

    pub fn editing(&self) -> EditingConfig {
        self.translator.editing()
    }

    pub fn repeat(&self) -> &RepeatScheduler {
        &self.repeat
    }

    /// Keys held at the last dispatch tick, modifiers first.
    pub fn current_keys(&self) -> &KeySet {
        &self.current_keys
    }

    /// Display label of the held chord (`"Ctrl+Shift+Z"`).
    pub fn current_keybind(&self) -> String {
        convert_keybind(self.current_keys.as_slice())
    }

    /// Register a content observer, called on observation ticks after a change.
    pub fn on_text_changed<F>(&mut self, handler: F)
    where
        F: FnMut(&str) + Send + 'static,
    {
        self.text_observers.push(Box::new(handler));
    }

    pub fn add_action_observer(&mut self, observer: Box<dyn ActionObserver>) {
        self.action_observers.push(observer);
    }

    /// Apply an action through the same path key handling uses.
    pub fn apply(&mut self, action: Action) -> DispatchResult {
        dispatch(action, &mut self.state, &self.action_observers)
    }

    /// Clear content, cursor, selection and history.
    pub fn request_reset(&mut self) -> DispatchResult {
        debug!(target: "session", len = self.state.len(), "reset_requested");
        self.apply(Action::Clear)
    }

    /// Single entry point for host events.
    pub fn handle(
        &mut self,
        event: &Event,
        oracle: &dyn KeyOracle,
        timers: &mut dyn TimerHost,
    ) -> DispatchResult {
        match event {
            Event::Tick => self.tick(oracle, timers),
            Event::Timer(timer) => match self.repeat.on_timer(*timer, oracle, timers) {
                Some(key) => self.fire_repeat(key, oracle),
                None => DispatchResult::clean(),
            },
            Event::Observe => {
                self.observe();
                DispatchResult::clean()
            }
            Event::ResetRequested => self.request_reset(),
            // Key transitions are folded into the host's oracle; shutdown is the host's call.
            Event::Input(_) | Event::Shutdown => DispatchResult::clean(),
        }
    }

    fn tick(&mut self, oracle: &dyn KeyOracle, timers: &mut dyn TimerHost) -> DispatchResult {
        let edges = self.detector.sample(oracle);
        if edges.is_idle() {
            self.current_keys = KeySet::new();
            return DispatchResult::clean();
        }
        self.repeat.apply_edges(&edges, timers);
        let actions = self
            .translator
            .plan_tick(&edges.current, &edges.newly_pressed);
        self.current_keys = edges.current;
        actions
            .into_iter()
            .fold(DispatchResult::clean(), |acc, action| {
                acc.merge(dispatch(action, &mut self.state, &self.action_observers))
            })
    }

    fn fire_repeat(&mut self, key: LogicalKey, oracle: &dyn KeyOracle) -> DispatchResult {
        let mods = held_modifiers(oracle);
        match self.translator.repeat_action(key, mods) {
            Some(action) => {
                trace!(target: "session", %key, action = action.label(), "repeat");
                dispatch(action, &mut self.state, &self.action_observers)
            }
            None => DispatchResult::clean(),
        }
    }

    /// Notify text observers if the content differs from the last observed
    /// value. Returns whether they were notified.
    pub fn observe(&mut self) -> bool {
        if self.state.buffer().text_eq(&self.last_observed) {
            return false;
        }
        self.last_observed = self.state.text();
        trace!(target: "session", len = self.state.len(), observers = self.text_observers.len(), "text_changed");
        for observer in self.text_observers.iter_mut() {
            observer(&self.last_observed);
        }
        true
    }

    /// Cancel all repeat timers (host shutdown).
    pub fn shutdown(&mut self, timers: &mut dyn TimerHost) {
        self.repeat.cancel_all(timers);
        debug!(target: "session", "session_shutdown");
    }
}

fn held_modifiers(oracle: &dyn KeyOracle) -> ModMask {
    LogicalKey::MODIFIERS
        .iter()
        .filter(|m| oracle.is_key_down(**m))
        .fold(ModMask::empty(), |acc, m| acc | ModMask::from_key(*m))
}
