//! Replay scripts: timed key transitions driven through the simulated runtime.
//!
//! ```toml
//! [[step]]
//! at = 0
//! down = ["Shift", "H"]
//!
//! [[step]]
//! at = 40
//! up = ["Shift", "H"]
//! ```

use anyhow::{Context, Result};
use core_config::Config;
use core_actions::{Action, ActionObserver};
use core_events::{CounterSnapshot, KeyParseError, LogicalKey};
use core_model::SimulatedRuntime;
use serde::Deserialize;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use thiserror::Error;
use tracing::info;

/// How long a replay keeps running after the last step when no end is given.
pub const DEFAULT_TAIL: Duration = Duration::from_millis(1_000);

#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("invalid script: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("step {step}: {source}")]
    UnknownKey {
        step: usize,
        #[source]
        source: KeyParseError,
    },
    #[error("step {step} at {at} ms comes before the previous step at {previous} ms")]
    OutOfOrder { step: usize, at: u64, previous: u64 },
}

#[derive(Debug, Deserialize)]
struct RawScript {
    #[serde(default, rename = "step")]
    steps: Vec<RawStep>,
}

#[derive(Debug, Deserialize)]
struct RawStep {
    at: u64,
    #[serde(default)]
    down: Vec<String>,
    #[serde(default)]
    up: Vec<String>,
    #[serde(default)]
    reset: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    pub at: Duration,
    pub down: Vec<LogicalKey>,
    pub up: Vec<LogicalKey>,
    pub reset: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Script {
    steps: Vec<Step>,
}

fn parse_keys(step: usize, names: &[String]) -> Result<Vec<LogicalKey>, ScriptError> {
    names
        .iter()
        .map(|name| {
            name.parse::<LogicalKey>()
                .map_err(|source| ScriptError::UnknownKey { step, source })
        })
        .collect()
}

impl Script {
    pub fn parse(src: &str) -> Result<Self, ScriptError> {
        let raw: RawScript = toml::from_str(src)?;
        let mut previous = 0;
        let mut steps = Vec::with_capacity(raw.steps.len());
        for (i, step) in raw.steps.into_iter().enumerate() {
            let number = i + 1;
            if step.at < previous {
                return Err(ScriptError::OutOfOrder {
                    step: number,
                    at: step.at,
                    previous,
                });
            }
            previous = step.at;
            steps.push(Step {
                at: Duration::from_millis(step.at),
                down: parse_keys(number, &step.down)?,
                up: parse_keys(number, &step.up)?,
                reset: step.reset,
            });
        }
        Ok(Self { steps })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let src = std::fs::read_to_string(path)
            .with_context(|| format!("reading replay script {}", path.display()))?;
        Self::parse(&src).with_context(|| format!("parsing replay script {}", path.display()))
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Time of the last step.
    pub fn last_at(&self) -> Duration {
        self.steps.last().map(|s| s.at).unwrap_or_default()
    }
}

/// Outcome of a replay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplayReport {
    /// Content reported by each observation that saw a change.
    pub observed: Vec<String>,
    /// Label of every dispatched action, in order.
    pub actions: Vec<&'static str>,
    pub final_text: String,
    pub debug_info: String,
    pub ended_at: Duration,
}

struct ActionLog(Arc<Mutex<Vec<&'static str>>>);

impl ActionObserver for ActionLog {
    fn on_action(&self, action: &Action) {
        if let Ok(mut log) = self.0.lock() {
            log.push(action.label());
        }
    }
}

/// Run `script` on a fresh simulated runtime built from `config`.
///
/// Releases are applied before presses within a step; a `reset` runs after both.
pub fn replay(script: &Script, config: &Config, until: Option<Duration>) -> ReplayReport {
    let observed = Arc::new(Mutex::new(Vec::new()));
    let actions = Arc::new(Mutex::new(Vec::new()));
    let counters = CounterSnapshot::take();
    let mut rt = SimulatedRuntime::from_config(config);
    rt.session_mut()
        .add_action_observer(Box::new(ActionLog(actions.clone())));
    let sink = observed.clone();
    rt.session_mut().on_text_changed(move |text| {
        if let Ok(mut seen) = sink.lock() {
            seen.push(text.to_string());
        }
    });

    let end = until.unwrap_or_else(|| script.last_at() + DEFAULT_TAIL);
    for step in script.steps().iter().take_while(|s| s.at <= end) {
        rt.run_until(step.at);
        for key in &step.up {
            rt.release(*key);
        }
        for key in &step.down {
            rt.press(*key);
        }
        if step.reset {
            rt.reset();
        }
    }
    rt.run_until(end);

    let observed = observed.lock().map(|seen| seen.clone()).unwrap_or_default();
    let actions = actions.lock().map(|log| log.clone()).unwrap_or_default();
    let state = rt.session().state();
    let counters = CounterSnapshot::take().since(&counters);
    info!(
        target: "runtime",
        steps = script.steps().len(),
        observed = observed.len(),
        actions = actions.len(),
        repeat_fires = counters.repeat_fires,
        stale_drops = counters.repeat_stale_drops,
        end_ms = end.as_millis() as u64,
        "replay_finished"
    );
    ReplayReport {
        observed,
        actions,
        final_text: state.text(),
        debug_info: state.debug_info(),
        ended_at: rt.now(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    const HEY: &str = r#"
[[step]]
at = 0
down = ["Shift", "H"]

[[step]]
at = 40
up = ["Shift", "H"]

[[step]]
at = 80
down = ["e", "y"]

[[step]]
at = 120
up = ["E", "Y"]
"#;

    #[test]
    fn parses_steps_and_key_names() {
        let script = Script::parse(HEY).unwrap();
        assert_eq!(script.steps().len(), 4);
        assert_eq!(script.steps()[0].down, vec![LogicalKey::Shift, LogicalKey::H]);
        assert_eq!(script.steps()[2].down, vec![LogicalKey::E, LogicalKey::Y]);
        assert_eq!(script.last_at(), Duration::from_millis(120));
    }

    #[test]
    fn unknown_key_reports_step() {
        let err = Script::parse("[[step]]\nat = 0\ndown = [\"Hyper\"]\n").unwrap_err();
        assert!(matches!(err, ScriptError::UnknownKey { step: 1, .. }));
        assert!(err.to_string().contains("Hyper"));
    }

    #[test]
    fn steps_must_not_go_back_in_time() {
        let err = Script::parse("[[step]]\nat = 50\n\n[[step]]\nat = 10\n").unwrap_err();
        assert!(matches!(
            err,
            ScriptError::OutOfOrder {
                step: 2,
                at: 10,
                previous: 50
            }
        ));
    }

    #[test]
    fn empty_script_is_valid() {
        let script = Script::parse("").unwrap();
        assert!(script.steps().is_empty());
        let report = replay(&script, &Config::default(), Some(Duration::from_millis(50)));
        assert_eq!(report.final_text, "");
        assert!(report.observed.is_empty());
        assert_eq!(report.ended_at, Duration::from_millis(50));
    }

    #[test]
    fn replay_types_and_observes() {
        let script = Script::parse(HEY).unwrap();
        let report = replay(&script, &Config::default(), None);
        assert_eq!(report.final_text, "Hey");
        assert_eq!(report.observed, vec!["Hey".to_string()]);
        assert_eq!(report.actions, vec!["insert", "insert"]);
        assert_eq!(report.ended_at, Duration::from_millis(1_120));
        assert!(report.debug_info.starts_with("Text: \"Hey\"\nCursor: 3\n"));
    }

    #[test]
    fn reset_step_clears_content() {
        let src = format!("{HEY}\n[[step]]\nat = 300\nreset = true\n");
        let script = Script::parse(&src).unwrap();
        let report = replay(&script, &Config::default(), Some(Duration::from_millis(400)));
        assert_eq!(report.final_text, "");
        assert_eq!(report.observed, vec!["Hey".to_string(), String::new()]);
    }

    #[test]
    fn load_adds_path_context() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "[[step]]\nat = 0\ndown = [\"Nope\"]\n").unwrap();
        let err = Script::load(file.path()).unwrap_err();
        let chain = format!("{err:#}");
        assert!(chain.contains("parsing replay script"), "{chain}");
        assert!(chain.contains("Nope"), "{chain}");
    }
}
