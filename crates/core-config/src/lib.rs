//! Configuration loading and parsing.
//!
//! Parses `livekey.toml` (or an override path provided by the binary):
//!
//! ```toml
//! [editing]
//! word_navigation = true
//! multi_key_batch_insert = true
//! [timing]
//! frame_interval_ms = 16
//! observe_interval_ms = 100
//! ```
//!
//! Missing files and missing fields fall back to defaults; unknown fields are
//! ignored so older binaries tolerate newer files. A file that fails to parse
//! is reported with a `warn!` and replaced by defaults. The raw timing values
//! are kept next to the effective (clamped) ones.

use anyhow::Result;
use serde::Deserialize;
use std::time::Duration;
use std::{fs, path::PathBuf};
use tracing::{debug, info, warn};

/// Editing feature flags.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct EditingConfig {
    /// Ctrl+Arrow jumps by word and Ctrl+Backspace/Delete deletes by word.
    /// When off, Ctrl is ignored for navigation and deletion.
    #[serde(default = "EditingConfig::enabled")]
    pub word_navigation: bool,
    /// Keys newly pressed in the same tick are inserted as one batch (one
    /// undo step). When off, each key is inserted on its own.
    #[serde(default = "EditingConfig::enabled")]
    pub multi_key_batch_insert: bool,
}

impl Default for EditingConfig {
    fn default() -> Self {
        Self {
            word_navigation: true,
            multi_key_batch_insert: true,
        }
    }
}

impl EditingConfig {
    const fn enabled() -> bool {
        true
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct TimingConfig {
    #[serde(default = "TimingConfig::default_frame_interval_ms")]
    pub frame_interval_ms: u64,
    #[serde(default = "TimingConfig::default_observe_interval_ms")]
    pub observe_interval_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            frame_interval_ms: Self::default_frame_interval_ms(),
            observe_interval_ms: Self::default_observe_interval_ms(),
        }
    }
}

impl TimingConfig {
    const fn default_frame_interval_ms() -> u64 {
        16
    }
    const fn default_observe_interval_ms() -> u64 {
        100
    }
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct ConfigFile {
    #[serde(default)]
    pub editing: EditingConfig,
    #[serde(default)]
    pub timing: TimingConfig,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub raw: Option<String>, // original file string (optional)
    pub file: ConfigFile,    // parsed (or default) data
    pub effective_frame_interval_ms: u64,
    pub effective_observe_interval_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self::from_file(None, ConfigFile::default())
    }
}

/// Best-effort config path: working directory first, then the platform config dir.
pub fn discover() -> PathBuf {
    let local = PathBuf::from("livekey.toml");
    if local.exists() {
        return local;
    }
    if let Some(dir) = dirs::config_dir() {
        return dir.join("livekey").join("livekey.toml");
    }
    PathBuf::from("livekey.toml")
}

pub fn load_from(path: Option<PathBuf>) -> Result<Config> {
    let path = path.unwrap_or_else(discover);
    let content = match fs::read_to_string(&path) {
        Ok(content) => content,
        Err(e) => {
            debug!(target: "config", path = %path.display(), error = %e, "config_file_unavailable_using_defaults");
            return Ok(Config::default());
        }
    };
    match toml::from_str::<ConfigFile>(&content) {
        Ok(file) => {
            info!(target: "config", path = %path.display(), "config_loaded");
            Ok(Config::from_file(Some(content), file))
        }
        Err(e) => {
            warn!(target: "config", path = %path.display(), error = %e, "config_parse_failed_using_defaults");
            Ok(Config::default())
        }
    }
}

impl Config {
    pub fn from_file(raw: Option<String>, file: ConfigFile) -> Self {
        let mut cfg = Self {
            raw,
            file,
            effective_frame_interval_ms: 0,
            effective_observe_interval_ms: 0,
        };
        cfg.apply_timing();
        cfg
    }

    /// Clamp the observation interval to at least 1ms and the frame interval
    /// into `[1, observe]` (dispatch never runs slower than observation).
    /// Returns the effective frame interval in milliseconds.
    pub fn apply_timing(&mut self) -> u64 {
        let raw_frame = self.file.timing.frame_interval_ms;
        let raw_observe = self.file.timing.observe_interval_ms;
        let observe = raw_observe.max(1);
        let frame = raw_frame.clamp(1, observe);
        if observe != raw_observe {
            info!(target: "config", raw = raw_observe, clamped = observe, "observe_interval_clamped");
        }
        if frame != raw_frame {
            info!(target: "config", raw = raw_frame, clamped = frame, max = observe, "frame_interval_clamped");
        }
        self.effective_frame_interval_ms = frame;
        self.effective_observe_interval_ms = observe;
        frame
    }

    pub fn editing(&self) -> EditingConfig {
        self.file.editing
    }

    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.effective_frame_interval_ms)
    }

    pub fn observe_interval(&self) -> Duration {
        Duration::from_millis(self.effective_observe_interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::path::PathBuf;
    use std::sync::{Arc, Mutex, MutexGuard};
    use tracing::Level;
    use tracing::subscriber::with_default;
    use tracing_subscriber::fmt::MakeWriter;

    #[derive(Clone)]
    struct BufferWriter {
        inner: Arc<Mutex<Vec<u8>>>,
    }

    impl BufferWriter {
        fn new() -> (Self, Arc<Mutex<Vec<u8>>>) {
            let buf = Arc::new(Mutex::new(Vec::new()));
            (Self { inner: buf.clone() }, buf)
        }
    }

    struct LockedWriter<'a> {
        guard: MutexGuard<'a, Vec<u8>>,
    }

    impl<'a> Write for LockedWriter<'a> {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.guard.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for BufferWriter {
        type Writer = LockedWriter<'a>;

        fn make_writer(&'a self) -> Self::Writer {
            LockedWriter {
                guard: self.inner.lock().expect("log buffer poisoned"),
            }
        }
    }

    fn write_config(body: &str) -> tempfile::NamedTempFile {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(tmp.path(), body).unwrap();
        tmp
    }

    fn capture_logs<F: FnOnce()>(f: F) -> String {
        let (writer, buffer) = BufferWriter::new();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(Level::INFO)
            .with_target(true)
            .with_ansi(false)
            .without_time()
            .with_writer(writer)
            .finish();
        with_default(subscriber, f);
        let out = String::from_utf8(buffer.lock().unwrap().clone()).unwrap();
        out
    }

    #[test]
    fn defaults_when_missing_file() {
        let cfg = load_from(Some(PathBuf::from("__nonexistent_hopefully__.toml"))).unwrap();
        assert!(cfg.raw.is_none());
        assert!(cfg.editing().word_navigation);
        assert!(cfg.editing().multi_key_batch_insert);
        assert_eq!(cfg.frame_interval(), Duration::from_millis(16));
        assert_eq!(cfg.observe_interval(), Duration::from_millis(100));
    }

    #[test]
    fn parses_editing_flags_and_keeps_missing_defaults() {
        let tmp = write_config("[editing]\nword_navigation = false\n");
        let cfg = load_from(Some(tmp.path().to_path_buf())).unwrap();
        assert!(!cfg.editing().word_navigation);
        assert!(cfg.editing().multi_key_batch_insert);
        assert_eq!(cfg.effective_frame_interval_ms, 16);
    }

    #[test]
    fn unknown_fields_are_ignored() {
        let tmp = write_config("[editing]\nmulti_key_batch_insert = false\nfuture_flag = 3\n[other]\nx = 1\n");
        let cfg = load_from(Some(tmp.path().to_path_buf())).unwrap();
        assert!(!cfg.editing().multi_key_batch_insert);
        assert!(cfg.raw.is_some());
    }

    #[test]
    fn invalid_file_falls_back_with_warning() {
        let tmp = write_config("[timing]\nframe_interval_ms = \"fast\"\n");
        let mut cfg = None;
        let logs = capture_logs(|| {
            cfg = Some(load_from(Some(tmp.path().to_path_buf())).unwrap());
        });
        let cfg = cfg.unwrap();
        assert!(cfg.raw.is_none());
        assert_eq!(cfg.effective_frame_interval_ms, 16);
        assert!(logs.contains("WARN config:"));
        assert!(logs.contains("config_parse_failed_using_defaults"));
    }

    #[test]
    fn frame_interval_clamped_to_observe_interval() {
        let tmp = write_config("[timing]\nframe_interval_ms = 500\nobserve_interval_ms = 50\n");
        let mut cfg = None;
        let logs = capture_logs(|| {
            cfg = Some(load_from(Some(tmp.path().to_path_buf())).unwrap());
        });
        let cfg = cfg.unwrap();
        assert_eq!(cfg.file.timing.frame_interval_ms, 500);
        assert_eq!(cfg.effective_frame_interval_ms, 50);
        assert!(logs.contains("INFO config:"));
        assert!(logs.contains("frame_interval_clamped"));
    }

    #[test]
    fn zero_intervals_clamp_to_one_ms() {
        let mut cfg = Config::default();
        cfg.file.timing.frame_interval_ms = 0;
        cfg.file.timing.observe_interval_ms = 0;
        assert_eq!(cfg.apply_timing(), 1);
        assert_eq!(cfg.observe_interval(), Duration::from_millis(1));
    }

    #[test]
    fn in_range_values_do_not_log_clamp() {
        let tmp = write_config("[timing]\nframe_interval_ms = 10\n");
        let logs = capture_logs(|| {
            let cfg = load_from(Some(tmp.path().to_path_buf())).unwrap();
            assert_eq!(cfg.effective_frame_interval_ms, 10);
        });
        assert!(!logs.contains("clamped"));
    }
}
