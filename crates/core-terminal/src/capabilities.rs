//! Terminal capability probing.
//!
//! Detection runs once at startup. The only capability the live host cares
//! about is whether key releases are reported (kitty keyboard protocol);
//! without them presses fall back to short synthetic holds.

use crossterm::terminal::supports_keyboard_enhancement;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub struct TerminalCapabilities {
    pub reports_key_release: bool,
}

impl TerminalCapabilities {
    pub fn detect() -> Self {
        let reports_key_release = match supports_keyboard_enhancement() {
            Ok(supported) => supported,
            Err(error) => {
                debug!(target: "runtime", %error, "keyboard_enhancement_probe_failed");
                false
            }
        };
        info!(target: "runtime", reports_key_release, "terminal_capabilities");
        Self {
            reports_key_release,
        }
    }

    /// Capabilities of a terminal that reports presses only.
    pub fn basic() -> Self {
        Self {
            reports_key_release: false,
        }
    }
}
