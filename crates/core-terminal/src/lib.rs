//! Terminal backend abstraction and crossterm implementation.
//!
//! Entering the terminal enables raw mode, switches to the alternate screen
//! and, when the terminal supports it, pushes keyboard enhancement flags so
//! key releases are reported. Leaving undoes all of it in reverse order.

use anyhow::Result;
use crossterm::{
    cursor::Hide,
    cursor::Show,
    event::{KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags},
    execute,
    terminal::{
        EnterAlternateScreen, LeaveAlternateScreen, SetTitle, disable_raw_mode, enable_raw_mode,
    },
};
use std::io::stdout;
use tracing::debug;

pub mod capabilities;
pub use capabilities::TerminalCapabilities;

pub trait TerminalBackend {
    fn enter(&mut self) -> Result<()>;
    fn leave(&mut self) -> Result<()>;
    fn set_title(&mut self, title: &str) -> Result<()>;
}

/// Flags requested when the terminal supports the kitty keyboard protocol.
pub fn enhancement_flags() -> KeyboardEnhancementFlags {
    KeyboardEnhancementFlags::DISAMBIGUATE_ESCAPE_CODES
        | KeyboardEnhancementFlags::REPORT_EVENT_TYPES
        | KeyboardEnhancementFlags::REPORT_ALL_KEYS_AS_ESCAPE_CODES
}

pub struct CrosstermBackend {
    capabilities: TerminalCapabilities,
    entered: bool,
    enhanced: bool,
}

/// RAII guard ensuring terminal state restoration even if caller early-returns or panics.
pub struct TerminalGuard<'a> {
    backend: &'a mut CrosstermBackend,
    active: bool,
}

impl CrosstermBackend {
    pub fn new(capabilities: TerminalCapabilities) -> Self {
        Self {
            capabilities,
            entered: false,
            enhanced: false,
        }
    }

    pub fn capabilities(&self) -> TerminalCapabilities {
        self.capabilities
    }

    /// True while release reporting is active.
    pub fn reports_key_release(&self) -> bool {
        self.enhanced
    }

    /// Enter and return a guard that will leave on drop.
    pub fn enter_guard(&mut self) -> Result<TerminalGuard<'_>> {
        self.enter()?;
        Ok(TerminalGuard {
            backend: self,
            active: true,
        })
    }
}

impl TerminalBackend for CrosstermBackend {
    fn enter(&mut self) -> Result<()> {
        if !self.entered {
            enable_raw_mode()?;
            execute!(stdout(), EnterAlternateScreen, Hide)?;
            if self.capabilities.reports_key_release {
                execute!(stdout(), PushKeyboardEnhancementFlags(enhancement_flags()))?;
                self.enhanced = true;
            }
            self.entered = true;
            debug!(target: "runtime", enhanced = self.enhanced, "terminal_entered");
        }
        Ok(())
    }

    fn leave(&mut self) -> Result<()> {
        if self.entered {
            if self.enhanced {
                execute!(stdout(), PopKeyboardEnhancementFlags)?;
                self.enhanced = false;
            }
            execute!(stdout(), LeaveAlternateScreen, Show)?;
            disable_raw_mode()?;
            self.entered = false;
            debug!(target: "runtime", "terminal_left");
        }
        Ok(())
    }

    fn set_title(&mut self, title: &str) -> Result<()> {
        execute!(stdout(), SetTitle(title))?;
        Ok(())
    }
}

impl Drop for CrosstermBackend {
    fn drop(&mut self) {
        let _ = self.leave();
    }
}

impl<'a> TerminalGuard<'a> {
    pub fn backend(&self) -> &CrosstermBackend {
        self.backend
    }
}

impl<'a> Drop for TerminalGuard<'a> {
    fn drop(&mut self) {
        if self.active {
            let _ = self.backend.leave();
        }
    }
}
