//! Key -> character and key set -> `Action` translation.
//!
//! `key_to_char` is the pure US-layout character table. `KeyTranslator`
//! applies the per-tick priority rules to the edge detector output and
//! resolves the action a held key repeats:
//! 1. Ctrl held: newly pressed Z/Y/A/X/C/V -> undo/redo/select all/cut/copy/paste.
//! 2. Newly pressed ArrowLeft/ArrowRight/Home/End -> navigation.
//! 3. Newly pressed Backspace/Delete -> deletion.
//! 4. Everything else newly pressed -> literal insertion.
//!
//! The first matching rule wins, so Ctrl+A never inserts an `a`.

use crate::{Action, DeleteDirection, NavKey};
use core_config::EditingConfig;
use core_events::{KeySet, LogicalKey, ModMask};
use tracing::trace;

/// Shifted symbols for the digit row, indexed by digit value.
const SHIFTED_DIGITS: [char; 10] = [')', '!', '@', '#', '$', '%', '^', '&', '*', '('];

const SHORTCUT_KEYS: [LogicalKey; 6] = [
    LogicalKey::Z,
    LogicalKey::Y,
    LogicalKey::A,
    LogicalKey::X,
    LogicalKey::C,
    LogicalKey::V,
];

const NAV_KEYS: [LogicalKey; 4] = [
    LogicalKey::ArrowLeft,
    LogicalKey::ArrowRight,
    LogicalKey::Home,
    LogicalKey::End,
];

const DELETE_KEYS: [LogicalKey; 2] = [LogicalKey::Backspace, LogicalKey::Delete];

fn pick(shift: bool, plain: char, shifted: char) -> char {
    if shift { shifted } else { plain }
}

/// Literal character produced by `key`, or `None` for control keys.
pub fn key_to_char(key: LogicalKey, shift: bool) -> Option<char> {
    use LogicalKey::*;
    let c = match key {
        Space => ' ',
        Enter => '\n',
        Tab => '\t',
        A | B | C | D | E | F | G | H | I | J | K | L | M | N | O | P | Q | R | S | T | U
        | V | W | X | Y | Z => {
            let upper = key.name().chars().next()?;
            pick(shift, upper.to_ascii_lowercase(), upper)
        }
        Digit0 | Digit1 | Digit2 | Digit3 | Digit4 | Digit5 | Digit6 | Digit7 | Digit8
        | Digit9 => {
            let digit = key.name().chars().next()?;
            let value = digit.to_digit(10)? as usize;
            pick(shift, digit, SHIFTED_DIGITS[value])
        }
        Comma => pick(shift, ',', '<'),
        Period => pick(shift, '.', '>'),
        Slash => pick(shift, '/', '?'),
        Backslash => pick(shift, '\\', '|'),
        Semicolon => pick(shift, ';', ':'),
        Apostrophe => pick(shift, '\'', '"'),
        BracketLeft => pick(shift, '[', '{'),
        BracketRight => pick(shift, ']', '}'),
        Minus => pick(shift, '-', '_'),
        Equals => pick(shift, '=', '+'),
        Backtick => pick(shift, '`', '~'),
        Shift | Ctrl | Alt | Meta | CapsLock | Home | End | Backspace | Delete | ArrowUp
        | ArrowDown | ArrowLeft | ArrowRight | PageUp | PageDown => return None,
    };
    Some(c)
}

/// Render a pressed-key set as a label: `[] -> ""`, a lone one-char key in
/// lowercase, `Shift` plus a one-char key collapses to that key, otherwise
/// the names joined with `+`.
pub fn convert_keybind(keys: &[LogicalKey]) -> String {
    match keys {
        [] => String::new(),
        [key] if key.name().chars().count() == 1 => key.name().to_lowercase(),
        [LogicalKey::Shift, key] if key.name().chars().count() == 1 => key.name().to_string(),
        _ => keys
            .iter()
            .map(|k| k.name())
            .collect::<Vec<_>>()
            .join("+"),
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct KeyTranslator {
    editing: EditingConfig,
}

impl KeyTranslator {
    pub fn new(editing: EditingConfig) -> Self {
        Self { editing }
    }

    pub fn editing(&self) -> EditingConfig {
        self.editing
    }

    /// Actions for one dispatch tick given the held keys and the subset that
    /// went down this tick.
    pub fn plan_tick(&self, current: &KeySet, newly: &KeySet) -> Vec<Action> {
        if current.is_empty() && newly.is_empty() {
            return Vec::new();
        }
        let mods = current.modifiers();

        if mods.ctrl()
            && let Some(action) = SHORTCUT_KEYS
                .iter()
                .find(|k| newly.contains(**k))
                .and_then(|k| self.shortcut(*k))
        {
            trace!(target: "actions.dispatch", rule = "shortcut", action = action.label());
            return vec![action];
        }
        if let Some(action) = NAV_KEYS
            .iter()
            .find(|k| newly.contains(**k))
            .and_then(|k| self.navigation(*k, mods))
        {
            trace!(target: "actions.dispatch", rule = "navigation", action = action.label());
            return vec![action];
        }
        if let Some(action) = DELETE_KEYS
            .iter()
            .find(|k| newly.contains(**k))
            .and_then(|k| self.deletion(*k, mods))
        {
            trace!(target: "actions.dispatch", rule = "deletion", action = action.label());
            return vec![action];
        }

        let chars: Vec<char> = newly
            .iter()
            .filter(|k| !k.is_modifier() && !NAV_KEYS.contains(k) && !DELETE_KEYS.contains(k))
            .filter_map(|k| key_to_char(k, mods.shift()))
            .collect();
        if chars.is_empty() {
            return Vec::new();
        }
        trace!(target: "actions.dispatch", rule = "insert", chars = chars.len(), batched = self.editing.multi_key_batch_insert);
        if self.editing.multi_key_batch_insert {
            vec![Action::Insert(chars.into_iter().collect())]
        } else {
            chars
                .into_iter()
                .map(|c| Action::Insert(c.to_string()))
                .collect()
        }
    }

    /// Action re-issued by a repeat firing for a still-held `key`, resolved
    /// with the modifiers held at fire time.
    pub fn repeat_action(&self, key: LogicalKey, mods: ModMask) -> Option<Action> {
        match key {
            LogicalKey::Backspace | LogicalKey::Delete => self.deletion(key, mods),
            LogicalKey::ArrowLeft | LogicalKey::ArrowRight => self.navigation(key, mods),
            k if mods.ctrl() && SHORTCUT_KEYS.contains(&k) => self.shortcut(k),
            k => key_to_char(k, mods.shift()).map(|c| Action::Insert(c.to_string())),
        }
    }

    fn shortcut(&self, key: LogicalKey) -> Option<Action> {
        Some(match key {
            LogicalKey::Z => Action::Undo,
            LogicalKey::Y => Action::Redo,
            LogicalKey::A => Action::SelectAll,
            LogicalKey::X => Action::Cut,
            LogicalKey::C => Action::Copy,
            LogicalKey::V => Action::Paste,
            _ => return None,
        })
    }

    fn navigation(&self, key: LogicalKey, mods: ModMask) -> Option<Action> {
        let nav = match key {
            LogicalKey::ArrowLeft => NavKey::Left,
            LogicalKey::ArrowRight => NavKey::Right,
            LogicalKey::Home => NavKey::Home,
            LogicalKey::End => NavKey::End,
            _ => return None,
        };
        // Ctrl+Home/End always jump to the document edges; word jumps are optional.
        let jump = mods.ctrl()
            && (self.editing.word_navigation || matches!(nav, NavKey::Home | NavKey::End));
        Some(Action::Navigate {
            key: nav,
            extend: mods.shift(),
            jump,
        })
    }

    fn deletion(&self, key: LogicalKey, mods: ModMask) -> Option<Action> {
        let direction = match key {
            LogicalKey::Backspace => DeleteDirection::Backward,
            LogicalKey::Delete => DeleteDirection::Forward,
            _ => return None,
        };
        Some(Action::Delete {
            direction,
            word: mods.ctrl() && self.editing.word_navigation,
        })
    }
}
