use core_events::{Event, InputEvent, LogicalKey, ModMask};
use crossterm::event::{
    KeyCode as CKeyCode, KeyEvent as CKeyEvent, KeyEventKind as CKeyEventKind,
    KeyModifiers as CKeyModifiers, ModifierKeyCode,
};
use smallvec::SmallVec;

/// Meaning of a terminal key code for the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum KeyMapping {
    /// Host-level control (Esc quits, F2 requests a reset); never reaches the editor.
    Control(Event),
    /// A logical key. `shifted` is set when the reported character itself
    /// implies Shift (`'A'`, `'!'`), which terminals may not flag.
    Key { key: LogicalKey, shifted: bool },
}

/// Shifted symbols and the key that produces them on a US layout.
const SHIFTED_SYMBOLS: [(char, LogicalKey); 21] = [
    ('!', LogicalKey::Digit1),
    ('@', LogicalKey::Digit2),
    ('#', LogicalKey::Digit3),
    ('$', LogicalKey::Digit4),
    ('%', LogicalKey::Digit5),
    ('^', LogicalKey::Digit6),
    ('&', LogicalKey::Digit7),
    ('*', LogicalKey::Digit8),
    ('(', LogicalKey::Digit9),
    (')', LogicalKey::Digit0),
    ('<', LogicalKey::Comma),
    ('>', LogicalKey::Period),
    ('?', LogicalKey::Slash),
    ('|', LogicalKey::Backslash),
    (':', LogicalKey::Semicolon),
    ('"', LogicalKey::Apostrophe),
    ('{', LogicalKey::BracketLeft),
    ('}', LogicalKey::BracketRight),
    ('_', LogicalKey::Minus),
    ('+', LogicalKey::Equals),
    ('~', LogicalKey::Backtick),
];

/// Key (and implied Shift) that types `c`.
pub(crate) fn map_char(c: char) -> Option<(LogicalKey, bool)> {
    if c == ' ' {
        return Some((LogicalKey::Space, false));
    }
    if let Some(key) = LogicalKey::from_letter(c) {
        return Some((key, c.is_ascii_uppercase()));
    }
    if let Some(key) = LogicalKey::from_digit(c).or_else(|| LogicalKey::from_punctuation(c)) {
        return Some((key, false));
    }
    SHIFTED_SYMBOLS
        .iter()
        .find(|(sym, _)| *sym == c)
        .map(|(_, key)| (*key, true))
}

pub(crate) fn map_key_code(code: &CKeyCode) -> Option<KeyMapping> {
    let key = match code {
        CKeyCode::Char(c) => {
            let (key, shifted) = map_char(*c)?;
            return Some(KeyMapping::Key { key, shifted });
        }
        CKeyCode::Esc => return Some(KeyMapping::Control(Event::Shutdown)),
        CKeyCode::F(2) => return Some(KeyMapping::Control(Event::ResetRequested)),
        CKeyCode::Enter => LogicalKey::Enter,
        CKeyCode::Backspace => LogicalKey::Backspace,
        CKeyCode::Tab | CKeyCode::BackTab => LogicalKey::Tab,
        CKeyCode::Up => LogicalKey::ArrowUp,
        CKeyCode::Down => LogicalKey::ArrowDown,
        CKeyCode::Left => LogicalKey::ArrowLeft,
        CKeyCode::Right => LogicalKey::ArrowRight,
        CKeyCode::Home => LogicalKey::Home,
        CKeyCode::End => LogicalKey::End,
        CKeyCode::PageUp => LogicalKey::PageUp,
        CKeyCode::PageDown => LogicalKey::PageDown,
        CKeyCode::Delete => LogicalKey::Delete,
        CKeyCode::CapsLock => LogicalKey::CapsLock,
        CKeyCode::Modifier(m) => map_modifier_key(*m)?,
        CKeyCode::Insert
        | CKeyCode::F(_)
        | CKeyCode::Null
        | CKeyCode::ScrollLock
        | CKeyCode::NumLock
        | CKeyCode::PrintScreen
        | CKeyCode::Pause
        | CKeyCode::Menu
        | CKeyCode::KeypadBegin
        | CKeyCode::Media(_) => return None,
    };
    Some(KeyMapping::Key {
        key,
        shifted: false,
    })
}

fn map_modifier_key(code: ModifierKeyCode) -> Option<LogicalKey> {
    let key = match code {
        ModifierKeyCode::LeftShift | ModifierKeyCode::RightShift => LogicalKey::Shift,
        ModifierKeyCode::LeftControl | ModifierKeyCode::RightControl => LogicalKey::Ctrl,
        ModifierKeyCode::LeftAlt | ModifierKeyCode::RightAlt => LogicalKey::Alt,
        ModifierKeyCode::LeftSuper
        | ModifierKeyCode::RightSuper
        | ModifierKeyCode::LeftMeta
        | ModifierKeyCode::RightMeta
        | ModifierKeyCode::LeftHyper
        | ModifierKeyCode::RightHyper => LogicalKey::Meta,
        ModifierKeyCode::IsoLevel3Shift | ModifierKeyCode::IsoLevel5Shift => return None,
    };
    Some(key)
}

/// Convert crossterm modifier flags into `ModMask` bits.
pub(crate) fn map_mod_mask(mods: CKeyModifiers) -> ModMask {
    let mut out = ModMask::empty();
    if mods.contains(CKeyModifiers::CONTROL) {
        out |= ModMask::CTRL;
    }
    if mods.contains(CKeyModifiers::ALT) {
        out |= ModMask::ALT;
    }
    if mods.contains(CKeyModifiers::SHIFT) {
        out |= ModMask::SHIFT;
    }
    if mods.intersects(CKeyModifiers::SUPER | CKeyModifiers::META | CKeyModifiers::HYPER) {
        out |= ModMask::META;
    }
    out
}

/// Key transitions implied by one terminal key event.
///
/// With release reporting, a press re-asserts the modifier state carried on
/// the event (down for present, up for absent) before the key itself, which
/// keeps modifiers correct even if a modifier release was missed. Without
/// release reporting, the key and its modifiers are tapped.
pub(crate) fn key_transitions(
    event: &CKeyEvent,
    release_events: bool,
) -> SmallVec<[InputEvent; 6]> {
    let mut out = SmallVec::new();
    let Some(KeyMapping::Key { key, shifted }) = map_key_code(&event.code) else {
        return out;
    };
    let mut mods = map_mod_mask(event.modifiers);
    if shifted {
        mods |= ModMask::SHIFT;
    }
    match event.kind {
        CKeyEventKind::Release => out.push(InputEvent::KeyUp(key)),
        CKeyEventKind::Press | CKeyEventKind::Repeat if release_events => {
            if !key.is_modifier() {
                for m in LogicalKey::MODIFIERS {
                    out.push(if mods.contains(ModMask::from_key(m)) {
                        InputEvent::KeyDown(m)
                    } else {
                        InputEvent::KeyUp(m)
                    });
                }
            }
            out.push(InputEvent::KeyDown(key));
        }
        CKeyEventKind::Press | CKeyEventKind::Repeat => {
            for m in LogicalKey::MODIFIERS {
                if mods.contains(ModMask::from_key(m)) {
                    out.push(InputEvent::KeyTap(m));
                }
            }
            out.push(InputEvent::KeyTap(key));
        }
    }
    out
}

/// Host control event for a press, if the key is reserved for the host.
pub(crate) fn control_event(event: &CKeyEvent) -> Option<Event> {
    if !matches!(event.kind, CKeyEventKind::Press) {
        return None;
    }
    match map_key_code(&event.code)? {
        KeyMapping::Control(ev) => Some(ev),
        KeyMapping::Key { .. } => None,
    }
}
