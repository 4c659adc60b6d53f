//! Logical key vocabulary.
//!
//! The host reports key state for a closed set of logical keys. Every per-key
//! table in the workspace (previous samples, repeat handles, held state) is a
//! fixed-size array indexed by [`LogicalKey::index`], so adding a key is a
//! compile-checked change to the `match` arms in the translator and dispatcher.

use smallvec::SmallVec;
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

macro_rules! logical_keys {
    ($($variant:ident => $name:literal),+ $(,)?) => {
        /// Logical key identity as sampled from the host oracle.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[repr(u8)]
        pub enum LogicalKey {
            $($variant),+
        }

        impl LogicalKey {
            /// Every key, in discriminant order (`ALL[k.index()] == k`).
            pub const ALL: &'static [LogicalKey] = &[$(LogicalKey::$variant),+];

            /// Canonical label used for ordering, parsing and keybind display.
            pub const fn name(self) -> &'static str {
                match self {
                    $(LogicalKey::$variant => $name),+
                }
            }
        }
    };
}

logical_keys! {
    Shift => "Shift",
    Ctrl => "Ctrl",
    Alt => "Alt",
    Meta => "Meta",
    A => "A", B => "B", C => "C", D => "D", E => "E", F => "F", G => "G",
    H => "H", I => "I", J => "J", K => "K", L => "L", M => "M", N => "N",
    O => "O", P => "P", Q => "Q", R => "R", S => "S", T => "T", U => "U",
    V => "V", W => "W", X => "X", Y => "Y", Z => "Z",
    Digit0 => "0", Digit1 => "1", Digit2 => "2", Digit3 => "3", Digit4 => "4",
    Digit5 => "5", Digit6 => "6", Digit7 => "7", Digit8 => "8", Digit9 => "9",
    Enter => "Enter",
    Tab => "Tab",
    CapsLock => "CapsLock",
    Space => "Space",
    Home => "Home",
    End => "End",
    Backspace => "Backspace",
    Delete => "Delete",
    ArrowUp => "ArrowUp",
    ArrowDown => "ArrowDown",
    ArrowLeft => "ArrowLeft",
    ArrowRight => "ArrowRight",
    PageUp => "PageUp",
    PageDown => "PageDown",
    Comma => ",",
    Period => ".",
    Slash => "/",
    Backslash => "\\",
    Semicolon => ";",
    Apostrophe => "'",
    BracketLeft => "[",
    BracketRight => "]",
    Minus => "-",
    Equals => "=",
    Backtick => "`",
}

impl LogicalKey {
    pub const COUNT: usize = Self::ALL.len();

    /// Modifier keys in their fixed precedence order.
    pub const MODIFIERS: [LogicalKey; 4] = [
        LogicalKey::Shift,
        LogicalKey::Ctrl,
        LogicalKey::Alt,
        LogicalKey::Meta,
    ];

    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    pub const fn is_modifier(self) -> bool {
        matches!(
            self,
            LogicalKey::Shift | LogicalKey::Ctrl | LogicalKey::Alt | LogicalKey::Meta
        )
    }

    /// Position within [`Self::MODIFIERS`], `None` for ordinary keys.
    pub const fn modifier_rank(self) -> Option<u8> {
        match self {
            LogicalKey::Shift => Some(0),
            LogicalKey::Ctrl => Some(1),
            LogicalKey::Alt => Some(2),
            LogicalKey::Meta => Some(3),
            _ => None,
        }
    }

    /// Letter key for an ASCII letter of either case.
    pub fn from_letter(c: char) -> Option<Self> {
        if !c.is_ascii_alphabetic() {
            return None;
        }
        let offset = (c.to_ascii_uppercase() as u8 - b'A') as usize;
        Some(Self::ALL[LogicalKey::A.index() + offset])
    }

    /// Digit key for an ASCII digit.
    pub fn from_digit(c: char) -> Option<Self> {
        let value = c.to_digit(10)? as usize;
        Some(Self::ALL[LogicalKey::Digit0.index() + value])
    }

    /// Punctuation key whose unshifted label is `c`.
    pub fn from_punctuation(c: char) -> Option<Self> {
        let key = match c {
            ',' => LogicalKey::Comma,
            '.' => LogicalKey::Period,
            '/' => LogicalKey::Slash,
            '\\' => LogicalKey::Backslash,
            ';' => LogicalKey::Semicolon,
            '\'' => LogicalKey::Apostrophe,
            '[' => LogicalKey::BracketLeft,
            ']' => LogicalKey::BracketRight,
            '-' => LogicalKey::Minus,
            '=' => LogicalKey::Equals,
            '`' => LogicalKey::Backtick,
            _ => return None,
        };
        Some(key)
    }
}

/// Modifiers first (Shift, Ctrl, Alt, Meta), then lexicographic by name.
impl Ord for LogicalKey {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.modifier_rank(), other.modifier_rank()) {
            (Some(a), Some(b)) => a.cmp(&b),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => self.name().cmp(other.name()),
        }
    }
}

impl PartialOrd for LogicalKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for LogicalKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyParseError {
    #[error("empty key name")]
    Empty,
    #[error("unknown key name: {0:?}")]
    Unknown(String),
}

impl FromStr for LogicalKey {
    type Err = KeyParseError;

    /// Accepts canonical names case-insensitively plus a few common aliases
    /// (`Control`, `Return`, `Left`, ...).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            // A lone space is a reasonable way to spell the space bar.
            return if s == " " {
                Ok(LogicalKey::Space)
            } else {
                Err(KeyParseError::Empty)
            };
        }
        if let Some(key) = LogicalKey::ALL
            .iter()
            .copied()
            .find(|k| k.name().eq_ignore_ascii_case(trimmed))
        {
            return Ok(key);
        }
        let alias = match trimmed.to_ascii_lowercase().as_str() {
            "control" => LogicalKey::Ctrl,
            "option" => LogicalKey::Alt,
            "super" | "cmd" | "command" => LogicalKey::Meta,
            "return" => LogicalKey::Enter,
            "left" => LogicalKey::ArrowLeft,
            "right" => LogicalKey::ArrowRight,
            "up" => LogicalKey::ArrowUp,
            "down" => LogicalKey::ArrowDown,
            "del" => LogicalKey::Delete,
            _ => return Err(KeyParseError::Unknown(trimmed.to_string())),
        };
        Ok(alias)
    }
}

bitflags::bitflags! {
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct ModMask: u8 { const SHIFT=1; const CTRL=2; const ALT=4; const META=8; }
}

impl ModMask {
    pub fn from_key(key: LogicalKey) -> Self {
        match key {
            LogicalKey::Shift => ModMask::SHIFT,
            LogicalKey::Ctrl => ModMask::CTRL,
            LogicalKey::Alt => ModMask::ALT,
            LogicalKey::Meta => ModMask::META,
            _ => ModMask::empty(),
        }
    }

    #[inline]
    pub fn shift(self) -> bool {
        self.contains(ModMask::SHIFT)
    }

    #[inline]
    pub fn ctrl(self) -> bool {
        self.contains(ModMask::CTRL)
    }
}

/// Ordered, duplicate-free set of keys (modifiers first, see [`LogicalKey`]'s `Ord`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct KeySet {
    keys: SmallVec<[LogicalKey; 8]>,
}

impl KeySet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, key: LogicalKey) -> bool {
        self.keys.binary_search(&key).is_ok()
    }

    pub fn insert(&mut self, key: LogicalKey) {
        if let Err(at) = self.keys.binary_search(&key) {
            self.keys.insert(at, key);
        }
    }

    /// Returns whether the key was present.
    pub fn remove(&mut self, key: LogicalKey) -> bool {
        match self.keys.binary_search(&key) {
            Ok(at) => {
                self.keys.remove(at);
                true
            }
            Err(_) => false,
        }
    }

    pub fn as_slice(&self) -> &[LogicalKey] {
        &self.keys
    }

    pub fn iter(&self) -> impl Iterator<Item = LogicalKey> + '_ {
        self.keys.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Modifier state implied by the held modifier keys.
    pub fn modifiers(&self) -> ModMask {
        self.iter()
            .take_while(|k| k.is_modifier())
            .fold(ModMask::empty(), |acc, k| acc | ModMask::from_key(k))
    }

    /// Keys in `self` that are absent from `other`, order preserved.
    pub fn difference(&self, other: &KeySet) -> KeySet {
        KeySet {
            keys: self.iter().filter(|k| !other.contains(*k)).collect(),
        }
    }
}

impl FromIterator<LogicalKey> for KeySet {
    fn from_iter<I: IntoIterator<Item = LogicalKey>>(iter: I) -> Self {
        let mut keys: SmallVec<[LogicalKey; 8]> = iter.into_iter().collect();
        keys.sort_unstable();
        keys.dedup();
        Self { keys }
    }
}

impl<'a> IntoIterator for &'a KeySet {
    type Item = &'a LogicalKey;
    type IntoIter = std::slice::Iter<'a, LogicalKey>;

    fn into_iter(self) -> Self::IntoIter {
        self.keys.iter()
    }
}
