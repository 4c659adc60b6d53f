//! Action model, key translation and dispatch.
//!
//! Key state (from the edge detector or a repeat firing) is first turned into
//! [`Action`]s by [`KeyTranslator`]; [`dispatch`] then applies each action to
//! `EditorState`. Ticks and repeat timers share this single path, so there is
//! exactly one place where key input mutates the buffer.

pub mod dispatcher;
pub mod key_translator;

pub use dispatcher::{DispatchResult, dispatch};
pub use key_translator::{KeyTranslator, convert_keybind, key_to_char};

/// Navigation keys handled by the dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NavKey {
    Left,
    Right,
    Home,
    End,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeleteDirection {
    Backward,
    Forward,
}

/// Editing action produced from key input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Undo,
    Redo,
    SelectAll,
    Cut,
    Copy,
    Paste,
    /// `extend`: Shift held (grow the selection). `jump`: Ctrl held (word or
    /// document motion instead of one unit / line edge).
    Navigate {
        key: NavKey,
        extend: bool,
        jump: bool,
    },
    Delete {
        direction: DeleteDirection,
        word: bool,
    },
    /// Literal text; replaces an active selection.
    Insert(String),
    Clear,
}

impl Action {
    /// Short stable label for logs (never includes inserted text).
    pub fn label(&self) -> &'static str {
        match self {
            Action::Undo => "undo",
            Action::Redo => "redo",
            Action::SelectAll => "select_all",
            Action::Cut => "cut",
            Action::Copy => "copy",
            Action::Paste => "paste",
            Action::Navigate { .. } => "navigate",
            Action::Delete { .. } => "delete",
            Action::Insert(_) => "insert",
            Action::Clear => "clear",
        }
    }
}

/// Observer hook invoked for every dispatched action.
pub trait ActionObserver: Send {
    fn on_action(&self, action: &Action);
}
