/// Single-slot clipboard; last write wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Clipboard {
    text: String,
}

impl Clipboard {
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn set<S: Into<String>>(&mut self, text: S) {
        self.text = text.into();
    }
}
