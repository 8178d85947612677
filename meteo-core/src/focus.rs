//! Focus handling for the "press Enter anywhere to search" shortcut.

/// Which part of the view receives typed input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Focus {
    #[default]
    SearchField,
    Forecast,
}

/// Front-end independent key, translated from the terminal's key events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Enter,
    Tab,
    Esc,
    Backspace,
    Char(char),
    Other,
}

#[derive(Debug, Clone, Default)]
pub struct FocusState {
    focus: Focus,
}

impl FocusState {
    pub fn new(focus: Focus) -> Self {
        Self { focus }
    }

    pub fn current(&self) -> Focus {
        self.focus
    }

    pub fn is_search_focused(&self) -> bool {
        self.focus == Focus::SearchField
    }

    pub fn blur(&mut self) {
        self.focus = Focus::Forecast;
    }

    pub fn toggle(&mut self) {
        self.focus = match self.focus {
            Focus::SearchField => Focus::Forecast,
            Focus::Forecast => Focus::SearchField,
        };
    }

    /// Global shortcut: Enter outside the search field focuses it.
    ///
    /// Returns `true` when the key was consumed by a focus change.
    pub fn on_key_press(&mut self, key: Key) -> bool {
        if key == Key::Enter && self.focus != Focus::SearchField {
            tracing::trace!("enter pressed outside search field, focusing it");
            self.focus = Focus::SearchField;
            return true;
        }
        false
    }
}
