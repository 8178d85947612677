use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use meteo_core::{FocusState, Key, SearchController, SearchState};
use ratatui::DefaultTerminal;
use tokio::sync::watch;

use crate::tui::events::{KeySubscription, TermEvent};
use crate::tui::ui;

enum Step {
    Input(Option<TermEvent>),
    StateChanged(bool),
}

pub struct App {
    controller: SearchController,
    state_rx: watch::Receiver<SearchState>,

    /// Text in the search field, ahead of what the controller has committed.
    pub input: String,
    pub focus: FocusState,
    pub should_quit: bool,
}

impl App {
    pub fn new(controller: SearchController) -> Self {
        let state_rx = controller.subscribe();
        let input = state_rx.borrow().query_text.clone();

        Self {
            controller,
            state_rx,
            input,
            focus: FocusState::default(),
            should_quit: false,
        }
    }

    pub async fn run(&mut self, terminal: &mut DefaultTerminal) -> Result<()> {
        let mut keys = KeySubscription::acquire()?;

        // Same as mounting the view: look up whatever was saved last time.
        tokio::spawn(self.controller.start().run());

        loop {
            let state = self.state_rx.borrow_and_update().clone();
            terminal.draw(|frame| ui::draw(frame, self, &state))?;

            let step = tokio::select! {
                event = keys.next() => Step::Input(event),
                changed = self.state_rx.changed() => Step::StateChanged(changed.is_ok()),
            };

            match step {
                Step::Input(Some(TermEvent::Key(key))) => self.handle_key(key),
                Step::Input(Some(TermEvent::Resize)) => {}
                Step::Input(None) | Step::StateChanged(false) => break,
                Step::StateChanged(true) => {}
            }

            if self.should_quit {
                break;
            }
        }

        self.controller.cancel_pending();
        Ok(())
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        if key.modifiers.contains(KeyModifiers::CONTROL)
            && matches!(key.code, KeyCode::Char('c') | KeyCode::Char('q'))
        {
            self.should_quit = true;
            return;
        }

        let key = to_key(key.code);
        if self.focus.on_key_press(key) {
            return;
        }

        match key {
            Key::Tab => self.focus.toggle(),
            Key::Esc if self.focus.is_search_focused() => {
                self.controller.cancel_pending();
                self.focus.blur();
            }
            Key::Esc | Key::Char('q') if !self.focus.is_search_focused() => {
                self.should_quit = true;
            }
            Key::Char(c) if self.focus.is_search_focused() => {
                self.input.push(c);
                self.query_changed();
            }
            Key::Backspace if self.focus.is_search_focused() => {
                if self.input.pop().is_some() {
                    self.query_changed();
                }
            }
            _ => {}
        }
    }

    fn query_changed(&self) {
        if let Some(lookup) = self.controller.commit_query(&self.input) {
            tokio::spawn(lookup.run());
        }
    }
}

fn to_key(code: KeyCode) -> Key {
    match code {
        KeyCode::Enter => Key::Enter,
        KeyCode::Tab | KeyCode::BackTab => Key::Tab,
        KeyCode::Esc => Key::Esc,
        KeyCode::Backspace => Key::Backspace,
        KeyCode::Char(c) => Key::Char(c),
        _ => Key::Other,
    }
}
