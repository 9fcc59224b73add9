use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

/// Terminal input the app reacts to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TermEvent {
    Key(KeyEvent),
    /// The window changed size; redraw
    Resize,
}

/// Wait up to `timeout` for terminal input
pub fn poll_event(timeout: Duration) -> Option<TermEvent> {
    if !event::poll(timeout).ok()? {
        return None;
    }
    match event::read().ok()? {
        // Ignore key release events on some terminals
        Event::Key(key) if key.kind == KeyEventKind::Press => Some(TermEvent::Key(key)),
        Event::Resize(_, _) => Some(TermEvent::Resize),
        _ => None,
    }
}

/// Key event helper methods
pub trait KeyEventExt {
    /// Keys that always quit, even before bindings are loaded
    fn is_quit(&self) -> bool;
}

impl KeyEventExt for KeyEvent {
    fn is_quit(&self) -> bool {
        matches!(
            (self.code, self.modifiers),
            (KeyCode::Char('q'), KeyModifiers::NONE) | (KeyCode::Char('c'), KeyModifiers::CONTROL)
        )
    }
}
