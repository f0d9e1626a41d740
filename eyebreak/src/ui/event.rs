//! Keyboard input and redraw events for the UI loop.

use crossterm::event::{self, Event as CrosstermEvent, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use std::time::Duration;
use tokio::sync::mpsc;

/// Terminal events forwarded from the input thread.
#[derive(Debug)]
pub enum Event {
    Key(KeyEvent),
    Resize,
    /// Poll timeout; lets the loop refresh the "next reminder" line.
    Redraw,
}

/// Reads terminal input on a dedicated OS thread and forwards it to the UI loop.
pub struct EventHandler {
    rx: mpsc::UnboundedReceiver<Event>,
}

impl EventHandler {
    pub fn new(redraw_rate: Duration) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();

        std::thread::Builder::new()
            .name("ui-input".into())
            .spawn(move || loop {
                let ready = match event::poll(redraw_rate) {
                    Ok(ready) => ready,
                    Err(e) => {
                        // The tty is gone; dropping `tx` ends the UI loop.
                        log::error!("[ui] Terminal input failed: {e}");
                        break;
                    }
                };
                let evt = if ready {
                    match event::read() {
                        Ok(CrosstermEvent::Key(key)) if key.kind == KeyEventKind::Press => {
                            Event::Key(key)
                        }
                        Ok(CrosstermEvent::Resize(..)) => Event::Resize,
                        _ => continue,
                    }
                } else {
                    Event::Redraw
                };
                if tx.send(evt).is_err() {
                    break;
                }
            })
            .map(|_| ())
            .unwrap_or_else(|e| log::error!("[ui] Failed to spawn input thread: {e}"));

        Self { rx }
    }

    /// Receive the next event. `None` once the input thread is gone.
    pub async fn next(&mut self) -> Option<Event> {
        self.rx.recv().await
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    None,
    Start,
    Pause,
    AddToStartup,
    RemoveFromStartup,
    /// Defer the open reminder by the early-remind interval.
    RemindLater,
    /// Close the open reminder without deferring.
    CloseReminder,
    Quit,
}

/// Maps a key press to an action. While a reminder is open only the dialog's
/// own keys (and Ctrl+C) are live.
pub fn map_key_event(key: KeyEvent, reminder_open: bool) -> KeyAction {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return KeyAction::Quit;
    }

    if reminder_open {
        return match key.code {
            KeyCode::Char('l') | KeyCode::Char('L') => KeyAction::RemindLater,
            KeyCode::Esc => KeyAction::CloseReminder,
            _ => KeyAction::None,
        };
    }

    match key.code {
        KeyCode::Char('s') => KeyAction::Start,
        KeyCode::Char('p') => KeyAction::Pause,
        KeyCode::Char('a') => KeyAction::AddToStartup,
        KeyCode::Char('r') => KeyAction::RemoveFromStartup,
        KeyCode::Char('q') | KeyCode::Esc => KeyAction::Quit,
        _ => KeyAction::None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn main_window_keys() {
        assert_eq!(map_key_event(key(KeyCode::Char('s')), false), KeyAction::Start);
        assert_eq!(map_key_event(key(KeyCode::Char('p')), false), KeyAction::Pause);
        assert_eq!(map_key_event(key(KeyCode::Char('a')), false), KeyAction::AddToStartup);
        assert_eq!(map_key_event(key(KeyCode::Char('r')), false), KeyAction::RemoveFromStartup);
        assert_eq!(map_key_event(key(KeyCode::Char('q')), false), KeyAction::Quit);
        assert_eq!(map_key_event(key(KeyCode::Char('x')), false), KeyAction::None);
    }

    #[test]
    fn dialog_keys_only_while_reminder_open() {
        assert_eq!(map_key_event(key(KeyCode::Char('l')), true), KeyAction::RemindLater);
        assert_eq!(map_key_event(key(KeyCode::Esc), true), KeyAction::CloseReminder);
        assert_eq!(map_key_event(key(KeyCode::Char('l')), false), KeyAction::None);
    }

    #[test]
    fn main_window_keys_are_blocked_by_the_dialog() {
        for c in ['s', 'p', 'a', 'r', 'q'] {
            assert_eq!(map_key_event(key(KeyCode::Char(c)), true), KeyAction::None);
        }
    }

    #[test]
    fn ctrl_c_always_quits() {
        let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(map_key_event(ctrl_c, false), KeyAction::Quit);
        assert_eq!(map_key_event(ctrl_c, true), KeyAction::Quit);
    }
}
