use std::io;

use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use futures::{Stream, StreamExt};

use crate::core::action::Key;
use crate::core::channel::{Wake, WakeReceiver};

/// TUI-specific input events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TuiEvent {
    Key(Key),
    /// Viewport changed size; redraw from current state.
    Resize,
    /// Key releases, focus changes, mouse, paste.
    Ignored,
}

/// Whichever source became ready first in `wait_any`.
#[derive(Debug)]
pub enum Ready {
    Terminal(Event),
    Wake,
    /// Keystroke stream ended or failed; nothing more can be typed.
    InputClosed(Option<io::Error>),
    /// The worker dropped its wake sender (it has exited).
    WorkerGone,
}

/// Block until a terminal event or a wake signal is available.
///
/// Terminal events take priority so typing stays responsive while responses
/// stream in. No timeout: this only returns when something happened.
pub async fn wait_any<S>(events: &mut S, wake: &mut WakeReceiver) -> Ready
where
    S: Stream<Item = io::Result<Event>> + Unpin,
{
    tokio::select! {
        biased;
        maybe_event = events.next() => match maybe_event {
            Some(Ok(event)) => Ready::Terminal(event),
            Some(Err(e)) => Ready::InputClosed(Some(e)),
            None => Ready::InputClosed(None),
        },
        signal = wake.wait() => match signal {
            Wake::Signalled => Ready::Wake,
            Wake::Disconnected => Ready::WorkerGone,
        },
    }
}

pub fn map_event(event: &Event) -> TuiEvent {
    match event {
        Event::Key(key_event) => map_key_event(key_event),
        Event::Resize(_, _) => TuiEvent::Resize,
        _ => TuiEvent::Ignored,
    }
}

fn map_key_event(key_event: &KeyEvent) -> TuiEvent {
    if key_event.kind == KeyEventKind::Release {
        return TuiEvent::Ignored;
    }
    log::debug!(
        "Key event: {:?} with modifiers {:?}",
        key_event.code,
        key_event.modifiers
    );
    let key = match (key_event.modifiers, key_event.code) {
        (m, KeyCode::Char('c')) if m.contains(KeyModifiers::CONTROL) => Key::Interrupt,
        // Ctrl+H is the ASCII backspace byte
        (m, KeyCode::Char('h')) if m.contains(KeyModifiers::CONTROL) => Key::Backspace,
        (m, KeyCode::Char(_)) if m.contains(KeyModifiers::CONTROL) => Key::Other,
        (_, KeyCode::Char(c)) => Key::from_char(c),
        (_, KeyCode::Enter) => Key::Enter,
        (_, KeyCode::Backspace | KeyCode::Delete) => Key::Backspace,
        _ => Key::Other,
    };
    TuiEvent::Key(key)
}
