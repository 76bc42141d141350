//! # Actions
//!
//! Every keystroke becomes a `Key`. The `update()` function applies it to the
//! `Session` and returns an `Effect` for the caller to carry out. No I/O here.
//!
//! ```text
//! Session + Key  →  update()  →  Session' + Effect
//! ```
//!
//! | Key                  | Effect                                      |
//! |----------------------|---------------------------------------------|
//! | Ctrl+C (byte 3)      | `Quit`                                      |
//! | Enter (`\r`)         | `Submit(input_line)`, input cleared         |
//! | Backspace (127, `\b`)| drop last char, no-op when empty            |
//! | `"`                  | `scroll_offset -= 1` (towards newest)       |
//! | `'`                  | `scroll_offset += 1` (reveals older lines)  |
//! | printable char       | appended while under capacity               |

use log::debug;

use crate::core::channel::FetchRequest;
use crate::core::state::Session;

/// A keystroke, independent of the terminal library that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Interrupt,
    Enter,
    Backspace,
    /// Hide one more line at the bottom, revealing older content.
    ScrollOlder,
    /// Show one more line at the bottom, towards the newest content.
    ScrollNewer,
    Char(char),
    /// Anything without a meaning here (other control keys, arrows, ...).
    Other,
}

impl Key {
    /// Decode one raw byte as typed on a terminal in raw mode.
    pub fn from_byte(byte: u8) -> Self {
        match byte {
            3 => Key::Interrupt,
            b'\r' => Key::Enter,
            127 | 0x08 => Key::Backspace,
            b'"' => Key::ScrollNewer,
            b'\'' => Key::ScrollOlder,
            b if b.is_ascii_graphic() || b == b' ' => Key::Char(b as char),
            _ => Key::Other,
        }
    }

    /// Classify a decoded character (quote characters become scroll keys).
    pub fn from_char(c: char) -> Self {
        match c {
            '"' => Key::ScrollNewer,
            '\'' => Key::ScrollOlder,
            c if c.is_control() => Key::Other,
            c => Key::Char(c),
        }
    }
}

/// What the caller must do after `update()`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    None,
    Submit(FetchRequest),
    Quit,
}

pub fn update(session: &mut Session, key: Key) -> Effect {
    match key {
        Key::Interrupt => Effect::Quit,
        Key::Enter => {
            let url = std::mem::take(&mut session.input_line);
            debug!("Input submitted: {:?}", url);
            Effect::Submit(FetchRequest::new(url))
        }
        Key::Backspace => {
            session.input_line.pop();
            Effect::None
        }
        Key::ScrollNewer => {
            session.scroll_offset -= 1;
            Effect::None
        }
        Key::ScrollOlder => {
            session.scroll_offset += 1;
            Effect::None
        }
        Key::Char(c) => {
            if session.input_len() < session.input_capacity {
                session.input_line.push(c);
            }
            Effect::None
        }
        Key::Other => Effect::None,
    }
}
