//! Key mapping for console input
//!
//! Converts host key events to the bytes a serial console would deliver.
//! Only 7-bit ASCII is produced.

use bitflags::bitflags;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::core::term::TermFlags;

/// Ctrl+] ends an interactive session
pub const QUIT_BYTE: u8 = 0x1D;

bitflags! {
    /// Modifier keys
    #[derive(Clone, Copy, Debug, Default, PartialEq)]
    pub struct Modifiers: u8 {
        const SHIFT = 0b0001;
        const CTRL  = 0b0010;
        const ALT   = 0b0100;
    }
}

impl From<KeyModifiers> for Modifiers {
    fn from(mods: KeyModifiers) -> Self {
        let mut result = Modifiers::empty();
        if mods.contains(KeyModifiers::SHIFT) {
            result |= Modifiers::SHIFT;
        }
        if mods.contains(KeyModifiers::CONTROL) {
            result |= Modifiers::CTRL;
        }
        if mods.contains(KeyModifiers::ALT) {
            result |= Modifiers::ALT;
        }
        result
    }
}

/// Key mapper for converting key events to bytes
pub struct KeyMapper;

impl KeyMapper {
    /// Map a key event; `None` for keys with no ASCII encoding.
    ///
    /// Enter sends CR LF, or only LF when the terminal is in newline mode.
    pub fn map(event: &KeyEvent, flags: TermFlags) -> Option<Vec<u8>> {
        let mods = Modifiers::from(event.modifiers);

        match event.code {
            KeyCode::Char(ch) => Self::map_char(ch, mods),
            KeyCode::Enter => {
                if flags.contains(TermFlags::NEWLINE) {
                    Some(vec![0x0A])
                } else {
                    Some(vec![0x0D, 0x0A])
                }
            }
            KeyCode::Backspace => Some(vec![0x08]),
            KeyCode::Tab => Some(vec![0x09]),
            KeyCode::Esc => Some(vec![0x1B]),
            KeyCode::Up => Some(b"\x1b[A".to_vec()),
            KeyCode::Down => Some(b"\x1b[B".to_vec()),
            KeyCode::Right => Some(b"\x1b[C".to_vec()),
            KeyCode::Left => Some(b"\x1b[D".to_vec()),
            KeyCode::Home => Some(b"\x1b[H".to_vec()),
            KeyCode::Delete => Some(vec![0x7F]),
            _ => None,
        }
    }

    /// Map a character with modifiers
    fn map_char(ch: char, mods: Modifiers) -> Option<Vec<u8>> {
        if !ch.is_ascii() {
            return None;
        }
        let byte = ch as u8;

        if mods.contains(Modifiers::CTRL) {
            let code = match byte {
                b'a'..=b'z' => byte - b'a' + 1,
                b'A'..=b'Z' => byte - b'A' + 1,
                b'@' | b'`' | b' ' => 0x00,
                b'[' => 0x1B,
                b'\\' => 0x1C,
                b']' => 0x1D,
                b'^' | b'~' => 0x1E,
                b'_' | b'?' => 0x1F,
                _ => byte,
            };
            return Some(if mods.contains(Modifiers::ALT) {
                vec![0x1B, code]
            } else {
                vec![code]
            });
        }

        if mods.contains(Modifiers::ALT) {
            return Some(vec![0x1B, byte]);
        }

        Some(vec![byte])
    }
}
