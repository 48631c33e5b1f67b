//! Keyboard console
//!
//! Reads crossterm key events from the host terminal and hands them to the
//! emulator one byte at a time.

use std::collections::VecDeque;
use std::time::Duration;

use crossterm::event::{self, Event, KeyEvent, KeyEventKind};

use super::keymapper::KeyMapper;
use crate::core::session::{Console, ConsoleError};
use crate::core::term::TermFlags;

/// Console input from the host keyboard (raw mode required)
#[derive(Debug, Default)]
pub struct KeyboardConsole {
    pending: VecDeque<u8>,
    /// Terminal flags used to encode Enter
    flags: TermFlags,
}

impl KeyboardConsole {
    pub fn new() -> Self {
        Self::default()
    }

    /// Update the terminal flags that influence key encoding
    pub fn set_flags(&mut self, flags: TermFlags) {
        self.flags = flags;
    }

    fn queue_key(&mut self, key: &KeyEvent) {
        if key.kind != KeyEventKind::Press {
            return;
        }
        if let Some(bytes) = KeyMapper::map(key, self.flags) {
            self.pending.extend(bytes);
        }
    }
}

impl Console for KeyboardConsole {
    fn read_byte(&mut self) -> Result<u8, ConsoleError> {
        loop {
            if let Some(byte) = self.pending.pop_front() {
                return Ok(byte);
            }
            if let Event::Key(key) = event::read().map_err(ConsoleError::Read)? {
                self.queue_key(&key);
            }
        }
    }

    fn byte_ready(&mut self) -> bool {
        while self.pending.is_empty() {
            match event::poll(Duration::ZERO) {
                Ok(true) => {}
                _ => return false,
            }
            match event::read() {
                Ok(Event::Key(key)) => self.queue_key(&key),
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!("Keyboard read failed: {}", e);
                    return false;
                }
            }
        }
        true
    }
}
