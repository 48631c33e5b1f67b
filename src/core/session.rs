//! Session management
//!
//! Pairs a terminal with a console input source. Output goes straight to the
//! terminal; input reads take care of the blinking cursor.

use std::io;

use thiserror::Error;

use super::adapter::{VideoAdapter, CURSOR_BLINK_BIT};
use super::term::{AnsiTerm, TermFlags};

#[derive(Error, Debug)]
pub enum ConsoleError {
    #[error("Console input closed")]
    Closed,

    #[error("Failed to read from console: {0}")]
    Read(#[source] io::Error),
}

/// Character input source
pub trait Console {
    /// Block until a byte is available
    fn read_byte(&mut self) -> Result<u8, ConsoleError>;

    /// Whether `read_byte` would return without blocking
    fn byte_ready(&mut self) -> bool;
}

/// A terminal together with its input console
pub struct Session<A: VideoAdapter, C: Console> {
    term: AnsiTerm<A>,
    console: C,
}

impl<A: VideoAdapter, C: Console> Session<A, C> {
    pub fn new(term: AnsiTerm<A>, console: C) -> Self {
        Self { term, console }
    }

    pub fn term(&self) -> &AnsiTerm<A> {
        &self.term
    }

    pub fn term_mut(&mut self) -> &mut AnsiTerm<A> {
        &mut self.term
    }

    pub fn console_mut(&mut self) -> &mut C {
        &mut self.console
    }

    /// Feed output bytes to the terminal
    pub fn feed_bytes(&mut self, bytes: &[u8]) {
        self.term.put_bytes(bytes);
    }

    pub fn put_char(&mut self, byte: u8) {
        self.term.put_char(byte);
    }

    /// Read one input byte with the cursor hidden
    pub fn read_char_with_cursor(&mut self) -> Result<u8, ConsoleError> {
        self.term.erase_cursor();
        self.console.read_byte()
    }

    /// Poll for input, blinking the cursor while none is pending.
    ///
    /// Call repeatedly while idle. Any pending deferred wrap is resolved
    /// first so the cursor shows where the next glyph will go.
    pub fn check_char_with_cursor(&mut self) -> bool {
        self.term.resolve_deferred_wrap();
        let ready = self.console.byte_ready();
        let hidden = self.term.flags().contains(TermFlags::HIDE_CURSOR);
        let blink_on = self.term.adapter_mut().timer() & CURSOR_BLINK_BIT != 0;

        if !hidden && !ready && blink_on {
            self.term.draw_cursor();
        } else {
            self.term.erase_cursor();
        }
        ready
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TermConfig;
    use crate::core::sim::{MemAdapter, ScriptConsole};

    fn session() -> Session<MemAdapter, ScriptConsole> {
        let term = AnsiTerm::with_adapter(MemAdapter::new(), &TermConfig::default());
        Session::new(term, ScriptConsole::new())
    }

    #[test]
    fn test_blink_phase() {
        let mut session = session();
        session.term_mut().adapter_mut().set_timer(0x0400);
        assert!(!session.check_char_with_cursor());
        assert!(!session.term().is_cursor_drawn());

        session.term_mut().adapter_mut().set_timer(0x0800);
        session.check_char_with_cursor();
        assert!(session.term().is_cursor_drawn());
        assert_eq!(session.term().adapter().cell(0), 0x2020);

        session.term_mut().adapter_mut().set_timer(0x1000);
        session.check_char_with_cursor();
        assert!(!session.term().is_cursor_drawn());
        assert_eq!(session.term().adapter().cell(0), 0x0220);
    }

    #[test]
    fn test_hidden_cursor_never_drawn() {
        let mut session = session();
        session.feed_bytes(b"\x1b[?25l");
        session.term_mut().adapter_mut().set_timer(0x0800);
        session.check_char_with_cursor();
        assert!(!session.term().is_cursor_drawn());
    }

    #[test]
    fn test_pending_input_hides_cursor() {
        let mut session = session();
        session.term_mut().adapter_mut().set_timer(0x0800);
        session.check_char_with_cursor();
        assert!(session.term().is_cursor_drawn());

        session.console_mut().push(b"k");
        assert!(session.check_char_with_cursor());
        assert!(!session.term().is_cursor_drawn());
        assert_eq!(session.read_char_with_cursor().unwrap(), b'k');
    }

    #[test]
    fn test_read_erases_cursor() {
        let mut session = session();
        session.feed_bytes(b"z\x08");
        session.term_mut().adapter_mut().set_timer(0x0FFF);
        session.check_char_with_cursor();
        assert!(session.term().is_cursor_drawn());

        assert!(matches!(session.read_char_with_cursor(), Err(ConsoleError::Closed)));
        assert!(!session.term().is_cursor_drawn());
        assert_eq!(session.term().adapter().cell(0), 0x027A);
    }

    #[test]
    fn test_poll_resolves_deferred_wrap() {
        let mut session = session();
        session.feed_bytes(b"\x1b[30;80H!");
        assert!(session.term().state().lcf);

        session.check_char_with_cursor();
        let state = session.term().state();
        assert!(!state.lcf);
        assert_eq!(state.cursor_addr, 29 * 80);
        assert_eq!(session.term().adapter().cell(28 * 80 + 79) & 0xFF, b'!' as u16);
    }
}
