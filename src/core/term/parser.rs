//! Byte dispatcher and escape sequence parser
//!
//! Only single-byte ESC sequences are supported. CSI sequences collect up to
//! 16 numeric parameters, one intermediate byte (or private marker) and a
//! final byte in 0x40-0x7E.

use tracing::{debug, trace};

use super::state::{ParserState, TermFlags, MAX_CSI_PARAMS};
use super::AnsiTerm;
use crate::core::adapter::VideoAdapter;

const ESC: u8 = 0x1B;
const CSI_8BIT: u8 = 0x9B;
const CAN: u8 = 0x18;
const SUB: u8 = 0x1A;
const DEL: u8 = 0x7F;
const LF: u8 = 0x0A;
const VT: u8 = 0x0B;

impl<A: VideoAdapter> AnsiTerm<A> {
    /// Feed a single output byte to the terminal
    pub fn put_char(&mut self, byte: u8) {
        self.erase_cursor();

        if byte & 0x7F == ESC {
            let in_sequence = matches!(self.state.parser, ParserState::Esc | ParserState::Csi);
            if in_sequence && self.state.flags.contains(TermFlags::PASSTHRU) {
                // second ESC/CSI is shown as a glyph
                self.state.parser = ParserState::Normal;
                self.process_char(byte);
            } else if byte == ESC {
                self.state.begin_sequence(ParserState::Esc);
            } else {
                self.state.begin_sequence(ParserState::Csi);
            }
        } else {
            match self.state.parser {
                ParserState::Normal => self.process_char(byte),
                _ if byte == CAN || byte == SUB => {
                    debug!("Sequence cancelled by 0x{:02x}", byte);
                    self.state.parser = ParserState::Normal;
                }
                ParserState::Esc => self.process_esc(byte),
                ParserState::Csi => self.parse_csi(byte),
                ParserState::Illegal => {
                    if byte >= 0x40 {
                        trace!("End of skipped sequence 0x{:02x}", byte);
                        self.state.parser = ParserState::Normal;
                    }
                }
            }
        }

        self.check_position(byte);
    }

    /// Execute the byte following ESC
    fn process_esc(&mut self, byte: u8) {
        self.state.parser = ParserState::Normal;
        match byte {
            b'[' => {
                self.state.begin_sequence(ParserState::Csi);
            }
            b'c' => {
                // RIS
                debug!("Reset to initial state");
                self.state.flags = TermFlags::empty();
                self.apply_mode();
                self.cls();
            }
            b'7' => {
                // DECSC
                self.state.save_cursor();
            }
            b'8' => {
                // DECRC
                self.state.restore_cursor();
            }
            b'(' | b')' | b'*' | b'+' => {
                self.state.font = byte & 0x03;
                debug!("Font {}", self.state.font);
                self.apply_mode();
            }
            b'D' => {
                // IND: line feed regardless of newline mode
                let saved = self.state.flags;
                self.state.flags.remove(TermFlags::NEWLINE);
                self.control_code(LF);
                self.state.flags = saved;
            }
            b'M' => {
                // RI
                self.control_code(VT);
            }
            b'E' => {
                // NEL
                self.state.x = 0;
                self.state.y += 1;
                self.state.lcf = false;
                if self.state.y >= self.state.rows {
                    self.state.y = self.state.rows - 1;
                    self.scroll_up();
                }
                self.state.update_cursor_addr();
            }
            DEL => {
                self.state.parser = ParserState::Esc;
            }
            _ => {
                debug!("Ignored ESC 0x{:02x}", byte);
            }
        }
    }

    /// Accumulate one byte of a CSI sequence
    fn parse_csi(&mut self, byte: u8) {
        match byte {
            // controls, space, DEL and high-bit bytes are dropped
            0x00..=0x20 | DEL..=0xFF => {}
            0x21..=0x2F => {
                if let Some(first) = self.state.intermediate {
                    debug!("Second intermediate 0x{:02x} after 0x{:02x}", byte, first);
                } else {
                    self.state.intermediate = Some(byte);
                }
            }
            b'0'..=b'9' => {
                if self.state.param_count == 0 {
                    self.state.param_count = 1;
                }
                let slot = &mut self.state.csi_params[self.state.param_count - 1];
                *slot = slot.saturating_mul(10).saturating_add((byte - b'0') as u16);
            }
            b';' => {
                // an empty leading parameter still occupies slot 0
                let next = self.state.param_count.max(1) + 1;
                if next > MAX_CSI_PARAMS {
                    debug!("More than {} CSI parameters", MAX_CSI_PARAMS);
                    self.state.parser = ParserState::Illegal;
                } else {
                    self.state.param_count = next;
                }
            }
            b':' => {
                debug!("Sub-parameters not supported");
                self.state.parser = ParserState::Illegal;
            }
            b'<'..=b'?' => {
                if self.state.intermediate.is_some() {
                    debug!("Misplaced private marker 0x{:02x}", byte);
                    self.state.parser = ParserState::Illegal;
                } else {
                    self.state.intermediate = Some(byte);
                }
            }
            _ => {
                trace!(
                    "CSI {:?} {:?} {}",
                    self.state.intermediate.map(char::from),
                    self.state.params(),
                    byte as char
                );
                self.state.parser = ParserState::Normal;
                self.execute_csi(byte);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TermConfig;
    use crate::core::sim::MemAdapter;

    fn term() -> AnsiTerm<MemAdapter> {
        AnsiTerm::with_adapter(MemAdapter::new(), &TermConfig::default())
    }

    #[test]
    fn test_parameter_accumulation() {
        let mut term = term();
        term.put_bytes(b"\x1b[12;34");
        assert_eq!(term.state().parser, ParserState::Csi);
        assert_eq!(term.state().params(), &[12, 34]);
    }

    #[test]
    fn test_parameter_saturates() {
        let mut term = term();
        term.put_bytes(b"\x1b[99999");
        assert_eq!(term.state().params(), &[65535]);
    }

    #[test]
    fn test_leading_semicolon() {
        let mut term = term();
        term.put_bytes(b"\x1b[;5");
        assert_eq!(term.state().params(), &[0, 5]);
    }

    #[test]
    fn test_too_many_parameters() {
        let mut term = term();
        term.put_bytes(b"\x1b[1;2;3;4;5;6;7;8;9;10;11;12;13;14;15;16");
        assert_eq!(term.state().parser, ParserState::Csi);
        assert_eq!(term.state().params().len(), 16);

        term.put_bytes(b";");
        assert_eq!(term.state().parser, ParserState::Illegal);

        // skipped until a final byte, which is not executed
        term.put_bytes(b"17;0H");
        assert_eq!(term.state().parser, ParserState::Normal);
        assert_eq!(term.cursor(), (0, 0));
    }

    #[test]
    fn test_private_marker_and_intermediates() {
        let mut term = term();
        term.put_bytes(b"\x1b[?");
        assert_eq!(term.state().intermediate, Some(b'?'));
        term.put_bytes(b"?");
        assert_eq!(term.state().parser, ParserState::Illegal);

        term.put_bytes(b"A\x1b[ !");
        assert_eq!(term.state().intermediate, Some(b'!'));
        term.put_bytes(b"\"");
        assert_eq!(term.state().intermediate, Some(b'!'));

        term.put_bytes(b"\x1b[1:2");
        assert_eq!(term.state().parser, ParserState::Illegal);
    }

    #[test]
    fn test_cancel_and_ignored_bytes() {
        let mut term = term();
        term.put_bytes(b"\x1b[5\x18C");
        assert_eq!(term.state().parser, ParserState::Normal);
        // 'C' printed, not executed as cursor forward
        assert_eq!(term.cursor(), (1, 0));
        assert_eq!(term.adapter().cell(0) & 0xFF, b'C' as u16);

        term.put_bytes(b"\x1b[3\r\n\x7f\xC0C");
        assert_eq!(term.cursor(), (4, 0));
    }

    #[test]
    fn test_eight_bit_csi() {
        let mut term = term();
        term.put_bytes(b"\x9b5C");
        assert_eq!(term.cursor(), (5, 0));
    }

    #[test]
    fn test_passthru_draws_second_escape() {
        let mut term = term();
        term.put_bytes(b"\x1b[8m\x1b\x1b");
        assert_eq!(term.state().parser, ParserState::Normal);
        assert_eq!(term.adapter().cell(0) & 0xFF, 0x1B);
        assert_eq!(term.cursor(), (1, 0));
    }

    #[test]
    fn test_esc_del_stays_in_escape() {
        let mut term = term();
        term.put_bytes(b"\x1b\x7f");
        assert_eq!(term.state().parser, ParserState::Esc);
        term.put_bytes(b"7");
        assert_eq!(term.state().parser, ParserState::Normal);
    }

    #[test]
    fn test_unknown_escape_is_ignored() {
        let mut term = term();
        term.put_bytes(b"\x1bZX");
        assert_eq!(term.state().parser, ParserState::Normal);
        assert_eq!(term.adapter().cell(0) & 0xFF, b'X' as u16);
    }
}
