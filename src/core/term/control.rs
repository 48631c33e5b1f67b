//! C0 control characters

use tracing::trace;

use super::state::TermFlags;
use super::AnsiTerm;
use crate::core::adapter::VideoAdapter;

const BEL: u8 = 0x07;
const BS: u8 = 0x08;
const HT: u8 = 0x09;
const LF: u8 = 0x0A;
const VT: u8 = 0x0B;
const FF: u8 = 0x0C;
const CR: u8 = 0x0D;

const TAB_WIDTH: u16 = 8;

impl<A: VideoAdapter> AnsiTerm<A> {
    /// Handle a byte outside of any escape sequence
    pub(super) fn process_char(&mut self, byte: u8) {
        if byte >= 0x20 || self.state.flags.contains(TermFlags::PASSTHRU) {
            self.draw_char(byte);
        } else {
            self.control_code(byte);
        }
    }

    pub(super) fn control_code(&mut self, byte: u8) {
        match byte {
            BEL => {
                trace!("BEL");
                // lcf survives the bell
                self.visual_bell(false);
                return;
            }
            BS => {
                self.state.x = self.state.x.saturating_sub(1);
            }
            HT => {
                let next = (self.state.x & !(TAB_WIDTH - 1)) + TAB_WIDTH;
                let room = self.state.cols.checked_sub(next);
                if room.map_or(false, |left| left >= TAB_WIDTH) {
                    self.state.x = next;
                } else {
                    self.state.x = 0;
                    self.state.y += 1;
                }
            }
            LF => {
                self.state.y += 1;
                if self.state.flags.contains(TermFlags::NEWLINE) {
                    self.state.x = 0;
                }
            }
            VT => {
                // reverse line feed
                if self.state.y == 0 {
                    self.scroll_down();
                } else {
                    self.state.y -= 1;
                }
            }
            FF => {
                self.cls();
            }
            CR => {
                self.state.x = 0;
            }
            _ => return,
        }

        if self.state.y >= self.state.rows {
            self.state.y = self.state.rows - 1;
            self.scroll_up();
        }
        self.state.lcf = false;
        self.state.update_cursor_addr();
    }
}

#[cfg(test)]
mod tests {
    use crate::config::TermConfig;
    use crate::core::sim::MemAdapter;
    use crate::core::term::AnsiTerm;

    fn term() -> AnsiTerm<MemAdapter> {
        AnsiTerm::with_adapter(MemAdapter::new(), &TermConfig::default())
    }

    fn row_text(term: &AnsiTerm<MemAdapter>, row: u16, len: u16) -> Vec<u8> {
        term.adapter().glyphs(row * 80, len)
    }

    #[test]
    fn test_cr_lf() {
        let mut term = term();
        term.put_bytes(b"AB\r\nC");
        assert_eq!(term.cursor(), (1, 1));
        assert_eq!(row_text(&term, 0, 2), b"AB");
        assert_eq!(row_text(&term, 1, 1), b"C");
    }

    #[test]
    fn test_lf_keeps_column_without_newline_mode() {
        let mut term = term();
        term.put_bytes(b"abc\n");
        assert_eq!(term.cursor(), (3, 1));

        term.put_bytes(b"\x1b[20h\n");
        assert_eq!(term.cursor(), (0, 2));
    }

    #[test]
    fn test_backspace_stops_at_margin() {
        let mut term = term();
        term.put_bytes(b"ab\x08\x08\x08");
        assert_eq!(term.cursor(), (0, 0));
        assert_eq!(term.state().cursor_addr, 0);
    }

    #[test]
    fn test_tab_stops_and_wrap() {
        let mut term = term();
        term.put_bytes(b"ab\t");
        assert_eq!(term.cursor(), (8, 0));

        // 64 -> 72 leaves exactly 8 columns
        term.put_bytes(b"\x1b[1;65H\t");
        assert_eq!(term.cursor(), (72, 0));

        // 72 -> 80 would leave none
        term.put_bytes(b"\t");
        assert_eq!(term.cursor(), (0, 1));
    }

    #[test]
    fn test_vertical_tab_scrolls_down_at_top() {
        let mut term = term();
        term.put_bytes(b"top\r\nsecond\x1b[H\x0b");
        assert_eq!(term.cursor(), (0, 0));
        assert_eq!(row_text(&term, 0, 3), b"   ");
        assert_eq!(row_text(&term, 1, 3), b"top");
        assert_eq!(row_text(&term, 2, 6), b"second");
    }

    #[test]
    fn test_form_feed_clears_and_homes() {
        let mut term = term();
        term.put_bytes(b"hello\r\nworld\x0c");
        assert_eq!(term.cursor(), (0, 0));
        assert_eq!(row_text(&term, 0, 5), b"     ");
        assert_eq!(row_text(&term, 1, 5), b"     ");
    }

    #[test]
    fn test_lf_on_last_row_scrolls() {
        let mut term = term();
        term.put_bytes(b"first\x1b[30;1Hlast\n");
        assert_eq!(term.cursor(), (4, 29));
        assert_eq!(row_text(&term, 28, 4), b"last");
        assert_eq!(row_text(&term, 29, 4), b"    ");
    }

    #[test]
    fn test_bell_restores_screen() {
        let mut term = term();
        term.put_bytes(b"x\x07");
        assert_eq!(term.adapter().cell(0), 0x0278);
        assert_eq!(term.cursor(), (1, 0));
    }

    #[test]
    fn test_other_controls_are_discarded() {
        let mut term = term();
        term.put_bytes(b"ab\x01\x02\x1f");
        assert_eq!(term.cursor(), (2, 0));
        assert_eq!(row_text(&term, 0, 3), b"ab ");
    }
}
