//! CSI command execution

use tracing::{debug, info, warn};

use super::state::TermFlags;
use super::AnsiTerm;
use crate::core::adapter::{VideoAdapter, XReg, WIDTH_16_9, WIDTH_4_3};

impl<A: VideoAdapter> AnsiTerm<A> {
    /// Run a complete CSI sequence ending in `final_byte`
    pub(super) fn execute_csi(&mut self, final_byte: u8) {
        let num_z = self.state.param(0);
        let num = num_z.max(1);

        match final_byte {
            b'A' => {
                self.state.y = self.state.y.saturating_sub(num);
                self.state.update_cursor_addr();
            }
            b'B' => {
                self.state.y = self.state.y.saturating_add(num).min(self.state.rows - 1);
                self.state.update_cursor_addr();
            }
            b'C' => {
                self.state.x = self.state.x.saturating_add(num).min(self.state.cols - 1);
                self.state.update_cursor_addr();
            }
            b'D' => {
                self.state.x = self.state.x.saturating_sub(num);
                self.state.update_cursor_addr();
            }
            b'H' | b'f' => self.cursor_position(),
            b'h' | b'l' => self.set_mode(final_byte == b'h'),
            b's' => self.state.save_cursor(),
            b'u' => self.state.restore_cursor(),
            b'J' => self.erase_in_display(num_z),
            b'K' => self.erase_in_line(num_z),
            b'm' => self.execute_sgr(),
            _ => {
                debug!("Ignored CSI final '{}'", final_byte as char);
            }
        }
    }

    /// CUP / HVP
    fn cursor_position(&mut self) {
        let state = &mut self.state;
        let row = state.param(0);
        let col = state.param(1);

        state.lcf = false;
        state.y = row.saturating_sub(1).min(state.rows - 1);
        state.x = col.saturating_sub(1).min(state.cols - 1);
        state.update_cursor_addr();
    }

    /// SM / RM and the DEC private modes
    fn set_mode(&mut self, on: bool) {
        let mode = self.state.param(0);

        if self.state.intermediate == Some(b'?') {
            match mode {
                3 => {
                    // DECCOLM selects the display width
                    let width = if on { WIDTH_16_9 } else { WIDTH_4_3 };
                    if self.switch_resolution(width) {
                        self.apply_mode();
                        self.cls();
                        info!("Resolution {}: {}x{} text", width, self.state.cols, self.state.rows);
                    }
                }
                5 => {
                    // DECSCNM
                    self.reverse_screen();
                }
                7 => {
                    // DECAWM
                    self.resolve_deferred_wrap();
                    self.state.flags.set(TermFlags::NO_AUTOWRAP, !on);
                    debug!("Autowrap {}", if on { "on" } else { "off" });
                }
                25 => {
                    // DECTCEM
                    self.state.flags.set(TermFlags::HIDE_CURSOR, !on);
                }
                _ => {
                    debug!("Ignored private mode ?{}{}", mode, if on { 'h' } else { 'l' });
                }
            }
        } else if mode == 20 {
            // LNM
            self.state.flags.set(TermFlags::NEWLINE, on);
        } else {
            debug!("Ignored mode {}{}", mode, if on { 'h' } else { 'l' });
        }
    }

    /// Re-initialize the adapter for `width` pixels if it is not already
    /// there. Returns true when the mode actually changed.
    pub(super) fn switch_resolution(&mut self, width: u16) -> bool {
        if self.adapter.reg(XReg::VidHSize) == width {
            return false;
        }
        let config = if width == WIDTH_4_3 { 0 } else { 1 };
        match self.adapter.reinit(config) {
            Ok(()) => {
                debug!("Adapter reconfigured to #{}", config);
                true
            }
            Err(e) => {
                warn!("Adapter reconfiguration #{} failed: {}", config, e);
                false
            }
        }
    }

    /// Swap foreground and background everywhere, persistently
    fn reverse_screen(&mut self) {
        let state = &mut self.state;
        state.default_color = state.default_color.swapped();
        state.selected_color = state.selected_color.swapped();
        state.effective_color = state.effective_color.swapped();
        self.visual_bell(true);
    }

    /// ED
    fn erase_in_display(&mut self, mode: u16) {
        let first = self.state.vram_base;
        let last = self.state.vram_end.wrapping_sub(1);
        let here = self.state.addr_of(self.state.x, self.state.y);
        match mode {
            0 => self.clear(here, last),
            1 => self.clear(first, here),
            2 => self.clear(first, last),
            _ => debug!("Ignored erase in display {}", mode),
        }
    }

    /// EL
    fn erase_in_line(&mut self, mode: u16) {
        let y = self.state.y;
        let start = self.state.addr_of(0, y);
        let end = self.state.addr_of(self.state.cols - 1, y);
        let here = self.state.addr_of(self.state.x, y);
        match mode {
            0 => self.clear(here, end),
            1 => self.clear(start, here),
            2 => self.clear(start, end),
            _ => debug!("Ignored erase in line {}", mode),
        }
    }
}
