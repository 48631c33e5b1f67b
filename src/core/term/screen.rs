//! Screen memory driver
//!
//! All VRAM access goes through the adapter ports. Bulk operations set the
//! port increments first and then stream cells.

use tracing::{info, trace, warn};

use super::state::TermFlags;
use super::AnsiTerm;
use crate::core::adapter::{TextGeometry, VideoAdapter, XReg, SCANLINE_VBLANK};

/// Register reads to wait for each vertical blank edge
const VBLANK_SPIN_LIMIT: u32 = 100_000;

/// Swap the color nibbles of a cell
const fn invert_cell(cell: u16) -> u16 {
    ((cell & 0xF000) >> 4) | ((cell & 0x0F00) << 4) | (cell & 0x00FF)
}

impl<A: VideoAdapter> AnsiTerm<A> {
    /// Fill `start..=end` with blanks in the effective color
    pub(super) fn clear(&mut self, start: u16, end: u16) {
        let (start, end) = if start > end { (end, start) } else { (start, end) };
        self.adapter.set_write_incr(1);
        self.adapter.set_write_addr(start);
        self.adapter.write_cell_high(self.state.effective_color.attr());
        for _ in start..=end {
            self.adapter.write_cell_low(b' ');
        }
    }

    /// Clear the whole grid and home the cursor
    pub(super) fn cls(&mut self) {
        let (first, last) = (self.state.vram_base, self.state.vram_end.wrapping_sub(1));
        self.clear(first, last);
        self.state.x = 0;
        self.state.y = 0;
        self.state.lcf = false;
        self.state.cursor_addr = self.state.vram_base;
    }

    /// Move every line up by one and blank the last line
    pub(super) fn scroll_up(&mut self) {
        let base = self.state.vram_base;
        self.adapter.set_write_incr(1);
        self.adapter.set_read_incr(1);
        self.adapter.set_write_addr(base);
        self.adapter.set_read_addr(base.wrapping_add(self.state.cols));
        self.do_scroll();
    }

    /// Move every line down by one and blank the first line
    pub(super) fn scroll_down(&mut self) {
        let last = self.state.vram_end.wrapping_sub(1);
        self.adapter.set_write_incr(0xFFFF);
        self.adapter.set_read_incr(0xFFFF);
        self.adapter.set_write_addr(last);
        self.adapter.set_read_addr(last.wrapping_sub(self.state.cols));
        self.do_scroll();
    }

    /// Copy all but one line through the ports, then blank one line
    fn do_scroll(&mut self) {
        let moved = self.state.vram_size - self.state.cols;
        for _ in 0..moved {
            let cell = self.adapter.read_cell();
            self.adapter.write_cell(cell);
        }
        self.adapter.write_cell_high(self.state.effective_color.attr());
        for _ in 0..self.state.cols {
            self.adapter.write_cell_low(b' ');
        }
    }

    /// Draw a glyph at the cursor and advance it
    pub(super) fn draw_char(&mut self, glyph: u8) {
        self.resolve_deferred_wrap();

        self.adapter.set_write_addr(self.state.cursor_addr);
        self.adapter.write_cell_high(self.state.effective_color.attr());
        self.adapter.write_cell_low(glyph);

        let state = &mut self.state;
        state.cursor_addr = state.cursor_addr.wrapping_add(1);
        state.x += 1;
        if state.x >= state.cols {
            if state.flags.contains(TermFlags::NO_AUTOWRAP) {
                state.x = state.cols - 1;
                state.cursor_addr = state.cursor_addr.wrapping_sub(1);
            } else {
                state.x = 0;
                state.y = (state.y + 1).min(state.rows - 1);
                state.lcf = true;
            }
        }
    }

    /// Complete a pending wrap: if the last glyph filled the bottom-right
    /// cell, scroll and put the cursor at the start of the last line.
    pub fn resolve_deferred_wrap(&mut self) {
        if !self.state.lcf {
            return;
        }
        self.state.lcf = false;
        let offset = self.state.cursor_addr.wrapping_sub(self.state.vram_base);
        if offset >= self.state.vram_size {
            self.state.cursor_addr = self.state.addr_of(0, self.state.rows - 1);
            self.scroll_up();
        }
    }

    /// Invert every cell twice (a flash), or once to leave it inverted
    pub(super) fn visual_bell(&mut self, invert_once: bool) {
        let passes = if invert_once { 1 } else { 2 };
        self.adapter.set_read_incr(1);
        self.adapter.set_write_incr(1);
        for _ in 0..passes {
            self.adapter.set_read_addr(self.state.vram_base);
            self.adapter.set_write_addr(self.state.vram_base);
            for _ in 0..self.state.vram_size {
                let cell = self.adapter.read_cell();
                self.adapter.write_cell(invert_cell(cell));
            }
        }
    }

    /// Program the display mode from the current font, GFX_CTRL and size
    /// overrides, then recompute the text geometry.
    pub(super) fn apply_mode(&mut self) {
        let tile_ctrl = self.state.tile_ctrl[(self.state.font & 0x03) as usize];
        let gfx_ctrl = self.state.gfx_ctrl;
        let hsize = self.adapter.reg(XReg::VidHSize);
        let vsize = self.adapter.reg(XReg::VidVSize);
        let geometry = TextGeometry::derive(
            gfx_ctrl,
            tile_ctrl,
            hsize,
            vsize,
            self.state.line_len,
            self.state.height,
        );

        // grid must fit the 16-bit address space
        let cols = geometry.cols.max(1);
        let rows = geometry.rows.clamp(1, u16::MAX / cols);
        let size = cols * rows;
        let base = self.state.requested_base.min(u16::MAX - size);
        let prev_end = self.state.vram_end;

        let state = &mut self.state;
        state.cols = cols;
        state.rows = rows;
        state.vram_size = size;
        state.vram_base = base;
        state.vram_end = base + size;
        state.selected_color = state.default_color;
        state.effective_color = state.default_color;
        state.x = state.x.min(cols - 1);
        state.y = state.y.min(rows - 1);
        state.lcf = false;

        info!(
            "Mode gfx_ctrl={:04X} tile_ctrl={:04X} base={:04X} {}x{} end={:04X}",
            gfx_ctrl, tile_ctrl, base, cols, rows, base + size
        );

        self.wait_vblank();
        self.adapter.set_reg(XReg::PaGfxCtrl, gfx_ctrl);
        self.adapter.set_reg(XReg::PaTileCtrl, tile_ctrl);
        self.adapter.set_reg(XReg::PaDispAddr, base);
        self.adapter.set_reg(XReg::PaLineLen, cols);
        self.adapter.set_reg(XReg::PaHvScroll, 0);
        self.set_default_palette();

        // only clear memory the previous mode did not cover
        let end = self.state.vram_end;
        if prev_end < end {
            self.clear(prev_end.max(base), end - 1);
        }
        self.state.update_cursor_addr();
    }

    fn set_default_palette(&mut self) {
        for (index, &rgb) in self.presets.palette.iter().take(256).enumerate() {
            self.adapter.set_color(index as u16, rgb);
        }
    }

    /// Wait for the start of the next vertical blank
    fn wait_vblank(&mut self) {
        let mut spins = 0;
        while self.adapter.reg(XReg::Scanline) & SCANLINE_VBLANK != 0 && spins < VBLANK_SPIN_LIMIT {
            spins += 1;
        }
        while self.adapter.reg(XReg::Scanline) & SCANLINE_VBLANK == 0 && spins < VBLANK_SPIN_LIMIT {
            spins += 1;
        }
        if spins >= VBLANK_SPIN_LIMIT {
            warn!("No vertical blank seen, programming mode anyway");
        } else {
            trace!("Vertical blank after {} reads", spins);
        }
    }
}
