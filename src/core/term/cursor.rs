//! Input cursor overlay
//!
//! The cursor is drawn by rewriting the cell under it with inverted colors
//! and restored from a saved copy. It is only ever shown while waiting for
//! input, and every output byte erases it first.

use super::state::ColorPair;
use super::AnsiTerm;
use crate::core::adapter::VideoAdapter;

/// Cell shown for the cursor over `cell` when drawing in `effective` colors.
///
/// Starts from the effective color with foreground and background swapped;
/// a nibble that would match the cell's own color gets its intensity bit
/// flipped so the cursor stays visible.
pub fn cursor_cell(effective: ColorPair, cell: u16) -> u16 {
    let mut color = ((effective.fg as u16 & 0x0F) << 12) | ((effective.bg as u16 & 0x0F) << 8);
    if (color ^ cell) & 0x0F00 == 0 {
        color ^= 0x0800;
    }
    if (color ^ cell) & 0xF000 == 0 {
        color ^= 0x8000;
    }
    color | (cell & 0x00FF)
}

impl<A: VideoAdapter> AnsiTerm<A> {
    pub fn draw_cursor(&mut self) {
        if self.state.cursor_drawn {
            return;
        }
        self.adapter.set_read_incr(0);
        self.adapter.set_read_addr(self.state.cursor_addr);
        let cell = self.adapter.read_cell();

        self.state.cursor_save = cell;
        self.state.cursor_drawn = true;
        self.adapter.set_write_addr(self.state.cursor_addr);
        self.adapter
            .write_cell(cursor_cell(self.state.effective_color, cell));
    }

    pub fn erase_cursor(&mut self) {
        if !self.state.cursor_drawn {
            return;
        }
        self.state.cursor_drawn = false;
        self.adapter.set_write_addr(self.state.cursor_addr);
        self.adapter.write_cell(self.state.cursor_save);
    }

    pub fn is_cursor_drawn(&self) -> bool {
        self.state.cursor_drawn
    }
}
