//! ANSI/VT100 terminal emulator core
//!
//! `AnsiTerm` consumes output bytes one at a time and renders them into the
//! text-mode VRAM of a [`VideoAdapter`]. The implementation is split by
//! concern:
//!
//! - `parser`  - byte dispatcher and ESC/CSI accumulation
//! - `control` - C0 control characters
//! - `csi`     - CSI command execution and private modes
//! - `sgr`     - graphic rendition and the SGR 68 adapter commands
//! - `screen`  - VRAM clear/scroll/draw and display mode setup
//! - `cursor`  - input cursor overlay

mod control;
mod csi;
mod cursor;
mod parser;
mod screen;
mod sgr;
pub mod state;

use crate::config::TermConfig;

use super::adapter::{VideoAdapter, WIDTH_16_9};

pub use cursor::cursor_cell;
pub use sgr::VendorCommand;
pub use state::{ColorPair, ParserState, SessionState, TermFlags};

/// Terminal emulator bound to one video adapter
pub struct AnsiTerm<A: VideoAdapter> {
    state: SessionState,
    adapter: A,
    presets: TermConfig,
}

impl<A: VideoAdapter> AnsiTerm<A> {
    /// Bare terminal with zero geometry; only valid once `init` has run
    fn new(adapter: A, presets: &TermConfig) -> Self {
        Self {
            state: SessionState::new(),
            adapter,
            presets: presets.clone(),
        }
    }

    /// Create a terminal on `adapter`, program the display mode from
    /// `presets` and clear the screen
    pub fn with_adapter(adapter: A, presets: &TermConfig) -> Self {
        let mut term = Self::new(adapter, presets);
        term.init();
        term
    }

    /// Reset all state to the presets, program the display mode and clear
    /// the screen.
    pub fn init(&mut self) {
        tracing::debug!("Terminal init");
        self.state = SessionState::new();
        self.state.tile_ctrl = self.presets.tile_ctrl;
        self.state.gfx_ctrl = self.presets.gfx_ctrl;
        self.state.font = self.presets.font & 0x03;
        self.state.requested_base = self.presets.vram_base;
        self.state.line_len = self.presets.line_len;
        self.state.height = self.presets.height;
        self.state.default_color = self.presets.default_color;
        self.apply_mode();
        self.cls();
    }

    /// Initialize, switching the adapter to the 848-wide mode first when
    /// `wide` is set
    pub fn init_wide(&mut self, wide: bool) {
        if wide {
            self.switch_resolution(WIDTH_16_9);
        }
        self.init();
    }

    pub fn put_bytes(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            self.put_char(byte);
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn flags(&self) -> TermFlags {
        self.state.flags
    }

    /// Cursor position (column, row)
    pub fn cursor(&self) -> (u16, u16) {
        (self.state.x, self.state.y)
    }

    /// Grid size (columns, rows)
    pub fn size(&self) -> (u16, u16) {
        (self.state.cols, self.state.rows)
    }

    pub fn adapter(&self) -> &A {
        &self.adapter
    }

    pub fn adapter_mut(&mut self) -> &mut A {
        &mut self.adapter
    }

    /// Log a cursor address that disagrees with (x, y)
    #[cfg(debug_assertions)]
    fn check_position(&self, byte: u8) {
        if !self.state.is_xy_consistent() {
            tracing::error!(
                "Cursor address 0x{:04x} does not match {},{} after 0x{:02x}",
                self.state.cursor_addr,
                self.state.x,
                self.state.y,
                byte
            );
        }
    }

    #[cfg(not(debug_assertions))]
    fn check_position(&self, _byte: u8) {}
}
