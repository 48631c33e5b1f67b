//! Terminal session state
//!
//! Everything the emulator remembers between bytes: cursor position and its
//! VRAM address, text geometry, colors and attributes, the saved cursor and
//! the escape-sequence parser registers.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

/// Maximum number of CSI parameters
pub const MAX_CSI_PARAMS: usize = 16;

/// ANSI color number (0-7) to VGA palette index
pub const ANSI_TO_VGA: [u8; 8] = [0, 4, 2, 6, 1, 5, 3, 7];

bitflags! {
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct TermFlags: u8 {
        /// LF also returns the carriage
        const NEWLINE     = 1 << 0;
        /// Cursor stops at the right margin
        const NO_AUTOWRAP = 1 << 1;
        /// Never show the input cursor
        const HIDE_CURSOR = 1 << 2;
        const BRIGHT      = 1 << 4;
        const DIM         = 1 << 5;
        const REVERSE     = 1 << 6;
        /// Control characters are drawn as glyphs
        const PASSTHRU    = 1 << 7;

        /// Rendition flags cleared by SGR 0
        const ATTRIBUTES = Self::BRIGHT.bits()
            | Self::DIM.bits()
            | Self::REVERSE.bits()
            | Self::PASSTHRU.bits();
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ParserState {
    #[default]
    Normal,
    /// Skipping a malformed sequence until a final byte
    Illegal,
    Esc,
    Csi,
}

/// Foreground/background palette indices of a cell
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawColorPair")]
pub struct ColorPair {
    pub fg: u8,
    pub bg: u8,
}

/// Unchecked color pair as written in a config file
#[derive(Deserialize)]
struct RawColorPair {
    fg: u8,
    bg: u8,
}

impl From<RawColorPair> for ColorPair {
    fn from(raw: RawColorPair) -> Self {
        Self::new(raw.fg, raw.bg)
    }
}

impl ColorPair {
    pub const fn new(fg: u8, bg: u8) -> Self {
        Self {
            fg: fg & 0x0F,
            bg: bg & 0x0F,
        }
    }

    /// Unpack a cell attribute byte (`bg << 4 | fg`)
    pub const fn from_attr(attr: u8) -> Self {
        Self::new(attr & 0x0F, attr >> 4)
    }

    pub const fn attr(self) -> u8 {
        (self.bg & 0x0F) << 4 | (self.fg & 0x0F)
    }

    pub const fn swapped(self) -> Self {
        Self {
            fg: self.bg,
            bg: self.fg,
        }
    }
}

/// Cursor save slot shared by DECSC/DECRC and CSI s/u
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SavedCursor {
    pub x: u16,
    pub y: u16,
    pub lcf: bool,
    /// Cursor address relative to the display base; tells a wrap pending
    /// past the last row apart from one onto the next row
    pub offset: u16,
}

/// Complete emulator state for one screen
#[derive(Clone, Debug, Default)]
pub struct SessionState {
    /// VRAM address of the cell under the cursor
    pub cursor_addr: u16,
    /// First cell of the displayed grid
    pub vram_base: u16,
    /// Display start requested by SGR 68;0;0, applied on the next mode apply
    pub requested_base: u16,
    pub vram_size: u16,
    /// One past the last cell of the grid
    pub vram_end: u16,
    /// Column override (0 = derive from the display width)
    pub line_len: u16,
    /// Row override (0 = derive from the display height)
    pub height: u16,
    pub cols: u16,
    pub rows: u16,
    pub x: u16,
    pub y: u16,
    pub saved: SavedCursor,

    /// Selected font slot (0-3)
    pub font: u8,
    pub tile_ctrl: [u16; 4],
    pub gfx_ctrl: u16,

    pub parser: ParserState,
    pub csi_params: [u16; MAX_CSI_PARAMS],
    pub param_count: usize,
    pub intermediate: Option<u8>,

    /// Color restored by SGR 0 and mode applies
    pub default_color: ColorPair,
    /// Color chosen by SGR before attributes
    pub selected_color: ColorPair,
    /// Color written into cells
    pub effective_color: ColorPair,
    pub flags: TermFlags,
    /// Deferred wrap pending (last column written)
    pub lcf: bool,

    pub cursor_drawn: bool,
    /// Cell hidden under the drawn cursor
    pub cursor_save: u16,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// VRAM address of grid position (x, y)
    pub fn addr_of(&self, x: u16, y: u16) -> u16 {
        self.vram_base
            .wrapping_add(y.wrapping_mul(self.cols))
            .wrapping_add(x)
    }

    pub fn update_cursor_addr(&mut self) {
        self.cursor_addr = self.addr_of(self.x, self.y);
    }

    /// Enter ESC or CSI state with empty parameters
    pub fn begin_sequence(&mut self, parser: ParserState) {
        self.parser = parser;
        self.intermediate = None;
        self.param_count = 0;
        self.csi_params = [0; MAX_CSI_PARAMS];
    }

    /// Parameters collected so far
    pub fn params(&self) -> &[u16] {
        &self.csi_params[..self.param_count]
    }

    /// Parameter `index`, 0 when absent
    pub fn param(&self, index: usize) -> u16 {
        self.params().get(index).copied().unwrap_or(0)
    }

    pub fn save_cursor(&mut self) {
        self.saved = SavedCursor {
            x: self.x,
            y: self.y,
            lcf: self.lcf,
            offset: self.cursor_addr.wrapping_sub(self.vram_base),
        };
    }

    /// Restore the saved slot, clamped to the current grid, and recompute
    /// the cursor address. A pending wrap keeps its saved address while that
    /// still agrees with the restored position.
    pub fn restore_cursor(&mut self) {
        self.x = self.saved.x.min(self.cols.saturating_sub(1));
        self.y = self.saved.y.min(self.rows.saturating_sub(1));
        self.lcf = self.saved.lcf;
        self.update_cursor_addr();

        if self.lcf && self.saved.offset <= self.vram_size {
            let addr = self.vram_base.wrapping_add(self.saved.offset);
            if addr == self.addr_of(self.x, self.y.wrapping_add(1)) {
                self.cursor_addr = addr;
            }
        }
    }

    /// Recompute the cell color from the selected color and attribute flags
    pub fn refresh_effective_color(&mut self) {
        let mut color = if self.flags.contains(TermFlags::REVERSE) {
            self.selected_color.swapped()
        } else {
            self.selected_color
        };
        if self.flags.contains(TermFlags::DIM) {
            color.fg &= !0x08;
        }
        if self.flags.contains(TermFlags::BRIGHT) {
            color.fg |= 0x08;
        }
        self.effective_color = color;
    }

    /// Whether `cursor_addr` agrees with (x, y).
    ///
    /// A pending deferred wrap on the last row leaves the address one line
    /// below the logical position.
    pub fn is_xy_consistent(&self) -> bool {
        self.cursor_addr == self.addr_of(self.x, self.y)
            || (self.lcf && self.cursor_addr == self.addr_of(self.x, self.y.wrapping_add(1)))
    }
}

/// VGA palette index for ANSI color `n` (0-7)
pub fn ansi_to_vga(n: u16) -> u8 {
    ANSI_TO_VGA[(n & 0x07) as usize]
}
