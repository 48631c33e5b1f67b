//! Video adapter register interface
//!
//! The terminal never touches video memory directly. Everything goes through
//! the adapter's narrow register protocol: a read port and a write port, each
//! with its own address and auto-increment, plus a handful of extended (XR)
//! registers describing the display mode.
//!
//! A cell is one 16-bit VRAM word: high byte = color (background nibble,
//! foreground nibble), low byte = glyph code.

use thiserror::Error;

/// Bit set in the SCANLINE register while the display is in vertical blank
pub const SCANLINE_VBLANK: u16 = 0x8000;

/// Timer bit used for cursor blink (~410ms on, ~410ms off)
pub const CURSOR_BLINK_BIT: u16 = 0x0800;

/// Native display widths selectable with `CSI ? 3 h` / `CSI ? 3 l`
pub const WIDTH_4_3: u16 = 640;
pub const WIDTH_16_9: u16 = 848;

#[derive(Error, Debug)]
pub enum AdapterError {
    #[error("Unknown video configuration: {0}")]
    UnknownConfig(u16),

    #[error("Adapter not responding after reconfiguration")]
    NotResponding,
}

/// Extended registers used by the terminal
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum XReg {
    /// Current scanline (bit 15 set during vertical blank)
    Scanline,
    /// Native pixel width of the monitor mode (640 or 848)
    VidHSize,
    /// Native pixel height of the monitor mode
    VidVSize,
    /// Playfield A graphics control
    PaGfxCtrl,
    /// Playfield A tile control (font address and tile height)
    PaTileCtrl,
    /// Playfield A display start address in VRAM
    PaDispAddr,
    /// Playfield A line length in words
    PaLineLen,
    /// Playfield A fine scroll
    PaHvScroll,
}

impl XReg {
    /// Register number on the XR bus
    pub const fn addr(self) -> u16 {
        match self {
            XReg::Scanline => 0x08,
            XReg::VidHSize => 0x0A,
            XReg::VidVSize => 0x0B,
            XReg::PaGfxCtrl => 0x10,
            XReg::PaTileCtrl => 0x11,
            XReg::PaDispAddr => 0x12,
            XReg::PaLineLen => 0x13,
            XReg::PaHvScroll => 0x15,
        }
    }
}

/// Register-level access to a text-mode video adapter.
///
/// Implementations model the adapter's byte-lane protocol: writing the high
/// byte latches a color, writing the low byte stores `latch << 8 | glyph` at
/// the write address and advances it by the write increment. Increments are
/// two's complement, so `0xFFFF` walks backwards.
pub trait VideoAdapter {
    fn set_write_addr(&mut self, addr: u16);
    fn set_write_incr(&mut self, incr: u16);
    /// Store a full cell and advance the write address
    fn write_cell(&mut self, cell: u16);
    /// Latch the color byte for following low-byte writes
    fn write_cell_high(&mut self, color: u8);
    /// Store `latch << 8 | glyph` and advance the write address
    fn write_cell_low(&mut self, glyph: u8);

    fn set_read_addr(&mut self, addr: u16);
    fn set_read_incr(&mut self, incr: u16);
    /// Fetch the cell at the read address and advance it
    fn read_cell(&mut self) -> u16;

    fn reg(&mut self, reg: XReg) -> u16;
    fn set_reg(&mut self, reg: XReg, value: u16);

    /// Program palette entry `index` with a 12-bit RGB value
    fn set_color(&mut self, index: u16, rgb: u16);

    /// Free-running millisecond timer
    fn timer(&mut self) -> u16;

    /// Full hardware mode switch (0 = 640 wide, 1 = 848 wide)
    fn reinit(&mut self, config: u16) -> Result<(), AdapterError>;
}

/// Build a TILE_CTRL value from font address, font memory select and tile height
pub const fn make_tile_ctrl(font_addr: u16, font_in_vram: bool, tile_height: u16) -> u16 {
    let vram = if font_in_vram { 0x0100 } else { 0x0000 };
    (font_addr & 0xFC00) | vram | (tile_height.saturating_sub(1) & 0x000F)
}

/// Text grid size implied by a display mode
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TextGeometry {
    pub cols: u16,
    pub rows: u16,
}

impl TextGeometry {
    /// Derive the text grid from GFX_CTRL / TILE_CTRL and the native display size.
    ///
    /// `line_len` and `height` override the derived columns/rows when non-zero.
    pub fn derive(
        gfx_ctrl: u16,
        tile_ctrl: u16,
        hsize: u16,
        vsize: u16,
        line_len: u16,
        height: u16,
    ) -> Self {
        let bitmap = gfx_ctrl & 0x0040 != 0;
        let bpp = (gfx_ctrl >> 4) & 0x3;
        let h_rpt = ((gfx_ctrl >> 2) & 0x3) + 1;
        let v_rpt = (gfx_ctrl & 0x3) + 1;

        let pixels_per_tile = match (bitmap, bpp) {
            (false, _) | (true, 0) | (true, 1) => 8,
            (true, 2) => 4,
            _ => 1,
        };
        let lines_per_tile = if bitmap { 1 } else { (tile_ctrl & 0x000F) + 1 };
        let tile_w = pixels_per_tile * h_rpt;
        let tile_h = lines_per_tile * v_rpt;

        let cols = if line_len != 0 {
            line_len
        } else {
            ((hsize as u32 + tile_w as u32 - 1) / tile_w as u32) as u16
        };
        let rows = if height != 0 {
            height
        } else {
            ((vsize as u32 + tile_h as u32 - 1) / tile_h as u32) as u16
        };

        Self { cols, rows }
    }
}
