//! Memory-backed adapter
//!
//! Models the adapter's register protocol over plain memory so the terminal
//! can run without hardware: the host program renders from it and the tests
//! inspect it cell by cell. Display timing is not modelled; SCANLINE simply
//! toggles its vertical-blank bit on every read so mode switches never stall.

use std::collections::VecDeque;
use std::time::Instant;

use super::adapter::{AdapterError, VideoAdapter, XReg, SCANLINE_VBLANK, WIDTH_16_9, WIDTH_4_3};
use super::session::{Console, ConsoleError};

/// Words of video memory (full 16-bit address space)
pub const VRAM_WORDS: usize = 0x1_0000;

/// Palette entries in color memory
pub const PALETTE_ENTRIES: usize = 256;

/// Native display height for both supported modes
const VID_VSIZE: u16 = 480;

/// Timer source for the free-running millisecond counter
#[derive(Clone, Copy, Debug)]
enum Clock {
    Manual(u16),
    Realtime(Instant),
}

/// In-memory video adapter
pub struct MemAdapter {
    vram: Vec<u16>,
    palette: Vec<u16>,
    regs: [u16; 0x20],
    rd_addr: u16,
    rd_incr: u16,
    wr_addr: u16,
    wr_incr: u16,
    /// Color byte latched by the last high-byte write
    latch: u8,
    scanline_reads: u32,
    clock: Clock,
    reinit_log: Vec<u16>,
    fail_reinit: bool,
}

impl Default for MemAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl MemAdapter {
    /// Create an adapter in 640x480 mode with a stopped manual timer
    pub fn new() -> Self {
        let mut adapter = Self {
            vram: vec![0; VRAM_WORDS],
            palette: vec![0; PALETTE_ENTRIES],
            regs: [0; 0x20],
            rd_addr: 0,
            rd_incr: 1,
            wr_addr: 0,
            wr_incr: 1,
            latch: 0,
            scanline_reads: 0,
            clock: Clock::Manual(0),
            reinit_log: Vec::new(),
            fail_reinit: false,
        };
        adapter.configure(WIDTH_4_3);
        adapter
    }

    /// Drive the timer from the wall clock instead of `set_timer`
    pub fn with_realtime_timer(mut self) -> Self {
        self.clock = Clock::Realtime(Instant::now());
        self
    }

    fn configure(&mut self, hsize: u16) {
        self.regs[XReg::VidHSize.addr() as usize] = hsize;
        self.regs[XReg::VidVSize.addr() as usize] = VID_VSIZE;
    }

    /// Cell at a VRAM address
    pub fn cell(&self, addr: u16) -> u16 {
        self.vram[addr as usize]
    }

    /// Glyph codes of `len` cells starting at `addr`
    pub fn glyphs(&self, addr: u16, len: u16) -> Vec<u8> {
        (0..len)
            .map(|i| (self.cell(addr.wrapping_add(i)) & 0x00FF) as u8)
            .collect()
    }

    /// Palette entry (12-bit RGB)
    pub fn color(&self, index: usize) -> u16 {
        self.palette.get(index).copied().unwrap_or(0)
    }

    /// Last value written to an XR register
    pub fn xreg(&self, reg: XReg) -> u16 {
        self.regs[reg.addr() as usize]
    }

    pub fn set_timer(&mut self, ms: u16) {
        self.clock = Clock::Manual(ms);
    }

    /// Configurations passed to `reinit`, oldest first
    pub fn reinit_calls(&self) -> &[u16] {
        &self.reinit_log
    }

    /// Make the next `reinit` calls fail with `NotResponding`
    pub fn set_reinit_failure(&mut self, fail: bool) {
        self.fail_reinit = fail;
    }
}

impl VideoAdapter for MemAdapter {
    fn set_write_addr(&mut self, addr: u16) {
        self.wr_addr = addr;
    }

    fn set_write_incr(&mut self, incr: u16) {
        self.wr_incr = incr;
    }

    fn write_cell(&mut self, cell: u16) {
        self.latch = (cell >> 8) as u8;
        self.vram[self.wr_addr as usize] = cell;
        self.wr_addr = self.wr_addr.wrapping_add(self.wr_incr);
    }

    fn write_cell_high(&mut self, color: u8) {
        self.latch = color;
    }

    fn write_cell_low(&mut self, glyph: u8) {
        self.vram[self.wr_addr as usize] = ((self.latch as u16) << 8) | glyph as u16;
        self.wr_addr = self.wr_addr.wrapping_add(self.wr_incr);
    }

    fn set_read_addr(&mut self, addr: u16) {
        self.rd_addr = addr;
    }

    fn set_read_incr(&mut self, incr: u16) {
        self.rd_incr = incr;
    }

    fn read_cell(&mut self) -> u16 {
        let cell = self.vram[self.rd_addr as usize];
        self.rd_addr = self.rd_addr.wrapping_add(self.rd_incr);
        cell
    }

    fn reg(&mut self, reg: XReg) -> u16 {
        if reg == XReg::Scanline {
            self.scanline_reads = self.scanline_reads.wrapping_add(1);
            return if self.scanline_reads % 2 == 0 {
                SCANLINE_VBLANK
            } else {
                0
            };
        }
        self.regs[reg.addr() as usize]
    }

    fn set_reg(&mut self, reg: XReg, value: u16) {
        match reg {
            // read-only
            XReg::Scanline | XReg::VidHSize | XReg::VidVSize => {}
            _ => self.regs[reg.addr() as usize] = value,
        }
    }

    fn set_color(&mut self, index: u16, rgb: u16) {
        if let Some(entry) = self.palette.get_mut(index as usize) {
            *entry = rgb & 0x0FFF;
        }
    }

    fn timer(&mut self) -> u16 {
        match self.clock {
            Clock::Manual(ms) => ms,
            Clock::Realtime(start) => start.elapsed().as_millis() as u16,
        }
    }

    fn reinit(&mut self, config: u16) -> Result<(), AdapterError> {
        self.reinit_log.push(config);
        if self.fail_reinit {
            return Err(AdapterError::NotResponding);
        }
        let hsize = match config {
            0 => WIDTH_4_3,
            1 => WIDTH_16_9,
            other => return Err(AdapterError::UnknownConfig(other)),
        };
        self.configure(hsize);
        Ok(())
    }
}

/// Console fed from an in-memory byte queue
#[derive(Debug, Default)]
pub struct ScriptConsole {
    input: VecDeque<u8>,
}

impl ScriptConsole {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue bytes as if typed
    pub fn push(&mut self, bytes: &[u8]) {
        self.input.extend(bytes.iter().copied());
    }

    pub fn pending(&self) -> usize {
        self.input.len()
    }
}

impl Console for ScriptConsole {
    fn read_byte(&mut self) -> Result<u8, ConsoleError> {
        self.input.pop_front().ok_or(ConsoleError::Closed)
    }

    fn byte_ready(&mut self) -> bool {
        !self.input.is_empty()
    }
}
