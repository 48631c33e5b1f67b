//! Select Graphic Rendition
//!
//! Besides the usual attributes and colors, SGR 68 carries adapter commands:
//!
//! ```text
//! 68;0;0;<addr>m           display start address (next mode apply)
//! 68;0;1;<cols>m           line length override, 0 = auto
//! 68;0;2;<rows>m           height override, 0 = auto
//! 68;10;<n>;<r>;<g>;<b>m   palette entry n from 8-bit components
//! 68;12;<n>;<tile_ctrl>m   TILE_CTRL for font slot n
//! 68;20;16;<gfx_ctrl>m     playfield A GFX_CTRL
//! ```

use tracing::{debug, trace};

use super::state::{ansi_to_vga, TermFlags};
use super::AnsiTerm;
use crate::core::adapter::{VideoAdapter, XReg};

/// Adapter command carried by SGR 68
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VendorCommand {
    SetVramBase(u16),
    SetLineLen(u16),
    SetHeight(u16),
    SetPalette { index: u16, rgb: u16 },
    SetTileCtrl { font: usize, value: u16 },
    SetGfxCtrl(u16),
}

impl VendorCommand {
    /// Parse the parameters following 68. `None` when the command is
    /// unknown or its arguments are missing or out of range.
    pub fn parse(args: &[u16]) -> Option<Self> {
        let (cmd, n, p0) = match args {
            [cmd, n, p0, ..] => (*cmd, *n, *p0),
            _ => return None,
        };

        match (cmd, n) {
            (0, 0) => Some(Self::SetVramBase(p0)),
            (0, 1) => Some(Self::SetLineLen(p0)),
            (0, 2) => Some(Self::SetHeight(p0)),
            (10, index) if index < 256 => match args.get(3..5) {
                Some(&[g, b]) => Some(Self::SetPalette {
                    index,
                    rgb: rgb12(p0, g, b),
                }),
                _ => None,
            },
            (12, font) if font < 4 => Some(Self::SetTileCtrl {
                font: font as usize,
                value: p0,
            }),
            (20, reg) if reg == XReg::PaGfxCtrl.addr() => Some(Self::SetGfxCtrl(p0)),
            _ => None,
        }
    }
}

/// 12-bit RGB from the high nibble of three 8-bit components
fn rgb12(r: u16, g: u16, b: u16) -> u16 {
    ((r & 0xF0) << 4) | (g & 0xF0) | ((b & 0xF0) >> 4)
}

/// VGA palette index for an 8-bit color argument of SGR 38/48
fn indexed_color(n: u16) -> u8 {
    let col = n & 0x0F;
    if col < 8 {
        ansi_to_vga(col)
    } else {
        col as u8
    }
}

impl<A: VideoAdapter> AnsiTerm<A> {
    pub(super) fn execute_sgr(&mut self) {
        let params = self.state.csi_params;
        let count = self.state.param_count.max(1);

        let mut i = 0;
        while i < count {
            let code = params[i];
            let state = &mut self.state;
            match code {
                0 => {
                    state.flags.remove(TermFlags::ATTRIBUTES);
                    state.selected_color = state.default_color;
                }
                1 => {
                    state.flags.remove(TermFlags::DIM);
                    state.flags.insert(TermFlags::BRIGHT);
                }
                2 => {
                    state.flags.remove(TermFlags::BRIGHT);
                    state.flags.insert(TermFlags::DIM);
                }
                7 => state.flags.insert(TermFlags::REVERSE),
                8 => state.flags.insert(TermFlags::PASSTHRU),
                30..=37 => state.selected_color.fg = ansi_to_vga(code - 30),
                39 => state.selected_color.fg = state.default_color.fg,
                40..=47 => state.selected_color.bg = ansi_to_vga(code - 40),
                49 => state.selected_color.bg = state.default_color.bg,
                90..=97 => state.selected_color.fg = ansi_to_vga(code - 90) + 8,
                100..=107 => state.selected_color.bg = ansi_to_vga(code - 100) + 8,
                38 | 48 => {
                    if i + 2 < count && params[i + 1] == 5 {
                        let col = indexed_color(params[i + 2]);
                        if code == 38 {
                            state.default_color.fg = col;
                            state.selected_color.fg = col;
                        } else {
                            state.default_color.bg = col;
                            state.selected_color.bg = col;
                        }
                        i += 2;
                    } else {
                        debug!("SGR {} needs ;5;<n>", code);
                        i = count;
                    }
                }
                68 => {
                    let args = &params[i + 1..count];
                    match VendorCommand::parse(args) {
                        Some(command) => self.run_vendor(command),
                        None => debug!("Bad SGR 68 command {:?}", args),
                    }
                    i = count;
                }
                _ => {
                    debug!("Ignored SGR {}", code);
                }
            }
            self.state.refresh_effective_color();
            i += 1;
        }
    }

    fn run_vendor(&mut self, command: VendorCommand) {
        trace!("SGR 68 {:?}", command);
        let state = &mut self.state;
        match command {
            VendorCommand::SetVramBase(addr) => state.requested_base = addr,
            VendorCommand::SetLineLen(cols) => state.line_len = cols,
            VendorCommand::SetHeight(rows) => state.height = rows,
            VendorCommand::SetPalette { index, rgb } => self.adapter.set_color(index, rgb),
            VendorCommand::SetTileCtrl { font, value } => state.tile_ctrl[font] = value,
            VendorCommand::SetGfxCtrl(value) => state.gfx_ctrl = value,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TermConfig;
    use crate::core::sim::MemAdapter;
    use crate::core::term::ColorPair;

    fn term() -> AnsiTerm<MemAdapter> {
        AnsiTerm::with_adapter(MemAdapter::new(), &TermConfig::default())
    }

    #[test]
    fn test_bright_red() {
        let mut term = term();
        term.put_bytes(b"\x1b[1;31mX");
        assert_eq!(term.state().effective_color.fg, 12);
        assert_eq!(term.adapter().cell(0), 0x0C58);
    }

    #[test]
    fn test_reset_restores_default() {
        let mut term = term();
        term.put_bytes(b"\x1b[1;7;8;35;46m\x1b[m");
        assert!(term.flags().is_empty());
        assert_eq!(term.state().effective_color, ColorPair::new(2, 0));
    }

    #[test]
    fn test_bright_and_dim_exclusive() {
        let mut term = term();
        term.put_bytes(b"\x1b[1;2m");
        assert!(term.flags().contains(TermFlags::DIM));
        assert!(!term.flags().contains(TermFlags::BRIGHT));

        term.put_bytes(b"\x1b[92m");
        // dim clears the intensity bit of light green
        assert_eq!(term.state().effective_color.fg, 2);
    }

    #[test]
    fn test_reverse_swaps_nibbles() {
        let mut term = term();
        term.put_bytes(b"\x1b[34;43;7m");
        assert_eq!(term.state().selected_color, ColorPair::new(1, 6));
        assert_eq!(term.state().effective_color, ColorPair::new(6, 1));
    }

    #[test]
    fn test_default_color_codes() {
        let mut term = term();
        term.put_bytes(b"\x1b[31;44m\x1b[39m");
        assert_eq!(term.state().selected_color, ColorPair::new(2, 1));
        term.put_bytes(b"\x1b[49m");
        assert_eq!(term.state().selected_color, ColorPair::new(2, 0));
    }

    #[test]
    fn test_light_color_aliases() {
        let mut term = term();
        term.put_bytes(b"\x1b[91;104m");
        assert_eq!(term.state().selected_color, ColorPair::new(12, 9));
    }

    #[test]
    fn test_indexed_color_sets_default() {
        let mut term = term();
        term.put_bytes(b"\x1b[38;5;1m");
        assert_eq!(term.state().default_color.fg, 4);
        assert_eq!(term.state().selected_color.fg, 4);

        term.put_bytes(b"\x1b[48;5;14m\x1b[0m");
        assert_eq!(term.state().effective_color, ColorPair::new(4, 14));
    }

    #[test]
    fn test_indexed_color_keeps_following_params() {
        let mut term = term();
        term.put_bytes(b"\x1b[38;5;4;1m");
        let state = term.state();
        assert_eq!(state.selected_color.fg, 1);
        assert!(state.flags.contains(TermFlags::BRIGHT));
        assert_eq!(state.effective_color.fg, 9);

        term.put_bytes(b"\x1b[0;48;5;2;31m");
        let state = term.state();
        assert_eq!(state.selected_color, ColorPair::new(4, 2));
        assert_eq!(state.default_color.bg, 2);
    }

    #[test]
    fn test_malformed_indexed_color_consumes_rest() {
        let mut term = term();
        term.put_bytes(b"\x1b[38;2;1;1m");
        assert_eq!(term.state().selected_color, ColorPair::new(2, 0));
        assert!(!term.flags().contains(TermFlags::BRIGHT));
    }

    #[test]
    fn test_vendor_palette() {
        let mut term = term();
        term.put_bytes(b"\x1b[68;10;5;255;128;16m");
        assert_eq!(term.adapter().color(5), 0x0F81);
    }

    #[test]
    fn test_vendor_too_few_parameters() {
        let mut term = term();
        let before = term.state().clone();
        term.put_bytes(b"\x1b[68;0;1m\x1b[68;10;5;255;128m");

        assert_eq!(term.state().line_len, before.line_len);
        assert_eq!(term.adapter().color(5), 0x0A0A);
    }

    #[test]
    fn test_vendor_geometry_applies_on_mode_change() {
        let mut term = term();
        term.put_bytes(b"\x1b[68;0;1;100m\x1b[68;0;2;20m");
        assert_eq!(term.size(), (80, 30));

        term.put_bytes(b"\x1b(");
        assert_eq!(term.size(), (100, 20));
    }

    #[test]
    fn test_vendor_tile_and_gfx_ctrl() {
        let mut term = term();
        term.put_bytes(b"\x1b[68;12;3;7m\x1b[68;20;16;5m");
        assert_eq!(term.state().tile_ctrl[3], 7);
        assert_eq!(term.state().gfx_ctrl, 5);

        term.put_bytes(b"\x1b[68;12;4;7m\x1b[68;20;17;1m");
        assert_eq!(term.state().gfx_ctrl, 5);
    }

    #[test]
    fn test_parse_vendor_commands() {
        assert_eq!(VendorCommand::parse(&[0, 0, 0x8000]), Some(VendorCommand::SetVramBase(0x8000)));
        assert_eq!(VendorCommand::parse(&[0, 3, 1]), None);
        assert_eq!(
            VendorCommand::parse(&[10, 255, 0xF0, 0xF0, 0xF0]),
            Some(VendorCommand::SetPalette { index: 255, rgb: 0x0FFF })
        );
        assert_eq!(VendorCommand::parse(&[10, 256, 1, 2, 3]), None);
        assert_eq!(VendorCommand::parse(&[99, 0, 0]), None);
        assert_eq!(VendorCommand::parse(&[12]), None);
    }
}
