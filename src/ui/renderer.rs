//! Host terminal renderer using crossterm
//!
//! Paints the text grid held in `MemAdapter` VRAM onto the host terminal,
//! translating palette entries to 24-bit colors.

use std::io::{self, Write};

use crossterm::{
    cursor::{Hide, MoveTo, Show},
    execute, queue,
    style::{Attribute, Color, Print, ResetColor, SetAttribute, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType, DisableLineWrap, EnableLineWrap, EnterAlternateScreen, LeaveAlternateScreen},
};

use crate::core::sim::MemAdapter;
use crate::core::term::{AnsiTerm, ColorPair};

/// 12-bit palette value to a crossterm color
pub fn rgb12_to_color(rgb: u16) -> Color {
    let expand = |nibble: u16| ((nibble & 0x0F) * 0x11) as u8;
    Color::Rgb {
        r: expand(rgb >> 8),
        g: expand(rgb >> 4),
        b: expand(rgb),
    }
}

/// Printable stand-in for a glyph code
pub fn glyph_char(glyph: u8) -> char {
    match glyph {
        0x00 => ' ',
        0x20..=0x7E => glyph as char,
        _ => '\u{00B7}',
    }
}

/// Cells of row `y` as (color, glyph)
fn row_cells(term: &AnsiTerm<MemAdapter>, y: u16) -> impl Iterator<Item = (ColorPair, u8)> + '_ {
    let state = term.state();
    let start = state.addr_of(0, y);
    (0..state.cols).map(move |x| {
        let cell = term.adapter().cell(start.wrapping_add(x));
        (ColorPair::from_attr((cell >> 8) as u8), (cell & 0xFF) as u8)
    })
}

/// Terminal renderer
pub struct Renderer {
    /// Whether the terminal has been initialized
    initialized: bool,
    /// Cells drawn by the previous frame, row-major
    prev_frame: Vec<u16>,
    prev_size: (u16, u16),
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer {
    pub fn new() -> Self {
        Self {
            initialized: false,
            prev_frame: Vec::new(),
            prev_size: (0, 0),
        }
    }

    /// Initialize the terminal for rendering
    pub fn init(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(
            stdout,
            EnterAlternateScreen,
            DisableLineWrap,
            Hide,
            Clear(ClearType::All),
            MoveTo(0, 0)
        )?;
        self.initialized = true;
        tracing::debug!("Renderer initialized");
        Ok(())
    }

    /// Cleanup the terminal
    pub fn cleanup(&mut self) -> io::Result<()> {
        if !self.initialized {
            return Ok(());
        }
        self.initialized = false;

        let mut stdout = io::stdout();
        let _ = execute!(stdout, ResetColor, SetAttribute(Attribute::Reset));
        let _ = execute!(stdout, Show, EnableLineWrap, LeaveAlternateScreen);
        let _ = stdout.flush();
        terminal::disable_raw_mode()?;
        Ok(())
    }

    /// Forget the previous frame so the next render repaints everything
    pub fn invalidate(&mut self) {
        self.prev_frame.clear();
    }

    /// Render rows that changed since the last frame
    pub fn render(&mut self, term: &AnsiTerm<MemAdapter>) -> io::Result<()> {
        let (cols, rows) = term.size();
        if self.prev_size != (cols, rows) {
            self.prev_size = (cols, rows);
            self.prev_frame.clear();
            execute!(io::stdout(), Clear(ClearType::All))?;
        }
        if self.prev_frame.len() != cols as usize * rows as usize {
            self.prev_frame = vec![!0; cols as usize * rows as usize];
        }

        let (host_cols, host_rows) = terminal::size().unwrap_or((cols, rows));
        let palette: Vec<Color> = (0..16).map(|i| rgb12_to_color(term.adapter().color(i))).collect();

        let stdout = io::stdout();
        let mut out = io::BufWriter::with_capacity(65536, stdout.lock());

        for y in 0..rows.min(host_rows) {
            let start = term.state().addr_of(0, y);
            let line: Vec<u16> = (0..cols).map(|x| term.adapter().cell(start.wrapping_add(x))).collect();
            let offset = y as usize * cols as usize;
            if self.prev_frame[offset..offset + cols as usize] == line[..] {
                continue;
            }
            self.prev_frame[offset..offset + cols as usize].copy_from_slice(&line);

            queue!(out, MoveTo(0, y))?;
            let mut current: Option<ColorPair> = None;
            let mut text = String::with_capacity(cols as usize);
            for (color, glyph) in row_cells(term, y).take(host_cols as usize) {
                if current != Some(color) {
                    if !text.is_empty() {
                        queue!(out, Print(&text))?;
                        text.clear();
                    }
                    queue!(
                        out,
                        SetForegroundColor(palette[color.fg as usize]),
                        SetBackgroundColor(palette[color.bg as usize])
                    )?;
                    current = Some(color);
                }
                text.push(glyph_char(glyph));
            }
            if !text.is_empty() {
                queue!(out, Print(&text))?;
            }
        }

        queue!(out, ResetColor)?;
        out.flush()
    }
}

impl Drop for Renderer {
    fn drop(&mut self) {
        let _ = self.cleanup();
    }
}

/// Renders the grid as plain text
pub struct DebugRenderer;

impl DebugRenderer {
    /// Grid with a header, cursor row marker and cursor cell
    pub fn render(term: &AnsiTerm<MemAdapter>) -> String {
        let state = term.state();
        let (cx, cy) = term.cursor();
        let mut output = String::new();

        output.push_str(&format!(
            "=== Terminal {}x{} base=0x{:04x} ===\n",
            state.cols, state.rows, state.vram_base
        ));
        output.push_str(&format!(
            "Cursor: ({}, {}) lcf={} flags={:?}\n",
            cx, cy, state.lcf, state.flags
        ));
        output.push_str(&"-".repeat(state.cols as usize + 1));
        output.push('\n');

        for y in 0..state.rows {
            output.push(if y == cy { '>' } else { ' ' });
            for (x, (_, glyph)) in row_cells(term, y).enumerate() {
                if y == cy && x == cx as usize {
                    output.push('_');
                } else {
                    output.push(glyph_char(glyph));
                }
            }
            output.push('\n');
        }

        output.push_str(&"-".repeat(state.cols as usize + 1));
        output.push('\n');
        output
    }

    /// Screen text only, trailing blanks and blank trailing lines removed
    pub fn plain_text(term: &AnsiTerm<MemAdapter>) -> String {
        let mut lines: Vec<String> = (0..term.state().rows)
            .map(|y| {
                let line: String = row_cells(term, y).map(|(_, glyph)| glyph_char(glyph)).collect();
                line.trim_end().to_string()
            })
            .collect();
        while lines.last().map_or(false, |l| l.is_empty()) {
            lines.pop();
        }
        let mut text = lines.join("\n");
        text.push('\n');
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TermConfig;

    #[test]
    fn test_palette_expansion() {
        assert_eq!(rgb12_to_color(0x0F81), Color::Rgb { r: 0xFF, g: 0x88, b: 0x11 });
        assert_eq!(rgb12_to_color(0x0000), Color::Rgb { r: 0, g: 0, b: 0 });
    }

    #[test]
    fn test_glyph_char() {
        assert_eq!(glyph_char(b'A'), 'A');
        assert_eq!(glyph_char(0), ' ');
        assert_eq!(glyph_char(0x1B), '\u{00B7}');
    }

    #[test]
    fn test_plain_text() {
        let mut term = AnsiTerm::with_adapter(MemAdapter::new(), &TermConfig::default());
        term.put_bytes(b"one\r\n  two  \r\n");
        assert_eq!(DebugRenderer::plain_text(&term), "one\n  two\n");
    }

    #[test]
    fn test_debug_render_marks_cursor() {
        let mut term = AnsiTerm::with_adapter(MemAdapter::new(), &TermConfig::default());
        term.put_bytes(b"ab");
        let text = DebugRenderer::render(&term);
        let lines: Vec<&str> = text.lines().collect();
        assert!(lines[0].contains("80x30"));
        assert!(lines[3].starts_with(">ab_"));
        assert!(lines[4].starts_with(' '));
    }
}
