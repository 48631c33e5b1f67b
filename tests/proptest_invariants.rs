//! Property tests for cursor bookkeeping and parameter parsing

use proptest::prelude::*;
use xansiterm::{AnsiTerm, MemAdapter, ParserState, TermConfig};

fn term() -> AnsiTerm<MemAdapter> {
    AnsiTerm::with_adapter(MemAdapter::new(), &TermConfig::default())
}

/// Output that looks like a real program: text, controls and sequences
fn output_chunk() -> impl Strategy<Value = Vec<u8>> {
    let fixed = vec![
        "\r\n", "\t", "\x08", "\x0b", "\x1bM", "\x1bE", "\x1b7", "\x1b8", "\x1b[?7l", "\x1b[?7h",
        "\x1b[20h", "\x1b[20l", "\x1b(", "\x1b)",
    ];
    prop_oneof![
        "[ -~]{1,40}".prop_map(String::into_bytes),
        prop::sample::select(fixed).prop_map(|s| s.as_bytes().to_vec()),
        (0u16..100, 0u16..200).prop_map(|(r, c)| format!("\x1b[{};{}H", r, c).into_bytes()),
        (0u16..100, prop::sample::select(vec!['A', 'B', 'C', 'D', 'J', 'K', 'm']))
            .prop_map(|(n, f)| format!("\x1b[{}{}", n, f).into_bytes()),
        proptest::collection::vec(any::<u8>(), 1..16),
    ]
}

proptest! {
    #[test]
    fn cursor_stays_on_grid(chunks in proptest::collection::vec(output_chunk(), 0..64)) {
        let mut term = term();
        for chunk in &chunks {
            term.put_bytes(chunk);
            let state = term.state();
            prop_assert!(state.x < state.cols, "x={} cols={}", state.x, state.cols);
            prop_assert!(state.y < state.rows, "y={} rows={}", state.y, state.rows);
            prop_assert!(state.is_xy_consistent());
            prop_assert!(state.cursor_addr >= state.vram_base);
            prop_assert!(state.cursor_addr <= state.vram_end);
            prop_assert!(state.param_count <= 16);
        }
    }

    #[test]
    fn parameters_saturate(digits in "[0-9]{1,12}") {
        let mut term = term();
        term.put_bytes(b"\x1b[");
        term.put_bytes(digits.as_bytes());

        let expected = digits.parse::<u64>().unwrap().min(u16::MAX as u64) as u16;
        prop_assert_eq!(term.state().parser, ParserState::Csi);
        prop_assert_eq!(term.state().params(), &[expected][..]);
    }

    #[test]
    fn cursor_overlay_restores_cell(chunks in proptest::collection::vec(output_chunk(), 0..32)) {
        let mut term = term();
        for chunk in &chunks {
            term.put_bytes(chunk);
        }
        // finish any open sequence so the next bytes are plain output
        term.put_bytes(b"\x18");

        let state = term.state();
        let (base, size) = (state.vram_base, state.vram_size);
        let before: Vec<u16> = (0..size).map(|i| term.adapter().cell(base + i)).collect();

        term.draw_cursor();
        prop_assert!(term.is_cursor_drawn());
        term.erase_cursor();

        let after: Vec<u16> = (0..size).map(|i| term.adapter().cell(base + i)).collect();
        prop_assert_eq!(before, after);
    }

    #[test]
    fn plain_text_fills_rows_in_order(text in "[!-~]{1,2000}") {
        let mut term = term();
        term.put_bytes(text.as_bytes());

        let len = text.len() as u16;
        prop_assert_eq!(term.cursor(), (len % 80, len / 80));
        let glyphs = term.adapter().glyphs(0, len);
        prop_assert_eq!(glyphs, text.into_bytes());
    }
}
