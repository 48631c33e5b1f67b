//! xansiterm - ANSI terminal emulation on a simulated text-mode adapter
//!
//! Runs terminal output through the emulator core and shows the resulting
//! video memory on the host terminal.
//!
//! # Quick Start
//!
//! ```text
//! xansiterm log.ans         # Render a captured ANSI stream
//! cat log.ans | xansiterm   # Same, from stdin
//! xansiterm -p log.ans      # Print the screen as plain text
//! xansiterm -d              # Built-in demo screen
//! xansiterm -i              # Type into the emulator (Ctrl+] quits)
//! ```

use std::env;
use std::io::{self, IsTerminal, Read};
use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use anyhow::Context;
use crossterm::event::{self, Event, KeyEventKind};
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use xansiterm::ui::{DebugRenderer, KeyboardConsole, Renderer, QUIT_BYTE};
use xansiterm::{AnsiTerm, Config, MemAdapter, Session};

/// Version string from Cargo.toml
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// How the emulated screen is presented
#[derive(Debug, Clone, Copy, PartialEq)]
enum Mode {
    /// Feed the input, then show the screen
    Render,
    /// Feed the input, then print the screen text
    Plain,
    /// Built-in showcase
    Demo,
    /// Keyboard input echoed through the emulator
    Interactive,
}

/// Command line options
struct Args {
    mode: Mode,
    config_path: Option<PathBuf>,
    wide: bool,
    input: Option<PathBuf>,
    init_config: bool,
}

impl Default for Args {
    fn default() -> Self {
        Self {
            mode: Mode::Render,
            config_path: None,
            wide: false,
            input: None,
            init_config: false,
        }
    }
}

fn print_version() {
    eprintln!("xansiterm {}", VERSION);
}

fn print_help() {
    eprintln!("xansiterm {} - ANSI terminal emulation for text-mode video adapters", VERSION);
    eprintln!();
    eprintln!("Usage: xansiterm [OPTIONS] [FILE]");
    eprintln!();
    eprintln!("Reads terminal output from FILE (or stdin) and renders the screen.");
    eprintln!();
    eprintln!("Mode options:");
    eprintln!("  (default)             Render the screen on the host terminal");
    eprintln!("  -p, --plain           Print the screen text only");
    eprintln!("  -d, --demo            Show the built-in demo screen");
    eprintln!("  -i, --interactive     Echo typed keys through the emulator");
    eprintln!();
    eprintln!("Display options:");
    eprintln!("  -w, --wide            Start in the 848x480 (16:9) mode");
    eprintln!("  -c, --config <FILE>   Read settings from FILE");
    eprintln!("      --init-config     Write the default config file and exit");
    eprintln!();
    eprintln!("Other options:");
    eprintln!("  -v, --version         Show version");
    eprintln!("  -h, --help            Show this help");
    eprintln!();
    eprintln!("Interactive mode keys:");
    eprintln!("  Ctrl+]                Quit");
    eprintln!();
    eprintln!("Config: ~/.xansiterm/config.toml");
    eprintln!("Log:    ~/.xansiterm/xansiterm.log (level from RUST_LOG)");
}

/// Parse command line arguments
fn parse_args() -> Result<Args, String> {
    let args: Vec<String> = env::args().collect();
    let mut parsed = Args::default();
    let mut i = 1;

    while i < args.len() {
        match args[i].as_str() {
            "-h" | "--help" => {
                print_help();
                std::process::exit(0);
            }
            "-v" | "--version" => {
                print_version();
                std::process::exit(0);
            }
            "-p" | "--plain" => parsed.mode = Mode::Plain,
            "-d" | "--demo" => parsed.mode = Mode::Demo,
            "-i" | "--interactive" => parsed.mode = Mode::Interactive,
            "-w" | "--wide" => parsed.wide = true,
            "-c" | "--config" => {
                i += 1;
                if i >= args.len() {
                    return Err("Missing config file argument".to_string());
                }
                parsed.config_path = Some(PathBuf::from(&args[i]));
            }
            "--init-config" => parsed.init_config = true,
            arg if arg.starts_with('-') && arg != "-" => {
                return Err(format!("Unknown argument: {}. Use -h for help.", arg));
            }
            arg => {
                if parsed.input.is_some() {
                    return Err(format!("Unexpected argument: {}", arg));
                }
                if arg != "-" {
                    parsed.input = Some(PathBuf::from(arg));
                }
            }
        }
        i += 1;
    }

    Ok(parsed)
}

/// Log to ~/.xansiterm/xansiterm.log, filtered by RUST_LOG
fn init_logging() {
    let log_path = Config::data_dir()
        .map(|dir| dir.join("xansiterm.log"))
        .unwrap_or_else(|| PathBuf::from("xansiterm.log"));

    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .ok();

    if let Some(file) = log_file {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        let subscriber = FmtSubscriber::builder()
            .with_env_filter(filter)
            .with_writer(std::sync::Mutex::new(file))
            .with_ansi(false)
            .finish();
        let _ = tracing::subscriber::set_global_default(subscriber);
    }
}

fn main() -> anyhow::Result<()> {
    let args = match parse_args() {
        Ok(a) => a,
        Err(e) => {
            eprintln!("Error: {}", e);
            eprintln!("Use --help for usage information");
            std::process::exit(1);
        }
    };

    init_logging();
    info!("xansiterm {} starting", VERSION);

    let config = match &args.config_path {
        Some(path) => Config::load_from(path)?,
        None => Config::load(),
    };

    if args.init_config {
        config.save().context("Failed to write config file")?;
        eprintln!("Config written to ~/.xansiterm/config.toml");
        return Ok(());
    }

    let wide = args.wide || config.wide;
    let result = match args.mode {
        Mode::Interactive => run_interactive(&config, wide),
        Mode::Demo => {
            let mut term = new_terminal(&config, wide, false);
            term.put_bytes(DEMO_SCREEN.as_bytes());
            show(&term)
        }
        Mode::Plain | Mode::Render => {
            let input = read_input(args.input.as_ref())?;
            let mut term = new_terminal(&config, wide, false);
            term.put_bytes(&input);
            if args.mode == Mode::Plain {
                print!("{}", DebugRenderer::plain_text(&term));
                Ok(())
            } else {
                show(&term)
            }
        }
    };

    if let Err(e) = &result {
        error!("{:#}", e);
    }
    info!("xansiterm exiting");
    result
}

fn new_terminal(config: &Config, wide: bool, realtime: bool) -> AnsiTerm<MemAdapter> {
    let adapter = if realtime {
        MemAdapter::new().with_realtime_timer()
    } else {
        MemAdapter::new()
    };
    let mut term = AnsiTerm::with_adapter(adapter, &config.term);
    if wide {
        term.init_wide(true);
    }
    term
}

/// Read the whole input stream
fn read_input(path: Option<&PathBuf>) -> anyhow::Result<Vec<u8>> {
    match path {
        Some(path) => std::fs::read(path).with_context(|| format!("Failed to read {}", path.display())),
        None => {
            let mut stdin = io::stdin();
            if stdin.is_terminal() {
                anyhow::bail!("No input. Give a FILE, pipe data on stdin, or use --demo.");
            }
            let mut input = Vec::new();
            stdin.read_to_end(&mut input).context("Failed to read stdin")?;
            Ok(input)
        }
    }
}

/// Show the screen full-size until a key is pressed, or dump it as text
/// when stdout is not a terminal
fn show(term: &AnsiTerm<MemAdapter>) -> anyhow::Result<()> {
    if !io::stdout().is_terminal() {
        print!("{}", DebugRenderer::render(term));
        return Ok(());
    }

    let mut renderer = Renderer::new();
    renderer.init()?;
    renderer.render(term)?;
    loop {
        match event::read()? {
            Event::Key(key) if key.kind == KeyEventKind::Press => break,
            Event::Resize(_, _) => {
                renderer.invalidate();
                renderer.render(term)?;
            }
            _ => {}
        }
    }
    renderer.cleanup()?;
    Ok(())
}

fn run_interactive(config: &Config, wide: bool) -> anyhow::Result<()> {
    let mut term = new_terminal(config, wide, true);
    term.put_bytes(b"xansiterm interactive mode. Ctrl+] to quit.\r\n\r\n");

    let mut session = Session::new(term, KeyboardConsole::new());
    let mut renderer = Renderer::new();
    renderer.init()?;

    let result = run_main_loop(&mut session, &mut renderer);
    renderer.cleanup()?;
    result
}

fn run_main_loop(
    session: &mut Session<MemAdapter, KeyboardConsole>,
    renderer: &mut Renderer,
) -> anyhow::Result<()> {
    let idle = Duration::from_millis(16);

    loop {
        if !session.check_char_with_cursor() {
            renderer.render(session.term())?;
            thread::sleep(idle);
            continue;
        }

        let byte = session.read_char_with_cursor()?;
        if byte == QUIT_BYTE {
            info!("Quit requested");
            break;
        }
        session.put_char(byte);
        let flags = session.term().flags();
        session.console_mut().set_flags(flags);
        renderer.render(session.term())?;
    }
    Ok(())
}

/// Demo output: colors, attributes, cursor save/restore and a palette change
const DEMO_SCREEN: &str = concat!(
    "\x1b[2J\x1b[H",
    "\x1b[1;97;44m xansiterm demo \x1b[0m\r\n",
    "\r\n",
    "Colors:  \x1b[31mred \x1b[32mgreen \x1b[33myellow \x1b[34mblue \x1b[35mmagenta \x1b[36mcyan\x1b[0m\r\n",
    "Bright:  \x1b[91mred \x1b[92mgreen \x1b[93myellow \x1b[94mblue \x1b[95mmagenta \x1b[96mcyan\x1b[0m\r\n",
    "Bold:    \x1b[1;31mred \x1b[32mgreen \x1b[34mblue\x1b[0m\r\n",
    "Reverse: \x1b[7m reversed \x1b[0m  Dim: \x1b[1;2mdim\x1b[0m\r\n",
    "\r\n",
    "\x1b[s\x1b[12;40H\x1b[30;47m saved cursor, jumped, came back \x1b[0m\x1b[u",
    "Tabs:\tone\ttwo\tthree\r\n",
    "\r\n",
    "\x1b[68;10;6;255;0;0mPalette entry 6 (yellow) redefined to pure red\r\n",
    "\x1b[33mThis yellow is now red.\x1b[0m\r\n",
    "\r\n",
    "\x1b[5;60H\x1b[46m    \x1b[6;60H    \x1b[7;60H    \x1b[0m",
    "\x1b[20;1HErase to end of line:\x1b[43m          \x1b[15D\x1b[K\x1b[0m\r\n",
    "\x1b[24;1HPress any key to exit.",
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_demo_screen_renders() {
        let mut term = new_terminal(&Config::default(), false, false);
        term.put_bytes(DEMO_SCREEN.as_bytes());
        let text = DebugRenderer::plain_text(&term);
        assert!(text.starts_with(" xansiterm demo"));
        assert!(text.contains("saved cursor, jumped, came back"));
        assert!(text.contains("Press any key to exit."));
        assert_eq!(term.adapter().color(6), 0x0F00);
    }

    #[test]
    fn test_wide_terminal() {
        let term = new_terminal(&Config::default(), true, false);
        assert_eq!(term.size(), (106, 30));
    }
}
