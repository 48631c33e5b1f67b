//! Host terminal front end.
//!
//! - **renderer**: paints the emulated VRAM grid with crossterm
//! - **keymapper**: key events to console bytes
//! - **console**: keyboard `Console` for interactive sessions

pub mod console;
pub mod keymapper;
pub mod renderer;

pub use console::KeyboardConsole;
pub use keymapper::*;
pub use renderer::*;
