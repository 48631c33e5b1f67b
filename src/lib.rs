//! xansiterm - VT100/ANSI terminal emulation for text-mode video adapters.
//!
//! Bytes written to an [`AnsiTerm`] are interpreted as terminal output and
//! rendered straight into the video memory of a [`VideoAdapter`]. A
//! [`Session`] adds console input with a blinking cursor.

pub mod config;
pub mod core;
pub mod ui;

pub use crate::config::{Config, ConfigError, TermConfig};
pub use crate::core::adapter::{AdapterError, TextGeometry, VideoAdapter, XReg};
pub use crate::core::session::{Console, ConsoleError, Session};
pub use crate::core::sim::{MemAdapter, ScriptConsole};
pub use crate::core::term::{AnsiTerm, ColorPair, ParserState, TermFlags, VendorCommand};
