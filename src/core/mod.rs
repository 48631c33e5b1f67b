//! Core terminal emulation components.
//!
//! - **adapter**: register interface of the text-mode video adapter
//! - **term**: VT100/ANSI state machine rendering into adapter VRAM
//! - **session**: terminal plus console input with a blinking cursor
//! - **sim**: memory-backed adapter and scripted console
//!
//! # Architecture
//!
//! ```text
//! Session
//! ├── Console (input bytes)
//! └── AnsiTerm
//!     ├── SessionState (cursor, geometry, colors, parser registers)
//!     └── VideoAdapter (VRAM ports + XR registers)
//! ```

pub mod adapter;
pub mod session;
pub mod sim;
pub mod term;
