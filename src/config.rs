//! Configuration for xansiterm.
//!
//! Settings are read from `~/.xansiterm/config.toml` (or a path given with
//! `--config`). Every field is optional; missing values fall back to the
//! power-on presets of the terminal.
//!
//! ```toml
//! # Start in 848x480 (16:9) instead of 640x480
//! wide = false
//!
//! [term]
//! font = 0
//! gfx_ctrl = 0
//! vram_base = 0
//! line_len = 0          # 0 = derive from display width
//! height = 0            # 0 = derive from display height
//! tile_ctrl = [0x000F, 0x0807, 0x0C07, 0x000F]
//!
//! [term.default_color]
//! fg = 2
//! bg = 0
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::adapter::make_tile_ctrl;
use crate::core::term::state::ColorPair;

/// Power-on color: dark green on black
pub const DEFAULT_COLOR: u8 = 0x02;

/// Standard 16-color VGA palette (12-bit RGB)
pub const VGA_PALETTE: [u16; 16] = [
    0x0000, // black
    0x000A, // blue
    0x00A0, // green
    0x00AA, // cyan
    0x0A00, // red
    0x0A0A, // magenta
    0x0A50, // brown
    0x0AAA, // white
    0x0555, // gray
    0x055F, // light blue
    0x05F5, // light green
    0x05FF, // light cyan
    0x0F55, // light red
    0x0F5F, // light magenta
    0x0FF5, // yellow
    0x0FFF, // bright white
];

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Failed to write config: {0}")]
    Write(#[source] std::io::Error),

    #[error("Could not determine config path")]
    NoPath,
}

/// Main configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Start in the 848x480 mode
    pub wide: bool,
    /// Terminal presets
    pub term: TermConfig,
}

/// Presets applied by terminal initialization
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TermConfig {
    pub default_color: ColorPair,
    /// Font slot selected at start (0-3)
    pub font: u8,
    /// TILE_CTRL value for each font slot
    pub tile_ctrl: [u16; 4],
    pub gfx_ctrl: u16,
    pub vram_base: u16,
    pub line_len: u16,
    pub height: u16,
    /// Palette programmed on every mode apply
    pub palette: Vec<u16>,
}

impl Default for TermConfig {
    fn default() -> Self {
        Self {
            default_color: ColorPair::from_attr(DEFAULT_COLOR),
            font: 0,
            tile_ctrl: [
                make_tile_ctrl(0x0000, false, 16),
                make_tile_ctrl(0x0800, false, 8),
                make_tile_ctrl(0x0C00, false, 8),
                make_tile_ctrl(0x0000, false, 16),
            ],
            gfx_ctrl: 0,
            vram_base: 0,
            line_len: 0,
            height: 0,
            palette: VGA_PALETTE.to_vec(),
        }
    }
}

impl Config {
    /// Load configuration from the default location, falling back to defaults
    pub fn load() -> Self {
        if let Some(path) = Self::get_config_path() {
            if path.exists() {
                match Self::load_from(&path) {
                    Ok(config) => return config,
                    Err(e) => tracing::warn!("{}, using defaults", e),
                }
            }
        }
        Self::default()
    }

    /// Load configuration from a specific file
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Save configuration to the default location
    pub fn save(&self) -> Result<(), ConfigError> {
        let path = Self::get_config_path().ok_or(ConfigError::NoPath)?;
        let content = toml::to_string_pretty(self)?;
        fs::write(&path, content).map_err(ConfigError::Write)
    }

    /// Directory holding the config and log files
    pub fn data_dir() -> Option<PathBuf> {
        let dir = home_dir()?.join(".xansiterm");
        if !dir.exists() {
            let _ = fs::create_dir_all(&dir);
        }
        Some(dir)
    }

    fn get_config_path() -> Option<PathBuf> {
        Self::data_dir().map(|dir| dir.join("config.toml"))
    }
}

// Get home directory
fn home_dir() -> Option<PathBuf> {
    std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .map(PathBuf::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = TermConfig::default();
        assert_eq!(config.default_color.attr(), DEFAULT_COLOR);
        assert_eq!(config.tile_ctrl, [0x000F, 0x0807, 0x0C07, 0x000F]);
        assert_eq!(config.palette.len(), 16);
        assert_eq!(config.palette[14], 0x0FF5);
    }

    #[test]
    fn test_partial_file() {
        let config = Config::parse(
            r#"
            wide = true

            [term]
            font = 1
            line_len = 100

            [term.default_color]
            fg = 15
            bg = 1
            "#,
        )
        .unwrap();

        assert!(config.wide);
        assert_eq!(config.term.font, 1);
        assert_eq!(config.term.line_len, 100);
        assert_eq!(config.term.default_color.attr(), 0x1F);
        // untouched fields keep their defaults
        assert_eq!(config.term.tile_ctrl, TermConfig::default().tile_ctrl);
    }

    #[test]
    fn test_color_indices_are_masked() {
        let config = Config::parse(
            r#"
            [term.default_color]
            fg = 200
            bg = 17
            "#,
        )
        .unwrap();
        assert_eq!(config.term.default_color, ColorPair::new(8, 1));
        assert_eq!(config.term.default_color.fg, 8);
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        assert!(Config::parse("wide = \"yes\"").is_err());

        let dir = std::env::temp_dir().join(format!("xansiterm-cfg-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("bad.toml");
        fs::write(&path, "[term\nfont = ").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_round_trip_through_toml() {
        let mut config = Config::default();
        config.term.gfx_ctrl = 0x0005;
        let text = toml::to_string_pretty(&config).unwrap();
        assert_eq!(Config::parse(&text).unwrap(), config);
    }
}
