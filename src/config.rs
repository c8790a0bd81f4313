//! Configuration file handling

use std::error::Error;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use directories::ProjectDirs;
use kontrol_display_core::DisplayError;
use kontrol_mk2::{DisplayLayout, Encoding};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub display: DisplayConfig,
    pub refresh: RefreshConfig,
    pub media: MediaConfig,
}

impl Config {
    /// Get the config file path for this platform
    pub fn path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "kontrol-display")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Load config from file, or create default if it doesn't exist
    pub fn load_or_create() -> Result<Self, Box<dyn Error>> {
        let path = Self::path().ok_or("could not determine config directory")?;

        if path.exists() {
            let contents = fs::read_to_string(&path)?;
            let config: Config = toml::from_str(&contents)?;
            Ok(config)
        } else {
            let config = Config::default();
            config.save_with_header()?;
            tracing::info!("created default config at {}", path.display());
            Ok(config)
        }
    }

    /// Save config with header comments for new files
    pub fn save_with_header(&self) -> Result<(), Box<dyn Error>> {
        let path = Self::path().ok_or("could not determine config directory")?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let header = r#"# kontrol-display configuration file
# width/height describe the virtual surface covering both screens

"#;
        let contents = toml::to_string_pretty(self)?;
        fs::write(&path, format!("{header}{contents}"))?;
        Ok(())
    }
}

/// Pixel layout written into the transfer buffers
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EncodingKind {
    #[default]
    Opcode,
    Blocks,
}

impl From<EncodingKind> for Encoding {
    fn from(kind: EncodingKind) -> Self {
        match kind {
            EncodingKind::Opcode => Encoding::Opcode,
            EncodingKind::Blocks => Encoding::Blocks,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Width of the virtual surface
    pub width: u32,
    /// Height of the virtual surface
    pub height: u32,
    /// Split the surface into a left and a right screen
    pub split: bool,
    /// Display selector of the left (or only) screen
    pub left_display: u8,
    /// Display selector of the right screen
    pub right_display: u8,
    pub encoding: EncodingKind,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        let (width, height) = DisplayLayout::kontrol_mk2().surface_size();
        Self {
            width,
            height,
            split: true,
            left_display: 0,
            right_display: 1,
            encoding: EncodingKind::Opcode,
        }
    }
}

impl DisplayConfig {
    /// Build the driver layout, rejecting sizes the wire format cannot carry
    pub fn layout(&self) -> Result<DisplayLayout, DisplayError> {
        let layout = if self.split {
            DisplayLayout::split(self.width, self.height)?
        } else {
            DisplayLayout::single(self.width, self.height)?
        };
        Ok(layout
            .with_displays(self.left_display, self.right_display)
            .with_encoding(self.encoding.into()))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RefreshConfig {
    /// Resend interval for the refresh command
    #[serde(with = "humantime_serde")]
    pub interval: Duration,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(100),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaConfig {
    /// Background color for transparent images (hex)
    pub background_color: String,
    /// Use nearest neighbor interpolation
    pub use_nearest_neighbor: bool,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            background_color: "#000000".into(),
            use_nearest_neighbor: false,
        }
    }
}
