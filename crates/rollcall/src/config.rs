//! Configuration management for rollcall.
//!
//! This module provides configuration loading and validation using figment,
//! supporting TOML config files, environment variables, and defaults.

use std::path::PathBuf;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::photo::Facing;
use crate::signature::raster::parse_hex_color;

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Default data directory name.
const DATA_DIR_NAME: &str = "rollcall";

/// Default database file name.
const DATABASE_FILE_NAME: &str = "members.db";

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `ROLLCALL_`, sections separated
///    by `__`, e.g. `ROLLCALL_PHOTO__JPEG_QUALITY`)
/// 2. TOML config file at `~/.config/rollcall/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Storage configuration.
    pub storage: StorageConfig,
    /// Signature pad configuration.
    pub signature: SignatureConfig,
    /// Photo capture configuration.
    pub photo: PhotoConfig,
    /// Registration form configuration.
    pub form: FormConfig,
}

/// Storage-related configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path to the database file.
    /// Defaults to `~/.local/share/rollcall/members.db`
    pub database_path: Option<PathBuf>,
}

/// Signature pad configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignatureConfig {
    /// Raster width in pixels.
    pub width: u32,
    /// Raster height in pixels.
    pub height: u32,
    /// Ink color as `#rrggbb`.
    pub stroke_color: String,
    /// Line width in raster pixels.
    pub stroke_width: f32,
}

/// Photo capture configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhotoConfig {
    /// Preferred camera frame width.
    pub ideal_width: u32,
    /// Preferred camera frame height.
    pub ideal_height: u32,
    /// JPEG quality for camera snapshots (1-100).
    pub jpeg_quality: u8,
    /// Camera direction used when none is given.
    pub default_facing: Facing,
}

/// Registration form configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormConfig {
    /// Church pre-filled on every new draft.
    pub default_church: String,
    /// Reject submissions whose email does not look like an address.
    pub require_email_format: bool,
}

impl Default for SignatureConfig {
    fn default() -> Self {
        Self {
            width: 400,
            height: 128,
            stroke_color: "#1e3a8a".to_string(),
            stroke_width: 2.0,
        }
    }
}

impl Default for PhotoConfig {
    fn default() -> Self {
        Self {
            ideal_width: 1280,
            ideal_height: 720,
            jpeg_quality: 90,
            default_facing: Facing::Front,
        }
    }
}

impl Default for FormConfig {
    fn default() -> Self {
        Self {
            default_church: "Universal".to_string(),
            require_email_format: true,
        }
    }
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// Configuration is loaded in this order (later sources override earlier):
    /// 1. Default values
    /// 2. TOML config file (if exists)
    /// 3. Environment variables (prefixed with `ROLLCALL_`)
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration with an optional custom config path.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);

        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_file))
            .merge(Env::prefixed("ROLLCALL_").split("__"));

        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(DATA_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Get the default data directory path.
    #[must_use]
    pub fn default_data_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from(".local/share"))
            .join(DATA_DIR_NAME)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        if self.signature.width == 0 || self.signature.height == 0 {
            return Err(Error::ConfigValidation {
                message: format!(
                    "signature raster must be non-empty, got {}x{}",
                    self.signature.width, self.signature.height
                ),
            });
        }

        if !(self.signature.stroke_width > 0.0 && self.signature.stroke_width.is_finite()) {
            return Err(Error::ConfigValidation {
                message: format!(
                    "stroke_width must be positive, got {}",
                    self.signature.stroke_width
                ),
            });
        }

        parse_hex_color(&self.signature.stroke_color)?;

        if !(1..=100).contains(&self.photo.jpeg_quality) {
            return Err(Error::ConfigValidation {
                message: format!(
                    "jpeg_quality must be between 1 and 100, got {}",
                    self.photo.jpeg_quality
                ),
            });
        }

        if self.photo.ideal_width == 0 || self.photo.ideal_height == 0 {
            return Err(Error::ConfigValidation {
                message: "ideal camera resolution must be non-zero".to_string(),
            });
        }

        Ok(())
    }

    /// Get the database path, resolving defaults if not set.
    #[must_use]
    pub fn database_path(&self) -> PathBuf {
        self.storage
            .database_path
            .clone()
            .unwrap_or_else(|| Self::default_data_dir().join(DATABASE_FILE_NAME))
    }
}
