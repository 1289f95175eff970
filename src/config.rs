//! Booth configuration
//!
//! Defaults, overlaid by an optional JSON file, overlaid by `SNAPBOOTH_*`
//! environment variables.

use std::fs;
use std::path::{Path, PathBuf};

use log::debug;
use serde::{Deserialize, Serialize};

use crate::collage::{DEFAULT_FONT_SIZE, DEFAULT_JPEG_QUALITY, MAX_FONT_SIZE};
use crate::error::{BoothError, Result};

const ENV_PHOTOS_DIR: &str = "SNAPBOOTH_PHOTOS_DIR";
const ENV_PHOTO_QUALITY: &str = "SNAPBOOTH_PHOTO_QUALITY";
const ENV_FONT_PATH: &str = "SNAPBOOTH_FONT_PATH";
const ENV_FONT_SIZE: &str = "SNAPBOOTH_FONT_SIZE";

/// Runtime settings for the booth
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BoothConfig {
    /// Where finished collages are written
    pub photos_dir: PathBuf,
    /// JPEG quality for finished collages (1-100)
    pub photo_quality: u8,
    /// Preferred font for the timestamp; system fonts are tried after it
    pub font_path: Option<PathBuf>,
    pub font_size: f32,
    /// Size of synthetic frames when no camera directory is given
    pub frame_width: u32,
    pub frame_height: u32,
    /// Mirror frames horizontally like a selfie preview
    pub mirror_frames: bool,
}

impl Default for BoothConfig {
    fn default() -> Self {
        Self {
            photos_dir: PathBuf::from("photos"),
            photo_quality: DEFAULT_JPEG_QUALITY,
            font_path: None,
            font_size: DEFAULT_FONT_SIZE,
            frame_width: 1920,
            frame_height: 1080,
            mirror_frames: true,
        }
    }
}

/// Where the loaded values came from
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigSources {
    pub file: Option<PathBuf>,
    pub env_overrides: Vec<String>,
}

impl BoothConfig {
    /// Load defaults, then `path` if given, then the process environment.
    pub fn load(path: Option<&Path>) -> Result<(Self, ConfigSources)> {
        let mut sources = ConfigSources::default();
        let mut config = match path {
            Some(path) => {
                sources.file = Some(path.to_path_buf());
                Self::from_file(path)?
            }
            None => Self::default(),
        };

        config.apply_env(|key| std::env::var(key).ok(), &mut sources)?;
        config.validate()?;
        debug!("Loaded config from {:?}", sources);
        Ok((config, sources))
    }

    /// Parse a JSON config file; missing keys keep their defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|e| BoothError::Config {
            origin: path.display().to_string(),
            reason: e.to_string(),
        })?;

        serde_json::from_str(&contents).map_err(|e| BoothError::Config {
            origin: path.display().to_string(),
            reason: e.to_string(),
        })
    }

    /// Overlay values found through `lookup`, recording each override.
    pub fn apply_env<F>(&mut self, lookup: F, sources: &mut ConfigSources) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup(ENV_PHOTOS_DIR) {
            self.photos_dir = PathBuf::from(v);
            sources.env_overrides.push(ENV_PHOTOS_DIR.to_string());
        }
        if let Some(v) = lookup(ENV_PHOTO_QUALITY) {
            self.photo_quality = v.trim().parse().map_err(|_| env_error(ENV_PHOTO_QUALITY, &v))?;
            sources.env_overrides.push(ENV_PHOTO_QUALITY.to_string());
        }
        if let Some(v) = lookup(ENV_FONT_PATH) {
            self.font_path = Some(PathBuf::from(v));
            sources.env_overrides.push(ENV_FONT_PATH.to_string());
        }
        if let Some(v) = lookup(ENV_FONT_SIZE) {
            self.font_size = v.trim().parse().map_err(|_| env_error(ENV_FONT_SIZE, &v))?;
            sources.env_overrides.push(ENV_FONT_SIZE.to_string());
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if !(1..=100).contains(&self.photo_quality) {
            return Err(BoothError::Config {
                origin: "photo_quality".to_string(),
                reason: format!("must be between 1 and 100, got {}", self.photo_quality),
            });
        }
        if !(self.font_size > 0.0 && self.font_size <= MAX_FONT_SIZE) {
            return Err(BoothError::Config {
                origin: "font_size".to_string(),
                reason: format!(
                    "must be greater than 0 and at most {}, got {}",
                    MAX_FONT_SIZE, self.font_size
                ),
            });
        }
        Ok(())
    }
}

fn env_error(key: &str, value: &str) -> BoothError {
    BoothError::Config {
        origin: key.to_string(),
        reason: format!("cannot parse '{}'", value),
    }
}
