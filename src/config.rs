// SPDX-License-Identifier: GPL-3.0-only

//! User configuration, stored as JSON under the XDG config dir

use crate::backends::camera::{CameraBackendType, FacingMode};
use crate::constants::{APP_DIR_NAME, CONFIG_FILE_NAME, LOG_FILE_NAME, pipeline};
use crate::errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Camera backend to use (V4L2 or PipeWire)
    pub backend: CameraBackendType,
    /// Facing mode requested by the "Default" entry
    pub default_facing: FacingMode,
    /// Preview frame width
    pub preview_width: u32,
    /// Preview frame height
    pub preview_height: u32,
    /// Log filter used when RUST_LOG is not set
    pub log_level: String,
    /// Device id of the last successfully opened camera
    pub last_device_id: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend: CameraBackendType::default(),
            default_facing: FacingMode::default(),
            preview_width: pipeline::DEFAULT_PREVIEW_WIDTH,
            preview_height: pipeline::DEFAULT_PREVIEW_HEIGHT,
            log_level: "warn".to_string(),
            last_device_id: None,
        }
    }
}

/// Configuration as read at startup
#[derive(Debug)]
pub struct LoadedConfig {
    pub config: Config,
    /// Where changes may be saved. `None` if the file could not be loaded, so
    /// a broken file is never replaced with defaults.
    pub save_path: Option<PathBuf>,
    /// Why the file could not be loaded
    pub error: Option<AppError>,
}

impl Config {
    /// Standard config file location
    pub fn path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// Log file used while the terminal UI is running
    pub fn log_path() -> Option<PathBuf> {
        dirs::cache_dir().map(|dir| dir.join(APP_DIR_NAME).join(LOG_FILE_NAME))
    }

    /// Load from the standard location. A missing file yields the defaults.
    pub fn load() -> AppResult<Self> {
        match Self::path() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    pub fn load_from(path: &Path) -> AppResult<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from the standard location, falling back to the defaults
    pub fn load_or_default() -> LoadedConfig {
        Self::load_or_default_from(Self::path())
    }

    pub fn load_or_default_from(path: Option<PathBuf>) -> LoadedConfig {
        let Some(path) = path else {
            return LoadedConfig {
                config: Self::default(),
                save_path: None,
                error: None,
            };
        };
        match Self::load_from(&path) {
            Ok(config) => LoadedConfig {
                config,
                save_path: Some(path),
                error: None,
            },
            Err(err) => LoadedConfig {
                config: Self::default(),
                save_path: None,
                error: Some(err),
            },
        }
    }

    pub fn save(&self) -> AppResult<()> {
        let path = Self::path()
            .ok_or_else(|| AppError::Config("No config directory available".to_string()))?;
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &Path) -> AppResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        debug!(path = %path.display(), "Config saved");
        Ok(())
    }

    fn validate(&self) -> AppResult<()> {
        let valid = 1..=pipeline::MAX_PREVIEW_DIMENSION;
        if !valid.contains(&self.preview_width) || !valid.contains(&self.preview_height) {
            return Err(AppError::Config(format!(
                "Invalid preview size {}x{}",
                self.preview_width, self.preview_height
            )));
        }
        Ok(())
    }
}
