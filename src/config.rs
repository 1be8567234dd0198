//! Configuration file handling for viewfinder.
//!
//! Loads configuration from `~/.config/viewfinder/config.toml` or a custom
//! path. Every key is optional; missing keys fall back to the built-in
//! capture preset (640x480 @ 30fps, front camera).

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::camera::LogicalCamera;
use crate::capture::OutputFormat;

/// Configuration file structure for viewfinder.
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub capture: CaptureConfig,
    #[serde(default)]
    pub camera: CameraConfig,
}

/// The `[capture]` table: the session's output preset.
#[derive(Debug, Deserialize)]
pub struct CaptureConfig {
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
    #[serde(default = "default_fps")]
    pub fps: u32,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            fps: default_fps(),
        }
    }
}

/// The `[camera]` table: which logical camera to start with.
#[derive(Debug, Deserialize, Default)]
pub struct CameraConfig {
    /// "front" or "back"
    pub default: Option<String>,
}

fn default_width() -> u32 {
    640
}

fn default_height() -> u32 {
    480
}

fn default_fps() -> u32 {
    30
}

impl Config {
    /// Load configuration from the default path.
    /// Returns default config if the file doesn't exist.
    /// Returns an error if the file exists but cannot be parsed.
    pub fn load() -> Result<Self, ConfigError> {
        let path = default_path();
        if path.exists() {
            Self::load_from_explicit(path)
        } else {
            Ok(Config::default())
        }
    }

    /// Load configuration from an explicit path, which must exist.
    pub fn load_from_explicit(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref().to_path_buf();
        let content = std::fs::read_to_string(&path).map_err(|source| ConfigError::Io {
            path: path.clone(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse { path, source })
    }

    /// The session output preset this configuration describes.
    pub fn output_format(&self) -> OutputFormat {
        OutputFormat {
            width: self.capture.width,
            height: self.capture.height,
            fps: self.capture.fps,
        }
    }

    /// The logical camera to start with. Unknown names fall back to front.
    pub fn default_camera(&self) -> LogicalCamera {
        self.camera
            .default
            .as_deref()
            .and_then(LogicalCamera::from_str)
            .unwrap_or_default()
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// Get the default config file path.
pub fn default_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| {
            let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
            PathBuf::from(home).join(".config")
        })
        .join("viewfinder")
        .join("config.toml")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_when_empty() {
        let config: Config = toml::from_str("").unwrap();
        let format = config.output_format();
        assert_eq!(format.width, 640);
        assert_eq!(format.height, 480);
        assert_eq!(format.fps, 30);
        assert_eq!(config.default_camera(), LogicalCamera::Front);
    }

    #[test]
    fn test_parse_full_config() {
        let config: Config = toml::from_str(
            r#"
            [capture]
            width = 1280
            height = 720
            fps = 24

            [camera]
            default = "back"
            "#,
        )
        .unwrap();

        let format = config.output_format();
        assert_eq!(format.width, 1280);
        assert_eq!(format.height, 720);
        assert_eq!(format.fps, 24);
        assert_eq!(config.default_camera(), LogicalCamera::Back);
    }

    #[test]
    fn test_partial_capture_table_keeps_other_defaults() {
        let config: Config = toml::from_str(
            r#"
            [capture]
            fps = 15
            "#,
        )
        .unwrap();
        let format = config.output_format();
        assert_eq!(format.width, 640);
        assert_eq!(format.height, 480);
        assert_eq!(format.fps, 15);
    }

    #[test]
    fn test_unknown_camera_name_falls_back_to_front() {
        let config: Config = toml::from_str(
            r#"
            [camera]
            default = "sideways"
            "#,
        )
        .unwrap();
        assert_eq!(config.default_camera(), LogicalCamera::Front);
    }

    #[test]
    fn test_load_from_explicit_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[capture]\nwidth = 320\nheight = 240").unwrap();

        let config = Config::load_from_explicit(file.path()).unwrap();
        assert_eq!(config.output_format().width, 320);
        assert_eq!(config.output_format().height, 240);
    }

    #[test]
    fn test_load_from_explicit_missing_file_errors() {
        let result = Config::load_from_explicit("/nonexistent/viewfinder.toml");
        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }

    #[test]
    fn test_load_from_explicit_invalid_toml_errors() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[capture\nwidth = ").unwrap();

        let result = Config::load_from_explicit(file.path());
        assert!(matches!(result, Err(ConfigError::Parse { .. })));
    }
}
