//! Engine configuration, loadable from TOML.
//!
//! Every field has a default, so a config file only needs the values it
//! wants to change:
//!
//! ```toml
//! [video]
//! width = 1280
//! height = 720
//! title = "Asteroids"
//!
//! [timing]
//! update_hz = 240
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{EngineError, Result};

pub const DEFAULT_TITLE: &str = "tandem";

/// Window settings. Only read when the surface is created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoOptions {
    pub width: u32,
    pub height: u32,
    pub fullscreen: bool,
    pub title: String,
}

impl Default for VideoOptions {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
            fullscreen: false,
            title: DEFAULT_TITLE.to_owned(),
        }
    }
}

impl VideoOptions {
    pub fn new(width: u32, height: u32, fullscreen: bool) -> Self {
        Self {
            width,
            height,
            fullscreen,
            ..Self::default()
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(EngineError::InvalidVideoOptions(format!(
                "window size must be positive, got {}x{}",
                self.width, self.height
            )));
        }
        if self.title.trim().is_empty() {
            return Err(EngineError::InvalidVideoOptions(
                "window title must not be empty".to_owned(),
            ));
        }
        Ok(())
    }
}

/// Cadence of the two passes. `None` runs a pass as fast as it can go.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    pub update_hz: Option<u32>,
    pub draw_hz: Option<u32>,
    /// Upper bound for a single pass's delta, so a stall does not turn into
    /// one giant step.
    pub max_delta_ms: Option<u64>,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            update_hz: Some(120),
            draw_hz: Some(60),
            max_delta_ms: Some(250),
        }
    }
}

impl TimingConfig {
    pub fn max_delta(&self) -> Option<Duration> {
        self.max_delta_ms.map(Duration::from_millis)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// One of `trace`, `debug`, `info`, `warn`, `error`
    pub level: String,
    pub pretty: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            pretty: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub video: VideoOptions,
    pub timing: TimingConfig,
    pub log: LogConfig,
}

impl EngineConfig {
    pub fn from_toml_str(source: &str) -> Result<Self> {
        Ok(toml::from_str(source)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&source)?;
        info!("Loaded engine config from {}", path.display());
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|err| EngineError::Config(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_document_yields_defaults() {
        let config = EngineConfig::from_toml_str("").unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.video.title, DEFAULT_TITLE);
        assert_eq!(config.timing.update_hz, Some(120));
    }

    #[test]
    fn partial_sections_keep_remaining_defaults() {
        let config = EngineConfig::from_toml_str(
            r#"
            [video]
            width = 1280
            fullscreen = true

            [timing]
            draw_hz = 144
            "#,
        )
        .unwrap();
        assert_eq!(config.video.width, 1280);
        assert_eq!(config.video.height, 600);
        assert!(config.video.fullscreen);
        assert_eq!(config.timing.draw_hz, Some(144));
        assert_eq!(config.timing.update_hz, Some(120));
    }

    #[test]
    fn wrong_types_are_config_errors() {
        let err = EngineConfig::from_toml_str("[video]\nwidth = \"wide\"").unwrap_err();
        assert!(matches!(err, EngineError::Config(_)));
    }

    #[test]
    fn zero_sized_window_is_rejected() {
        let err = VideoOptions::new(0, 600, false).validate().unwrap_err();
        assert!(matches!(err, EngineError::InvalidVideoOptions(_)));
        assert!(VideoOptions::new(640, 480, false).validate().is_ok());
    }

    #[test]
    fn blank_title_is_rejected() {
        let options = VideoOptions::default().with_title("   ");
        assert!(options.validate().is_err());
    }

    #[test]
    fn loads_from_file_and_round_trips() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[video]\ntitle = \"Pong\"\n[log]\nlevel = \"debug\"").unwrap();

        let config = EngineConfig::load(file.path()).unwrap();
        assert_eq!(config.video.title, "Pong");
        assert_eq!(config.log.level, "debug");

        let reparsed = EngineConfig::from_toml_str(&config.to_toml_string().unwrap()).unwrap();
        assert_eq!(reparsed, config);
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = EngineConfig::load("/definitely/not/here.toml").unwrap_err();
        assert!(matches!(err, EngineError::Io(_)));
    }
}
