// TOML config adapter - Configuration file loading and validation

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::model::EncodingPolicy;
use crate::domain::rules::DEFAULT_CLIP_DURATION;
use crate::utils::logging::{LogFormat, LogLevel, LoggingConfig};

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse TOML config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value for {key}: {message}")]
    Invalid { key: String, message: String },
}

impl ConfigError {
    pub fn invalid(key: &str, message: impl Into<String>) -> Self {
        ConfigError::Invalid {
            key: key.to_string(),
            message: message.into(),
        }
    }
}

/// Application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Transcoder executable
    pub ffmpeg_path: String,
    /// Probe executable used to read source durations
    pub ffprobe_path: String,
    /// Directory finished clips are written to
    pub document_dir: PathBuf,
    /// Key-value file holding the catalog snapshot
    pub storage_path: PathBuf,
    /// Library root that `content://` locators resolve under
    pub media_root: Option<PathBuf>,
    pub encoding: EncodingPolicy,
    /// Codecs used by the re-encode policy
    pub video_codec: String,
    pub audio_codec: String,
    /// Default clip length in seconds
    pub clip_duration: f64,
    /// Kill the transcoder after this many seconds
    pub timeout_secs: Option<u64>,
    pub log_level: LogLevel,
    pub log_format: LogFormat,
}

impl Default for AppConfig {
    fn default() -> Self {
        let data_dir = default_data_dir();
        Self {
            ffmpeg_path: "ffmpeg".to_string(),
            ffprobe_path: "ffprobe".to_string(),
            document_dir: data_dir.join("clips"),
            storage_path: data_dir.join("storage.json"),
            media_root: None,
            encoding: EncodingPolicy::Copy,
            video_codec: "libx264".to_string(),
            audio_codec: "aac".to_string(),
            clip_duration: DEFAULT_CLIP_DURATION,
            timeout_secs: None,
            log_level: LogLevel::Info,
            log_format: LogFormat::Pretty,
        }
    }
}

impl AppConfig {
    pub fn logging(&self) -> LoggingConfig {
        LoggingConfig {
            level: self.log_level,
            format: self.log_format,
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ffmpeg_path.trim().is_empty() {
            return Err(ConfigError::invalid("ffmpeg_path", "must not be empty"));
        }
        if !self.clip_duration.is_finite() || self.clip_duration <= 0.0 {
            return Err(ConfigError::invalid(
                "clip_duration",
                format!("must be positive, got {}", self.clip_duration),
            ));
        }
        if self.video_codec.trim().is_empty() || self.audio_codec.trim().is_empty() {
            return Err(ConfigError::invalid(
                "video_codec/audio_codec",
                "codec names must not be empty",
            ));
        }
        if self.timeout_secs == Some(0) {
            return Err(ConfigError::invalid("timeout_secs", "must be at least 1"));
        }
        Ok(())
    }
}

/// On-disk layout: all keys live under a `[clipshelf]` table
#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    clipshelf: AppConfig,
}

/// TOML configuration adapter
pub struct TomlConfigAdapter;

impl TomlConfigAdapter {
    /// Parse configuration from TOML text
    pub fn parse(content: &str) -> Result<AppConfig, ConfigError> {
        let file: ConfigFile = toml::from_str(content)?;
        Ok(file.clipshelf)
    }

    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<AppConfig, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse(&content)
    }

    /// Get default config file path
    pub fn default_config_path() -> PathBuf {
        default_data_dir().join("config.toml")
    }
}

/// Per-user data directory for the catalog and clips
pub fn default_data_dir() -> PathBuf {
    if let Some(xdg) = std::env::var_os("XDG_DATA_HOME").filter(|v| !v.is_empty()) {
        return PathBuf::from(xdg).join("clipshelf");
    }
    if let Some(home) = std::env::var_os("HOME").filter(|v| !v.is_empty()) {
        return PathBuf::from(home)
            .join(".local")
            .join("share")
            .join("clipshelf");
    }
    // On Windows, use %APPDATA%/Clipshelf
    if let Some(appdata) = std::env::var_os("APPDATA") {
        return PathBuf::from(appdata).join("Clipshelf");
    }
    PathBuf::from("clipshelf-data")
}
