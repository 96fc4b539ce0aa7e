//! Configuration initialization and hierarchy management

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::adapters::toml_config::{AppConfig, ConfigError, TomlConfigAdapter};
use crate::domain::model::EncodingPolicy;
use crate::utils::logging::{LogFormat, LogLevel};

/// Config file looked up in the working directory
pub const LOCAL_CONFIG_FILE: &str = "clipshelf.toml";

/// Prefix of environment overrides, e.g. `CLIPSHELF_ENCODING`
pub const ENV_PREFIX: &str = "CLIPSHELF_";

/// Values given on the command line; `None` leaves the lower layers in place
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub config_path: Option<PathBuf>,
    pub log_level: Option<LogLevel>,
    pub log_format: Option<LogFormat>,
    pub encoding: Option<EncodingPolicy>,
}

/// Build configuration following precedence: CLI > Env > File > Defaults
pub fn initialize_configuration(overrides: &ConfigOverrides) -> Result<AppConfig, ConfigError> {
    let mut config = match locate_config_file(overrides.config_path.as_deref())? {
        Some(path) => {
            debug!("Loading configuration from: {}", path.display());
            TomlConfigAdapter::load(&path)?
        }
        None => AppConfig::default(),
    };

    apply_environment(&mut config, |key| std::env::var(key).ok())?;
    apply_cli_overrides(&mut config, overrides);
    config.validate()?;
    Ok(config)
}

/// An explicit path must exist; the implicit locations are optional
fn locate_config_file(explicit: Option<&Path>) -> Result<Option<PathBuf>, ConfigError> {
    if let Some(path) = explicit {
        if !path.exists() {
            return Err(ConfigError::Io {
                path: path.display().to_string(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
            });
        }
        return Ok(Some(path.to_path_buf()));
    }

    let candidates = [
        PathBuf::from(LOCAL_CONFIG_FILE),
        TomlConfigAdapter::default_config_path(),
    ];
    Ok(candidates.into_iter().find(|path| path.is_file()))
}

/// Apply `CLIPSHELF_*` variables read through `lookup`
pub fn apply_environment<F>(config: &mut AppConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let var = |name: &str| {
        lookup(&format!("{}{}", ENV_PREFIX, name)).filter(|value| !value.trim().is_empty())
    };
    let mut applied = 0;

    if let Some(value) = var("FFMPEG_PATH") {
        config.ffmpeg_path = value;
        applied += 1;
    }
    if let Some(value) = var("FFPROBE_PATH") {
        config.ffprobe_path = value;
        applied += 1;
    }
    if let Some(value) = var("DOCUMENT_DIR") {
        config.document_dir = PathBuf::from(value);
        applied += 1;
    }
    if let Some(value) = var("STORAGE_PATH") {
        config.storage_path = PathBuf::from(value);
        applied += 1;
    }
    if let Some(value) = var("MEDIA_ROOT") {
        config.media_root = Some(PathBuf::from(value));
        applied += 1;
    }
    if let Some(value) = var("ENCODING") {
        config.encoding = EncodingPolicy::parse(&value)
            .map_err(|e| ConfigError::invalid("CLIPSHELF_ENCODING", e.to_string()))?;
        applied += 1;
    }
    if let Some(value) = var("VIDEO_CODEC") {
        config.video_codec = value;
        applied += 1;
    }
    if let Some(value) = var("AUDIO_CODEC") {
        config.audio_codec = value;
        applied += 1;
    }
    if let Some(value) = var("CLIP_DURATION") {
        config.clip_duration = value
            .trim()
            .parse()
            .map_err(|e| ConfigError::invalid("CLIPSHELF_CLIP_DURATION", format!("{}", e)))?;
        applied += 1;
    }
    if let Some(value) = var("TIMEOUT_SECS") {
        config.timeout_secs = Some(
            value
                .trim()
                .parse()
                .map_err(|e| ConfigError::invalid("CLIPSHELF_TIMEOUT_SECS", format!("{}", e)))?,
        );
        applied += 1;
    }
    if let Some(value) = var("LOG_LEVEL") {
        config.log_level = value
            .parse()
            .map_err(|e: String| ConfigError::invalid("CLIPSHELF_LOG_LEVEL", e))?;
        applied += 1;
    }
    if let Some(value) = var("LOG_FORMAT") {
        config.log_format = value
            .parse()
            .map_err(|e: String| ConfigError::invalid("CLIPSHELF_LOG_FORMAT", e))?;
        applied += 1;
    }

    if applied > 0 {
        debug!("Applied {} environment variable overrides", applied);
    }
    Ok(())
}

fn apply_cli_overrides(config: &mut AppConfig, overrides: &ConfigOverrides) {
    if let Some(level) = overrides.log_level {
        config.log_level = level;
    }
    if let Some(format) = overrides.log_format {
        config.log_format = format;
    }
    if let Some(encoding) = overrides.encoding {
        config.encoding = encoding;
    }
}
