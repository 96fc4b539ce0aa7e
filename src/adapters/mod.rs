// Adapters - External system implementations

pub mod exec_ffmpeg;
pub mod fs_metadata;
pub mod json_storage;
pub mod memory_storage;
pub mod probe_ffprobe;
pub mod toml_config;

// Re-export adapters
pub use exec_ffmpeg::FFmpegAdapter;
pub use fs_metadata::LocalMetadataAdapter;
pub use json_storage::JsonFileStorage;
pub use memory_storage::MemoryStorage;
pub use probe_ffprobe::FFprobeAdapter;
pub use toml_config::{AppConfig, ConfigError, TomlConfigAdapter};
