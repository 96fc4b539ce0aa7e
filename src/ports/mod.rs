// Ports - Interface definitions (contracts)

use async_trait::async_trait;

use crate::domain::errors::*;
use crate::domain::model::*;
use crate::utils::log_buffer::LogBuffer;

/// Port for the platform file-metadata service
#[async_trait]
pub trait MetadataPort: Send + Sync {
    /// Look up a locator. Lookup failures are reported as a missing file.
    async fn get_info(&self, uri: &str) -> FileInfo;
}

/// Completion status reported by the transcoding process
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessExit {
    pub success: bool,
    pub code: Option<i32>,
    /// Diagnostic trace the process exposes on failure
    pub fail_trace: Option<String>,
}

impl ProcessExit {
    pub fn succeeded() -> Self {
        Self {
            success: true,
            code: Some(0),
            fail_trace: None,
        }
    }

    pub fn failed(code: Option<i32>) -> Self {
        Self {
            success: false,
            code,
            fail_trace: None,
        }
    }
}

/// Port for the external transcoding process
///
/// An abort signal is not part of this contract yet; a future `run` variant
/// would accept one and kill the process when it fires.
#[async_trait]
pub trait TranscodePort: Send + Sync {
    /// Run the process once with `args`, appending its log lines to `log` in
    /// arrival order. Returns `LaunchFailed` when the process cannot start.
    async fn run(&self, args: &[String], log: &LogBuffer) -> Result<ProcessExit, ExecutionError>;
}

/// Port for reading a source video's length
#[async_trait]
pub trait ProbePort: Send + Sync {
    /// Duration of the media file in seconds
    async fn duration_seconds(&self, path: &str) -> Result<f64, ExecutionError>;
}

/// Port for the durable key-value store
#[async_trait]
pub trait StoragePort: Send + Sync {
    async fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Durably replace the value under `key`
    async fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError>;
}

/// Resolving stage of the extraction pipeline
#[async_trait]
pub trait SourceResolver: Send + Sync {
    async fn resolve(&self, source_uri: &str) -> Result<String, ResolveError>;
}

/// Executing stage of the extraction pipeline
#[async_trait]
pub trait ClipExecutor: Send + Sync {
    async fn execute(&self, command: &ClipCommand) -> Result<ExecutionReport, ExecutionError>;
}
