//! FFprobe adapter for reading a source video's duration

use async_trait::async_trait;
use tokio::process::Command;

use crate::domain::errors::ExecutionError;
use crate::ports::ProbePort;

/// FFprobe-based probe adapter
pub struct FFprobeAdapter {
    binary: String,
}

impl FFprobeAdapter {
    /// Create new FFprobe adapter using the given executable
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }
}

#[async_trait]
impl ProbePort for FFprobeAdapter {
    async fn duration_seconds(&self, path: &str) -> Result<f64, ExecutionError> {
        let output = Command::new(&self.binary)
            .args([
                "-v",
                "error",
                "-show_entries",
                "format=duration",
                "-of",
                "default=noprint_wrappers=1:nokey=1",
                path,
            ])
            .output()
            .await
            .map_err(|e| ExecutionError::LaunchFailed {
                cause: format!("{}: {}", self.binary, e),
            })?;

        let stderr_lines = || {
            String::from_utf8_lossy(&output.stderr)
                .lines()
                .map(str::to_string)
                .collect::<Vec<_>>()
        };

        if !output.status.success() {
            return Err(ExecutionError::ProcessFailed {
                code: output.status.code(),
                log: stderr_lines(),
                trace: None,
            });
        }

        parse_duration(&String::from_utf8_lossy(&output.stdout)).ok_or_else(|| {
            ExecutionError::ProcessFailed {
                code: output.status.code(),
                log: stderr_lines(),
                trace: Some("ffprobe reported no duration".to_string()),
            }
        })
    }
}

fn parse_duration(stdout: &str) -> Option<f64> {
    stdout
        .lines()
        .filter_map(|line| line.trim().parse::<f64>().ok())
        .find(|seconds| seconds.is_finite() && *seconds > 0.0)
}
