//! FFmpeg execution adapter
//!
//! Runs the `ffmpeg` binary as a child process and streams its stderr into a
//! [`LogBuffer`] line by line while it runs.

use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tracing::{debug, warn};

use crate::domain::errors::ExecutionError;
use crate::ports::{ProcessExit, TranscodePort};
use crate::utils::log_buffer::LogBuffer;

/// Lines from the end of the log used as the failure trace
const FAIL_TRACE_LINES: usize = 5;

/// FFmpeg-based transcoding adapter
pub struct FFmpegAdapter {
    binary: String,
}

impl FFmpegAdapter {
    /// Create new FFmpeg adapter using the given executable
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }
}

#[async_trait]
impl TranscodePort for FFmpegAdapter {
    async fn run(&self, args: &[String], log: &LogBuffer) -> Result<ProcessExit, ExecutionError> {
        debug!("Spawning {} {}", self.binary, args.join(" "));

        let mut child = Command::new(&self.binary)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| ExecutionError::LaunchFailed {
                cause: format!("{}: {}", self.binary, e),
            })?;

        if let Some(stderr) = child.stderr.take() {
            let mut lines = BufReader::new(stderr).lines();
            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => {
                        // Progress updates are separated by carriage returns
                        for part in line.split('\r').filter(|p| !p.trim().is_empty()) {
                            debug!(target: "ffmpeg", "{}", part);
                            log.push(part);
                        }
                    }
                    Ok(None) => break,
                    Err(e) => {
                        warn!("Stopped reading transcoder log: {}", e);
                        break;
                    }
                }
            }
        }

        let status = child
            .wait()
            .await
            .map_err(|e| ExecutionError::LaunchFailed {
                cause: format!("failed waiting for {}: {}", self.binary, e),
            })?;

        if status.success() {
            return Ok(ProcessExit::succeeded());
        }

        let captured = log.snapshot();
        let tail_start = captured.len().saturating_sub(FAIL_TRACE_LINES);
        let trace = captured[tail_start..].join("\n");
        Ok(ProcessExit {
            success: false,
            code: status.code(),
            fail_trace: (!trace.is_empty()).then_some(trace),
        })
    }
}
