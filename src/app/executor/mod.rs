// Transcode executor - runs one command and reports a typed result

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::{broadcast, Mutex};
use tracing::{info, warn};

use crate::domain::errors::ExecutionError;
use crate::domain::model::{ClipCommand, ExecutionReport};
use crate::ports::{ClipExecutor, TranscodePort};
use crate::utils::log_buffer::LogBuffer;

/// Runs transcoder commands one at a time.
///
/// Success is decided only by the exit status the process reports. The log of
/// the current run is kept in a shared [`LogBuffer`]; it is cleared when the
/// next run starts.
pub struct TranscodeExecutor {
    port: Arc<dyn TranscodePort>,
    log: Arc<LogBuffer>,
    timeout: Option<Duration>,
    running: Mutex<()>,
}

impl TranscodeExecutor {
    pub fn new(port: Arc<dyn TranscodePort>) -> Self {
        Self {
            port,
            log: Arc::new(LogBuffer::default()),
            timeout: None,
            running: Mutex::new(()),
        }
    }

    /// Kill the process and fail with `TimedOut` after `timeout`
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Use a log buffer with a different capacity
    pub fn with_log_capacity(mut self, capacity: usize) -> Self {
        self.log = Arc::new(LogBuffer::new(capacity));
        self
    }

    /// Buffer holding the log of the current or last run
    pub fn log(&self) -> Arc<LogBuffer> {
        Arc::clone(&self.log)
    }

    /// Receive log lines as the transcoder emits them
    pub fn subscribe_log(&self) -> broadcast::Receiver<String> {
        self.log.subscribe()
    }

    /// Run `command` to completion
    pub async fn execute(&self, command: &ClipCommand) -> Result<ExecutionReport, ExecutionError> {
        let _running = self.running.lock().await;
        self.log.clear();

        prepare_output_dir(&command.output_path).await?;

        info!("Starting transcoder for {}", command.output_path);
        let started = Instant::now();

        let run = self.port.run(&command.args, self.log.as_ref());
        let exit = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, run).await {
                Ok(result) => result?,
                Err(_) => {
                    warn!(
                        "Transcoder exceeded {}s, killing it",
                        limit.as_secs()
                    );
                    return Err(ExecutionError::TimedOut {
                        after_secs: limit.as_secs(),
                        log: self.log.snapshot(),
                    });
                }
            },
            None => run.await?,
        };

        let log_lines = self.log.snapshot();
        if self.log.dropped() > 0 {
            warn!(
                "Transcoder log exceeded buffer, {} earliest lines dropped",
                self.log.dropped()
            );
        }

        if exit.success {
            info!(
                "Transcoder finished in {:.2}s: {}",
                started.elapsed().as_secs_f64(),
                command.output_path
            );
            Ok(ExecutionReport {
                output_path: command.output_path.clone(),
                log_lines,
            })
        } else {
            warn!(
                "Transcoder failed with code {:?} after {} log lines",
                exit.code,
                log_lines.len()
            );
            Err(ExecutionError::ProcessFailed {
                code: exit.code,
                log: log_lines,
                trace: exit.fail_trace,
            })
        }
    }
}

async fn prepare_output_dir(output_path: &str) -> Result<(), ExecutionError> {
    match Path::new(output_path).parent() {
        Some(dir) if !dir.as_os_str().is_empty() => tokio::fs::create_dir_all(dir)
            .await
            .map_err(|e| ExecutionError::LaunchFailed {
                cause: format!("cannot create output directory {}: {}", dir.display(), e),
            }),
        _ => Ok(()),
    }
}

#[async_trait]
impl ClipExecutor for TranscodeExecutor {
    async fn execute(&self, command: &ClipCommand) -> Result<ExecutionReport, ExecutionError> {
        TranscodeExecutor::execute(self, command).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::ProcessExit;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Transcoder stand-in that replays canned log lines and a status
    struct ScriptedTranscoder {
        lines: Vec<&'static str>,
        exit: Result<ProcessExit, ExecutionError>,
        delay: Option<Duration>,
        calls: AtomicUsize,
    }

    impl ScriptedTranscoder {
        fn new(lines: Vec<&'static str>, exit: Result<ProcessExit, ExecutionError>) -> Self {
            Self {
                lines,
                exit,
                delay: None,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl TranscodePort for ScriptedTranscoder {
        async fn run(
            &self,
            _args: &[String],
            log: &LogBuffer,
        ) -> Result<ProcessExit, ExecutionError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            for line in &self.lines {
                log.push(*line);
            }
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            self.exit.clone()
        }
    }

    fn command(dir: &Path) -> ClipCommand {
        let output_path = dir.join("out").join("1.mp4").to_string_lossy().into_owned();
        ClipCommand {
            args: vec!["-i".into(), "in.mp4".into(), output_path.clone()],
            output_path,
        }
    }

    #[tokio::test]
    async fn test_success_reports_output_and_log() {
        let dir = tempfile::tempdir().unwrap();
        let port = Arc::new(ScriptedTranscoder::new(
            vec!["frame=1", "frame=2"],
            Ok(ProcessExit::succeeded()),
        ));
        let executor = TranscodeExecutor::new(port.clone());
        let cmd = command(dir.path());

        let report = executor.execute(&cmd).await.unwrap();
        assert_eq!(report.output_path, cmd.output_path);
        assert_eq!(report.log_lines, vec!["frame=1", "frame=2"]);
        assert_eq!(port.calls.load(Ordering::SeqCst), 1);
        assert!(dir.path().join("out").is_dir());
    }

    #[tokio::test]
    async fn test_failure_status_carries_log() {
        let dir = tempfile::tempdir().unwrap();
        let port = Arc::new(ScriptedTranscoder::new(
            vec!["Error opening input"],
            Ok(ProcessExit::failed(Some(1))),
        ));
        let executor = TranscodeExecutor::new(port);

        match executor.execute(&command(dir.path())).await {
            Err(ExecutionError::ProcessFailed { code, log, .. }) => {
                assert_eq!(code, Some(1));
                assert_eq!(log, vec!["Error opening input"]);
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_launch_failure_passes_through() {
        let dir = tempfile::tempdir().unwrap();
        let port = Arc::new(ScriptedTranscoder::new(
            vec![],
            Err(ExecutionError::LaunchFailed {
                cause: "ffmpeg: not found".into(),
            }),
        ));
        let executor = TranscodeExecutor::new(port);
        assert!(matches!(
            executor.execute(&command(dir.path())).await,
            Err(ExecutionError::LaunchFailed { .. })
        ));
    }

    #[tokio::test]
    async fn test_timeout() {
        let dir = tempfile::tempdir().unwrap();
        let mut scripted = ScriptedTranscoder::new(vec!["started"], Ok(ProcessExit::succeeded()));
        scripted.delay = Some(Duration::from_secs(30));
        let executor = TranscodeExecutor::new(Arc::new(scripted))
            .with_timeout(Some(Duration::from_millis(20)));

        match executor.execute(&command(dir.path())).await {
            Err(ExecutionError::TimedOut { log, .. }) => assert_eq!(log, vec!["started"]),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_log_is_reset_between_runs() {
        let dir = tempfile::tempdir().unwrap();
        let port = Arc::new(ScriptedTranscoder::new(
            vec!["only line"],
            Ok(ProcessExit::succeeded()),
        ));
        let executor = TranscodeExecutor::new(port);
        executor.execute(&command(dir.path())).await.unwrap();
        let second = executor.execute(&command(dir.path())).await.unwrap();
        assert_eq!(second.log_lines, vec!["only line"]);
        assert_eq!(executor.log().snapshot(), vec!["only line"]);
    }

    #[tokio::test]
    async fn test_drop_count_is_per_run() {
        let dir = tempfile::tempdir().unwrap();
        let overflowing = TranscodeExecutor::new(Arc::new(ScriptedTranscoder::new(
            vec!["a", "b", "c"],
            Ok(ProcessExit::succeeded()),
        )))
        .with_log_capacity(2);
        overflowing.execute(&command(dir.path())).await.unwrap();
        assert_eq!(overflowing.log().dropped(), 1);

        let short = ScriptedTranscoder::new(vec!["one"], Ok(ProcessExit::succeeded()));
        let executor = TranscodeExecutor {
            port: Arc::new(short),
            ..overflowing
        };
        executor.execute(&command(dir.path())).await.unwrap();
        assert_eq!(executor.log().dropped(), 0);
        assert_eq!(executor.log().snapshot(), vec!["one"]);
    }
}
