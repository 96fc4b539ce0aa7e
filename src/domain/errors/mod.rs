// Domain errors - Error types for the domain layer

use thiserror::Error;

/// Failure to turn a source locator into a local file path
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ResolveError {
    /// The metadata service does not know the locator or gave no local path for it
    #[error("Source not found: {uri}")]
    NotFound { uri: String },
}

/// Failure to read a user-supplied value
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("{reason}")]
    InvalidTime { reason: String },

    #[error("unknown encoding policy '{0}'. Valid policies: copy, reencode")]
    UnknownPolicy(String),
}

impl ParseError {
    pub fn invalid_time(reason: impl Into<String>) -> Self {
        ParseError::InvalidTime {
            reason: reason.into(),
        }
    }
}

/// Failure to construct a transcode command
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BuildError {
    /// Start or duration outside the accepted range
    #[error("Invalid clip window: {reason}")]
    InvalidWindow { reason: String },
}

impl BuildError {
    pub fn invalid_window(reason: impl Into<String>) -> Self {
        BuildError::InvalidWindow {
            reason: reason.into(),
        }
    }
}

/// Failure while running the external transcoder
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExecutionError {
    /// The process could not be started at all
    #[error("Failed to launch transcoder: {cause}")]
    LaunchFailed { cause: String },

    /// The process ran and reported a non-success status
    #[error("Transcoder failed{}", exit_code_suffix(.code))]
    ProcessFailed {
        code: Option<i32>,
        log: Vec<String>,
        trace: Option<String>,
    },

    /// The process exceeded the configured time limit and was killed
    #[error("Transcoder timed out after {after_secs}s")]
    TimedOut { after_secs: u64, log: Vec<String> },
}

fn exit_code_suffix(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!(" with exit code {}", code),
        None => String::new(),
    }
}

impl ExecutionError {
    /// Log lines captured before the failure, if any
    pub fn log(&self) -> Option<&[String]> {
        match self {
            ExecutionError::LaunchFailed { .. } => None,
            ExecutionError::ProcessFailed { log, .. } | ExecutionError::TimedOut { log, .. } => {
                Some(log.as_slice())
            }
        }
    }
}

/// Failure of a whole extraction attempt, tagged by the stage that failed
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PipelineError {
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    InvalidWindow(#[from] BuildError),

    #[error("Transcode failed: {details}")]
    Transcode {
        #[source]
        details: ExecutionError,
    },
}

impl From<ExecutionError> for PipelineError {
    fn from(details: ExecutionError) -> Self {
        PipelineError::Transcode { details }
    }
}

/// Failure of the key-value persistence medium
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage file is not valid JSON: {0}")]
    Format(#[from] serde_json::Error),

    #[error("Storage task failed: {0}")]
    Task(String),
}

/// Failure of a catalog mutation
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CatalogError {
    /// The snapshot could not be written; the in-memory catalog was left unchanged
    #[error("Failed to persist clip catalog: {reason}")]
    PersistFailed { reason: String },

    #[error("Invalid clip record: {reason}")]
    InvalidRecord { reason: String },
}

impl From<StorageError> for CatalogError {
    fn from(err: StorageError) -> Self {
        CatalogError::PersistFailed {
            reason: err.to_string(),
        }
    }
}

/// Failure surfaced by the clip session to the user
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SessionError {
    #[error("Cannot {action} while {state}")]
    InvalidTransition {
        action: &'static str,
        state: &'static str,
    },

    #[error("No video selected")]
    InvalidSource,

    #[error("Video length must be a positive number of seconds, got {seconds}")]
    InvalidSourceDuration { seconds: f64 },

    #[error(transparent)]
    InvalidWindow(#[from] BuildError),

    /// Extraction failed; nothing was written to the catalog
    #[error("Clip not created: {0}")]
    ClipNotCreated(PipelineError),

    /// Extraction succeeded but the catalog could not record the clip
    #[error("Clip created at {output_path} but not saved to your list: {source}")]
    ClipNotSaved {
        output_path: String,
        #[source]
        source: CatalogError,
    },
}
