// Domain models - Core types and data structures

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::errors::{BuildError, ParseError, PipelineError};
use crate::domain::rules::DEFAULT_CLIP_DURATION;

/// Time specification with precision - represents time in seconds with fractional precision
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct TimeSpec {
    pub seconds: f64,
}

impl TimeSpec {
    /// Create a new TimeSpec from seconds
    pub fn from_seconds(seconds: f64) -> Self {
        Self { seconds }
    }

    pub fn as_seconds(&self) -> f64 {
        self.seconds
    }

    /// Parse time string in seconds, MM:SS(.ms) or HH:MM:SS(.ms) form
    pub fn parse(time_str: &str) -> Result<Self, ParseError> {
        let trimmed = time_str.trim();

        if let Ok(seconds) = trimmed.parse::<f64>() {
            if !seconds.is_finite() || seconds < 0.0 {
                return Err(ParseError::invalid_time(format!(
                    "time must be a non-negative number: {}",
                    trimmed
                )));
            }
            return Ok(Self::from_seconds(seconds));
        }

        let parts: Vec<&str> = trimmed.split(':').collect();
        let (hours, minutes, seconds) = match parts.as_slice() {
            [mm, ss] => (0, parse_component(mm, trimmed)?, parse_seconds(ss, trimmed)?),
            [hh, mm, ss] => {
                let minutes = parse_component(mm, trimmed)?;
                if minutes >= 60 {
                    return Err(ParseError::invalid_time(format!(
                        "minutes must be less than 60: {}",
                        trimmed
                    )));
                }
                (
                    parse_component(hh, trimmed)?,
                    minutes,
                    parse_seconds(ss, trimmed)?,
                )
            }
            _ => {
                return Err(ParseError::invalid_time(format!(
                    "unsupported time format '{}'. Use seconds (12.5), MM:SS.ms (2:30.5) or HH:MM:SS.ms (1:02:30.5)",
                    trimmed
                )))
            }
        };

        Ok(Self::from_seconds(
            hours as f64 * 3600.0 + minutes as f64 * 60.0 + seconds,
        ))
    }

    /// Format as [H:]MM:SS.mmm
    pub fn format_hms(&self) -> String {
        let total_millis = (self.seconds * 1000.0).round() as u64;
        let hours = total_millis / 3_600_000;
        let minutes = (total_millis % 3_600_000) / 60_000;
        let seconds = (total_millis % 60_000) / 1000;
        let milliseconds = total_millis % 1000;

        if hours > 0 {
            format!("{}:{:02}:{:02}.{:03}", hours, minutes, seconds, milliseconds)
        } else {
            format!("{:02}:{:02}.{:03}", minutes, seconds, milliseconds)
        }
    }
}

fn parse_component(part: &str, whole: &str) -> Result<u32, ParseError> {
    part.parse::<u32>()
        .map_err(|_| ParseError::invalid_time(format!("invalid time component in '{}'", whole)))
}

fn parse_seconds(part: &str, whole: &str) -> Result<f64, ParseError> {
    let seconds = part
        .parse::<f64>()
        .map_err(|_| ParseError::invalid_time(format!("invalid seconds in '{}'", whole)))?;
    if !(0.0..60.0).contains(&seconds) {
        return Err(ParseError::invalid_time(format!(
            "seconds must be less than 60: {}",
            whole
        )));
    }
    Ok(seconds)
}

impl fmt::Display for TimeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_hms())
    }
}

/// Segment of a source video to extract
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClipWindow {
    pub start: f64,
    pub duration: f64,
}

impl ClipWindow {
    /// Create a window; `start` must be non-negative and `duration` positive
    pub fn new(start: f64, duration: f64) -> Result<Self, BuildError> {
        if !start.is_finite() || start < 0.0 {
            return Err(BuildError::invalid_window(format!(
                "start must be a non-negative number, got {}",
                start
            )));
        }
        if !duration.is_finite() || duration <= 0.0 {
            return Err(BuildError::invalid_window(format!(
                "duration must be positive, got {}",
                duration
            )));
        }
        Ok(Self { start, duration })
    }

    /// Window of the default fixed length starting at `start`
    pub fn fixed(start: f64) -> Result<Self, BuildError> {
        Self::new(start, DEFAULT_CLIP_DURATION)
    }

    /// Window spanning `[start, end)`
    pub fn between(start: f64, end: f64) -> Result<Self, BuildError> {
        Self::new(start, end - start)
    }

    pub fn end(&self) -> f64 {
        self.start + self.duration
    }

    /// Largest start that keeps this duration inside a source of `source_duration`
    pub fn max_start(&self, source_duration: f64) -> f64 {
        (source_duration - self.duration).max(0.0)
    }

    /// Whether the window lies inside a source of the given length
    pub fn fits_within(&self, source_duration: f64) -> bool {
        self.end() <= source_duration + f64::EPSILON * source_duration.max(1.0)
    }
}

impl Default for ClipWindow {
    fn default() -> Self {
        Self {
            start: 0.0,
            duration: DEFAULT_CLIP_DURATION,
        }
    }
}

/// How the transcoder treats the compressed streams
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EncodingPolicy {
    /// Copy samples without re-encoding; cut points snap to source keyframes
    #[default]
    #[serde(alias = "stream-copy")]
    Copy,
    /// Decode and encode again with explicit codecs; frame accurate
    #[serde(alias = "re-encode")]
    Reencode,
}

impl EncodingPolicy {
    /// Parse policy from string
    pub fn parse(policy: &str) -> Result<Self, ParseError> {
        match policy.to_lowercase().as_str() {
            "copy" | "stream-copy" => Ok(EncodingPolicy::Copy),
            "reencode" | "re-encode" => Ok(EncodingPolicy::Reencode),
            other => Err(ParseError::UnknownPolicy(other.to_string())),
        }
    }
}

impl fmt::Display for EncodingPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EncodingPolicy::Copy => write!(f, "copy"),
            EncodingPolicy::Reencode => write!(f, "reencode"),
        }
    }
}

/// Transcoder argument list plus the file it will write
#[derive(Debug, Clone, PartialEq)]
pub struct ClipCommand {
    pub args: Vec<String>,
    pub output_path: String,
}

impl ClipCommand {
    /// Value following the first occurrence of `flag`
    pub fn arg_value(&self, flag: &str) -> Option<&str> {
        self.args
            .iter()
            .position(|arg| arg == flag)
            .and_then(|idx| self.args.get(idx + 1))
            .map(String::as_str)
    }
}

/// Result of a successful transcoder run
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionReport {
    pub output_path: String,
    pub log_lines: Vec<String>,
}

/// A finished extraction, ready to be catalogued
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClipDescriptor {
    pub output_path: String,
    pub start: f64,
    pub end: f64,
}

impl ClipDescriptor {
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

/// Clip fields supplied by the caller; the catalog assigns the id
#[derive(Debug, Clone, PartialEq)]
pub struct NewClip {
    pub uri: String,
    pub name: String,
    pub description: String,
    pub start: f64,
    pub end: f64,
}

impl NewClip {
    pub fn from_descriptor(descriptor: &ClipDescriptor, name: &str, description: &str) -> Self {
        Self {
            uri: descriptor.output_path.clone(),
            name: name.to_string(),
            description: description.to_string(),
            start: descriptor.start,
            end: descriptor.end,
        }
    }

    pub(crate) fn with_id(self, id: String) -> ClipRecord {
        ClipRecord {
            id,
            uri: self.uri,
            name: self.name,
            description: self.description,
            start: self.start,
            end: self.end,
        }
    }
}

/// A catalogued clip
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClipRecord {
    pub id: String,
    pub uri: String,
    pub name: String,
    pub description: String,
    pub start: f64,
    pub end: f64,
}

impl ClipRecord {
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

/// Whole catalog contents, persisted as one snapshot
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogState {
    #[serde(default)]
    pub videos: Vec<ClipRecord>,
}

/// Stage that produced a failed outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureStage {
    Resolve,
    Command,
    Execute,
}

/// Per-attempt summary of an extraction, never persisted
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum TranscodeOutcome {
    Success {
        output_path: String,
    },
    Failure {
        stage: FailureStage,
        message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        raw_log: Option<Vec<String>>,
    },
}

impl TranscodeOutcome {
    pub fn from_result(result: &Result<ClipDescriptor, PipelineError>) -> Self {
        match result {
            Ok(descriptor) => TranscodeOutcome::Success {
                output_path: descriptor.output_path.clone(),
            },
            Err(err) => {
                let (stage, raw_log) = match err {
                    PipelineError::Resolve(_) => (FailureStage::Resolve, None),
                    PipelineError::InvalidWindow(_) => (FailureStage::Command, None),
                    PipelineError::Transcode { details } => {
                        (FailureStage::Execute, details.log().map(<[String]>::to_vec))
                    }
                };
                TranscodeOutcome::Failure {
                    stage,
                    message: err.to_string(),
                    raw_log,
                }
            }
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, TranscodeOutcome::Success { .. })
    }
}

/// What the media picker hands back for a single selection
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PickResult {
    pub canceled: bool,
    pub uri: Option<String>,
}

impl PickResult {
    pub fn picked(uri: impl Into<String>) -> Self {
        Self {
            canceled: false,
            uri: Some(uri.into()),
        }
    }

    pub fn canceled() -> Self {
        Self {
            canceled: true,
            uri: None,
        }
    }
}

/// Answer of the file-metadata service for one locator
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FileInfo {
    pub exists: bool,
    pub resolved_uri: Option<String>,
}
