// Clip command builder - deterministic transcoder arguments for one window

use std::path::Path;
use std::sync::Arc;

use crate::domain::errors::BuildError;
use crate::domain::model::{ClipCommand, ClipWindow, EncodingPolicy};
use crate::domain::rules::WindowRules;
use crate::utils::time::format_seconds;
use crate::utils::token::MonotonicClock;

/// Extension of every produced clip
pub const CLIP_EXTENSION: &str = "mp4";

/// Builds transcoder commands.
///
/// Stream copy (`-c copy`) is fast but cuts snap to the nearest source
/// keyframe, so the clip can start slightly early. Re-encoding selects the
/// configured codecs and is frame accurate. The policy is configuration; no
/// keyframe detection is attempted.
#[derive(Clone)]
pub struct ClipCommandBuilder {
    policy: EncodingPolicy,
    video_codec: String,
    audio_codec: String,
    tokens: Arc<MonotonicClock>,
}

impl ClipCommandBuilder {
    /// Create a builder using stream copy and the default re-encode codecs
    pub fn new(tokens: Arc<MonotonicClock>) -> Self {
        Self {
            policy: EncodingPolicy::Copy,
            video_codec: "libx264".to_string(),
            audio_codec: "aac".to_string(),
            tokens,
        }
    }

    /// Set the encoding policy
    pub fn with_policy(mut self, policy: EncodingPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Set the codecs used by the re-encode policy
    pub fn with_codecs(mut self, video: impl Into<String>, audio: impl Into<String>) -> Self {
        self.video_codec = video.into();
        self.audio_codec = audio.into();
        self
    }

    pub fn policy(&self) -> EncodingPolicy {
        self.policy
    }

    /// Build the command that extracts `window` from `input_path` into a new
    /// `{token}.mp4` file under `destination_dir`.
    pub fn build(
        &self,
        input_path: &str,
        window: &ClipWindow,
        destination_dir: &Path,
    ) -> Result<ClipCommand, BuildError> {
        let start = WindowRules::checked_start(window)?;
        let output_path = destination_dir
            .join(format!("{}.{}", self.tokens.next(), CLIP_EXTENSION))
            .to_string_lossy()
            .into_owned();

        let mut args: Vec<String> = vec![
            "-y".into(),
            "-ss".into(),
            format_seconds(start),
            "-t".into(),
            format_seconds(window.duration),
            "-i".into(),
            input_path.to_string(),
        ];

        match self.policy {
            EncodingPolicy::Copy => {
                args.extend(["-c".to_string(), "copy".to_string()]);
            }
            EncodingPolicy::Reencode => {
                args.extend([
                    "-c:v".to_string(),
                    self.video_codec.clone(),
                    "-c:a".to_string(),
                    self.audio_codec.clone(),
                ]);
            }
        }
        args.push(output_path.clone());

        Ok(ClipCommand { args, output_path })
    }
}
