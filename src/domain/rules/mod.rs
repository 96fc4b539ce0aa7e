// Domain rules - Business logic and policies

use crate::domain::errors::*;
use crate::domain::model::*;

/// Length of a clip in the primary flow, in seconds
pub const DEFAULT_CLIP_DURATION: f64 = 5.0;

/// Maximum clip name length, in characters
pub const MAX_NAME_CHARS: usize = 50;

/// Maximum clip description length, in characters
pub const MAX_DESCRIPTION_CHARS: usize = 200;

/// Key the catalog snapshot is stored under
pub const CATALOG_STORAGE_KEY: &str = "video-storage";

/// Negative starts closer to zero than this are float noise and clamp to zero
const START_CLAMP_TOLERANCE: f64 = 1e-9;

/// Rules for windows handed to the command builder
pub struct WindowRules;

impl WindowRules {
    /// Validate a window for command construction, returning the clamped start
    pub fn checked_start(window: &ClipWindow) -> Result<f64, BuildError> {
        if !window.duration.is_finite() || window.duration <= 0.0 {
            return Err(BuildError::invalid_window(format!(
                "duration must be positive, got {}",
                window.duration
            )));
        }
        if !window.start.is_finite() {
            return Err(BuildError::invalid_window("start must be a finite number"));
        }
        if window.start < -START_CLAMP_TOLERANCE {
            return Err(BuildError::invalid_window(format!(
                "start must not be negative, got {}",
                window.start
            )));
        }
        Ok(window.start.max(0.0))
    }

    /// Check the window against a known source length
    pub fn validate_against_source(
        window: &ClipWindow,
        source_duration: Option<f64>,
    ) -> Result<(), BuildError> {
        Self::checked_start(window)?;
        match source_duration {
            Some(total) if !window.fits_within(total) => Err(BuildError::invalid_window(format!(
                "window {:.3}s..{:.3}s exceeds source duration {:.3}s",
                window.start,
                window.end(),
                total
            ))),
            _ => Ok(()),
        }
    }

    /// Clamp a requested start into `[0, max(0, source - duration)]`
    pub fn clamp_start(start: f64, duration: f64, source_duration: Option<f64>) -> f64 {
        let start = if start.is_finite() { start.max(0.0) } else { 0.0 };
        match source_duration {
            Some(total) => start.min((total - duration).max(0.0)),
            None => start,
        }
    }
}

/// Rules for user-entered clip metadata
pub struct MetadataRules;

impl MetadataRules {
    /// Cut text to at most `max` characters, as a length-limited input field would
    pub fn truncate(text: &str, max: usize) -> String {
        text.chars().take(max).collect()
    }

    /// Validate a record before it enters the catalog
    pub fn validate(clip: &NewClip) -> Result<(), CatalogError> {
        let invalid = |reason: String| Err(CatalogError::InvalidRecord { reason });

        if clip.uri.trim().is_empty() {
            return invalid("clip location is empty".to_string());
        }
        let name_len = clip.name.chars().count();
        if name_len > MAX_NAME_CHARS {
            return invalid(format!(
                "name is {} characters, limit is {}",
                name_len, MAX_NAME_CHARS
            ));
        }
        let description_len = clip.description.chars().count();
        if description_len > MAX_DESCRIPTION_CHARS {
            return invalid(format!(
                "description is {} characters, limit is {}",
                description_len, MAX_DESCRIPTION_CHARS
            ));
        }
        if !clip.start.is_finite() || !clip.end.is_finite() || clip.end <= clip.start {
            return invalid(format!(
                "end ({}) must be greater than start ({})",
                clip.end, clip.start
            ));
        }
        Ok(())
    }
}
