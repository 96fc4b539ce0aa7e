//! Command-line argument definitions

use clap::Args;

use crate::domain::model::EncodingPolicy;

/// Arguments for the clip command
#[derive(Args, Debug)]
pub struct ClipArgs {
    /// Source video: a file path, file:// or content://media/ locator
    #[arg(short, long)]
    pub source: String,

    /// Start time (HH:MM:SS.ms, MM:SS.ms, or seconds)
    #[arg(short = 'f', long, default_value = "0")]
    pub start: String,

    /// Clip length in seconds (default: configured clip duration)
    #[arg(short, long, conflicts_with = "end")]
    pub duration: Option<f64>,

    /// End time (HH:MM:SS.ms, MM:SS.ms, or seconds)
    #[arg(short, long)]
    pub end: Option<String>,

    /// Clip name (up to 50 characters)
    #[arg(short, long, default_value = "")]
    pub name: String,

    /// Clip description (up to 200 characters)
    #[arg(long, default_value = "")]
    pub description: String,

    /// Encoding policy: copy (fast, keyframe aligned) or reencode (frame accurate)
    #[arg(long, value_parser = parse_policy)]
    pub mode: Option<EncodingPolicy>,

    /// Source length in seconds; probed with ffprobe when omitted
    #[arg(long)]
    pub source_duration: Option<f64>,

    /// Print the outcome as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the list command
#[derive(Args, Debug)]
pub struct ListArgs {
    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the show command
#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Clip id, as printed by `list`
    pub id: String,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the remove command
#[derive(Args, Debug)]
pub struct RemoveArgs {
    /// Clip id, as printed by `list`
    pub id: String,
}

fn parse_policy(value: &str) -> Result<EncodingPolicy, String> {
    EncodingPolicy::parse(value).map_err(|e| e.to_string())
}
