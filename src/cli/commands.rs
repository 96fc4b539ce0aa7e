//! Command implementations

use anyhow::{anyhow, Context, Result};
use serde_json::json;
use tracing::{error, info, warn};

use crate::app::AppContainer;
use crate::cli::args::{ClipArgs, ListArgs, RemoveArgs, ShowArgs};
use crate::domain::errors::{PipelineError, SessionError};
use crate::domain::model::{ClipRecord, PickResult, TimeSpec, TranscodeOutcome};
use crate::utils::time::format_clip_length;

/// Starts that moved by less than this were not clamped
const CLAMP_NOTICE_TOLERANCE: f64 = 1e-6;

/// Log lines shown when the transcoder fails
const FAILURE_LOG_TAIL: usize = 10;

/// Execute the clip command
pub async fn clip(container: &dyn AppContainer, args: ClipArgs) -> Result<()> {
    info!("Starting clip operation");
    info!("Source: {}", args.source);

    let start = TimeSpec::parse(&args.start)
        .map_err(|e| anyhow!("Invalid start time '{}': {}", args.start, e))?
        .as_seconds();
    let end = args
        .end
        .as_deref()
        .map(|end| {
            TimeSpec::parse(end)
                .map(|t| t.as_seconds())
                .map_err(|e| anyhow!("Invalid end time '{}': {}", end, e))
        })
        .transpose()?;

    let source_duration = match args.source_duration {
        Some(seconds) => Some(seconds),
        None => probe_duration(container, &args.source).await,
    };

    let mut session = container.new_session();
    session.select_source(PickResult::picked(args.source.clone()), source_duration)?;

    let window = match (end, args.duration) {
        (Some(end), _) => session.set_range(start, end)?,
        (None, Some(duration)) => {
            session.set_duration(duration)?;
            session.set_start(start)?
        }
        (None, None) => session.set_start(start)?,
    };
    if (window.start - start).abs() > CLAMP_NOTICE_TOLERANCE {
        warn!(
            "Start {} moved to {} to keep the clip inside the source",
            TimeSpec::from_seconds(start),
            TimeSpec::from_seconds(window.start)
        );
    }
    info!(
        "Window: {} - {} ({})",
        TimeSpec::from_seconds(window.start),
        TimeSpec::from_seconds(window.end()),
        format_clip_length(window.duration)
    );

    session.confirm_window()?;
    if session.set_name(&args.name)?.len() < args.name.len() {
        warn!("Name shortened to 50 characters");
    }
    if session.set_description(&args.description)?.len() < args.description.len() {
        warn!("Description shortened to 200 characters");
    }

    let result = session.save().await;
    if args.json {
        print_outcome_json(&result)?;
    }

    match result {
        Ok(record) => {
            if !args.json {
                println!(
                    "Saved clip {} ({}) -> {}",
                    record.id,
                    format_clip_length(record.duration()),
                    record.uri
                );
            }
            info!("Clip operation completed successfully");
            Ok(())
        }
        Err(err) => {
            if let SessionError::ClipNotCreated(PipelineError::Transcode { details }) = &err {
                if let Some(log) = details.log() {
                    let tail = &log[log.len().saturating_sub(FAILURE_LOG_TAIL)..];
                    for line in tail {
                        error!("ffmpeg: {}", line);
                    }
                }
            }
            Err(err.into())
        }
    }
}

/// Source length from ffprobe; unknown when the source cannot be probed
async fn probe_duration(container: &dyn AppContainer, source: &str) -> Option<f64> {
    let path = match container.resolver().resolve(source).await {
        Ok(path) => path,
        Err(e) => {
            warn!("Cannot probe source duration: {}", e);
            return None;
        }
    };
    match container.probe().duration_seconds(&path).await {
        Ok(seconds) => {
            info!("Source duration: {}", TimeSpec::from_seconds(seconds));
            Some(seconds)
        }
        Err(e) => {
            warn!("Source duration unknown: {}", e);
            None
        }
    }
}

fn print_outcome_json(result: &Result<ClipRecord, SessionError>) -> Result<()> {
    let value = match result {
        Ok(record) => json!({
            "outcome": TranscodeOutcome::Success { output_path: record.uri.clone() },
            "clip": record,
        }),
        Err(SessionError::ClipNotCreated(err)) => json!({
            "outcome": TranscodeOutcome::from_result(&Err(err.clone())),
            "error": result_message(result),
        }),
        Err(SessionError::ClipNotSaved { output_path, .. }) => json!({
            "outcome": TranscodeOutcome::Success { output_path: output_path.clone() },
            "error": result_message(result),
        }),
        Err(_) => json!({ "error": result_message(result) }),
    };
    let text = serde_json::to_string_pretty(&value).context("Failed to serialize outcome")?;
    println!("{}", text);
    Ok(())
}

fn result_message(result: &Result<ClipRecord, SessionError>) -> Option<String> {
    result.as_ref().err().map(ToString::to_string)
}

/// Execute the list command
pub async fn list(container: &dyn AppContainer, args: ListArgs) -> Result<()> {
    let clips = container.catalog().list();

    if args.json {
        let text = serde_json::to_string_pretty(&clips).context("Failed to serialize clips")?;
        println!("{}", text);
        return Ok(());
    }

    if clips.is_empty() {
        println!("No clips added yet");
        return Ok(());
    }
    for clip in &clips {
        println!(
            "{}  {:<24}  {:>8}  {}",
            clip.id,
            display_name(clip),
            format_clip_length(clip.duration()),
            clip.uri
        );
    }
    Ok(())
}

/// Execute the show command
pub async fn show(container: &dyn AppContainer, args: ShowArgs) -> Result<()> {
    let clip = container
        .catalog()
        .get(&args.id)
        .ok_or_else(|| anyhow!("Clip not found: {}", args.id))?;

    if args.json {
        let text = serde_json::to_string_pretty(&clip).context("Failed to serialize clip")?;
        println!("{}", text);
        return Ok(());
    }

    println!("{}", display_name(&clip));
    if clip.description.is_empty() {
        println!("  No description");
    } else {
        println!("  {}", clip.description);
    }
    println!("  Id:       {}", clip.id);
    println!("  Location: {}", clip.uri);
    println!(
        "  Window:   {} - {}",
        TimeSpec::from_seconds(clip.start),
        TimeSpec::from_seconds(clip.end)
    );
    println!("  Duration: {}", format_clip_length(clip.duration()));
    Ok(())
}

/// Execute the remove command
pub async fn remove(container: &dyn AppContainer, args: RemoveArgs) -> Result<()> {
    let catalog = container.catalog();
    if catalog.get(&args.id).is_none() {
        println!("Clip not found: {}, nothing removed", args.id);
        return Ok(());
    }
    catalog
        .remove_video(&args.id)
        .await
        .with_context(|| format!("Failed to remove clip {}", args.id))?;
    println!("Removed clip {}", args.id);
    Ok(())
}

fn display_name(clip: &ClipRecord) -> &str {
    if clip.name.is_empty() {
        "(untitled)"
    } else {
        &clip.name
    }
}
