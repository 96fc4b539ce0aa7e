//! Locale-independent number formatting for transcoder arguments

/// Format seconds with up to six decimals, without trailing zeros.
///
/// Rust float formatting never consults the locale, so the decimal separator
/// is always `.`.
pub fn format_seconds(seconds: f64) -> String {
    let fixed = format!("{:.6}", seconds);
    let trimmed = fixed.trim_end_matches('0').trim_end_matches('.');
    match trimmed {
        "" | "-0" => "0".to_string(),
        other => other.to_string(),
    }
}

/// Human readable clip length, e.g. `5s` or `3.5s`
pub fn format_clip_length(seconds: f64) -> String {
    format!("{}s", format_seconds((seconds * 1000.0).round() / 1000.0))
}
