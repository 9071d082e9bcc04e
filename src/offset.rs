//! UTC offset parsing and formatting.
//!
//! The vendor dataset writes offsets as `+HH:MM` / `-HH:MM`, or a bare `-`
//! when the timezone is unknown. Records store signed seconds east of UTC.

use once_cell::sync::Lazy;
use regex::Regex;

/// Marker the dataset uses for an unknown offset.
pub const UNKNOWN_OFFSET: &str = "-";

static OFFSET_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([+-]?)(\d{1,2}):([0-5]\d)$").unwrap());

/// Parse a dataset offset string into seconds east of UTC.
///
/// `"-"` means unknown and yields `0`. A missing sign is read as positive.
/// Returns `None` for anything else that is not `[+-]H[H]:MM`.
pub fn parse_utc_offset(text: &str) -> Option<i32> {
    let text = text.trim();
    if text == UNKNOWN_OFFSET {
        return Some(0);
    }

    let caps = OFFSET_PATTERN.captures(text)?;
    let hours: i32 = caps[2].parse().ok()?;
    let minutes: i32 = caps[3].parse().ok()?;
    let seconds = hours * 3600 + minutes * 60;

    if &caps[1] == "-" {
        Some(-seconds)
    } else {
        Some(seconds)
    }
}

/// Format seconds east of UTC as `+HH:MM` / `-HH:MM`.
pub fn format_utc_offset(seconds: i32) -> String {
    let sign = if seconds < 0 { '-' } else { '+' };
    let abs = seconds.unsigned_abs();
    format!("{}{:02}:{:02}", sign, abs / 3600, (abs % 3600) / 60)
}
