//! Human-readable time formatting for trim fields
//!
//! Trim bounds are displayed and edited as text. Formatting picks a layout from
//! the typical maximum of the field (usually the source duration) so a column of
//! values lines up, and parsing accepts every layout the formatter produces plus
//! plain seconds.

use crate::{Error, Result};

/// Time display format selection thresholds (seconds)
const SHORT_FORMAT_MAX: f64 = 100.0; // < 100s → S.CCs
const MEDIUM_FORMAT_MAX: f64 = 6000.0; // < 100m → M:SS.CC
                                       // >= 100m → H:MM:SS.D

/// Format seconds for a trim field.
///
/// Format selection by typical maximum value:
/// - Short format (`S.CCs`): typical max <= 100 seconds
/// - Medium format (`M:SS.CC`): typical max <= 100 minutes
/// - Long format (`H:MM:SS.D`): anything longer
///
/// Values are rounded to the displayed precision before splitting into
/// components, so 59.999s never renders as `0:60.00`.
///
/// # Examples
///
/// ```
/// use sfx_common::human_time::format_time_field;
///
/// assert_eq!(format_time_field(2.5, 10.0), "2.50s");
/// assert_eq!(format_time_field(62.5, 180.0), "1:02.50");
/// assert_eq!(format_time_field(3723.25, 7200.0), "1:02:03.3");
/// ```
pub fn format_time_field(seconds: f64, typical_max: f64) -> String {
    if !seconds.is_finite() {
        return "--".to_string();
    }

    let is_negative = seconds < 0.0;
    let abs_seconds = seconds.abs();

    let formatted = if typical_max <= SHORT_FORMAT_MAX {
        let centis = (abs_seconds * 100.0).round() as u64;
        format!("{}.{:02}s", centis / 100, centis % 100)
    } else if typical_max <= MEDIUM_FORMAT_MAX {
        let centis = (abs_seconds * 100.0).round() as u64;
        let minutes = centis / 6000;
        let rem = centis % 6000;
        format!("{}:{:02}.{:02}", minutes, rem / 100, rem % 100)
    } else {
        let decis = (abs_seconds * 10.0).round() as u64;
        let hours = decis / 36000;
        let mins = (decis % 36000) / 600;
        let rem = decis % 600;
        format!("{}:{:02}:{:02}.{}", hours, mins, rem / 10, rem % 10)
    };

    if is_negative {
        format!("-{}", formatted)
    } else {
        formatted
    }
}

/// Parse a trim field value into seconds.
///
/// Accepted layouts:
/// - `2.5`, `2.5s` (seconds)
/// - `1:02.5` (minutes and seconds)
/// - `0:01:02.5` (hours, minutes and seconds)
///
/// Negative, non-finite and malformed values are rejected with
/// [`Error::InvalidInput`]. Range clamping is the caller's concern.
///
/// # Examples
///
/// ```
/// use sfx_common::human_time::parse_time_field;
///
/// assert_eq!(parse_time_field("2.5").unwrap(), 2.5);
/// assert_eq!(parse_time_field("1:02.5").unwrap(), 62.5);
/// assert!(parse_time_field("abc").is_err());
/// ```
pub fn parse_time_field(text: &str) -> Result<f64> {
    let trimmed = text.trim();
    let body = trimmed.strip_suffix('s').unwrap_or(trimmed).trim_end();
    if body.is_empty() {
        return Err(Error::InvalidInput("empty time value".to_string()));
    }

    let parts: Vec<&str> = body.split(':').collect();
    if parts.len() > 3 {
        return Err(Error::InvalidInput(format!("too many ':' in {:?}", text)));
    }

    let invalid = || Error::InvalidInput(format!("not a time value: {:?}", text));

    let (last, leading) = parts.split_last().ok_or_else(invalid)?;
    let seconds: f64 = last.trim().parse().map_err(|_| invalid())?;
    if !seconds.is_finite() || seconds < 0.0 {
        return Err(invalid());
    }

    let mut whole_units = Vec::with_capacity(leading.len());
    for part in leading {
        let value: u32 = part.trim().parse().map_err(|_| invalid())?;
        whole_units.push(value);
    }

    // Seconds (and minutes under an hour field) must stay below 60 once a larger unit is present
    if !whole_units.is_empty() && seconds >= 60.0 {
        return Err(invalid());
    }

    let total = match whole_units.as_slice() {
        [] => seconds,
        [minutes] => *minutes as f64 * 60.0 + seconds,
        [hours, minutes] => {
            if *minutes >= 60 {
                return Err(invalid());
            }
            *hours as f64 * 3600.0 + *minutes as f64 * 60.0 + seconds
        }
        _ => return Err(invalid()),
    };

    Ok(total)
}
