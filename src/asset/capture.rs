//! Capture times and types of photo files
//!
//! Cameras and phones usually put the capture time into the file name
//! (`IMG_20230501_110000.jpg`, `20230501_1100.png`, ...). When they don't, the
//! file's modification time stands in.

use std::fs;
use std::path::Path;

use chrono::{DateTime, Local, NaiveDate};

use crate::error::Result;
use crate::time::{truncate_to_seconds, Timestamp};

/// Image file extensions accepted as photos, lower case without the dot
pub const SUPPORTED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp"];

/// Check if `path` has a supported image extension (case-insensitive)
pub fn is_supported_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map_or(false, |ext| {
            SUPPORTED_EXTENSIONS
                .iter()
                .any(|supported| supported.eq_ignore_ascii_case(ext))
        })
}

/// The extension of `path` including its leading dot, case preserved.
///
/// Empty if the path has no extension.
pub fn extension_of(path: &Path) -> String {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| format!(".{}", ext))
        .unwrap_or_default()
}

/// Read a capture time out of a file name.
///
/// The first run of digits is the date as `YYYYMMDD`. A second run of six
/// digits is the time as `HHMMSS`, of four digits `HHMM`; anything else
/// leaves the time at midnight. Returns `None` if there is no date or it is
/// not a real calendar date.
pub fn capture_time_from_name(file_name: &str) -> Option<Timestamp> {
    let mut runs = digit_runs(file_name);

    let date: u64 = runs.next()?.parse().ok()?;
    if date < 10_000 {
        return None;
    }
    let year = i32::try_from(date / 10_000).ok()?;
    let month = (date / 100 % 100) as u32;
    let day = (date % 100) as u32;

    let (hour, minute, second) = match runs.next() {
        Some(run) if run.len() == 6 => {
            let time: u32 = run.parse().ok()?;
            (time / 10_000, time / 100 % 100, time % 100)
        }
        Some(run) if run.len() == 4 => {
            let time: u32 = run.parse().ok()?;
            (time / 100, time % 100, 0)
        }
        _ => (0, 0, 0),
    };

    NaiveDate::from_ymd_opt(year, month, day)?.and_hms_opt(hour, minute, second)
}

/// Capture time of the photo at `path`: from its name if possible, otherwise
/// its modification time in local wall-clock time
pub fn capture_time(path: &Path) -> Result<Timestamp> {
    let from_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .and_then(capture_time_from_name);

    if let Some(timestamp) = from_name {
        return Ok(timestamp);
    }

    let modified = fs::metadata(path)?.modified()?;
    let local: DateTime<Local> = modified.into();
    Ok(truncate_to_seconds(local.naive_local()))
}

fn digit_runs(text: &str) -> impl Iterator<Item = &str> {
    text.split(|c: char| !c.is_ascii_digit())
        .filter(|run| !run.is_empty())
}
