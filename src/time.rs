//! Timestamp handling for diary entries
//!
//! All timestamps are naive local wall-clock values with second resolution.
//! This module defines the on-disk timestamp format and the search direction
//! used when looking for neighbouring entries.

use std::fmt;
use chrono::{Datelike, NaiveDateTime, Timelike};
use serde::{Serialize, Deserialize};

/// Timestamp of a diary entry
pub type Timestamp = NaiveDateTime;

/// Combined ISO date-time format used in shard documents
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Format a timestamp for storage
pub fn format_timestamp(timestamp: &Timestamp) -> String {
    timestamp.format(TIMESTAMP_FORMAT).to_string()
}

/// Parse a stored timestamp
pub fn parse_timestamp(value: &str) -> Option<Timestamp> {
    NaiveDateTime::parse_from_str(value.trim(), TIMESTAMP_FORMAT).ok()
}

/// Drop any sub-second part of a timestamp
pub fn truncate_to_seconds(timestamp: Timestamp) -> Timestamp {
    timestamp.with_nanosecond(0).unwrap_or(timestamp)
}

/// Human-readable form shown next to entry previews,
/// e.g. `Monday, 1.5.2023, Time: 10:00:00`
pub fn display_timestamp(timestamp: &Timestamp) -> String {
    format!(
        "{}, {}.{}.{}, Time: {:02}:{:02}:{:02}",
        timestamp.format("%A"),
        timestamp.day(),
        timestamp.month(),
        timestamp.year(),
        timestamp.hour(),
        timestamp.minute(),
        timestamp.second(),
    )
}

/// Search direction relative to a query timestamp
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Strictly before the query timestamp
    Earlier,
    /// Strictly after the query timestamp
    Later,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Earlier => write!(f, "earlier"),
            Direction::Later => write!(f, "later"),
        }
    }
}

impl Direction {
    /// Whether `candidate` lies strictly on this side of `bound`
    pub fn admits<T: PartialOrd>(&self, candidate: &T, bound: &T) -> bool {
        match self {
            Direction::Earlier => candidate < bound,
            Direction::Later => candidate > bound,
        }
    }

    /// Whether `candidate` is strictly closer to the bound than `best`.
    ///
    /// Equal values never improve, so the first of several ties is kept.
    pub fn improves<T: PartialOrd>(&self, candidate: &T, best: &T) -> bool {
        match self {
            Direction::Earlier => candidate > best,
            Direction::Later => candidate < best,
        }
    }

    /// The opposite direction
    pub fn reverse(&self) -> Self {
        match self {
            Direction::Earlier => Direction::Later,
            Direction::Later => Direction::Earlier,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ts(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> Timestamp {
        NaiveDate::from_ymd_opt(y, mo, d).unwrap().and_hms_opt(h, mi, s).unwrap()
    }

    #[test]
    fn test_timestamp_format_and_parse() {
        let t = ts(2023, 5, 1, 10, 0, 0);
        assert_eq!(format_timestamp(&t), "2023-05-01T10:00:00");
        assert_eq!(parse_timestamp("2023-05-01T10:00:00"), Some(t));

        // Other shapes are rejected
        assert_eq!(parse_timestamp("2023-05-01 10:00:00"), None);
        assert_eq!(parse_timestamp("01.05.2023"), None);
        assert_eq!(parse_timestamp(""), None);
    }

    #[test]
    fn test_truncate_to_seconds() {
        let t = ts(2023, 5, 1, 10, 0, 0);
        let with_millis = NaiveDate::from_ymd_opt(2023, 5, 1)
            .unwrap()
            .and_hms_milli_opt(10, 0, 0, 750)
            .unwrap();
        assert_eq!(truncate_to_seconds(with_millis), t);
    }

    #[test]
    fn test_display_timestamp() {
        let t = ts(2023, 5, 1, 10, 4, 9);
        assert_eq!(display_timestamp(&t), "Monday, 1.5.2023, Time: 10:04:09");
    }

    #[test]
    fn test_direction_comparisons() {
        assert!(Direction::Earlier.admits(&1, &2));
        assert!(!Direction::Earlier.admits(&2, &2));
        assert!(Direction::Later.admits(&3, &2));
        assert!(!Direction::Later.admits(&2, &2));

        assert!(Direction::Earlier.improves(&5, &4));
        assert!(!Direction::Earlier.improves(&4, &4));
        assert!(Direction::Later.improves(&4, &5));
        assert!(!Direction::Later.improves(&5, &5));

        assert_eq!(Direction::Earlier.reverse(), Direction::Later);
        assert_eq!(Direction::Later.to_string(), "later");
    }
}
