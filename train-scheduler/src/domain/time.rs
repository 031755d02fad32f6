//! Timestamp handling for scheduled segments.
//!
//! Timestamps are naive: no timezone is attached and all comparisons assume a
//! single consistent clock. Inputs that carry a UTC offset are rejected at
//! parse time rather than silently compared against naive values.

use std::fmt;

use chrono::{Duration, NaiveDateTime};

/// Formats accepted by [`parse_timestamp`], tried in order.
const ACCEPTED_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Error returned when parsing an invalid timestamp string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid timestamp {input:?}: {reason}")]
pub struct TimeError {
    input: String,
    reason: &'static str,
}

impl TimeError {
    fn new(input: &str, reason: &'static str) -> Self {
        Self {
            input: input.to_string(),
            reason,
        }
    }

    /// Returns the rejected input.
    pub fn input(&self) -> &str {
        &self.input
    }
}

/// Parse a naive ISO-8601 timestamp.
///
/// # Examples
///
/// ```
/// use train_scheduler::domain::parse_timestamp;
///
/// assert!(parse_timestamp("2025-01-01T10:00:00").is_ok());
/// assert!(parse_timestamp("2025-01-01 10:00:00.250").is_ok());
///
/// // Offsets are not comparable with naive timestamps
/// assert!(parse_timestamp("2025-01-01T10:00:00Z").is_err());
/// assert!(parse_timestamp("2025-01-01T10:00:00+01:00").is_err());
/// ```
pub fn parse_timestamp(s: &str) -> Result<NaiveDateTime, TimeError> {
    if has_offset(s) {
        return Err(TimeError::new(s, "timezone offsets are not supported"));
    }

    ACCEPTED_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .ok_or_else(|| TimeError::new(s, "expected YYYY-MM-DDTHH:MM:SS"))
}

/// Format a timestamp in canonical form.
///
/// Fractional seconds are only printed when present.
pub fn format_timestamp(t: &NaiveDateTime) -> String {
    t.format("%Y-%m-%dT%H:%M:%S%.f").to_string()
}

/// Detects a trailing `Z` or `+HH:MM`/`-HH:MM` after the date part.
fn has_offset(s: &str) -> bool {
    if s.ends_with('Z') || s.ends_with('z') {
        return true;
    }
    // The date part itself contains dashes, so only look past it.
    s.get(10..)
        .is_some_and(|rest| rest.contains('+') || rest.contains('-'))
}

/// A half-open occupancy window `[departure, arrival)`.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimeWindow {
    pub departure: NaiveDateTime,
    pub arrival: NaiveDateTime,
}

impl TimeWindow {
    /// Create a window. No ordering is enforced here; see
    /// [`TimeWindow::is_forward`].
    pub fn new(departure: NaiveDateTime, arrival: NaiveDateTime) -> Self {
        Self {
            departure,
            arrival,
        }
    }

    /// True if the window ends strictly after it starts.
    pub fn is_forward(&self) -> bool {
        self.departure < self.arrival
    }

    /// Half-open overlap test.
    ///
    /// Windows that merely touch (one arrives exactly when the other departs)
    /// do not overlap: the train clears the segment at arrival.
    pub fn overlaps(&self, other: &TimeWindow) -> bool {
        self.departure < other.arrival && other.departure < self.arrival
    }

    /// Time spent in the window.
    pub fn duration(&self) -> Duration {
        self.arrival - self.departure
    }
}

impl fmt::Debug for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "TimeWindow({} → {})",
            format_timestamp(&self.departure),
            format_timestamp(&self.arrival)
        )
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} → {}",
            format_timestamp(&self.departure),
            format_timestamp(&self.arrival)
        )
    }
}
