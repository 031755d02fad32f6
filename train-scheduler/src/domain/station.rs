//! Station types.

use std::fmt;

use super::{DomainError, StationId};

/// Maximum station name length, in characters.
const MAX_NAME_CHARS: usize = 200;

/// Allowed range for the number of tracks at a station.
const TRACK_RANGE: std::ops::RangeInclusive<u32> = 1..=50;

/// A non-empty station name of at most 200 characters.
///
/// # Examples
///
/// ```
/// use train_scheduler::domain::StationName;
///
/// let name = StationName::parse("Station A").unwrap();
/// assert_eq!(name.as_str(), "Station A");
///
/// assert!(StationName::parse("").is_err());
/// ```
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct StationName(String);

impl StationName {
    /// Parse a station name.
    pub fn parse(s: &str) -> Result<Self, DomainError> {
        let len = s.chars().count();
        if len == 0 {
            return Err(DomainError::invalid("station name", "must not be empty"));
        }
        if len > MAX_NAME_CHARS {
            return Err(DomainError::invalid(
                "station name",
                "must be at most 200 characters",
            ));
        }
        Ok(Self(s.to_string()))
    }

    /// Returns the name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for StationName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StationName({})", self.0)
    }
}

impl fmt::Display for StationName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Number of tracks at a station, between 1 and 50.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TrackCount(u32);

impl TrackCount {
    /// Validate a track count.
    pub fn new(n: u32) -> Result<Self, DomainError> {
        if !TRACK_RANGE.contains(&n) {
            return Err(DomainError::invalid("num_tracks", "must be between 1 and 50"));
        }
        Ok(Self(n))
    }

    pub fn get(&self) -> u32 {
        self.0
    }
}

impl Default for TrackCount {
    fn default() -> Self {
        Self(1)
    }
}

/// A physical railway station.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Station {
    pub id: StationId,
    pub name: StationName,
    pub num_tracks: TrackCount,
}
