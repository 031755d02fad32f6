//! Track segment types.
//!
//! A track segment joins two stations. Segments are undirected: the segment
//! between A and B is the same resource as the one between B and A, and at
//! most one may exist per unordered pair.

use super::{DomainError, Station, StationId, TrackSegmentId};

/// Allowed travel time range in minutes (up to one day).
const TRAVEL_RANGE: std::ops::RangeInclusive<u32> = 1..=1440;

/// An unordered pair of distinct stations.
///
/// # Examples
///
/// ```
/// use train_scheduler::domain::{StationId, StationPair};
///
/// let ab = StationPair::new(StationId(1), StationId(2)).unwrap();
/// let ba = StationPair::new(StationId(2), StationId(1)).unwrap();
/// assert_eq!(ab, ba);
///
/// assert!(StationPair::new(StationId(1), StationId(1)).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StationPair {
    low: StationId,
    high: StationId,
}

impl StationPair {
    /// Normalise two station ids into an unordered pair.
    pub fn new(a: StationId, b: StationId) -> Result<Self, DomainError> {
        if a == b {
            return Err(DomainError::SameStation(a));
        }
        Ok(Self {
            low: a.min(b),
            high: a.max(b),
        })
    }

    /// True if either end is `station`.
    pub fn touches(&self, station: StationId) -> bool {
        self.low == station || self.high == station
    }
}

/// Travel time along a segment, 1 to 1440 minutes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TravelTime(u32);

impl TravelTime {
    pub fn from_minutes(minutes: u32) -> Result<Self, DomainError> {
        if !TRAVEL_RANGE.contains(&minutes) {
            return Err(DomainError::invalid(
                "travel_time_minutes",
                "must be between 1 and 1440",
            ));
        }
        Ok(Self(minutes))
    }

    pub fn minutes(&self) -> u32 {
        self.0
    }
}

/// A physical connection between two stations.
///
/// Single-track segments are the unit of exclusivity for conflict
/// detection: only one train may occupy one at a time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackSegment {
    pub id: TrackSegmentId,
    pub station_a: StationId,
    pub station_b: StationId,
    pub single_track: bool,
    pub travel_time: TravelTime,
}

impl TrackSegment {
    /// The unordered station pair this segment joins.
    pub fn pair(&self) -> StationPair {
        // Construction via the registry guarantees distinct stations.
        StationPair {
            low: self.station_a.min(self.station_b),
            high: self.station_a.max(self.station_b),
        }
    }
}

/// A track segment joined with both of its stations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackSegmentDetails {
    pub segment: TrackSegment,
    pub station_a: Station,
    pub station_b: Station,
}

impl TrackSegmentDetails {
    /// Human-readable label naming both ends, e.g. `Station A - Station B`.
    pub fn label(&self) -> String {
        format!("{} - {}", self.station_a.name, self.station_b.name)
    }
}
