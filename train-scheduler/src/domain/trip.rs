//! Trip types and the trip status state machine.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::{ScheduledSegmentId, TimeWindow, TrackSegmentId, TrainId, TripId};

/// Status of a scheduled trip.
///
/// ```text
/// PLANNED ──► ACTIVE ──► CANCELLED
///    └──────────────────────▲
/// ```
///
/// CANCELLED is terminal under the strict policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TripStatus {
    #[default]
    Planned,
    Active,
    Cancelled,
}

impl TripStatus {
    /// True if trips in this status occupy their track segments.
    pub fn occupies_track(self) -> bool {
        matches!(self, TripStatus::Planned | TripStatus::Active)
    }

    /// The strict transition table. Staying in the same status is allowed.
    pub fn can_become(self, next: TripStatus) -> bool {
        use TripStatus::*;
        self == next || matches!((self, next), (Planned, Active) | (Planned | Active, Cancelled))
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TripStatus::Planned => "PLANNED",
            TripStatus::Active => "ACTIVE",
            TripStatus::Cancelled => "CANCELLED",
        }
    }
}

impl fmt::Display for TripStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How status updates are policed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransitionPolicy {
    /// Only the edges in [`TripStatus::can_become`] are allowed.
    #[default]
    Strict,
    /// Any status may be set at any time.
    Permissive,
}

impl TransitionPolicy {
    pub fn allows(self, from: TripStatus, to: TripStatus) -> bool {
        match self {
            TransitionPolicy::Strict => from.can_become(to),
            TransitionPolicy::Permissive => true,
        }
    }
}

/// Error returned when parsing an unknown policy name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown transition policy {0:?}, expected \"strict\" or \"permissive\"")]
pub struct UnknownPolicy(String);

impl FromStr for TransitionPolicy {
    type Err = UnknownPolicy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "strict" => Ok(TransitionPolicy::Strict),
            "permissive" => Ok(TransitionPolicy::Permissive),
            _ => Err(UnknownPolicy(s.to_string())),
        }
    }
}

/// One leg of a proposed trip, before it has been stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProposedSegment {
    pub track_segment_id: TrackSegmentId,
    pub window: TimeWindow,
}

/// A trip as submitted for creation or conflict checking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProposedTrip {
    pub train_id: TrainId,
    pub segments: Vec<ProposedSegment>,
}

impl ProposedTrip {
    /// Track segment ids in proposal order, duplicates included.
    pub fn track_segment_ids(&self) -> impl Iterator<Item = TrackSegmentId> + '_ {
        self.segments.iter().map(|s| s.track_segment_id)
    }
}

/// A validated trip ready to be written, with derived start/end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTrip {
    pub train_id: TrainId,
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
    pub segments: Vec<ProposedSegment>,
}

/// A stored leg of a trip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledSegment {
    pub id: ScheduledSegmentId,
    pub trip_id: TripId,
    pub track_segment_id: TrackSegmentId,
    pub window: TimeWindow,
}

/// An existing occupation of a track segment by a non-cancelled trip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Occupancy {
    pub trip_id: TripId,
    pub train_id: TrainId,
    pub segment_id: ScheduledSegmentId,
    pub window: TimeWindow,
}

/// A stored trip together with its owned segments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledTrip {
    pub id: TripId,
    pub train_id: TrainId,
    pub status: TripStatus,
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
    pub segments: Vec<ScheduledSegment>,
}
