//! Storage error types.

use crate::domain::{DomainError, StationId, TrackSegmentId, TrainId, TripId};

/// Errors from the scheduling capability of a store.
///
/// The core validates references before writing, but a concurrent registry
/// delete can still remove a train or segment in between, so the write
/// re-checks them.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// The trip's train disappeared before the write
    #[error("train {0} no longer exists")]
    MissingTrain(TrainId),

    /// Some track segments disappeared before the write
    #[error("track segments no longer exist: {0:?}")]
    MissingSegments(Vec<TrackSegmentId>),
}

/// Errors from registry (station, train, track segment) operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("station with id {0} not found")]
    StationNotFound(StationId),

    #[error("train with id {0} not found")]
    TrainNotFound(TrainId),

    #[error("track segment with id {0} not found")]
    SegmentNotFound(TrackSegmentId),

    #[error("station with name '{0}' already exists")]
    DuplicateStationName(String),

    #[error("train with code '{0}' already exists")]
    DuplicateTrainCode(String),

    /// Segments are undirected, so B-A duplicates A-B
    #[error("track segment between stations {0} and {1} already exists")]
    DuplicateSegment(StationId, StationId),

    #[error("cannot delete station {0}: it is referenced by track segments")]
    StationInUse(StationId),

    #[error("cannot delete train {0}: it has scheduled trips")]
    TrainHasTrips(TrainId),

    #[error("cannot delete track segment {0}: it is referenced by scheduled trips")]
    SegmentInUse(TrackSegmentId),

    /// Making a segment single-track would leave two live trips overlapping on it
    #[error(
        "cannot make track segment {segment} single-track: trips {first} and {second} overlap on it"
    )]
    SingleTrackConflict {
        segment: TrackSegmentId,
        first: TripId,
        second: TripId,
    },

    #[error(transparent)]
    Invalid(#[from] DomainError),
}
