//! Identifier newtypes.
//!
//! Every entity is keyed by a positive integer allocated by the store. Each
//! kind of entity gets its own type so a `TrainId` can never be passed where a
//! `TrackSegmentId` is expected.

use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

entity_id!(
    /// Identifies a station.
    StationId
);
entity_id!(
    /// Identifies a train.
    TrainId
);
entity_id!(
    /// Identifies a track segment between two stations.
    TrackSegmentId
);
entity_id!(
    /// Identifies a scheduled trip.
    TripId
);
entity_id!(
    /// Identifies one scheduled segment of a trip.
    ScheduledSegmentId
);
