//! Domain types for the train scheduler.
//!
//! This module contains the entities of the track network and the trips
//! scheduled over it. Registry types enforce their field rules at
//! construction time, so code that receives them can trust their validity.

mod error;
mod ids;
mod station;
mod time;
mod track;
mod train;
mod trip;

pub use error::DomainError;
pub use ids::{ScheduledSegmentId, StationId, TrackSegmentId, TrainId, TripId};
pub use station::{Station, StationName, TrackCount};
pub use time::{TimeError, TimeWindow, format_timestamp, parse_timestamp};
pub use track::{StationPair, TrackSegment, TrackSegmentDetails, TravelTime};
pub use train::{Train, TrainCode, validate_description};
pub use trip::{
    NewTrip, Occupancy, ProposedSegment, ProposedTrip, ScheduledSegment, ScheduledTrip,
    TransitionPolicy, TripStatus, UnknownPolicy,
};
