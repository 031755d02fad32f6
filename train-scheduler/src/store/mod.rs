//! Storage for the track network registry and scheduled trips.
//!
//! The scheduling core only sees the [`ScheduleStore`] capability: look up a
//! train, look up track segments, list the live occupancy of one track
//! segment, and write trips. Registry CRUD lives on the concrete store.

mod error;
mod memory;

use std::future::Future;

use crate::domain::{
    NewTrip, Occupancy, ScheduledTrip, TrackSegmentDetails, TrackSegmentId, Train, TrainId,
    TripId, TripStatus,
};

pub use error::{RegistryError, StoreError};
pub use memory::{MemoryStore, NewTrackSegment, SegmentPatch, StationPatch, TrainPatch};

/// Storage capability used by the scheduling core.
///
/// Implementations must make [`ScheduleStore::insert_trip`] atomic: either
/// the trip and all of its segments become visible, or nothing does.
pub trait ScheduleStore: Send + Sync {
    /// Look up a train by id.
    fn find_train(
        &self,
        id: TrainId,
    ) -> impl Future<Output = Result<Option<Train>, StoreError>> + Send;

    /// Look up track segments by id, joined with their stations.
    ///
    /// Ids that do not exist are silently omitted; duplicates are returned
    /// once.
    fn find_segments_by_ids(
        &self,
        ids: &[TrackSegmentId],
    ) -> impl Future<Output = Result<Vec<TrackSegmentDetails>, StoreError>> + Send;

    /// Existing occupations of `track` by PLANNED or ACTIVE trips, ordered by
    /// (trip id, scheduled segment id), optionally ignoring one trip.
    fn find_active_segments_on_track(
        &self,
        track: TrackSegmentId,
        exclude_trip: Option<TripId>,
    ) -> impl Future<Output = Result<Vec<Occupancy>, StoreError>> + Send;

    /// Write a trip and its segments with status PLANNED.
    fn insert_trip(
        &self,
        trip: NewTrip,
    ) -> impl Future<Output = Result<ScheduledTrip, StoreError>> + Send;

    fn get_trip(
        &self,
        id: TripId,
    ) -> impl Future<Output = Result<Option<ScheduledTrip>, StoreError>> + Send;

    /// Trips ordered by id.
    fn list_trips(
        &self,
        skip: usize,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<ScheduledTrip>, StoreError>> + Send;

    /// Set a trip's status. Returns `None` if the trip does not exist.
    fn set_trip_status(
        &self,
        id: TripId,
        status: TripStatus,
    ) -> impl Future<Output = Result<Option<ScheduledTrip>, StoreError>> + Send;

    /// Delete a trip and its segments. Returns `false` if it did not exist.
    fn delete_trip(&self, id: TripId) -> impl Future<Output = Result<bool, StoreError>> + Send;
}
