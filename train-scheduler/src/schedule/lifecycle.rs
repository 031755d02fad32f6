//! Trip lifecycle: create, check, read, status changes and deletion.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use tokio::sync::Mutex as AsyncMutex;
use tracing::{debug, info, warn};

use crate::domain::{
    NewTrip, ProposedSegment, ProposedTrip, ScheduledTrip, TrackSegmentDetails, TrackSegmentId,
    TransitionPolicy, TripId, TripStatus,
};
use crate::store::ScheduleStore;

use super::conflict::{Conflict, detect_conflicts};
use super::error::ScheduleError;
use super::locks::SegmentLocks;
use super::references::resolve_references;
use super::structure::{StructureError, validate_structure};

/// A stored trip with the track segments it runs over.
#[derive(Debug, Clone)]
pub struct TripDetails {
    pub trip: ScheduledTrip,
    pub tracks: HashMap<TrackSegmentId, TrackSegmentDetails>,
}

/// Schedules trips against a [`ScheduleStore`].
///
/// Writers that touch the same track segments are serialized through
/// per-segment locks, so a trip that passed conflict detection is still
/// conflict-free when it is written.
#[derive(Debug)]
pub struct Scheduler<S> {
    store: Arc<S>,
    locks: SegmentLocks,
    status_lock: AsyncMutex<()>,
    policy: TransitionPolicy,
}

impl<S: ScheduleStore> Scheduler<S> {
    pub fn new(store: Arc<S>, policy: TransitionPolicy) -> Self {
        Self {
            store,
            locks: SegmentLocks::new(),
            status_lock: AsyncMutex::new(()),
            policy,
        }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Run `work` while holding the lock of one track segment.
    ///
    /// Registry changes that alter whether a segment is single-track go
    /// through here so they cannot interleave with a trip being committed.
    pub async fn exclusive_on_segment<F, T>(&self, id: TrackSegmentId, work: F) -> T
    where
        F: Future<Output = T>,
    {
        let _guard = self.locks.acquire([id]).await;
        work.await
    }

    /// Validate `trip` and list its conflicts without writing anything.
    ///
    /// An empty list means the trip could be created right now.
    pub async fn check_conflicts(&self, trip: &ProposedTrip) -> Result<Vec<Conflict>, ScheduleError> {
        let resolved = resolve_references(&*self.store, trip).await?;
        validate_structure(&trip.segments)?;

        let conflicts =
            detect_conflicts(&*self.store, &trip.segments, &resolved.segments, None).await?;
        debug!(
            train = %trip.train_id,
            conflicts = conflicts.len(),
            "conflict check"
        );
        Ok(conflicts)
    }

    /// Validate, check and persist a new trip with status PLANNED.
    pub async fn create_trip(&self, trip: ProposedTrip) -> Result<ScheduledTrip, ScheduleError> {
        // Every referenced id is locked, not only the single-track ones: a
        // segment may be flipped to single-track while we hold it.
        let _guard = self.locks.acquire(trip.track_segment_ids()).await;

        let resolved = resolve_references(&*self.store, &trip).await?;
        validate_structure(&trip.segments)?;

        let conflicts =
            detect_conflicts(&*self.store, &trip.segments, &resolved.segments, None).await?;
        if !conflicts.is_empty() {
            warn!(
                train = %trip.train_id,
                conflicts = conflicts.len(),
                "trip rejected: single-track conflict"
            );
            return Err(ScheduleError::Conflict(conflicts));
        }

        let (Some(first), Some(last)) = (trip.segments.first(), trip.segments.last()) else {
            return Err(StructureError::EmptyTrip.into());
        };
        let new_trip = NewTrip {
            train_id: trip.train_id,
            start_time: first.window.departure,
            end_time: last.window.arrival,
            segments: trip.segments.clone(),
        };

        let stored = self.store.insert_trip(new_trip).await?;
        info!(
            trip = %stored.id,
            train = %stored.train_id,
            segments = stored.segments.len(),
            "trip scheduled"
        );
        Ok(stored)
    }

    pub async fn get_trip(&self, id: TripId) -> Result<ScheduledTrip, ScheduleError> {
        self.store
            .get_trip(id)
            .await?
            .ok_or(ScheduleError::TripNotFound(id))
    }

    /// A trip joined with the track segments it uses.
    pub async fn trip_details(&self, id: TripId) -> Result<TripDetails, ScheduleError> {
        let trip = self.get_trip(id).await?;
        let ids: Vec<TrackSegmentId> = trip.segments.iter().map(|s| s.track_segment_id).collect();
        let tracks = self
            .store
            .find_segments_by_ids(&ids)
            .await?
            .into_iter()
            .map(|d| (d.segment.id, d))
            .collect();
        Ok(TripDetails { trip, tracks })
    }

    pub async fn list_trips(
        &self,
        skip: usize,
        limit: usize,
    ) -> Result<Vec<ScheduledTrip>, ScheduleError> {
        Ok(self.store.list_trips(skip, limit).await?)
    }

    /// Change a trip's status, subject to the configured [`TransitionPolicy`].
    ///
    /// Setting the current status again is a no-op. Moving a CANCELLED trip
    /// back onto the tracks re-runs conflict detection first.
    pub async fn update_status(
        &self,
        id: TripId,
        status: TripStatus,
    ) -> Result<ScheduledTrip, ScheduleError> {
        let _serial = self.status_lock.lock().await;

        let current = self.get_trip(id).await?;
        if !self.policy.allows(current.status, status) {
            warn!(trip = %id, from = %current.status, to = %status, "status change refused");
            return Err(ScheduleError::InvalidTransition {
                from: current.status,
                to: status,
            });
        }
        if current.status == status {
            return Ok(current);
        }

        let revives = !current.status.occupies_track() && status.occupies_track();
        let _guard = if revives {
            let guard = self
                .locks
                .acquire(current.segments.iter().map(|s| s.track_segment_id))
                .await;
            self.recheck(&current).await?;
            Some(guard)
        } else {
            None
        };

        let updated = self
            .store
            .set_trip_status(id, status)
            .await?
            .ok_or(ScheduleError::TripNotFound(id))?;
        info!(trip = %id, from = %current.status, to = %status, "trip status changed");
        Ok(updated)
    }

    /// Re-run conflict detection for an existing trip, ignoring itself.
    async fn recheck(&self, trip: &ScheduledTrip) -> Result<(), ScheduleError> {
        let proposed: Vec<ProposedSegment> = trip
            .segments
            .iter()
            .map(|s| ProposedSegment {
                track_segment_id: s.track_segment_id,
                window: s.window,
            })
            .collect();
        let ids: Vec<TrackSegmentId> = proposed.iter().map(|s| s.track_segment_id).collect();
        let tracks: HashMap<TrackSegmentId, TrackSegmentDetails> = self
            .store
            .find_segments_by_ids(&ids)
            .await?
            .into_iter()
            .map(|d| (d.segment.id, d))
            .collect();

        let conflicts = detect_conflicts(&*self.store, &proposed, &tracks, Some(trip.id)).await?;
        if conflicts.is_empty() {
            Ok(())
        } else {
            warn!(
                trip = %trip.id,
                conflicts = conflicts.len(),
                "revival rejected: single-track conflict"
            );
            Err(ScheduleError::Conflict(conflicts))
        }
    }

    /// Delete a trip and its segments.
    pub async fn delete_trip(&self, id: TripId) -> Result<(), ScheduleError> {
        if !self.store.delete_trip(id).await? {
            return Err(ScheduleError::TripNotFound(id));
        }
        info!(trip = %id, "trip deleted");
        Ok(())
    }
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
