//! Conflict detection on single-track segments.
//!
//! A proposed trip conflicts with an existing one when both occupy the same
//! single-track segment during overlapping half-open windows. Multi-track
//! segments never conflict. Detection only reads from the store.

use std::collections::HashMap;

use tracing::debug;

use crate::domain::{
    Occupancy, ProposedSegment, ScheduledSegmentId, TimeWindow, TrackSegmentDetails,
    TrackSegmentId, TrainId, TripId,
};
use crate::store::{ScheduleStore, StoreError};

/// One overlapping occupation of a single-track segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conflict {
    pub track_segment_id: TrackSegmentId,

    /// Station pair names, e.g. `Station A - Station B`
    pub track_segment_name: String,

    pub conflicting_trip_id: TripId,
    pub conflicting_train_id: TrainId,

    /// The existing scheduled segment that overlaps
    pub existing_segment_id: ScheduledSegmentId,

    pub proposed: TimeWindow,
    pub existing: TimeWindow,
}

/// Compare one proposed segment against the existing occupations of its track.
///
/// `existing` is expected in retrieval order; conflicts keep that order.
pub fn conflicts_for_segment(
    proposed: &ProposedSegment,
    track: &TrackSegmentDetails,
    existing: &[Occupancy],
) -> Vec<Conflict> {
    if !track.segment.single_track {
        return Vec::new();
    }

    existing
        .iter()
        .filter(|occ| occ.window.overlaps(&proposed.window))
        .map(|occ| Conflict {
            track_segment_id: track.segment.id,
            track_segment_name: track.label(),
            conflicting_trip_id: occ.trip_id,
            conflicting_train_id: occ.train_id,
            existing_segment_id: occ.segment_id,
            proposed: proposed.window,
            existing: occ.window,
        })
        .collect()
}

/// Find every conflict between `proposed` and live trips in the store.
///
/// Does not stop at the first conflict. Results follow proposal order, then
/// the store's (trip id, segment id) order. `exclude_trip` lets an existing
/// trip be re-checked without colliding with itself.
pub async fn detect_conflicts<S: ScheduleStore>(
    store: &S,
    proposed: &[ProposedSegment],
    tracks: &HashMap<TrackSegmentId, TrackSegmentDetails>,
    exclude_trip: Option<TripId>,
) -> Result<Vec<Conflict>, StoreError> {
    let mut occupancy: HashMap<TrackSegmentId, Vec<Occupancy>> = HashMap::new();
    let mut conflicts = Vec::new();

    for segment in proposed {
        let Some(track) = tracks.get(&segment.track_segment_id) else {
            debug!(track = %segment.track_segment_id, "segment not resolved, skipping");
            continue;
        };
        if !track.segment.single_track {
            continue;
        }

        if !occupancy.contains_key(&track.segment.id) {
            let fetched = store
                .find_active_segments_on_track(track.segment.id, exclude_trip)
                .await?;
            occupancy.insert(track.segment.id, fetched);
        }
        let existing = &occupancy[&track.segment.id];

        conflicts.extend(conflicts_for_segment(segment, track, existing));
    }

    debug!(
        proposed = proposed.len(),
        conflicts = conflicts.len(),
        "conflict detection finished"
    );
    Ok(conflicts)
}
