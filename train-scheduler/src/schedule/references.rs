//! Reference validation: the train and every track segment must exist.

use std::collections::{BTreeSet, HashMap};

use crate::domain::{ProposedTrip, TrackSegmentDetails, TrackSegmentId, Train, TrainId};
use crate::store::{ScheduleStore, StoreError};

/// A proposed trip that points at entities which do not exist.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReferenceError {
    #[error("train with id {0} not found")]
    TrainNotFound(TrainId),

    /// Every missing id, sorted and de-duplicated
    #[error("track segments not found: [{}]", join_ids(.0))]
    SegmentsNotFound(Vec<TrackSegmentId>),
}

fn join_ids(ids: &[TrackSegmentId]) -> String {
    ids.iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

impl From<StoreError> for ReferenceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::MissingTrain(id) => ReferenceError::TrainNotFound(id),
            StoreError::MissingSegments(ids) => ReferenceError::SegmentsNotFound(ids),
        }
    }
}

/// The entities a proposed trip refers to, looked up once and reused by the
/// conflict detector.
#[derive(Debug, Clone)]
pub struct ResolvedReferences {
    pub train: Train,
    pub segments: HashMap<TrackSegmentId, TrackSegmentDetails>,
}

/// Confirm the train and all track segments of `trip` exist.
///
/// The train is checked first. Missing segments are reported all at once.
pub async fn resolve_references<S: ScheduleStore>(
    store: &S,
    trip: &ProposedTrip,
) -> Result<ResolvedReferences, ReferenceError> {
    let train = store
        .find_train(trip.train_id)
        .await?
        .ok_or(ReferenceError::TrainNotFound(trip.train_id))?;

    let requested: Vec<TrackSegmentId> = trip.track_segment_ids().collect();
    let segments: HashMap<TrackSegmentId, TrackSegmentDetails> = store
        .find_segments_by_ids(&requested)
        .await?
        .into_iter()
        .map(|d| (d.segment.id, d))
        .collect();

    let missing: BTreeSet<TrackSegmentId> = requested
        .into_iter()
        .filter(|id| !segments.contains_key(id))
        .collect();
    if !missing.is_empty() {
        return Err(ReferenceError::SegmentsNotFound(
            missing.into_iter().collect(),
        ));
    }

    Ok(ResolvedReferences { train, segments })
}
