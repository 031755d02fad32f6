use crate::domain::{TripId, TripStatus};
use crate::store::StoreError;

use super::conflict::Conflict;
use super::references::ReferenceError;
use super::structure::StructureError;

/// Errors from the trip lifecycle operations.
#[derive(Debug, thiserror::Error)]
pub enum ScheduleError {
    #[error(transparent)]
    Structure(#[from] StructureError),

    #[error(transparent)]
    Reference(#[from] ReferenceError),

    #[error("trip conflicts with {} existing segment(s)", .0.len())]
    Conflict(Vec<Conflict>),

    #[error("trip with id {0} not found")]
    TripNotFound(TripId),

    #[error("cannot change trip status from {from} to {to}")]
    InvalidTransition { from: TripStatus, to: TripStatus },
}

impl From<StoreError> for ScheduleError {
    fn from(err: StoreError) -> Self {
        ScheduleError::Reference(err.into())
    }
}
