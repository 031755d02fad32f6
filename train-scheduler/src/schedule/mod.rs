//! Trip scheduling on a network with single-track segments.
//!
//! A trip is accepted only if, on every single-track segment it uses, no
//! other PLANNED or ACTIVE trip occupies that segment during an overlapping
//! window. Validation runs in three stages: references, structure, then
//! conflicts.

mod conflict;
mod error;
mod lifecycle;
mod locks;
mod references;
mod structure;

pub use conflict::{Conflict, conflicts_for_segment, detect_conflicts};
pub use error::ScheduleError;
pub use lifecycle::{Scheduler, TripDetails};
pub use locks::{SegmentGuard, SegmentLocks};
pub use references::{ReferenceError, ResolvedReferences, resolve_references};
pub use structure::{StructureError, validate_structure};
