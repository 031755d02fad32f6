//! Structural validation of a proposed trip.
//!
//! Pure checks on the shape of the segment list: no storage access. They run
//! when a request is parsed and again before a trip is committed.

use crate::domain::ProposedSegment;

/// A proposed trip whose segment list is malformed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StructureError {
    /// No segments at all
    #[error("trip must have at least one segment")]
    EmptyTrip,

    /// A segment that does not move forward in time
    #[error("segment {index}: departure_time must be before arrival_time")]
    InvalidSegmentTime { index: usize },

    /// A segment departing before the previous one arrived
    #[error("segment {next} departure must be at or after segment {previous} arrival")]
    NonChronological { previous: usize, next: usize },
}

/// Validate the shape of a proposed segment list.
///
/// Checks, in order: the list is nonempty, every segment departs strictly
/// before it arrives, and each segment departs no earlier than the previous
/// one arrived. Zero dwell (equal timestamps) and gaps between segments are
/// both accepted.
pub fn validate_structure(segments: &[ProposedSegment]) -> Result<(), StructureError> {
    if segments.is_empty() {
        return Err(StructureError::EmptyTrip);
    }

    if let Some(index) = segments.iter().position(|s| !s.window.is_forward()) {
        return Err(StructureError::InvalidSegmentTime { index });
    }

    if let Some(previous) = segments
        .windows(2)
        .position(|pair| pair[1].window.departure < pair[0].window.arrival)
    {
        return Err(StructureError::NonChronological {
            previous,
            next: previous + 1,
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{TimeWindow, TrackSegmentId};
    use chrono::{NaiveDate, NaiveDateTime};

    fn at(hour: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 1, 1)
            .unwrap()
            .and_hms_opt(hour, min, 0)
            .unwrap()
    }

    fn seg(dep: (u32, u32), arr: (u32, u32)) -> ProposedSegment {
        ProposedSegment {
            track_segment_id: TrackSegmentId(1),
            window: TimeWindow::new(at(dep.0, dep.1), at(arr.0, arr.1)),
        }
    }

    #[test]
    fn empty_trip_rejected() {
        assert_eq!(validate_structure(&[]), Err(StructureError::EmptyTrip));
    }

    #[test]
    fn single_valid_segment() {
        assert_eq!(validate_structure(&[seg((10, 0), (11, 0))]), Ok(()));
    }

    #[test]
    fn zero_length_segment_rejected() {
        let segments = [seg((10, 0), (10, 30)), seg((10, 30), (10, 30))];
        assert_eq!(
            validate_structure(&segments),
            Err(StructureError::InvalidSegmentTime { index: 1 })
        );
    }

    #[test]
    fn reversed_segment_rejected() {
        assert_eq!(
            validate_structure(&[seg((11, 0), (10, 0))]),
            Err(StructureError::InvalidSegmentTime { index: 0 })
        );
    }

    #[test]
    fn overlapping_consecutive_segments_rejected() {
        let segments = [
            seg((10, 0), (10, 30)),
            seg((10, 35), (11, 0)),
            seg((10, 50), (11, 30)),
        ];
        assert_eq!(
            validate_structure(&segments),
            Err(StructureError::NonChronological {
                previous: 1,
                next: 2
            })
        );
    }

    #[test]
    fn zero_dwell_accepted() {
        let segments = [seg((10, 0), (10, 30)), seg((10, 30), (11, 0))];
        assert_eq!(validate_structure(&segments), Ok(()));
    }

    #[test]
    fn dwell_gap_accepted() {
        let segments = [seg((10, 0), (10, 30)), seg((10, 45), (11, 15))];
        assert_eq!(validate_structure(&segments), Ok(()));
    }

    #[test]
    fn segment_time_checked_before_ordering() {
        // Segment 1 both reverses and starts before segment 0 arrives
        let segments = [seg((10, 0), (10, 30)), seg((10, 20), (10, 10))];
        assert_eq!(
            validate_structure(&segments),
            Err(StructureError::InvalidSegmentTime { index: 1 })
        );
    }

    #[test]
    fn error_display() {
        assert_eq!(
            StructureError::InvalidSegmentTime { index: 2 }.to_string(),
            "segment 2: departure_time must be before arrival_time"
        );
        assert_eq!(
            StructureError::NonChronological {
                previous: 0,
                next: 1
            }
            .to_string(),
            "segment 1 departure must be at or after segment 0 arrival"
        );
    }
}
