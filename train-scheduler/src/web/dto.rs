//! Data transfer objects for web requests and responses.

use serde::{Deserialize, Deserializer, Serialize};

use crate::domain::{
    DomainError, ProposedSegment, ProposedTrip, ScheduledSegment, ScheduledSegmentId,
    ScheduledTrip, Station, StationId, StationName, TimeError, TimeWindow, TrackCount,
    TrackSegmentDetails, TrackSegmentId, Train, TrainCode, TrainId, TravelTime, TripId,
    TripStatus, format_timestamp, parse_timestamp, validate_description,
};
use crate::schedule::{Conflict, StructureError, TripDetails, validate_structure};
use crate::store::{NewTrackSegment, SegmentPatch, StationPatch, TrainPatch};

/// `skip`/`limit` query parameters for list endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct Pagination {
    #[serde(default)]
    pub skip: usize,

    /// Defaults to the configured page size
    pub limit: Option<usize>,
}

// Stations

#[derive(Debug, Deserialize)]
pub struct CreateStationRequest {
    pub name: String,
    pub num_tracks: Option<u32>,
}

impl CreateStationRequest {
    pub fn parse(&self) -> Result<(StationName, TrackCount), DomainError> {
        let name = StationName::parse(&self.name)?;
        let num_tracks = match self.num_tracks {
            Some(n) => TrackCount::new(n)?,
            None => TrackCount::default(),
        };
        Ok((name, num_tracks))
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateStationRequest {
    pub name: Option<String>,
    pub num_tracks: Option<u32>,
}

impl UpdateStationRequest {
    pub fn parse(&self) -> Result<StationPatch, DomainError> {
        Ok(StationPatch {
            name: self.name.as_deref().map(StationName::parse).transpose()?,
            num_tracks: self.num_tracks.map(TrackCount::new).transpose()?,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StationResponse {
    pub id: StationId,
    pub name: String,
    pub num_tracks: u32,
}

impl From<&Station> for StationResponse {
    fn from(station: &Station) -> Self {
        Self {
            id: station.id,
            name: station.name.to_string(),
            num_tracks: station.num_tracks.get(),
        }
    }
}

// Trains

#[derive(Debug, Deserialize)]
pub struct CreateTrainRequest {
    pub code: String,
    pub description: Option<String>,
}

impl CreateTrainRequest {
    pub fn parse(&self) -> Result<(TrainCode, Option<String>), DomainError> {
        let code = TrainCode::parse(&self.code)?;
        validate_description(self.description.as_deref())?;
        Ok((code, self.description.clone()))
    }
}

/// Train update body.
///
/// `description` distinguishes an absent field (left unchanged) from an
/// explicit `null` (cleared).
#[derive(Debug, Default, Deserialize)]
pub struct UpdateTrainRequest {
    pub code: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub description: Option<Option<String>>,
}

impl UpdateTrainRequest {
    pub fn parse(&self) -> Result<TrainPatch, DomainError> {
        if let Some(description) = &self.description {
            validate_description(description.as_deref())?;
        }
        Ok(TrainPatch {
            code: self.code.as_deref().map(TrainCode::parse).transpose()?,
            description: self.description.clone(),
        })
    }
}

/// Marks a field as present, keeping an explicit `null` as `Some(None)`.
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TrainResponse {
    pub id: TrainId,
    pub code: String,
    pub description: Option<String>,
}

impl From<&Train> for TrainResponse {
    fn from(train: &Train) -> Self {
        Self {
            id: train.id,
            code: train.code.to_string(),
            description: train.description.clone(),
        }
    }
}

// Track segments

#[derive(Debug, Deserialize)]
pub struct CreateSegmentRequest {
    pub station_a_id: StationId,
    pub station_b_id: StationId,
    #[serde(default)]
    pub single_track: bool,
    pub travel_time_minutes: u32,
}

impl CreateSegmentRequest {
    pub fn parse(&self) -> Result<NewTrackSegment, DomainError> {
        Ok(NewTrackSegment {
            station_a: self.station_a_id,
            station_b: self.station_b_id,
            single_track: self.single_track,
            travel_time: TravelTime::from_minutes(self.travel_time_minutes)?,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateSegmentRequest {
    pub single_track: Option<bool>,
    pub travel_time_minutes: Option<u32>,
}

impl UpdateSegmentRequest {
    pub fn parse(&self) -> Result<SegmentPatch, DomainError> {
        Ok(SegmentPatch {
            single_track: self.single_track,
            travel_time: self
                .travel_time_minutes
                .map(TravelTime::from_minutes)
                .transpose()?,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SegmentResponse {
    pub id: TrackSegmentId,
    pub station_a_id: StationId,
    pub station_b_id: StationId,
    pub single_track: bool,
    pub travel_time_minutes: u32,
    pub station_a: StationResponse,
    pub station_b: StationResponse,
}

impl From<&TrackSegmentDetails> for SegmentResponse {
    fn from(details: &TrackSegmentDetails) -> Self {
        let segment = &details.segment;
        Self {
            id: segment.id,
            station_a_id: segment.station_a,
            station_b_id: segment.station_b,
            single_track: segment.single_track,
            travel_time_minutes: segment.travel_time.minutes(),
            station_a: (&details.station_a).into(),
            station_b: (&details.station_b).into(),
        }
    }
}

// Trips

/// One leg of a trip request. Timestamps are naive ISO-8601 strings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmentRequest {
    pub track_segment_id: TrackSegmentId,
    pub departure_time: String,
    pub arrival_time: String,
}

/// Body of trip creation and conflict check requests.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TripRequest {
    pub train_id: TrainId,
    pub segments: Vec<SegmentRequest>,
}

/// A trip request that is malformed before any lookup.
#[derive(Debug, thiserror::Error)]
pub enum TripRequestError {
    #[error("segments[{index}].{field}: {source}")]
    Timestamp {
        index: usize,
        field: &'static str,
        source: TimeError,
    },

    #[error(transparent)]
    Structure(#[from] StructureError),
}

impl TripRequest {
    /// Parse timestamps and check the shape of the segment list.
    pub fn to_proposed(&self) -> Result<ProposedTrip, TripRequestError> {
        let segments = self
            .segments
            .iter()
            .enumerate()
            .map(|(index, seg)| -> Result<ProposedSegment, TripRequestError> {
                let parse = |field: &'static str, value: &str| {
                    parse_timestamp(value).map_err(|source| TripRequestError::Timestamp {
                        index,
                        field,
                        source,
                    })
                };
                Ok(ProposedSegment {
                    track_segment_id: seg.track_segment_id,
                    window: TimeWindow::new(
                        parse("departure_time", &seg.departure_time)?,
                        parse("arrival_time", &seg.arrival_time)?,
                    ),
                })
            })
            .collect::<Result<Vec<_>, TripRequestError>>()?;

        validate_structure(&segments)?;
        Ok(ProposedTrip {
            train_id: self.train_id,
            segments,
        })
    }
}

/// Body of a trip update. Only the status can change.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateTripRequest {
    pub status: Option<TripStatus>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScheduledSegmentResponse {
    pub id: ScheduledSegmentId,
    pub scheduled_trip_id: TripId,
    pub track_segment_id: TrackSegmentId,
    pub departure_time: String,
    pub arrival_time: String,

    /// Present on the trip detail endpoint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub track_segment: Option<SegmentResponse>,
}

impl From<&ScheduledSegment> for ScheduledSegmentResponse {
    fn from(seg: &ScheduledSegment) -> Self {
        Self {
            id: seg.id,
            scheduled_trip_id: seg.trip_id,
            track_segment_id: seg.track_segment_id,
            departure_time: format_timestamp(&seg.window.departure),
            arrival_time: format_timestamp(&seg.window.arrival),
            track_segment: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TripResponse {
    pub id: TripId,
    pub train_id: TrainId,
    pub status: TripStatus,
    pub start_time: String,
    pub end_time: String,
    pub segments: Vec<ScheduledSegmentResponse>,
}

impl From<&ScheduledTrip> for TripResponse {
    fn from(trip: &ScheduledTrip) -> Self {
        Self {
            id: trip.id,
            train_id: trip.train_id,
            status: trip.status,
            start_time: format_timestamp(&trip.start_time),
            end_time: format_timestamp(&trip.end_time),
            segments: trip.segments.iter().map(Into::into).collect(),
        }
    }
}

impl From<&TripDetails> for TripResponse {
    fn from(details: &TripDetails) -> Self {
        let mut response = TripResponse::from(&details.trip);
        for seg in &mut response.segments {
            seg.track_segment = details.tracks.get(&seg.track_segment_id).map(Into::into);
        }
        response
    }
}

/// Discriminator for conflict records.
pub const TRACK_CONFLICT: &str = "TRACK_CONFLICT";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConflictResponse {
    #[serde(rename = "type")]
    pub kind: String,
    pub track_segment_id: TrackSegmentId,
    pub track_segment_name: String,
    pub conflicting_trip_id: TripId,
    pub conflicting_train_id: TrainId,
    pub existing_segment_id: ScheduledSegmentId,
    pub new_departure: String,
    pub new_arrival: String,
    pub existing_departure: String,
    pub existing_arrival: String,
}

impl From<&Conflict> for ConflictResponse {
    fn from(c: &Conflict) -> Self {
        Self {
            kind: TRACK_CONFLICT.to_string(),
            track_segment_id: c.track_segment_id,
            track_segment_name: c.track_segment_name.clone(),
            conflicting_trip_id: c.conflicting_trip_id,
            conflicting_train_id: c.conflicting_train_id,
            existing_segment_id: c.existing_segment_id,
            new_departure: format_timestamp(&c.proposed.departure),
            new_arrival: format_timestamp(&c.proposed.arrival),
            existing_departure: format_timestamp(&c.existing.departure),
            existing_arrival: format_timestamp(&c.existing.arrival),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConflictCheckResponse {
    pub conflicts: Vec<ConflictResponse>,
    pub has_conflicts: bool,
}

impl ConflictCheckResponse {
    pub fn new(conflicts: &[Conflict]) -> Self {
        Self {
            conflicts: conflicts.iter().map(Into::into).collect(),
            has_conflicts: !conflicts.is_empty(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

/// Error response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,

    /// Only present on scheduling conflicts
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conflicts: Vec<ConflictResponse>,
}
