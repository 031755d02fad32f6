//! In-memory store.
//!
//! All tables live behind one `RwLock`, so every read sees a consistent
//! snapshot and every write is atomic. Tables are `BTreeMap`s keyed by id so
//! listing and pagination are deterministic.

use std::collections::{BTreeMap, BTreeSet};

use tokio::sync::RwLock;
use tracing::debug;

use crate::domain::{
    NewTrip, Occupancy, ScheduledSegment, ScheduledSegmentId, ScheduledTrip, Station, StationId,
    StationName, StationPair, TrackCount, TrackSegment, TrackSegmentDetails, TrackSegmentId,
    Train, TrainCode, TrainId, TravelTime, TripId, TripStatus,
};

use super::{RegistryError, ScheduleStore, StoreError};

/// Fields for a new track segment.
#[derive(Debug, Clone)]
pub struct NewTrackSegment {
    pub station_a: StationId,
    pub station_b: StationId,
    pub single_track: bool,
    pub travel_time: TravelTime,
}

/// Partial update of a station. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default)]
pub struct StationPatch {
    pub name: Option<StationName>,
    pub num_tracks: Option<TrackCount>,
}

/// Partial update of a train.
#[derive(Debug, Clone, Default)]
pub struct TrainPatch {
    pub code: Option<TrainCode>,
    /// `Some(None)` clears the description.
    pub description: Option<Option<String>>,
}

/// Partial update of a track segment. Stations cannot be changed.
#[derive(Debug, Clone, Default)]
pub struct SegmentPatch {
    pub single_track: Option<bool>,
    pub travel_time: Option<TravelTime>,
}

#[derive(Debug, Default)]
struct Tables {
    last_station: u64,
    last_train: u64,
    last_segment: u64,
    last_trip: u64,
    last_scheduled: u64,

    stations: BTreeMap<StationId, Station>,
    trains: BTreeMap<TrainId, Train>,
    segments: BTreeMap<TrackSegmentId, TrackSegment>,
    trips: BTreeMap<TripId, ScheduledTrip>,

    /// Scheduled segments per track segment, as (trip, index into the trip's
    /// segments), for trips of every status.
    by_track: BTreeMap<TrackSegmentId, BTreeSet<(TripId, usize)>>,
}

fn allocate(counter: &mut u64) -> u64 {
    *counter += 1;
    *counter
}

impl Tables {
    fn details(&self, segment: &TrackSegment) -> Option<TrackSegmentDetails> {
        Some(TrackSegmentDetails {
            segment: segment.clone(),
            station_a: self.stations.get(&segment.station_a)?.clone(),
            station_b: self.stations.get(&segment.station_b)?.clone(),
        })
    }

    fn occupancy(&self, track: TrackSegmentId, exclude: Option<TripId>) -> Vec<Occupancy> {
        let Some(refs) = self.by_track.get(&track) else {
            return Vec::new();
        };

        refs.iter()
            .filter(|(trip_id, _)| Some(*trip_id) != exclude)
            .filter_map(|(trip_id, idx)| {
                let trip = self.trips.get(trip_id)?;
                if !trip.status.occupies_track() {
                    return None;
                }
                let seg = trip.segments.get(*idx)?;
                Some(Occupancy {
                    trip_id: trip.id,
                    train_id: trip.train_id,
                    segment_id: seg.id,
                    window: seg.window,
                })
            })
            .collect()
    }

    fn station_name_taken(&self, name: &StationName, except: Option<StationId>) -> bool {
        self.stations
            .values()
            .any(|s| &s.name == name && Some(s.id) != except)
    }

    fn train_code_taken(&self, code: &TrainCode, except: Option<TrainId>) -> bool {
        self.trains
            .values()
            .any(|t| &t.code == code && Some(t.id) != except)
    }
}

/// Thread-safe in-memory registry and trip store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    // Stations

    pub async fn create_station(
        &self,
        name: StationName,
        num_tracks: TrackCount,
    ) -> Result<Station, RegistryError> {
        let mut guard = self.tables.write().await;
        let tables = &mut *guard;

        if tables.station_name_taken(&name, None) {
            return Err(RegistryError::DuplicateStationName(name.to_string()));
        }

        let station = Station {
            id: StationId(allocate(&mut tables.last_station)),
            name,
            num_tracks,
        };
        tables.stations.insert(station.id, station.clone());
        debug!(station = %station.id, name = %station.name, "created station");
        Ok(station)
    }

    pub async fn list_stations(&self, skip: usize, limit: usize) -> Vec<Station> {
        let tables = self.tables.read().await;
        tables
            .stations
            .values()
            .skip(skip)
            .take(limit)
            .cloned()
            .collect()
    }

    pub async fn get_station(&self, id: StationId) -> Option<Station> {
        self.tables.read().await.stations.get(&id).cloned()
    }

    pub async fn update_station(
        &self,
        id: StationId,
        patch: StationPatch,
    ) -> Result<Station, RegistryError> {
        let mut guard = self.tables.write().await;
        let tables = &mut *guard;

        if !tables.stations.contains_key(&id) {
            return Err(RegistryError::StationNotFound(id));
        }
        if let Some(name) = &patch.name {
            if tables.station_name_taken(name, Some(id)) {
                return Err(RegistryError::DuplicateStationName(name.to_string()));
            }
        }

        let station = tables
            .stations
            .get_mut(&id)
            .ok_or(RegistryError::StationNotFound(id))?;
        if let Some(name) = patch.name {
            station.name = name;
        }
        if let Some(num_tracks) = patch.num_tracks {
            station.num_tracks = num_tracks;
        }
        Ok(station.clone())
    }

    pub async fn delete_station(&self, id: StationId) -> Result<(), RegistryError> {
        let mut tables = self.tables.write().await;

        if !tables.stations.contains_key(&id) {
            return Err(RegistryError::StationNotFound(id));
        }
        if tables.segments.values().any(|s| s.pair().touches(id)) {
            return Err(RegistryError::StationInUse(id));
        }

        tables.stations.remove(&id);
        debug!(station = %id, "deleted station");
        Ok(())
    }

    // Trains

    pub async fn create_train(
        &self,
        code: TrainCode,
        description: Option<String>,
    ) -> Result<Train, RegistryError> {
        let mut guard = self.tables.write().await;
        let tables = &mut *guard;

        if tables.train_code_taken(&code, None) {
            return Err(RegistryError::DuplicateTrainCode(code.to_string()));
        }

        let train = Train {
            id: TrainId(allocate(&mut tables.last_train)),
            code,
            description,
        };
        tables.trains.insert(train.id, train.clone());
        debug!(train = %train.id, code = %train.code, "created train");
        Ok(train)
    }

    pub async fn list_trains(&self, skip: usize, limit: usize) -> Vec<Train> {
        let tables = self.tables.read().await;
        tables
            .trains
            .values()
            .skip(skip)
            .take(limit)
            .cloned()
            .collect()
    }

    pub async fn get_train(&self, id: TrainId) -> Option<Train> {
        self.tables.read().await.trains.get(&id).cloned()
    }

    pub async fn update_train(&self, id: TrainId, patch: TrainPatch) -> Result<Train, RegistryError> {
        let mut guard = self.tables.write().await;
        let tables = &mut *guard;

        if !tables.trains.contains_key(&id) {
            return Err(RegistryError::TrainNotFound(id));
        }
        if let Some(code) = &patch.code {
            if tables.train_code_taken(code, Some(id)) {
                return Err(RegistryError::DuplicateTrainCode(code.to_string()));
            }
        }

        let train = tables
            .trains
            .get_mut(&id)
            .ok_or(RegistryError::TrainNotFound(id))?;
        if let Some(code) = patch.code {
            train.code = code;
        }
        if let Some(description) = patch.description {
            train.description = description;
        }
        Ok(train.clone())
    }

    pub async fn delete_train(&self, id: TrainId) -> Result<(), RegistryError> {
        let mut tables = self.tables.write().await;

        if !tables.trains.contains_key(&id) {
            return Err(RegistryError::TrainNotFound(id));
        }
        if tables.trips.values().any(|t| t.train_id == id) {
            return Err(RegistryError::TrainHasTrips(id));
        }

        tables.trains.remove(&id);
        debug!(train = %id, "deleted train");
        Ok(())
    }

    // Track segments

    pub async fn create_segment(
        &self,
        new: NewTrackSegment,
    ) -> Result<TrackSegmentDetails, RegistryError> {
        let pair = StationPair::new(new.station_a, new.station_b)?;

        let mut guard = self.tables.write().await;
        let tables = &mut *guard;

        for station in [new.station_a, new.station_b] {
            if !tables.stations.contains_key(&station) {
                return Err(RegistryError::StationNotFound(station));
            }
        }
        if tables.segments.values().any(|s| s.pair() == pair) {
            return Err(RegistryError::DuplicateSegment(new.station_a, new.station_b));
        }

        let segment = TrackSegment {
            id: TrackSegmentId(allocate(&mut tables.last_segment)),
            station_a: new.station_a,
            station_b: new.station_b,
            single_track: new.single_track,
            travel_time: new.travel_time,
        };
        tables.segments.insert(segment.id, segment.clone());
        debug!(
            segment = %segment.id,
            single_track = segment.single_track,
            "created track segment"
        );

        tables
            .details(&segment)
            .ok_or(RegistryError::StationNotFound(segment.station_a))
    }

    pub async fn list_segments(&self, skip: usize, limit: usize) -> Vec<TrackSegmentDetails> {
        let tables = self.tables.read().await;
        tables
            .segments
            .values()
            .skip(skip)
            .take(limit)
            .filter_map(|s| tables.details(s))
            .collect()
    }

    pub async fn get_segment(&self, id: TrackSegmentId) -> Option<TrackSegmentDetails> {
        let tables = self.tables.read().await;
        tables.segments.get(&id).and_then(|s| tables.details(s))
    }

    /// Update a track segment.
    ///
    /// Turning a multi-track segment into a single-track one is refused if
    /// live trips already overlap on it.
    pub async fn update_segment(
        &self,
        id: TrackSegmentId,
        patch: SegmentPatch,
    ) -> Result<TrackSegmentDetails, RegistryError> {
        let mut guard = self.tables.write().await;
        let tables = &mut *guard;

        let current = tables
            .segments
            .get(&id)
            .ok_or(RegistryError::SegmentNotFound(id))?;

        if patch.single_track == Some(true) && !current.single_track {
            let mut live = tables.occupancy(id, None);
            live.sort_by_key(|o| (o.window.departure, o.trip_id));
            // Sorted by departure, any overlap implies an adjacent overlap.
            if let Some(pair) = live.windows(2).find(|w| w[0].window.overlaps(&w[1].window)) {
                return Err(RegistryError::SingleTrackConflict {
                    segment: id,
                    first: pair[0].trip_id,
                    second: pair[1].trip_id,
                });
            }
        }

        let segment = tables
            .segments
            .get_mut(&id)
            .ok_or(RegistryError::SegmentNotFound(id))?;
        if let Some(single_track) = patch.single_track {
            segment.single_track = single_track;
        }
        if let Some(travel_time) = patch.travel_time {
            segment.travel_time = travel_time;
        }
        let segment = segment.clone();

        tables
            .details(&segment)
            .ok_or(RegistryError::StationNotFound(segment.station_a))
    }

    pub async fn delete_segment(&self, id: TrackSegmentId) -> Result<(), RegistryError> {
        let mut tables = self.tables.write().await;

        if !tables.segments.contains_key(&id) {
            return Err(RegistryError::SegmentNotFound(id));
        }
        if tables.by_track.get(&id).is_some_and(|refs| !refs.is_empty()) {
            return Err(RegistryError::SegmentInUse(id));
        }

        tables.segments.remove(&id);
        debug!(segment = %id, "deleted track segment");
        Ok(())
    }
}

impl ScheduleStore for MemoryStore {
    async fn find_train(&self, id: TrainId) -> Result<Option<Train>, StoreError> {
        Ok(self.tables.read().await.trains.get(&id).cloned())
    }

    async fn find_segments_by_ids(
        &self,
        ids: &[TrackSegmentId],
    ) -> Result<Vec<TrackSegmentDetails>, StoreError> {
        let tables = self.tables.read().await;
        let unique: BTreeSet<TrackSegmentId> = ids.iter().copied().collect();
        Ok(unique
            .iter()
            .filter_map(|id| tables.segments.get(id))
            .filter_map(|s| tables.details(s))
            .collect())
    }

    async fn find_active_segments_on_track(
        &self,
        track: TrackSegmentId,
        exclude_trip: Option<TripId>,
    ) -> Result<Vec<Occupancy>, StoreError> {
        Ok(self.tables.read().await.occupancy(track, exclude_trip))
    }

    async fn insert_trip(&self, trip: NewTrip) -> Result<ScheduledTrip, StoreError> {
        let mut guard = self.tables.write().await;
        let tables = &mut *guard;

        if !tables.trains.contains_key(&trip.train_id) {
            return Err(StoreError::MissingTrain(trip.train_id));
        }
        let missing: BTreeSet<TrackSegmentId> = trip
            .segments
            .iter()
            .map(|s| s.track_segment_id)
            .filter(|id| !tables.segments.contains_key(id))
            .collect();
        if !missing.is_empty() {
            return Err(StoreError::MissingSegments(missing.into_iter().collect()));
        }

        let id = TripId(allocate(&mut tables.last_trip));
        let mut segments = Vec::with_capacity(trip.segments.len());
        for (idx, proposed) in trip.segments.iter().enumerate() {
            segments.push(ScheduledSegment {
                id: ScheduledSegmentId(allocate(&mut tables.last_scheduled)),
                trip_id: id,
                track_segment_id: proposed.track_segment_id,
                window: proposed.window,
            });
            tables
                .by_track
                .entry(proposed.track_segment_id)
                .or_default()
                .insert((id, idx));
        }

        let stored = ScheduledTrip {
            id,
            train_id: trip.train_id,
            status: TripStatus::Planned,
            start_time: trip.start_time,
            end_time: trip.end_time,
            segments,
        };
        tables.trips.insert(id, stored.clone());
        Ok(stored)
    }

    async fn get_trip(&self, id: TripId) -> Result<Option<ScheduledTrip>, StoreError> {
        Ok(self.tables.read().await.trips.get(&id).cloned())
    }

    async fn list_trips(&self, skip: usize, limit: usize) -> Result<Vec<ScheduledTrip>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .trips
            .values()
            .skip(skip)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn set_trip_status(
        &self,
        id: TripId,
        status: TripStatus,
    ) -> Result<Option<ScheduledTrip>, StoreError> {
        let mut tables = self.tables.write().await;
        Ok(tables.trips.get_mut(&id).map(|trip| {
            trip.status = status;
            trip.clone()
        }))
    }

    async fn delete_trip(&self, id: TripId) -> Result<bool, StoreError> {
        let mut guard = self.tables.write().await;
        let tables = &mut *guard;

        let Some(trip) = tables.trips.remove(&id) else {
            return Ok(false);
        };
        for (idx, seg) in trip.segments.iter().enumerate() {
            if let Some(refs) = tables.by_track.get_mut(&seg.track_segment_id) {
                refs.remove(&(id, idx));
                if refs.is_empty() {
                    tables.by_track.remove(&seg.track_segment_id);
                }
            }
        }
        Ok(true)
    }
}
