//! Scenario tests for the trip lifecycle.

use super::*;
use crate::domain::{
    ScheduledSegmentId, StationId, StationName, TimeWindow, TrackCount, TrainCode, TrainId,
    TravelTime,
};
use crate::schedule::references::ReferenceError;
use crate::store::{MemoryStore, NewTrackSegment};
use chrono::{NaiveDate, NaiveDateTime};

fn at(hour: u32, min: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 1, 1)
        .unwrap()
        .and_hms_opt(hour, min, 0)
        .unwrap()
}

fn leg(track: TrackSegmentId, dep: (u32, u32), arr: (u32, u32)) -> ProposedSegment {
    ProposedSegment {
        track_segment_id: track,
        window: TimeWindow::new(at(dep.0, dep.1), at(arr.0, arr.1)),
    }
}

fn trip(train: TrainId, segments: Vec<ProposedSegment>) -> ProposedTrip {
    ProposedTrip {
        train_id: train,
        segments,
    }
}

async fn trip_total(scheduler: &Scheduler<MemoryStore>) -> usize {
    scheduler.list_trips(0, usize::MAX).await.unwrap().len()
}

/// Stations A, B, C with a single-track A-B and a multi-track B-C.
struct Fixture {
    scheduler: Scheduler<MemoryStore>,
    train: TrainId,
    other_train: TrainId,
    single: TrackSegmentId,
    multi: TrackSegmentId,
}

async fn segment(
    store: &MemoryStore,
    a: StationId,
    b: StationId,
    single_track: bool,
) -> TrackSegmentId {
    store
        .create_segment(NewTrackSegment {
            station_a: a,
            station_b: b,
            single_track,
            travel_time: TravelTime::from_minutes(60).unwrap(),
        })
        .await
        .unwrap()
        .segment
        .id
}

async fn fixture(policy: TransitionPolicy) -> Fixture {
    let store = MemoryStore::new();

    let mut stations = Vec::new();
    for name in ["Station A", "Station B", "Station C"] {
        let station = store
            .create_station(StationName::parse(name).unwrap(), TrackCount::default())
            .await
            .unwrap();
        stations.push(station.id);
    }

    let single = segment(&store, stations[0], stations[1], true).await;
    let multi = segment(&store, stations[1], stations[2], false).await;

    let train = store
        .create_train(TrainCode::parse("EXP101").unwrap(), None)
        .await
        .unwrap()
        .id;
    let other_train = store
        .create_train(TrainCode::parse("LOC202").unwrap(), None)
        .await
        .unwrap()
        .id;

    Fixture {
        scheduler: Scheduler::new(Arc::new(store), policy),
        train,
        other_train,
        single,
        multi,
    }
}

#[tokio::test]
async fn create_trip_is_planned_with_derived_times() {
    let f = fixture(TransitionPolicy::Strict).await;

    let created = f
        .scheduler
        .create_trip(trip(
            f.train,
            vec![
                leg(f.single, (10, 0), (11, 0)),
                leg(f.multi, (11, 15), (12, 0)),
            ],
        ))
        .await
        .unwrap();

    assert_eq!(created.status, TripStatus::Planned);
    assert_eq!(created.train_id, f.train);
    assert_eq!(created.start_time, at(10, 0));
    assert_eq!(created.end_time, at(12, 0));
    assert_eq!(created.segments.len(), 2);
    assert!(created.segments.iter().all(|s| s.trip_id == created.id));

    assert_eq!(f.scheduler.get_trip(created.id).await.unwrap(), created);
    assert_eq!(trip_total(&f.scheduler).await, 1);
}

#[tokio::test]
async fn reversed_segment_fails_for_create_and_check() {
    let f = fixture(TransitionPolicy::Strict).await;
    let bad = trip(f.train, vec![leg(f.single, (11, 0), (10, 0))]);

    let err = f.scheduler.check_conflicts(&bad).await.unwrap_err();
    assert!(matches!(
        err,
        ScheduleError::Structure(StructureError::InvalidSegmentTime { index: 0 })
    ));

    let err = f.scheduler.create_trip(bad).await.unwrap_err();
    assert!(matches!(
        err,
        ScheduleError::Structure(StructureError::InvalidSegmentTime { index: 0 })
    ));
    assert_eq!(trip_total(&f.scheduler).await, 0);
}

#[tokio::test]
async fn out_of_order_segments_rejected_zero_dwell_accepted() {
    let f = fixture(TransitionPolicy::Strict).await;

    let err = f
        .scheduler
        .create_trip(trip(
            f.train,
            vec![
                leg(f.single, (10, 0), (11, 0)),
                leg(f.multi, (10, 45), (11, 30)),
            ],
        ))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ScheduleError::Structure(StructureError::NonChronological {
            previous: 0,
            next: 1
        })
    ));

    f.scheduler
        .create_trip(trip(
            f.train,
            vec![
                leg(f.single, (10, 0), (11, 0)),
                leg(f.multi, (11, 0), (11, 30)),
            ],
        ))
        .await
        .unwrap();
}

#[tokio::test]
async fn references_checked_before_structure() {
    let f = fixture(TransitionPolicy::Strict).await;

    let err = f
        .scheduler
        .create_trip(trip(
            f.train,
            vec![leg(TrackSegmentId(999), (11, 0), (10, 0))],
        ))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ScheduleError::Reference(ReferenceError::SegmentsNotFound(_))
    ));

    let err = f
        .scheduler
        .check_conflicts(&trip(TrainId(99999), vec![leg(f.single, (10, 0), (11, 0))]))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ScheduleError::Reference(ReferenceError::TrainNotFound(TrainId(99999)))
    ));
}

#[tokio::test]
async fn every_missing_segment_reported() {
    let f = fixture(TransitionPolicy::Strict).await;

    let err = f
        .scheduler
        .create_trip(trip(
            f.train,
            vec![
                leg(TrackSegmentId(99), (10, 0), (10, 30)),
                leg(f.single, (10, 30), (11, 0)),
                leg(TrackSegmentId(42), (11, 0), (11, 30)),
            ],
        ))
        .await
        .unwrap_err();
    match err {
        ScheduleError::Reference(ReferenceError::SegmentsNotFound(ids)) => {
            assert_eq!(ids, vec![TrackSegmentId(42), TrackSegmentId(99)]);
        }
        other => panic!("expected missing segments, got {other:?}"),
    }
    assert_eq!(f.scheduler.locks.entries(), 0);
}

#[tokio::test]
async fn unknown_segments_leave_no_locks_behind() {
    let f = fixture(TransitionPolicy::Strict).await;

    for id in 1_000..1_500 {
        let result = f
            .scheduler
            .create_trip(trip(f.train, vec![leg(TrackSegmentId(id), (10, 0), (11, 0))]))
            .await;
        assert!(matches!(result, Err(ScheduleError::Reference(_))));
        f.scheduler
            .exclusive_on_segment(TrackSegmentId(id + 1_000), async {})
            .await;
    }
    assert_eq!(f.scheduler.locks.entries(), 0);
}

#[tokio::test]
async fn identical_window_on_single_track_conflicts() {
    let f = fixture(TransitionPolicy::Strict).await;
    let first = f
        .scheduler
        .create_trip(trip(f.train, vec![leg(f.single, (10, 0), (11, 0))]))
        .await
        .unwrap();

    let err = f
        .scheduler
        .create_trip(trip(f.other_train, vec![leg(f.single, (10, 0), (11, 0))]))
        .await
        .unwrap_err();

    let conflicts = match err {
        ScheduleError::Conflict(conflicts) => conflicts,
        other => panic!("expected conflict, got {other:?}"),
    };
    assert_eq!(conflicts.len(), 1);
    let c = &conflicts[0];
    assert_eq!(c.track_segment_id, f.single);
    assert_eq!(c.track_segment_name, "Station A - Station B");
    assert_eq!(c.conflicting_trip_id, first.id);
    assert_eq!(c.conflicting_train_id, f.train);
    assert_eq!(c.existing_segment_id, first.segments[0].id);
    assert_eq!(c.proposed.departure, at(10, 0));
    assert_eq!(c.existing.arrival, at(11, 0));

    assert_eq!(trip_total(&f.scheduler).await, 1);
}

#[tokio::test]
async fn touching_windows_do_not_conflict() {
    let f = fixture(TransitionPolicy::Strict).await;
    f.scheduler
        .create_trip(trip(f.train, vec![leg(f.single, (10, 0), (11, 0))]))
        .await
        .unwrap();

    f.scheduler
        .create_trip(trip(f.other_train, vec![leg(f.single, (11, 0), (12, 0))]))
        .await
        .unwrap();
    f.scheduler
        .create_trip(trip(f.other_train, vec![leg(f.single, (9, 0), (10, 0))]))
        .await
        .unwrap();
}

#[tokio::test]
async fn partial_overlap_conflicts_only_on_single_track() {
    let f = fixture(TransitionPolicy::Strict).await;
    f.scheduler
        .create_trip(trip(
            f.train,
            vec![
                leg(f.single, (10, 0), (11, 0)),
                leg(f.multi, (11, 0), (12, 0)),
            ],
        ))
        .await
        .unwrap();

    let on_single = trip(f.other_train, vec![leg(f.single, (10, 30), (11, 30))]);
    assert_eq!(f.scheduler.check_conflicts(&on_single).await.unwrap().len(), 1);

    let on_multi = trip(f.other_train, vec![leg(f.multi, (11, 30), (12, 30))]);
    assert!(f.scheduler.check_conflicts(&on_multi).await.unwrap().is_empty());
    f.scheduler.create_trip(on_multi).await.unwrap();
}

#[tokio::test]
async fn mixed_trip_reports_single_track_conflict_only() {
    let f = fixture(TransitionPolicy::Strict).await;
    let legs = vec![
        leg(f.single, (10, 0), (11, 0)),
        leg(f.multi, (11, 0), (12, 0)),
    ];
    f.scheduler
        .create_trip(trip(f.train, legs.clone()))
        .await
        .unwrap();

    let conflicts = f
        .scheduler
        .check_conflicts(&trip(f.other_train, legs))
        .await
        .unwrap();
    assert_eq!(conflicts.len(), 1);
    assert_eq!(conflicts[0].track_segment_id, f.single);
}

#[tokio::test]
async fn repeated_track_reports_each_overlap() {
    let f = fixture(TransitionPolicy::Strict).await;
    let first = f
        .scheduler
        .create_trip(trip(f.train, vec![leg(f.single, (10, 0), (11, 0))]))
        .await
        .unwrap();
    let second = f
        .scheduler
        .create_trip(trip(f.train, vec![leg(f.single, (12, 0), (13, 0))]))
        .await
        .unwrap();

    // Out and back over the same single-track segment
    let conflicts = f
        .scheduler
        .check_conflicts(&trip(
            f.other_train,
            vec![
                leg(f.single, (10, 30), (11, 30)),
                leg(f.single, (12, 30), (13, 30)),
            ],
        ))
        .await
        .unwrap();

    let found: Vec<(TripId, ScheduledSegmentId)> = conflicts
        .iter()
        .map(|c| (c.conflicting_trip_id, c.existing_segment_id))
        .collect();
    assert_eq!(
        found,
        vec![
            (first.id, first.segments[0].id),
            (second.id, second.segments[0].id)
        ]
    );
}

#[tokio::test]
async fn check_never_persists() {
    let f = fixture(TransitionPolicy::Strict).await;
    let proposal = trip(f.train, vec![leg(f.single, (10, 0), (11, 0))]);

    for _ in 0..3 {
        assert!(f.scheduler.check_conflicts(&proposal).await.unwrap().is_empty());
    }
    assert_eq!(trip_total(&f.scheduler).await, 0);
    assert!(f.scheduler.list_trips(0, 100).await.unwrap().is_empty());
}

#[tokio::test]
async fn cancelling_frees_the_window() {
    let f = fixture(TransitionPolicy::Strict).await;
    let first = f
        .scheduler
        .create_trip(trip(f.train, vec![leg(f.single, (10, 0), (11, 0))]))
        .await
        .unwrap();
    let proposal = trip(f.other_train, vec![leg(f.single, (10, 0), (11, 0))]);
    assert_eq!(f.scheduler.check_conflicts(&proposal).await.unwrap().len(), 1);

    let cancelled = f
        .scheduler
        .update_status(first.id, TripStatus::Cancelled)
        .await
        .unwrap();
    assert_eq!(cancelled.status, TripStatus::Cancelled);

    assert!(f.scheduler.check_conflicts(&proposal).await.unwrap().is_empty());
    f.scheduler.create_trip(proposal).await.unwrap();
}

#[tokio::test]
async fn deleting_frees_the_window() {
    let f = fixture(TransitionPolicy::Strict).await;
    let first = f
        .scheduler
        .create_trip(trip(f.train, vec![leg(f.single, (10, 0), (11, 0))]))
        .await
        .unwrap();

    f.scheduler.delete_trip(first.id).await.unwrap();
    assert!(matches!(
        f.scheduler.get_trip(first.id).await,
        Err(ScheduleError::TripNotFound(_))
    ));
    assert!(matches!(
        f.scheduler.delete_trip(first.id).await,
        Err(ScheduleError::TripNotFound(_))
    ));

    f.scheduler
        .create_trip(trip(f.other_train, vec![leg(f.single, (10, 0), (11, 0))]))
        .await
        .unwrap();
}

#[tokio::test]
async fn strict_transitions() {
    let f = fixture(TransitionPolicy::Strict).await;
    let t = f
        .scheduler
        .create_trip(trip(f.train, vec![leg(f.single, (10, 0), (11, 0))]))
        .await
        .unwrap();

    // Same status is a no-op
    let same = f
        .scheduler
        .update_status(t.id, TripStatus::Planned)
        .await
        .unwrap();
    assert_eq!(same.status, TripStatus::Planned);

    f.scheduler
        .update_status(t.id, TripStatus::Active)
        .await
        .unwrap();
    let err = f
        .scheduler
        .update_status(t.id, TripStatus::Planned)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ScheduleError::InvalidTransition {
            from: TripStatus::Active,
            to: TripStatus::Planned
        }
    ));

    f.scheduler
        .update_status(t.id, TripStatus::Cancelled)
        .await
        .unwrap();
    for to in [TripStatus::Planned, TripStatus::Active] {
        let err = f.scheduler.update_status(t.id, to).await.unwrap_err();
        assert!(matches!(err, ScheduleError::InvalidTransition { .. }));
    }
    assert_eq!(
        f.scheduler.get_trip(t.id).await.unwrap().status,
        TripStatus::Cancelled
    );
}

#[tokio::test]
async fn status_update_of_unknown_trip() {
    let f = fixture(TransitionPolicy::Strict).await;
    let err = f
        .scheduler
        .update_status(TripId(99999), TripStatus::Active)
        .await
        .unwrap_err();
    assert!(matches!(err, ScheduleError::TripNotFound(TripId(99999))));
}

#[tokio::test]
async fn permissive_revival_rechecks_conflicts() {
    let f = fixture(TransitionPolicy::Permissive).await;
    let first = f
        .scheduler
        .create_trip(trip(f.train, vec![leg(f.single, (10, 0), (11, 0))]))
        .await
        .unwrap();
    f.scheduler
        .update_status(first.id, TripStatus::Cancelled)
        .await
        .unwrap();

    // Reviving an unobstructed trip, then cancelling again
    f.scheduler
        .update_status(first.id, TripStatus::Planned)
        .await
        .unwrap();
    f.scheduler
        .update_status(first.id, TripStatus::Cancelled)
        .await
        .unwrap();

    let second = f
        .scheduler
        .create_trip(trip(f.other_train, vec![leg(f.single, (10, 30), (11, 30))]))
        .await
        .unwrap();

    let err = f
        .scheduler
        .update_status(first.id, TripStatus::Active)
        .await
        .unwrap_err();
    let conflicts = match err {
        ScheduleError::Conflict(conflicts) => conflicts,
        other => panic!("expected conflict, got {other:?}"),
    };
    assert_eq!(conflicts.len(), 1);
    assert_eq!(conflicts[0].conflicting_trip_id, second.id);
    assert_eq!(
        f.scheduler.get_trip(first.id).await.unwrap().status,
        TripStatus::Cancelled
    );

    // Permissive also allows ACTIVE -> PLANNED without a re-check
    f.scheduler
        .update_status(second.id, TripStatus::Active)
        .await
        .unwrap();
    let back = f
        .scheduler
        .update_status(second.id, TripStatus::Planned)
        .await
        .unwrap();
    assert_eq!(back.status, TripStatus::Planned);
}

#[tokio::test]
async fn trip_details_include_tracks() {
    let f = fixture(TransitionPolicy::Strict).await;
    let t = f
        .scheduler
        .create_trip(trip(
            f.train,
            vec![
                leg(f.single, (10, 0), (11, 0)),
                leg(f.multi, (11, 0), (12, 0)),
            ],
        ))
        .await
        .unwrap();

    let details = f.scheduler.trip_details(t.id).await.unwrap();
    assert_eq!(details.trip, t);
    assert_eq!(details.tracks.len(), 2);
    assert_eq!(details.tracks[&f.multi].label(), "Station B - Station C");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_creators_commit_exactly_one() {
    let f = fixture(TransitionPolicy::Strict).await;
    let scheduler = Arc::new(f.scheduler);

    let mut handles = Vec::new();
    for i in 0..8 {
        let scheduler = Arc::clone(&scheduler);
        let train = if i % 2 == 0 { f.train } else { f.other_train };
        let single = f.single;
        handles.push(tokio::spawn(async move {
            scheduler
                .create_trip(trip(train, vec![leg(single, (10, 0), (11, 0))]))
                .await
        }));
    }

    let mut created = 0;
    let mut conflicted = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => created += 1,
            Err(ScheduleError::Conflict(_)) => conflicted += 1,
            Err(other) => panic!("unexpected error {other:?}"),
        }
    }

    assert_eq!(created, 1);
    assert_eq!(conflicted, 7);
    assert_eq!(trip_total(&scheduler).await, 1);
    assert_eq!(scheduler.locks.entries(), 0);
}

#[tokio::test]
async fn exclusive_on_segment_blocks_creators() {
    let f = fixture(TransitionPolicy::Strict).await;
    let scheduler = Arc::new(f.scheduler);
    let (locked_tx, locked_rx) = tokio::sync::oneshot::channel::<()>();
    let (release_tx, release_rx) = tokio::sync::oneshot::channel::<()>();

    let holder = {
        let scheduler = Arc::clone(&scheduler);
        let single = f.single;
        tokio::spawn(async move {
            scheduler
                .exclusive_on_segment(single, async {
                    let _ = locked_tx.send(());
                    let _ = release_rx.await;
                })
                .await
        })
    };
    locked_rx.await.unwrap();

    let blocked = tokio::time::timeout(
        std::time::Duration::from_millis(50),
        scheduler.create_trip(trip(f.train, vec![leg(f.single, (10, 0), (11, 0))])),
    )
    .await;
    assert!(blocked.is_err());

    release_tx.send(()).unwrap();
    holder.await.unwrap();
    scheduler
        .create_trip(trip(f.train, vec![leg(f.single, (10, 0), (11, 0))]))
        .await
        .unwrap();
}
