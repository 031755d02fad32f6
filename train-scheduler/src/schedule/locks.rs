//! Per-track-segment advisory locks.
//!
//! Conflict detection followed by insertion is a check-then-act sequence.
//! Holding the locks of every track segment a trip touches across both steps
//! makes the pair atomic with respect to other writers on those segments.

use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use crate::domain::TrackSegmentId;

type Table = HashMap<TrackSegmentId, Arc<AsyncMutex<()>>>;

/// Lock table keyed by track segment id.
///
/// Entries are created on first use and removed once the last guard or
/// waiter referring to them is gone, so the table only holds segments that
/// are currently locked or contended.
#[derive(Debug, Default)]
pub struct SegmentLocks {
    table: Arc<Mutex<Table>>,
}

/// Held locks; released on drop.
#[derive(Debug)]
pub struct SegmentGuard {
    table: Arc<Mutex<Table>>,
    guards: Vec<(TrackSegmentId, OwnedMutexGuard<()>)>,
}

impl Drop for SegmentGuard {
    fn drop(&mut self) {
        let held = std::mem::take(&mut self.guards);
        let ids: Vec<TrackSegmentId> = held.iter().map(|(id, _)| *id).collect();
        drop(held);

        // Handles are only cloned under the table mutex, so a count of one
        // here means no guard or waiter can still reach the entry.
        let mut table = self.table.lock().unwrap_or_else(PoisonError::into_inner);
        for id in ids {
            if table.get(&id).is_some_and(|m| Arc::strong_count(m) == 1) {
                table.remove(&id);
            }
        }
    }
}

impl SegmentLocks {
    pub fn new() -> Self {
        Self::default()
    }

    fn handle(&self, id: TrackSegmentId) -> Arc<AsyncMutex<()>> {
        let mut table = self.table.lock().unwrap_or_else(PoisonError::into_inner);
        table.entry(id).or_default().clone()
    }

    /// Lock every id in `ids`.
    ///
    /// Ids are de-duplicated and taken in ascending order so two callers with
    /// overlapping sets cannot deadlock.
    pub async fn acquire(&self, ids: impl IntoIterator<Item = TrackSegmentId>) -> SegmentGuard {
        let ordered: BTreeSet<TrackSegmentId> = ids.into_iter().collect();
        let mut guard = SegmentGuard {
            table: Arc::clone(&self.table),
            guards: Vec::with_capacity(ordered.len()),
        };
        for id in ordered {
            let lock = self.handle(id).lock_owned().await;
            guard.guards.push((id, lock));
        }
        guard
    }

    #[cfg(test)]
    pub(super) fn entries(&self) -> usize {
        self.table.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}
