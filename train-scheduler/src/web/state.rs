//! Application state for the web layer.

use std::sync::Arc;

use crate::config::Config;
use crate::schedule::Scheduler;
use crate::store::MemoryStore;

/// Shared application state.
///
/// Registry handlers use the store directly; everything that touches trips
/// goes through the scheduler.
#[derive(Clone)]
pub struct AppState {
    /// Trip scheduler, owning the store
    pub scheduler: Arc<Scheduler<MemoryStore>>,

    /// Server configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Create a new app state.
    pub fn new(store: MemoryStore, config: Config) -> Self {
        let scheduler = Scheduler::new(Arc::new(store), config.status_policy);
        Self {
            scheduler: Arc::new(scheduler),
            config: Arc::new(config),
        }
    }

    /// The registry and trip store.
    pub fn store(&self) -> &MemoryStore {
        self.scheduler.store()
    }
}
