use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::error::{RemoteError, SyncError, ValidationError};
use crate::models::{Ride, RideDetails};
use crate::remote::{require_id, RideCollection};
use crate::ride_id::RideId;
use crate::store::{lock, RideState, RideStore, SharedStore, SyncStatus};

/// A user-triggered sync action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    Load,
    Add,
    Update,
    Delete,
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Intent::Load => write!(f, "load"),
            Intent::Add => write!(f, "add"),
            Intent::Update => write!(f, "update"),
            Intent::Delete => write!(f, "delete"),
        }
    }
}

/// Keeps a shared [`RideStore`] in step with a remote collection.
///
/// This is the only writer to the store. Consumers read through
/// [`rides`](Self::rides), [`status`](Self::status), [`error`](Self::error)
/// or [`snapshot`](Self::snapshot).
///
/// The store handle is not handed back out:
///
/// ```compile_fail
/// # use std::sync::Arc;
/// # use ridelog_core::{MemoryCollection, RideStore, RideSync};
/// let sync = RideSync::new(RideStore::shared(), Arc::new(MemoryCollection::new()));
/// sync.store();
/// ```
///
/// ```compile_fail
/// # use ridelog_core::RideStore;
/// let shared = RideStore::shared();
/// ridelog_core::store::lock(&shared).set_rides(Vec::new());
/// ```
pub struct RideSync {
    store: SharedStore,
    remote: Arc<dyn RideCollection>,
    /// Sequence number of the most recently started intent. Only read or
    /// written while the store lock is held.
    generation: AtomicU64,
}

impl RideSync {
    pub fn new(store: SharedStore, remote: Arc<dyn RideCollection>) -> Self {
        Self {
            store,
            remote,
            generation: AtomicU64::new(0),
        }
    }

    pub fn rides(&self) -> Vec<Ride> {
        lock(&self.store).rides().to_vec()
    }

    pub fn status(&self) -> SyncStatus {
        lock(&self.store).status()
    }

    pub fn error(&self) -> Option<String> {
        lock(&self.store).error().map(str::to_string)
    }

    pub fn snapshot(&self) -> RideState {
        lock(&self.store).snapshot()
    }

    /// Load every ride the first time the store is observed while idle.
    /// Any later call, including one made while that load is still in
    /// flight, does nothing.
    pub async fn ensure_loaded(&self) -> Result<(), SyncError> {
        let generation = {
            let mut store = lock(&self.store);
            if store.status() != SyncStatus::Idle {
                return Ok(());
            }
            self.start(&mut store, Intent::Load)
        };
        self.run_load(generation).await
    }

    /// Replace the local list with the remote collection's contents.
    pub async fn load_rides(&self) -> Result<(), SyncError> {
        let generation = self.begin(Intent::Load);
        self.run_load(generation).await
    }

    /// Persist a new ride and append it to the local list.
    pub async fn add_ride(&self, details: RideDetails) -> Result<Ride, SyncError> {
        details.validate()?;
        let generation = self.begin(Intent::Add);

        let result = self.remote.create(&details).await.map_err(SyncError::from);
        self.finish(Intent::Add, generation, result, |store, ride| {
            // A load that finished first may already hold the new ride
            if !store.replace_ride(ride.clone()) {
                store.append_ride(ride.clone());
            }
        })
    }

    /// Replace a persisted ride, remotely and then locally.
    pub async fn update_ride(&self, ride: Ride) -> Result<(), SyncError> {
        let id = require_id(&ride, "update")?.clone();
        ride.details.validate()?;
        let generation = self.begin(Intent::Update);

        let result = self.remote.update_by_id(&ride).await;
        self.finish(Intent::Update, generation, result, |store, _| {
            if !store.replace_ride(ride) {
                tracing::warn!("Updated ride {} was not in the local list", id);
            }
        })
    }

    /// Delete a ride, remotely and then locally.
    pub async fn delete_ride(&self, id: &RideId) -> Result<(), SyncError> {
        if id.is_blank() {
            return Err(ValidationError::MissingId("delete").into());
        }
        let generation = self.begin(Intent::Delete);

        let result = self.remote.delete_by_id(id).await.map_err(SyncError::from);
        self.finish(Intent::Delete, generation, result, |store, _| {
            if !store.remove_ride(id) {
                tracing::warn!("Deleted ride {} was not in the local list", id);
            }
        })
    }

    /// Rides in one area, read straight from the remote collection. The
    /// store is not touched.
    pub async fn rides_by_area(&self, area: &str) -> Result<Vec<Ride>, RemoteError> {
        self.remote.list_by_area(area).await
    }

    async fn run_load(&self, generation: u64) -> Result<(), SyncError> {
        let result = self.remote.list_all().await.map_err(SyncError::from);
        self.finish(Intent::Load, generation, result, |store, rides| {
            store.set_rides(rides.clone());
        })
        .map(|_| ())
    }

    fn begin(&self, intent: Intent) -> u64 {
        let mut store = lock(&self.store);
        self.start(&mut store, intent)
    }

    fn start(&self, store: &mut RideStore, intent: Intent) -> u64 {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::debug!("Starting {} (generation {})", intent, generation);

        store.set_status(SyncStatus::Loading);
        if intent != Intent::Load {
            store.set_error(None);
        }
        generation
    }

    /// Apply the outcome of an intent. Status and error are only written by
    /// the latest intent. List mutations run on every success, except for a
    /// stale load: its snapshot predates the newer intent and would undo it.
    fn finish<T>(
        &self,
        intent: Intent,
        generation: u64,
        result: Result<T, SyncError>,
        apply: impl FnOnce(&mut RideStore, &T),
    ) -> Result<T, SyncError> {
        let mut store = lock(&self.store);
        let current = self.generation.load(Ordering::SeqCst) == generation;

        match &result {
            Ok(value) => {
                if current || intent != Intent::Load {
                    apply(&mut *store, value);
                }
                if current {
                    store.set_status(SyncStatus::Succeeded);
                    if intent == Intent::Load {
                        store.set_error(None);
                    }
                }
                tracing::debug!("{} succeeded (generation {})", intent, generation);
            }
            Err(e) => {
                if current {
                    store.set_error(Some(e.to_string()));
                    store.set_status(SyncStatus::Failed);
                }
                tracing::debug!("{} failed (generation {}): {}", intent, generation, e);
            }
        }

        if !current {
            tracing::debug!(
                "{} (generation {}) finished after a newer intent; status left unchanged",
                intent,
                generation
            );
        }

        result
    }
}
