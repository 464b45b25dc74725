//! In-memory mirror of the remote ride collection.
//!
//! [`RideStore`] owns the ride list together with a [`SyncStatus`] and an
//! optional error message. The six mutation methods below are the only way
//! to change any of them; readers get borrowed views or a cloned
//! [`RideState`] snapshot.

use std::sync::{Arc, Mutex, MutexGuard};

use serde::{Deserialize, Serialize};

use crate::models::Ride;
use crate::ride_id::RideId;

/// Progress of the most recent sync intent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncStatus {
    #[default]
    Idle,
    Loading,
    Succeeded,
    Failed,
}

impl std::fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SyncStatus::Idle => write!(f, "idle"),
            SyncStatus::Loading => write!(f, "loading"),
            SyncStatus::Succeeded => write!(f, "succeeded"),
            SyncStatus::Failed => write!(f, "failed"),
        }
    }
}

/// A point-in-time copy of the store contents.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RideState {
    pub rides: Vec<Ride>,
    pub status: SyncStatus,
    pub error: Option<String>,
}

#[derive(Debug, Default)]
pub struct RideStore {
    state: RideState,
}

/// Store handle shared between the sync service and whoever renders it.
pub type SharedStore = Arc<Mutex<RideStore>>;

impl RideStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap a fresh store for sharing.
    pub fn shared() -> SharedStore {
        Arc::new(Mutex::new(Self::new()))
    }

    // Mutations

    /// Replace the whole ride list. Status and error are left alone.
    pub fn set_rides(&mut self, rides: Vec<Ride>) {
        self.state.rides = rides;
    }

    /// Append one ride. No deduplication: the caller must not append an
    /// identifier that is already present.
    pub fn append_ride(&mut self, ride: Ride) {
        self.state.rides.push(ride);
    }

    /// Replace the ride with the same identifier in place.
    ///
    /// Returns `false`, leaving the list untouched, when no ride matches
    /// (including when `ride` has no identifier).
    pub fn replace_ride(&mut self, ride: Ride) -> bool {
        let Some(id) = ride.id.as_ref() else {
            return false;
        };
        match self.state.rides.iter().position(|r| r.has_id(id)) {
            Some(index) => {
                self.state.rides[index] = ride;
                true
            }
            None => false,
        }
    }

    /// Remove the first ride with this identifier. Returns `false` when none
    /// matched.
    pub fn remove_ride(&mut self, id: &RideId) -> bool {
        match self.state.rides.iter().position(|r| r.has_id(id)) {
            Some(index) => {
                self.state.rides.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn set_status(&mut self, status: SyncStatus) {
        self.state.status = status;
    }

    pub fn set_error(&mut self, error: Option<String>) {
        self.state.error = error;
    }

    // Reads

    pub fn rides(&self) -> &[Ride] {
        &self.state.rides
    }

    pub fn status(&self) -> SyncStatus {
        self.state.status
    }

    pub fn error(&self) -> Option<&str> {
        self.state.error.as_deref()
    }

    pub fn get(&self, id: &RideId) -> Option<&Ride> {
        self.state.rides.iter().find(|r| r.has_id(id))
    }

    pub fn is_empty(&self) -> bool {
        self.state.rides.is_empty()
    }

    pub fn snapshot(&self) -> RideState {
        self.state.clone()
    }
}

/// Lock a shared store, recovering the data if a previous holder panicked.
/// The store has no invariants spanning more than one field write, so a
/// poisoned guard is still consistent.
pub(crate) fn lock(store: &SharedStore) -> MutexGuard<'_, RideStore> {
    store.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
