//! Remote collection clients.
//!
//! [`RideCollection`] is the four-operation CRUD contract (plus a read by
//! area) that the sync service drives. Implementations are pure
//! pass-through: one round trip per call, no retries, no caching.

mod document;
mod firestore;
mod memory;

use async_trait::async_trait;

use crate::error::{RemoteError, SyncError, ValidationError};
use crate::models::{Ride, RideDetails};
use crate::ride_id::RideId;

pub use firestore::{FirestoreCollection, FirestoreConfig, DEFAULT_BASE_URL, DEFAULT_DATABASE};
pub use memory::MemoryCollection;

/// Name of the remote collection rides are stored in.
pub const RIDES_COLLECTION: &str = "rides";

#[async_trait]
pub trait RideCollection: Send + Sync {
    /// Every ride currently in the collection.
    async fn list_all(&self) -> Result<Vec<Ride>, RemoteError>;

    /// Persist a new ride and return it with its assigned identifier.
    async fn create(&self, details: &RideDetails) -> Result<Ride, RemoteError>;

    /// Overwrite every field of the ride's document. Fails with a
    /// validation error, without any network call, when `ride.id` is missing.
    async fn update_by_id(&self, ride: &Ride) -> Result<(), SyncError>;

    /// Remove a ride. Removing an identifier that does not exist succeeds.
    async fn delete_by_id(&self, id: &RideId) -> Result<(), RemoteError>;

    /// Rides whose area matches exactly.
    async fn list_by_area(&self, area: &str) -> Result<Vec<Ride>, RemoteError>;
}

/// The identifier of a ride that must already be persisted.
pub fn require_id<'a>(
    ride: &'a Ride,
    operation: &'static str,
) -> Result<&'a RideId, ValidationError> {
    ride.persisted_id()
        .ok_or(ValidationError::MissingId(operation))
}
