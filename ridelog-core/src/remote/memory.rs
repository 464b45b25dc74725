//! In-process ride collection.
//!
//! Keeps documents in insertion order and assigns fresh identifiers on
//! create. Used by tests and for trying the CLI without a backend. Failures
//! can be queued with [`MemoryCollection::fail_next`].

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use super::{require_id, RideCollection};
use crate::error::{RemoteError, SyncError};
use crate::models::{Ride, RideDetails};
use crate::ride_id::RideId;

#[derive(Debug, Default)]
pub struct MemoryCollection {
    documents: Mutex<Vec<Ride>>,
    failures: Mutex<VecDeque<String>>,
    calls: AtomicUsize,
}

impl MemoryCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the collection. Rides without an identifier get one.
    pub fn with_rides(rides: Vec<Ride>) -> Self {
        let documents = rides
            .into_iter()
            .map(|ride| match ride.persisted_id() {
                Some(_) => ride,
                None => ride.details.into_ride(RideId::generate()),
            })
            .collect();
        Self {
            documents: Mutex::new(documents),
            ..Self::default()
        }
    }

    /// Make the next call fail with this message.
    pub fn fail_next(&self, message: impl Into<String>) {
        lock(&self.failures).push_back(message.into());
    }

    /// Number of operations attempted so far, failed ones included.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Current contents of the collection.
    pub fn rides(&self) -> Vec<Ride> {
        lock(&self.documents).clone()
    }

    fn begin(&self) -> Result<(), RemoteError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match lock(&self.failures).pop_front() {
            Some(message) => Err(RemoteError::Injected(message)),
            None => Ok(()),
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[async_trait]
impl RideCollection for MemoryCollection {
    async fn list_all(&self) -> Result<Vec<Ride>, RemoteError> {
        self.begin()?;
        Ok(self.rides())
    }

    async fn create(&self, details: &RideDetails) -> Result<Ride, RemoteError> {
        self.begin()?;
        let ride = details.clone().into_ride(RideId::generate());
        lock(&self.documents).push(ride.clone());
        Ok(ride)
    }

    async fn update_by_id(&self, ride: &Ride) -> Result<(), SyncError> {
        let id = require_id(ride, "update")?;
        self.begin()?;
        let mut documents = lock(&self.documents);
        match documents.iter_mut().find(|r| r.has_id(id)) {
            Some(existing) => {
                existing.details = ride.details.clone();
                Ok(())
            }
            None => Err(RemoteError::NotFound(id.to_string()).into()),
        }
    }

    async fn delete_by_id(&self, id: &RideId) -> Result<(), RemoteError> {
        self.begin()?;
        lock(&self.documents).retain(|r| !r.has_id(id));
        Ok(())
    }

    async fn list_by_area(&self, area: &str) -> Result<Vec<Ride>, RemoteError> {
        self.begin()?;
        Ok(lock(&self.documents)
            .iter()
            .filter(|r| r.details.area == area)
            .cloned()
            .collect())
    }
}
