//! Ridelog Core Library
//!
//! Ride model, validation, the remote collection client and the
//! synchronization service shared by Ridelog front ends.

pub mod error;
pub mod models;
pub mod remote;
pub mod ride_id;
pub mod store;
pub mod sync;
pub mod validation;

pub use error::{FieldError, RemoteError, SyncError, ValidationError};
pub use models::{Difficulty, Ride, RideDetails, RouteType};
pub use remote::{
    FirestoreCollection, FirestoreConfig, MemoryCollection, RideCollection, RIDES_COLLECTION,
};
pub use ride_id::{RideId, RideIdError};
pub use store::{RideState, RideStore, SharedStore, SyncStatus};
pub use sync::{Intent, RideSync};
pub use validation::RideForm;

pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
