//! Synchronization between the local [`RideStore`](crate::store::RideStore)
//! and a remote [`RideCollection`](crate::remote::RideCollection).
//!
//! ## Intents
//!
//! Each user action (load, add, update, delete) runs as one intent:
//! 1. status becomes `loading` (add/update/delete also clear the error)
//! 2. the remote operation runs
//! 3. on success the matching store mutation is applied and status becomes
//!    `succeeded`
//! 4. on failure the message is recorded, status becomes `failed`, and the
//!    error is returned to the caller as well
//!
//! Intents may overlap. Every completed intent applies its list mutation,
//! but only the most recently started one writes status and error.

mod service;

pub use service::{Intent, RideSync};
