//! Ride identifiers.
//!
//! Identifiers are assigned by the remote collection when a ride is first
//! persisted. Firestore reports them as the last segment of the document
//! resource name (`projects/../documents/rides/<id>`).

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Errors that can occur when parsing ride identifiers
#[derive(Error, Debug, PartialEq)]
pub enum RideIdError {
    #[error("Ride ID cannot be empty")]
    Empty,

    #[error("Invalid ride ID '{0}': must not contain '/'")]
    InvalidCharacter(String),

    #[error("Invalid document name: {0}")]
    InvalidDocumentName(String),
}

/// Identifier of a persisted ride.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RideId(String);

impl RideId {
    /// Parse an identifier, rejecting blank values and path separators.
    pub fn parse(s: &str) -> Result<Self, RideIdError> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(RideIdError::Empty);
        }
        if trimmed.contains('/') {
            return Err(RideIdError::InvalidCharacter(trimmed.to_string()));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Generate a fresh identifier, shaped like Firestore's auto IDs closely
    /// enough for local collections.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    /// Extract the identifier from a full document resource name.
    pub fn from_document_name(name: &str) -> Result<Self, RideIdError> {
        let id = name
            .rsplit('/')
            .next()
            .filter(|segment| !segment.is_empty())
            .ok_or_else(|| RideIdError::InvalidDocumentName(name.to_string()))?;
        Self::parse(id)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True when the identifier is blank. Only possible for values that
    /// bypassed [`RideId::parse`], e.g. deserialized from an empty string.
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl std::fmt::Display for RideId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for RideId {
    type Err = RideIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for RideId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
