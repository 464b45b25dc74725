//! Error types shared by the remote clients and the sync service.

use thiserror::Error;

/// A single failing field from the validation schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl std::fmt::Display for FieldError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// A precondition was violated before any remote call was made.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Ride ID is required for {0}")]
    MissingId(&'static str),

    #[error("{}", join_fields(.0))]
    Fields(Vec<FieldError>),
}

impl ValidationError {
    /// Field-level errors, empty for [`ValidationError::MissingId`].
    pub fn field_errors(&self) -> &[FieldError] {
        match self {
            ValidationError::Fields(errors) => errors,
            ValidationError::MissingId(_) => &[],
        }
    }
}

fn join_fields(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

/// A remote collection operation failed. `Display` yields the underlying
/// message unchanged; that text is what the store records as its error.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RemoteError {
    #[error("Remote collection not configured: {0}")]
    NotConfigured(String),

    #[error("{0}")]
    Http(String),

    #[error("{message}")]
    Status { status: u16, message: String },

    #[error("Failed to decode response: {0}")]
    Decode(String),

    #[error("No document to update: {0}")]
    NotFound(String),

    /// Failure produced on purpose by an in-memory collection.
    #[error("{0}")]
    Injected(String),
}

impl From<reqwest::Error> for RemoteError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            RemoteError::Decode(e.to_string())
        } else {
            RemoteError::Http(e.to_string())
        }
    }
}

/// Any failure surfaced by a sync intent.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SyncError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Remote(#[from] RemoteError),
}

impl SyncError {
    pub fn is_validation(&self) -> bool {
        matches!(self, SyncError::Validation(_))
    }
}
