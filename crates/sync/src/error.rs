use schedule_core::validation::ValidationError;
use thiserror::Error;

use crate::state::Operation;

/// Everything a store, session or catalog call can fail with.
///
/// The `Display` text is what ends up in the category's error slot.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SyncError {
    #[error("not signed in")]
    NotAuthenticated,

    /// No active schedule; carries the operation-specific hint.
    #[error("{0}")]
    NoActiveSchedule(String),

    /// Rejected client-side because another operation holds the guard.
    #[error("another operation is in progress ({0})")]
    Busy(Operation),

    #[error(transparent)]
    Invalid(#[from] ValidationError),

    /// HTTP 409 on an operation that has conflict semantics.
    #[error("{message}")]
    Conflict { message: String },

    #[error("{message}")]
    Http { status: u16, message: String },

    /// Body was not the JSON the operation expects.
    #[error("Expected JSON, but received non-JSON response. Status: {status}. Response body starts with: {snippet}")]
    Decode { status: u16, snippet: String },

    #[error("response is missing `{field}`")]
    MissingField { field: &'static str },

    #[error("transport error: {0}")]
    Transport(String),
}

impl SyncError {
    /// HTTP status behind the error, if a response was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            SyncError::Conflict { .. } => Some(409),
            SyncError::Http { status, .. } | SyncError::Decode { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// True when the service was never contacted.
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            SyncError::NotAuthenticated
                | SyncError::NoActiveSchedule(_)
                | SyncError::Busy(_)
                | SyncError::Invalid(_)
        )
    }
}
