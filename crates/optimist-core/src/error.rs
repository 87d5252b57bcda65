//! Error types for Optimist Core
//!
//! Provides error handling for:
//! - Backend call failures
//! - Failed mutations surfaced through the controller's error slot
//! - Local admission checks on submit

use crate::types::{MutationKind, RecordId};

/// Errors returned by a [`TodoBackend`](crate::TodoBackend)
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BackendError {
    /// The backend refused the call
    #[error("{message}")]
    Rejected {
        /// Which call was refused
        operation: MutationKind,
        /// Human readable reason
        message: String,
    },

    /// The call never completed, e.g. its task was dropped or panicked
    #[error("backend unavailable: {0}")]
    Unavailable(String),
}

impl BackendError {
    /// Standard rejection for an operation
    #[inline]
    #[must_use]
    pub fn rejected(operation: MutationKind) -> Self {
        let message = match operation {
            MutationKind::Create => "Failed to add",
            MutationKind::Toggle => "Failed to toggle",
            MutationKind::Delete => "Failed to delete",
        };
        Self::Rejected {
            operation,
            message: message.to_string(),
        }
    }
}

/// A mutation whose backend call failed and was rolled back
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind} of record {id} failed: {source}")]
pub struct MutationError {
    /// Which mutation failed
    pub kind: MutationKind,
    /// Record the mutation targeted
    pub id: RecordId,
    /// Underlying backend failure
    pub source: BackendError,
}

impl MutationError {
    /// Create a new mutation error
    #[inline]
    #[must_use]
    pub fn new(kind: MutationKind, id: RecordId, source: BackendError) -> Self {
        Self { kind, id, source }
    }

    /// Failed mutations are single attempts; the user may always re-trigger.
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        true
    }
}

/// Reasons a submit is refused before any backend call is made
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SubmitError {
    /// No record with this id is in the collection
    #[error("record {0} not found")]
    NotFound(RecordId),

    /// The record already has an unresolved mutation
    #[error("record {id} already has a {kind} in flight")]
    InFlight {
        /// Target record
        id: RecordId,
        /// Mutation currently holding the record
        kind: MutationKind,
    },
}

impl SubmitError {
    /// Record the refused submit targeted
    #[inline]
    #[must_use]
    pub fn id(&self) -> RecordId {
        match self {
            Self::NotFound(id) | Self::InFlight { id, .. } => *id,
        }
    }
}
