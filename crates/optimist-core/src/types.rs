//! Core types for the mutation controller
//!
//! Defines the record model and the payloads exchanged with the backend:
//! - Record identifiers and their allocator
//! - Records with pending markers
//! - Mutation kinds

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// Client-assigned record identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(pub u64);

impl RecordId {
    /// Raw numeric value
    #[inline]
    #[must_use]
    pub fn value(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Monotonic id source. Ids start at 1 and are never handed out twice.
#[derive(Debug)]
pub(crate) struct IdAllocator {
    next: AtomicU64,
}

impl IdAllocator {
    pub(crate) fn new() -> Self {
        Self {
            next: AtomicU64::new(1),
        }
    }

    pub(crate) fn allocate(&self) -> RecordId {
        RecordId(self.next.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self::new()
    }
}

/// A todo record as seen by the view layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Unique identifier
    pub id: RecordId,
    /// Text content
    pub text: String,
    /// Completion status
    pub done: bool,
    /// True while a backend call for this record is unresolved
    pub pending: bool,
}

impl Record {
    /// Create a settled, not-done record
    #[inline]
    #[must_use]
    pub fn new(id: RecordId, text: impl Into<String>) -> Self {
        Self {
            id,
            text: text.into(),
            done: false,
            pending: false,
        }
    }

    /// Create a record that is still waiting on the backend
    #[inline]
    #[must_use]
    pub fn optimistic(id: RecordId, text: impl Into<String>) -> Self {
        Self {
            pending: true,
            ..Self::new(id, text)
        }
    }
}

/// Payload for a create call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTodo {
    /// Id already assigned by the client
    pub id: RecordId,
    /// Text content
    pub text: String,
}

impl From<&Record> for NewTodo {
    fn from(record: &Record) -> Self {
        Self {
            id: record.id,
            text: record.text.clone(),
        }
    }
}

/// Backend acknowledgement for toggle and delete
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ack {
    /// Always true on the success path
    pub success: bool,
}

impl Ack {
    /// Successful acknowledgement
    pub const OK: Ack = Ack { success: true };
}

/// The three optimistic mutations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MutationKind {
    /// Append a new record
    Create,
    /// Flip a record's done flag
    Toggle,
    /// Remove a record
    Delete,
}

impl MutationKind {
    /// Lowercase name used in logs
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            MutationKind::Create => "create",
            MutationKind::Toggle => "toggle",
            MutationKind::Delete => "delete",
        }
    }
}

impl std::fmt::Display for MutationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
