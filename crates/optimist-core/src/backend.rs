//! Backend contract consumed by the controller
//!
//! Each method issues the call when it returns and hands back a `'static`
//! future for the outcome. Anything that decides the outcome (such as the
//! failure switch) is read at that moment, so toggling failure mode never
//! affects calls already in flight.

use crate::error::BackendError;
use crate::types::{Ack, NewTodo, Record, RecordId};
use futures::future::BoxFuture;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Asynchronous todo backend
#[cfg_attr(test, mockall::automock)]
pub trait TodoBackend: Send + Sync {
    /// Persist a new record; resolves to the stored record
    fn add_todo(&self, todo: NewTodo) -> BoxFuture<'static, Result<Record, BackendError>>;

    /// Flip a record's done flag
    fn toggle_todo(&self, id: RecordId) -> BoxFuture<'static, Result<Ack, BackendError>>;

    /// Remove a record
    fn delete_todo(&self, id: RecordId) -> BoxFuture<'static, Result<Ack, BackendError>>;
}

/// Shared failure-mode flag injected into a backend
///
/// Cloning shares the flag: the controller holds one end to flip it, the
/// backend holds the other to read it when a call is issued.
#[derive(Debug, Clone, Default)]
pub struct FailureSwitch(Arc<AtomicBool>);

impl FailureSwitch {
    /// Create a switch in the given position
    #[inline]
    #[must_use]
    pub fn new(on: bool) -> Self {
        Self(Arc::new(AtomicBool::new(on)))
    }

    /// Turn failure mode on or off
    #[inline]
    pub fn set(&self, on: bool) {
        self.0.store(on, Ordering::SeqCst);
    }

    /// Whether calls issued now should fail
    #[inline]
    #[must_use]
    pub fn is_on(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}
