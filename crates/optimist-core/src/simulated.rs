//! In-memory backend with artificial latency and a failure switch
//!
//! Stands in for a remote service in demos and tests. Every call waits for the
//! configured latency before resolving; calls issued while the failure switch
//! is on are rejected and leave the store untouched.

use crate::backend::{FailureSwitch, TodoBackend};
use crate::config::BackendConfig;
use crate::error::BackendError;
use crate::types::{Ack, MutationKind, NewTodo, Record, RecordId};
use futures::future::{BoxFuture, FutureExt};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

/// Simulated todo backend
#[derive(Debug, Clone)]
pub struct SimulatedBackend {
    latency: Duration,
    failure: FailureSwitch,
    store: Arc<Mutex<Vec<Record>>>,
}

impl SimulatedBackend {
    /// Create a backend with the given latency and failure switch
    #[inline]
    #[must_use]
    pub fn new(latency: Duration, failure: FailureSwitch) -> Self {
        Self {
            latency,
            failure,
            store: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Create a backend from configuration with a fresh switch
    #[must_use]
    pub fn from_config(config: &BackendConfig) -> Self {
        Self::new(config.latency(), FailureSwitch::new(config.fail_initially))
    }

    /// The switch this backend consults
    #[inline]
    #[must_use]
    pub fn failure_switch(&self) -> FailureSwitch {
        self.failure.clone()
    }

    /// Records the backend has accepted so far
    #[must_use]
    pub fn stored(&self) -> Vec<Record> {
        self.store.lock().clone()
    }

    /// Snapshot the switch and the pieces the deferred call needs
    fn issue(&self) -> (bool, Duration, Arc<Mutex<Vec<Record>>>) {
        (self.failure.is_on(), self.latency, Arc::clone(&self.store))
    }
}

fn not_found(operation: MutationKind, id: RecordId) -> BackendError {
    BackendError::Rejected {
        operation,
        message: format!("record {id} not found"),
    }
}

impl TodoBackend for SimulatedBackend {
    fn add_todo(&self, todo: NewTodo) -> BoxFuture<'static, Result<Record, BackendError>> {
        let (fail, latency, store) = self.issue();
        async move {
            tokio::time::sleep(latency).await;
            if fail {
                return Err(BackendError::rejected(MutationKind::Create));
            }
            let record = Record::new(todo.id, todo.text);
            store.lock().push(record.clone());
            tracing::debug!(id = %record.id, "backend stored record");
            Ok(record)
        }
        .boxed()
    }

    fn toggle_todo(&self, id: RecordId) -> BoxFuture<'static, Result<Ack, BackendError>> {
        let (fail, latency, store) = self.issue();
        async move {
            tokio::time::sleep(latency).await;
            if fail {
                return Err(BackendError::rejected(MutationKind::Toggle));
            }
            let mut store = store.lock();
            let record = store
                .iter_mut()
                .find(|r| r.id == id)
                .ok_or_else(|| not_found(MutationKind::Toggle, id))?;
            record.done = !record.done;
            Ok(Ack::OK)
        }
        .boxed()
    }

    fn delete_todo(&self, id: RecordId) -> BoxFuture<'static, Result<Ack, BackendError>> {
        let (fail, latency, store) = self.issue();
        async move {
            tokio::time::sleep(latency).await;
            if fail {
                return Err(BackendError::rejected(MutationKind::Delete));
            }
            let mut store = store.lock();
            let before = store.len();
            store.retain(|r| r.id != id);
            if store.len() == before {
                return Err(not_found(MutationKind::Delete, id));
            }
            Ok(Ack::OK)
        }
        .boxed()
    }
}
