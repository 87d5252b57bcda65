//! Testing utilities for the Optimist workspace
//!
//! Shared runtimes, time helpers and controller fixtures.

#![allow(missing_docs)]

use optimist_core::{BackendConfig, MutationController, RecordId, SimulatedBackend};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// Run a future on a current-thread runtime with time paused.
///
/// For proptest bodies, which cannot be `#[tokio::test]` functions.
pub fn block_on_paused<F: Future>(future: F) -> F::Output {
    tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .start_paused(true)
        .build()
        .unwrap()
        .block_on(future)
}

/// Sleep one millisecond past `duration`.
pub async fn past(duration: Duration) {
    tokio::time::sleep(duration + Duration::from_millis(1)).await;
}

pub fn simulated_controller(latency_ms: u64) -> (MutationController, SimulatedBackend) {
    let config = BackendConfig::new().with_latency_ms(latency_ms);
    let backend = SimulatedBackend::from_config(&config);
    let switch = backend.failure_switch();
    let controller = MutationController::new(Arc::new(backend.clone()), switch);
    (controller, backend)
}

pub async fn settled_record(controller: &MutationController, text: &str) -> RecordId {
    let id = controller.submit_create(text).unwrap();
    controller.settled().await;
    id
}
