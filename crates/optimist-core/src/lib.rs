//! Optimist Core - optimistic mutation controller
//!
//! Applies create/toggle/delete to a local record list before the backend
//! answers, then reconciles:
//! - Success clears the record's pending marker
//! - Failure rolls back from a snapshot captured when the mutation was issued
//! - Each record admits one in-flight mutation at a time
//!
//! # Example
//!
//! ```rust,ignore
//! use optimist_core::{BackendConfig, MutationController};
//!
//! # async fn example() {
//! let controller = MutationController::simulated(&BackendConfig::new());
//!
//! let id = controller.submit_create("Buy milk").unwrap();
//! assert!(controller.get(id).unwrap().pending);
//!
//! controller.settled().await;
//! assert!(!controller.get(id).unwrap().pending);
//! # }
//! ```

#![warn(unreachable_pub)]

// Core modules
pub mod backend;
pub mod config;
pub mod controller;
pub mod error;
pub mod simulated;
pub mod types;

// Re-exports for convenience
pub use backend::{FailureSwitch, TodoBackend};
pub use config::BackendConfig;
pub use controller::{ControllerView, MutationController};
pub use error::{BackendError, MutationError, SubmitError};
pub use simulated::SimulatedBackend;
pub use types::{Ack, MutationKind, NewTodo, Record, RecordId};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for driving a mutation controller
    pub use crate::{
        BackendConfig, ControllerView, FailureSwitch, MutationController, MutationKind, Record,
        RecordId, SimulatedBackend, SubmitError, TodoBackend,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
