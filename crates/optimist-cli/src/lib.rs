//! Optimist CLI - scripted runs of the optimistic, pagination and search
//! controllers against their mock sources.

pub mod config;
pub mod logging;
pub mod scenario;

pub use config::{ConfigError, OptimistConfig};
pub use logging::init_tracing;
pub use scenario::{
    run_scroll, run_search, run_todo, QueryOutcome, ScrollReport, SearchReport, TodoReport,
};
