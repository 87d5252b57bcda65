//! Optimist Feed - pagination and debounced search
//!
//! Two read-side controllers that share the mutation controller's shape
//! (synchronous commands, spawned fetches, watchable views):
//!
//! - [`FeedController`]: intersection-driven pagination with end-of-data detection
//! - [`DebouncedSearch`]: quiet-period debounce with cancellation of superseded searches
//!
//! # Example
//!
//! ```rust,ignore
//! use optimist_feed::{FeedConfig, FeedController, MockCatalog};
//!
//! # async fn example() {
//! let feed = FeedController::new(MockCatalog::from_config(&FeedConfig::new()));
//! feed.start();
//! feed.settled().await;
//!
//! feed.on_intersect(true);
//! feed.settled().await;
//! assert_eq!(feed.view().items.len(), 20);
//! # }
//! ```

#![warn(unreachable_pub)]

pub mod catalog;
pub mod config;
pub mod error;
pub mod feed;
pub mod fruit;
pub mod search;
pub mod source;

pub use catalog::{CatalogItem, MockCatalog};
pub use config::{FeedConfig, SearchConfig};
pub use error::FeedError;
pub use feed::{FeedController, FeedView};
pub use fruit::{Fruit, MockFruitIndex};
pub use search::{DebouncedSearch, SearchView};
pub use source::{Page, PageSource, SearchSource};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
