//! Source traits consumed by the feed and search controllers
//!
//! Async interfaces so sources can be in-memory mocks or remote services.

use crate::error::FeedError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// One page of results
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    /// Items on this page, in order
    pub items: Vec<T>,
    /// Whether a further page exists
    pub has_more: bool,
}

/// Paged data source
#[async_trait]
pub trait PageSource: Send + Sync + 'static {
    /// Item type yielded by pages
    type Item: Clone + Send + Sync + 'static;

    /// Fetch a 1-based page
    async fn fetch_page(&self, page: u32) -> Result<Page<Self::Item>, FeedError>;
}

/// Query-driven data source
#[async_trait]
pub trait SearchSource: Send + Sync + 'static {
    /// Item type yielded by searches
    type Item: Clone + Send + Sync + 'static;

    /// Run a search for a non-empty, trimmed query
    async fn search(&self, query: &str) -> Result<Vec<Self::Item>, FeedError>;
}
