//! Mock paged catalog
//!
//! Serves `Item 1..=total` in fixed-size pages after an artificial delay.

use crate::config::FeedConfig;
use crate::error::FeedError;
use crate::source::{Page, PageSource};
use async_trait::async_trait;
use optimist_core::FailureSwitch;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// An entry in the mock catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogItem {
    /// 1-based position in the catalog
    pub id: u32,
    /// Display title, `Item {id}`
    pub title: String,
}

impl CatalogItem {
    fn numbered(id: u32) -> Self {
        Self {
            id,
            title: format!("Item {id}"),
        }
    }
}

/// Paged catalog with latency and an optional failure switch
#[derive(Debug, Clone)]
pub struct MockCatalog {
    page_size: u32,
    total_items: u32,
    latency: Duration,
    failure: FailureSwitch,
}

impl MockCatalog {
    /// Create a catalog
    #[must_use]
    pub fn new(page_size: u32, total_items: u32, latency: Duration) -> Self {
        Self {
            page_size: page_size.max(1),
            total_items,
            latency,
            failure: FailureSwitch::default(),
        }
    }

    /// Create a catalog from configuration
    #[must_use]
    pub fn from_config(config: &FeedConfig) -> Self {
        Self::new(config.page_size, config.total_items, config.latency())
    }

    /// Share a failure switch with the caller
    #[must_use]
    pub fn with_failure_switch(mut self, failure: FailureSwitch) -> Self {
        self.failure = failure;
        self
    }

    /// Items that exist on `page`, without delay
    fn slice(&self, page: u32) -> Page<CatalogItem> {
        let start = (page - 1).saturating_mul(self.page_size);
        let end = start.saturating_add(self.page_size).min(self.total_items);
        Page {
            items: (start + 1..=end).map(CatalogItem::numbered).collect(),
            has_more: start.saturating_add(self.page_size) < self.total_items,
        }
    }
}

#[async_trait]
impl PageSource for MockCatalog {
    type Item = CatalogItem;

    async fn fetch_page(&self, page: u32) -> Result<Page<CatalogItem>, FeedError> {
        if page == 0 {
            return Err(FeedError::InvalidPage(page));
        }
        let fail = self.failure.is_on();
        tokio::time::sleep(self.latency).await;
        if fail {
            return Err(FeedError::Fetch(format!("page {page} unavailable")));
        }
        Ok(self.slice(page))
    }
}
