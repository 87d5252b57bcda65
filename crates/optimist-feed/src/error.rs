//! Error types for feed and search sources

/// Errors returned by a [`PageSource`](crate::PageSource) or
/// [`SearchSource`](crate::SearchSource)
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FeedError {
    /// The source failed to answer
    #[error("fetch failed: {0}")]
    Fetch(String),

    /// Pages are numbered from 1
    #[error("page {0} is out of range")]
    InvalidPage(u32),
}
