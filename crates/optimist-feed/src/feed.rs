//! Intersection-driven pagination
//!
//! The view layer reports sentinel visibility through
//! [`FeedController::on_intersect`]. At most one page fetch runs at a time,
//! pages are appended in order, and a page reporting `has_more == false`
//! exhausts the feed.

use crate::error::FeedError;
use crate::source::{Page, PageSource};
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::watch;

/// Presentation snapshot of a feed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedView<T> {
    /// Every item loaded so far, in page order
    pub items: Vec<T>,
    /// A page fetch is in flight
    pub loading: bool,
    /// The last page has been loaded
    pub exhausted: bool,
    /// Pages loaded successfully
    pub pages_loaded: u32,
    /// Most recent fetch failure
    pub last_error: Option<FeedError>,
}

impl<T> Default for FeedView<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            loading: false,
            exhausted: false,
            pages_loaded: 0,
            last_error: None,
        }
    }
}

#[derive(Debug)]
struct FeedState<T> {
    items: Vec<T>,
    next_page: u32,
    has_more: bool,
    loading: bool,
    last_error: Option<FeedError>,
}

impl<T> Default for FeedState<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            next_page: 1,
            has_more: true,
            loading: false,
            last_error: None,
        }
    }
}

struct FeedInner<S: PageSource> {
    source: S,
    state: Mutex<FeedState<S::Item>>,
    view: watch::Sender<FeedView<S::Item>>,
}

impl<S: PageSource> FeedInner<S> {
    fn publish(&self, state: &FeedState<S::Item>) {
        self.view.send_replace(FeedView {
            items: state.items.clone(),
            loading: state.loading,
            exhausted: !state.has_more,
            pages_loaded: state.next_page - 1,
            last_error: state.last_error.clone(),
        });
    }

    fn settle(&self, page: u32, outcome: Result<Page<S::Item>, FeedError>) {
        let mut state = self.state.lock();
        state.loading = false;
        match outcome {
            Ok(loaded) => {
                tracing::debug!(
                    page,
                    items = loaded.items.len(),
                    has_more = loaded.has_more,
                    "page loaded"
                );
                state.items.extend(loaded.items);
                state.next_page = page + 1;
                state.has_more = loaded.has_more;
                state.last_error = None;
            }
            Err(error) => {
                tracing::warn!(page, %error, "page fetch failed");
                state.last_error = Some(error);
            }
        }
        self.publish(&state);
    }
}

/// Paginated feed over a [`PageSource`]
pub struct FeedController<S: PageSource> {
    inner: Arc<FeedInner<S>>,
}

impl<S: PageSource> Clone for FeedController<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: PageSource> std::fmt::Debug for FeedController<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.inner.state.lock();
        f.debug_struct("FeedController")
            .field("items", &state.items.len())
            .field("next_page", &state.next_page)
            .field("loading", &state.loading)
            .finish_non_exhaustive()
    }
}

impl<S: PageSource> FeedController<S> {
    /// Create an empty feed; nothing is fetched until [`start`](Self::start)
    #[must_use]
    pub fn new(source: S) -> Self {
        let (view, _) = watch::channel(FeedView::default());
        Self {
            inner: Arc::new(FeedInner {
                source,
                state: Mutex::new(FeedState::default()),
                view,
            }),
        }
    }

    /// Load the first page if nothing has been loaded or requested yet
    ///
    /// Returns true if a fetch was issued.
    ///
    /// # Panics
    /// Panics if called outside a Tokio runtime.
    pub fn start(&self) -> bool {
        let fresh = {
            let state = self.inner.state.lock();
            state.next_page == 1 && !state.loading
        };
        fresh && self.load_more()
    }

    /// React to the sentinel entering or leaving the viewport
    ///
    /// # Panics
    /// Panics if called outside a Tokio runtime.
    pub fn on_intersect(&self, is_intersecting: bool) -> bool {
        is_intersecting && self.load_more()
    }

    /// Fetch the next page unless one is in flight or the feed is exhausted
    ///
    /// Returns true if a fetch was issued.
    ///
    /// # Panics
    /// Panics if called outside a Tokio runtime.
    pub fn load_more(&self) -> bool {
        let page = {
            let mut state = self.inner.state.lock();
            if state.loading || !state.has_more {
                return false;
            }
            state.loading = true;
            self.inner.publish(&state);
            state.next_page
        };
        tracing::info!(page, "loading page");

        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            let outcome = inner.source.fetch_page(page).await;
            inner.settle(page, outcome);
        });
        true
    }

    /// True once the last page has been loaded
    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        !self.inner.state.lock().has_more
    }

    /// True while a page fetch is in flight
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.inner.state.lock().loading
    }

    /// Current presentation snapshot
    #[must_use]
    pub fn view(&self) -> FeedView<S::Item> {
        self.inner.view.borrow().clone()
    }

    /// Receiver notified after every state change
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<FeedView<S::Item>> {
        self.inner.view.subscribe()
    }

    /// Wait until no page fetch is in flight
    pub async fn settled(&self) {
        let mut rx = self.subscribe();
        let _ = rx.wait_for(|view| !view.loading).await;
    }
}
