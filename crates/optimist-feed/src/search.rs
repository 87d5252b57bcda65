//! Debounced search
//!
//! Each query change restarts a quiet-period timer. Only a query that stays
//! unchanged for the whole debounce window is searched. A newer query aborts
//! the older task, whether it is still waiting or already fetching, and a
//! generation counter drops any result that races the abort.

use crate::config::SearchConfig;
use crate::error::FeedError;
use crate::source::SearchSource;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Presentation snapshot of a search box
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchView<T> {
    /// Query as typed
    pub query: String,
    /// Results of the latest completed search
    pub results: Vec<T>,
    /// A search request is in flight
    pub loading: bool,
    /// A search is waiting on the debounce timer or the source
    pub pending: bool,
    /// The latest completed search matched nothing
    pub no_results: bool,
    /// Most recent search failure
    pub last_error: Option<FeedError>,
}

impl<T> Default for SearchView<T> {
    fn default() -> Self {
        Self {
            query: String::new(),
            results: Vec::new(),
            loading: false,
            pending: false,
            no_results: false,
            last_error: None,
        }
    }
}

#[derive(Debug)]
struct SearchState<T> {
    query: String,
    results: Vec<T>,
    loading: bool,
    pending: bool,
    searched: bool,
    last_error: Option<FeedError>,
    generation: u64,
    task: Option<JoinHandle<()>>,
}

impl<T> Default for SearchState<T> {
    fn default() -> Self {
        Self {
            query: String::new(),
            results: Vec::new(),
            loading: false,
            pending: false,
            searched: false,
            last_error: None,
            generation: 0,
            task: None,
        }
    }
}

struct SearchInner<S: SearchSource> {
    source: S,
    config: SearchConfig,
    state: Mutex<SearchState<S::Item>>,
    view: watch::Sender<SearchView<S::Item>>,
}

impl<S: SearchSource> SearchInner<S> {
    fn publish(&self, state: &SearchState<S::Item>) {
        self.view.send_replace(SearchView {
            query: state.query.clone(),
            results: state.results.clone(),
            loading: state.loading,
            pending: state.pending,
            no_results: state.searched && !state.pending && state.results.is_empty(),
            last_error: state.last_error.clone(),
        });
    }

    /// Debounce elapsed; mark loading unless superseded.
    fn begin(&self, generation: u64) -> bool {
        let mut state = self.state.lock();
        if state.generation != generation {
            return false;
        }
        state.loading = true;
        self.publish(&state);
        true
    }

    fn finish(&self, generation: u64, term: &str, outcome: Result<Vec<S::Item>, FeedError>) {
        let mut state = self.state.lock();
        if state.generation != generation {
            tracing::debug!(term, "dropping superseded search result");
            return;
        }
        state.loading = false;
        state.pending = false;
        state.task = None;
        match outcome {
            Ok(results) => {
                tracing::debug!(term, matches = results.len(), "search completed");
                state.results = results;
                state.searched = true;
                state.last_error = None;
            }
            Err(error) => {
                tracing::warn!(term, %error, "search failed");
                state.last_error = Some(error);
            }
        }
        self.publish(&state);
    }
}

/// Search box that debounces queries against a [`SearchSource`]
pub struct DebouncedSearch<S: SearchSource> {
    inner: Arc<SearchInner<S>>,
}

impl<S: SearchSource> Clone for DebouncedSearch<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: SearchSource> std::fmt::Debug for DebouncedSearch<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.inner.state.lock();
        f.debug_struct("DebouncedSearch")
            .field("query", &state.query)
            .field("results", &state.results.len())
            .field("loading", &state.loading)
            .finish_non_exhaustive()
    }
}

impl<S: SearchSource> DebouncedSearch<S> {
    /// Create a search box over a source
    #[must_use]
    pub fn new(source: S, config: SearchConfig) -> Self {
        let (view, _) = watch::channel(SearchView::default());
        Self {
            inner: Arc::new(SearchInner {
                source,
                config,
                state: Mutex::new(SearchState::default()),
                view,
            }),
        }
    }

    /// Replace the query
    ///
    /// Cancels any waiting or running search. Queries shorter than the
    /// configured minimum clear the results immediately; longer ones are
    /// searched once the debounce window passes without another change.
    ///
    /// # Panics
    /// Panics if called outside a Tokio runtime.
    pub fn set_query(&self, text: impl Into<String>) {
        let query = text.into();
        let term = query.trim().to_owned();

        let mut state = self.inner.state.lock();
        state.generation += 1;
        let generation = state.generation;
        if let Some(task) = state.task.take() {
            task.abort();
        }
        state.query = query;
        state.loading = false;

        if term.is_empty() || term.chars().count() < self.inner.config.min_query_len {
            state.results.clear();
            state.searched = false;
            state.pending = false;
            self.inner.publish(&state);
            return;
        }

        state.pending = true;
        let inner = Arc::clone(&self.inner);
        state.task = Some(tokio::spawn(async move {
            tokio::time::sleep(inner.config.debounce()).await;
            if !inner.begin(generation) {
                return;
            }
            let outcome = inner.source.search(&term).await;
            inner.finish(generation, &term, outcome);
        }));
        self.inner.publish(&state);
    }

    /// Clear the query and results
    ///
    /// # Panics
    /// Panics if called outside a Tokio runtime.
    pub fn clear(&self) {
        self.set_query(String::new());
    }

    /// Current presentation snapshot
    #[must_use]
    pub fn view(&self) -> SearchView<S::Item> {
        self.inner.view.borrow().clone()
    }

    /// Receiver notified after every state change
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SearchView<S::Item>> {
        self.inner.view.subscribe()
    }

    /// Wait until no search is waiting or running
    pub async fn settled(&self) {
        let mut rx = self.subscribe();
        let _ = rx.wait_for(|view| !view.pending).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fruit::{Fruit, MockFruitIndex};
    use std::time::Duration;

    fn search_box() -> DebouncedSearch<MockFruitIndex> {
        let config = SearchConfig::new();
        DebouncedSearch::new(MockFruitIndex::from_config(&config), config)
    }

    fn names(view: &SearchView<Fruit>) -> Vec<&str> {
        view.results.iter().map(|f| f.name.as_str()).collect()
    }

    #[tokio::test(start_paused = true)]
    async fn search_runs_after_quiet_period() {
        let search = search_box();
        search.set_query("berry");
        assert!(search.view().pending);
        assert!(!search.view().loading);

        search.settled().await;
        let view = search.view();
        assert_eq!(names(&view), vec!["Blueberry", "Cranberry"]);
        assert!(!view.no_results);
    }

    #[tokio::test(start_paused = true)]
    async fn typing_restarts_debounce() {
        let search = search_box();
        search.set_query("ap");
        tokio::time::sleep(Duration::from_millis(200)).await;
        search.set_query("apr");
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(!search.view().loading);

        search.settled().await;
        assert_eq!(names(&search.view()), vec!["Apricot"]);
    }

    #[tokio::test(start_paused = true)]
    async fn short_query_clears_without_searching() {
        let search = search_box();
        search.set_query("cherry");
        search.settled().await;
        assert_eq!(search.view().results.len(), 1);

        search.set_query("c");
        let view = search.view();
        assert!(view.results.is_empty());
        assert!(!view.pending);
        assert!(!view.no_results);
    }

    #[tokio::test(start_paused = true)]
    async fn whitespace_is_trimmed() {
        let search = search_box();
        search.set_query("  a ");
        assert!(!search.view().pending);
        assert_eq!(search.view().query, "  a ");
    }

    #[tokio::test(start_paused = true)]
    async fn empty_match_sets_no_results() {
        let search = search_box();
        search.set_query("xyz");
        search.settled().await;
        assert!(search.view().no_results);

        search.clear();
        assert!(!search.view().no_results);
        assert_eq!(search.view().query, "");
    }
}
