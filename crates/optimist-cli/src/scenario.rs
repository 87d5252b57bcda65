//! Scripted runs of each controller
//!
//! Every scenario drives a controller against its mock source in real time
//! and returns a report that can be printed as text or JSON.

use anyhow::{bail, Context};
use optimist_core::{BackendConfig, MutationController, Record};
use optimist_feed::{
    DebouncedSearch, FeedConfig, FeedController, MockCatalog, MockFruitIndex, SearchConfig,
};
use serde::Serialize;
use std::fmt::Write as _;
use std::time::Duration;

/// Outcome of the todo scenario
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TodoReport {
    /// Failure mode during the run
    pub failure_mode: bool,
    /// Records visible right after submitting every create
    pub optimistic: Vec<Record>,
    /// Records after creates settled
    pub created: Vec<Record>,
    /// Records after toggling every created record
    pub toggled: Vec<Record>,
    /// Records after deleting the first record
    pub deleted: Vec<Record>,
    /// Last error shown, if any
    pub last_error: Option<String>,
}

impl TodoReport {
    /// Render as plain text
    #[must_use]
    pub fn generate_text(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "=== Optimistic Todo Run ===");
        let _ = writeln!(out, "Failure mode: {}", if self.failure_mode { "ON" } else { "OFF" });
        for (label, records) in [
            ("Submitted", &self.optimistic),
            ("Created", &self.created),
            ("Toggled", &self.toggled),
            ("Deleted first", &self.deleted),
        ] {
            let _ = writeln!(out, "\n{label}:");
            if records.is_empty() {
                let _ = writeln!(out, "  (empty)");
            }
            for record in records {
                let _ = writeln!(
                    out,
                    "  [{}] #{} {}{}",
                    if record.done { "x" } else { " " },
                    record.id,
                    record.text,
                    if record.pending { " (saving...)" } else { "" }
                );
            }
        }
        if let Some(error) = &self.last_error {
            let _ = writeln!(out, "\nError: {error}");
        }
        out
    }
}

/// Create `items`, toggle each surviving record, then delete the first one
///
/// Creates fail only if the backend config starts in failure mode. With
/// `fail`, failure mode is switched on once the creates settle, so the
/// toggles and the delete are rolled back.
///
/// # Errors
/// Fails if a toggle or delete is refused.
pub async fn run_todo(
    config: &BackendConfig,
    items: &[String],
    fail: bool,
) -> anyhow::Result<TodoReport> {
    let controller = MutationController::simulated(config);

    for text in items {
        if controller.submit_create(text.as_str()).is_none() {
            tracing::info!(text = %text, "skipping blank item");
        }
    }
    let optimistic = controller.view().records;
    controller.settled().await;
    let created = controller.view().records;

    if fail {
        controller.set_simulate_failure(true);
    }
    let failure_mode = controller.simulate_failure();

    for record in &created {
        controller
            .submit_toggle(record.id)
            .with_context(|| format!("toggling record {}", record.id))?;
    }
    controller.settled().await;
    let toggled = controller.view().records;

    if let Some(first) = toggled.first() {
        controller
            .submit_delete(first.id)
            .with_context(|| format!("deleting record {}", first.id))?;
    }
    controller.settled().await;
    let view = controller.view();

    Ok(TodoReport {
        failure_mode,
        optimistic,
        created,
        toggled,
        deleted: view.records,
        last_error: view.last_error.map(|e| e.to_string()),
    })
}

/// Outcome of the scroll scenario
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScrollReport {
    /// Total items after each page load
    pub loaded_after_page: Vec<usize>,
    /// Titles of every loaded item
    pub titles: Vec<String>,
    /// End of data was reached
    pub exhausted: bool,
}

impl ScrollReport {
    /// Render as plain text
    #[must_use]
    pub fn generate_text(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "=== Infinite Scroll Run ===");
        for (page, total) in self.loaded_after_page.iter().enumerate() {
            let _ = writeln!(out, "Page {}: {total} items loaded", page + 1);
        }
        if let (Some(first), Some(last)) = (self.titles.first(), self.titles.last()) {
            let _ = writeln!(out, "Range: {first} .. {last}");
        }
        if self.exhausted {
            let _ = writeln!(out, "No more items to load.");
        }
        out
    }
}

/// Scroll the feed to the end, one intersection per page
///
/// # Errors
/// Fails on the first page fetch error.
pub async fn run_scroll(config: &FeedConfig) -> anyhow::Result<ScrollReport> {
    let feed = FeedController::new(MockCatalog::from_config(config));
    let mut loaded_after_page = Vec::new();

    feed.start();
    loop {
        feed.settled().await;
        let view = feed.view();
        if let Some(error) = view.last_error {
            bail!("page {} failed: {error}", view.pages_loaded + 1);
        }
        loaded_after_page.push(view.items.len());
        if view.exhausted {
            break;
        }
        feed.on_intersect(true);
    }

    let view = feed.view();
    Ok(ScrollReport {
        loaded_after_page,
        titles: view.items.into_iter().map(|item| item.title).collect(),
        exhausted: view.exhausted,
    })
}

/// Final state of one typed query
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueryOutcome {
    /// Query as typed
    pub query: String,
    /// Matching names
    pub results: Vec<String>,
    /// A search ran and matched nothing
    pub no_results: bool,
}

/// Outcome of the search scenario
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchReport {
    /// One entry per query, in order
    pub queries: Vec<QueryOutcome>,
}

impl SearchReport {
    /// Render as plain text
    #[must_use]
    pub fn generate_text(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "=== Debounced Search Run ===");
        for outcome in &self.queries {
            let summary = if outcome.no_results {
                "No results found".to_string()
            } else if outcome.results.is_empty() {
                "(not searched)".to_string()
            } else {
                outcome.results.join(", ")
            };
            let _ = writeln!(out, "{:?}: {summary}", outcome.query);
        }
        out
    }
}

/// Type each query one keystroke at a time, then wait for its results
///
/// Keystrokes arrive `keystroke` apart; when that is shorter than the
/// debounce window only the full query is searched.
///
/// # Errors
/// Fails if a search errors.
pub async fn run_search(
    config: &SearchConfig,
    queries: &[String],
    keystroke: Duration,
) -> anyhow::Result<SearchReport> {
    let search = DebouncedSearch::new(MockFruitIndex::from_config(config), config.clone());
    let mut outcomes = Vec::with_capacity(queries.len());

    for query in queries {
        let mut typed = String::new();
        for ch in query.chars() {
            typed.push(ch);
            search.set_query(typed.as_str());
            tokio::time::sleep(keystroke).await;
        }
        if query.is_empty() {
            search.clear();
        }
        search.settled().await;

        let view = search.view();
        if let Some(error) = view.last_error {
            bail!("search for {query:?} failed: {error}");
        }
        outcomes.push(QueryOutcome {
            query: view.query,
            results: view.results.into_iter().map(|fruit| fruit.name).collect(),
            no_results: view.no_results,
        });
    }

    Ok(SearchReport { queries: outcomes })
}
