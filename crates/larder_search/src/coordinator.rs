//! The pagination and query state machine.

use crate::signal::Signal;
use crate::state::{SearchState, SearchStatus};
use larder_core::{Recipe, Resource};
use larder_sync::{RecipeRepository, ResourceStream};
use parking_lot::Mutex;
use std::sync::Arc;
use std::thread;

/// Reserved message re-tagging a terminal empty page on the result
/// stream. Consumers can special-case it instead of showing a failure.
pub const QUERY_EXHAUSTED: &str = "Query is exhausted.";

/// What the frontend is currently browsing; used for back-button
/// semantics, not by the synchronization core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Browse {
    /// The default category list.
    Categories,
    /// Search results.
    Results,
}

struct Inner {
    state: SearchState,
    browse: Browse,
    /// Stamps each executed page; outcomes stamped with an older
    /// generation belong to a superseded or cancelled page and are
    /// discarded without touching state or presentation.
    generation: u64,
    /// Item count of the last successfully presented list, used to
    /// detect pages that contribute nothing new.
    presented_len: usize,
}

/// Drives the synchronization engine once per page and merges per-page
/// outcomes into a single result stream.
///
/// Only one page request is in flight at a time; `search` and
/// `next_page` are no-ops while one is outstanding. The coordinator is
/// the sole mutator of its [`SearchState`].
pub struct SearchCoordinator {
    repository: Arc<RecipeRepository>,
    inner: Arc<Mutex<Inner>>,
    results: Arc<Signal<Resource<Vec<Recipe>>>>,
    browsing: Arc<Signal<Browse>>,
}

impl SearchCoordinator {
    /// Creates a coordinator over the given repository, browsing
    /// categories.
    pub fn new(repository: Arc<RecipeRepository>) -> Self {
        Self {
            repository,
            inner: Arc::new(Mutex::new(Inner {
                state: SearchState::new(),
                browse: Browse::Categories,
                generation: 0,
                presented_len: 0,
            })),
            results: Arc::new(Signal::new()),
            browsing: Arc::new(Signal::new()),
        }
    }

    /// Subscribes to the merged result stream.
    ///
    /// Carries one [`Resource`] per state transition; a terminal empty
    /// page arrives as an error tagged [`QUERY_EXHAUSTED`].
    pub fn results(&self) -> std::sync::mpsc::Receiver<Resource<Vec<Recipe>>> {
        self.results.subscribe()
    }

    /// Subscribes to browse-state transitions.
    pub fn browsing(&self) -> std::sync::mpsc::Receiver<Browse> {
        self.browsing.subscribe()
    }

    /// Returns what is currently being browsed.
    pub fn browse(&self) -> Browse {
        self.inner.lock().browse
    }

    /// Returns a snapshot of the search state.
    pub fn state(&self) -> SearchState {
        self.inner.lock().state.clone()
    }

    /// Returns the derived coarse status.
    pub fn status(&self) -> SearchStatus {
        self.inner.lock().state.status()
    }

    /// Starts a brand-new search at page 1.
    ///
    /// No-op while a page is in flight. Submitting the same query text
    /// again still resets to page 1; pagination progress is always
    /// discarded.
    pub fn search(&self, query: &str) {
        let mut inner = self.inner.lock();
        if !inner.state.can_search() {
            tracing::debug!(query, "search ignored, page in flight");
            return;
        }
        inner.state.query = query.to_string();
        inner.state.page = 1;
        inner.state.exhausted = false;
        inner.presented_len = 0;
        inner.browse = Browse::Results;
        self.browsing.emit(Browse::Results);
        self.execute(&mut inner);
    }

    /// Requests the next page of the current query.
    ///
    /// No-op while a page is in flight or once the query is exhausted.
    pub fn next_page(&self) {
        let mut inner = self.inner.lock();
        if !inner.state.can_advance() {
            tracing::debug!(
                exhausted = inner.state.exhausted,
                in_flight = inner.state.in_flight,
                "next page ignored"
            );
            return;
        }
        inner.state.page += 1;
        self.execute(&mut inner);
    }

    /// Cancels the in-flight page, if any.
    ///
    /// The discarded page's outcome produces no presentation update and
    /// no state mutation; the page counter resets so a later `search`
    /// starts clean. The remote call itself is not aborted, and a cache
    /// write it triggers may still complete.
    pub fn cancel(&self) {
        let mut inner = self.inner.lock();
        if !inner.state.in_flight {
            return;
        }
        tracing::debug!(query = %inner.state.query, "cancelling in-flight search");
        inner.state.cancelled = true;
        inner.state.in_flight = false;
        inner.state.page = 1;
    }

    /// Switches the frontend back to category browsing.
    pub fn show_categories(&self) {
        let mut inner = self.inner.lock();
        inner.browse = Browse::Categories;
        self.browsing.emit(Browse::Categories);
    }

    /// Issues the request for the current `(query, page)` and spawns a
    /// consumer for its outcome stream.
    fn execute(&self, inner: &mut Inner) {
        inner.state.in_flight = true;
        inner.state.cancelled = false;
        inner.generation += 1;
        let generation = inner.generation;
        let query = inner.state.query.clone();
        let page = inner.state.page;
        tracing::debug!(query = %query, page, "requesting page");

        let stream = self.repository.search_recipes(&query, page);
        let shared = Arc::clone(&self.inner);
        let results = Arc::clone(&self.results);
        thread::spawn(move || consume(stream, generation, shared, results));
    }
}

impl std::fmt::Debug for SearchCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchCoordinator")
            .field("state", &self.inner.lock().state)
            .finish_non_exhaustive()
    }
}

/// Interprets one page's outcome stream. Detaches on the first terminal
/// outcome; the cache keeps serving future observations, not this page.
fn consume(
    stream: ResourceStream<Vec<Recipe>>,
    generation: u64,
    shared: Arc<Mutex<Inner>>,
    results: Arc<Signal<Resource<Vec<Recipe>>>>,
) {
    while let Some(outcome) = stream.recv() {
        let mut inner = shared.lock();
        if inner.generation != generation || inner.state.cancelled {
            tracing::debug!("discarding outcome of superseded page");
            return;
        }
        match outcome {
            loading @ Resource::Loading(_) => {
                results.emit(loading);
            }
            Resource::Success(items) => {
                inner.state.in_flight = false;
                if items.len() <= inner.presented_len {
                    // No new items: the query is exhausted. Re-tagged as
                    // an error so the frontend can render the terminal
                    // marker through its existing error branch.
                    inner.state.exhausted = true;
                    tracing::debug!(query = %inner.state.query, "query exhausted");
                    results.emit(Resource::error(QUERY_EXHAUSTED, Some(items)));
                } else {
                    inner.presented_len = items.len();
                    results.emit(Resource::Success(items));
                }
                return;
            }
            error @ Resource::Error { .. } => {
                inner.state.in_flight = false;
                results.emit(error);
                return;
            }
        }
    }

    // The stream ended without a terminal outcome (engine torn down);
    // release the in-flight guard so the session is not wedged.
    let mut inner = shared.lock();
    if inner.generation == generation && inner.state.in_flight {
        inner.state.in_flight = false;
    }
}
