//! A mock remote source for tests and demos.

use crate::response::{ApiResponse, RecipeLookupResponse, RecipeSearchResponse};
use crate::source::RecipeApi;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};

/// A [`RecipeApi`] that serves queued canned responses.
///
/// Responses are consumed in FIFO order per endpoint; an empty queue
/// yields an error outcome so a missing fixture shows up in the
/// request's error state rather than as a hang.
#[derive(Debug, Default)]
pub struct MockRecipeApi {
    search_queue: Mutex<VecDeque<ApiResponse<RecipeSearchResponse>>>,
    lookup_queue: Mutex<VecDeque<ApiResponse<RecipeLookupResponse>>>,
    search_calls: AtomicUsize,
    lookup_calls: AtomicUsize,
}

impl MockRecipeApi {
    /// Creates a mock with empty queues.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a search response.
    pub fn push_search(&self, response: ApiResponse<RecipeSearchResponse>) {
        self.search_queue.lock().push_back(response);
    }

    /// Queues a lookup response.
    pub fn push_lookup(&self, response: ApiResponse<RecipeLookupResponse>) {
        self.lookup_queue.lock().push_back(response);
    }

    /// Number of search calls made so far.
    pub fn search_calls(&self) -> usize {
        self.search_calls.load(Ordering::SeqCst)
    }

    /// Number of lookup calls made so far.
    pub fn lookup_calls(&self) -> usize {
        self.lookup_calls.load(Ordering::SeqCst)
    }
}

impl RecipeApi for MockRecipeApi {
    fn search_recipes(&self, _query: &str, _page: u32) -> ApiResponse<RecipeSearchResponse> {
        self.search_calls.fetch_add(1, Ordering::SeqCst);
        self.search_queue
            .lock()
            .pop_front()
            .unwrap_or_else(|| ApiResponse::error("no mock search response queued"))
    }

    fn get_recipe(&self, _id: &str) -> ApiResponse<RecipeLookupResponse> {
        self.lookup_calls.fetch_add(1, Ordering::SeqCst);
        self.lookup_queue
            .lock()
            .pop_front()
            .unwrap_or_else(|| ApiResponse::error("no mock lookup response queued"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn responses_are_fifo_per_endpoint() {
        let mock = MockRecipeApi::new();
        mock.push_search(ApiResponse::Empty);
        mock.push_search(ApiResponse::error("second"));

        assert_eq!(mock.search_recipes("q", 1), ApiResponse::Empty);
        assert_eq!(
            mock.search_recipes("q", 2),
            ApiResponse::Error {
                message: "second".into()
            }
        );
        assert_eq!(mock.search_calls(), 2);
        assert_eq!(mock.lookup_calls(), 0);
    }

    #[test]
    fn drained_queue_yields_error() {
        let mock = MockRecipeApi::new();
        assert!(matches!(
            mock.get_recipe("a"),
            ApiResponse::Error { .. }
        ));
    }
}
