//! Concrete synchronized resources for recipes.
//!
//! The repository owns the cache store and the remote source and hands
//! out one observation per request. It is constructed explicitly and
//! passed by handle to whoever coordinates requests; there is no
//! process-wide instance.

use crate::config::SyncConfig;
use crate::strategy::{RemoteCall, SyncStrategy};
use crate::synchronizer::{observe, ResourceStream};
use larder_api::{RecipeApi, RecipeLookupResponse, RecipeSearchResponse};
use larder_core::{now_epoch_secs, CacheSubscription, Recipe, RecipeStore, UpsertOutcome};
use std::sync::Arc;
use std::time::Duration;

/// Synchronized access to recipes: paginated search and single-item
/// lookup, each backed by the cache-or-fetch protocol.
pub struct RecipeRepository {
    store: Arc<dyn RecipeStore>,
    api: Arc<dyn RecipeApi>,
    config: SyncConfig,
}

impl RecipeRepository {
    /// Creates a repository over the given store and remote source.
    pub fn new(store: Arc<dyn RecipeStore>, api: Arc<dyn RecipeApi>, config: SyncConfig) -> Self {
        Self { store, api, config }
    }

    /// Observes one page of search results.
    ///
    /// Search always fetches: the query space is unbounded, so a cached
    /// snapshot of some prior query cannot satisfy the page request.
    /// The cache write resolves conflicts with a summary-only update so
    /// enrichment fields survive a re-search.
    pub fn search_recipes(&self, query: &str, page: u32) -> ResourceStream<Vec<Recipe>> {
        observe(SearchPageStrategy {
            store: Arc::clone(&self.store),
            api: Arc::clone(&self.api),
            query: query.to_string(),
            page,
        })
    }

    /// Observes one recipe's full detail.
    ///
    /// Fetches only if the row is absent or older than the configured
    /// refresh threshold.
    pub fn recipe(&self, id: &str) -> ResourceStream<Option<Recipe>> {
        observe(RecipeDetailStrategy {
            store: Arc::clone(&self.store),
            api: Arc::clone(&self.api),
            id: id.to_string(),
            refresh_threshold: self.config.refresh_threshold,
        })
    }
}

impl std::fmt::Debug for RecipeRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecipeRepository")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

struct SearchPageStrategy {
    store: Arc<dyn RecipeStore>,
    api: Arc<dyn RecipeApi>,
    query: String,
    page: u32,
}

impl SyncStrategy for SearchPageStrategy {
    type Cached = Vec<Recipe>;
    type Body = RecipeSearchResponse;

    fn load_from_cache(&self) -> CacheSubscription<Vec<Recipe>> {
        self.store.watch_search(&self.query, self.page)
    }

    fn should_fetch(&self, _cached: &Vec<Recipe>) -> bool {
        true
    }

    fn create_call(&self) -> RemoteCall<RecipeSearchResponse> {
        let api = Arc::clone(&self.api);
        let query = self.query.clone();
        let page = self.page;
        RemoteCall::new(move || api.search_recipes(&query, page))
    }

    fn save_call_result(&self, body: RecipeSearchResponse) {
        // The row list is null when the credential has expired; that is
        // a success with nothing to save.
        let Some(dtos) = body.recipes else {
            tracing::debug!(query = %self.query, "search response carried no rows");
            return;
        };
        let recipes: Vec<Recipe> = dtos.into_iter().map(|dto| dto.into_recipe()).collect();
        let outcomes = match self.store.upsert(&recipes) {
            Ok(outcomes) => outcomes,
            Err(error) => {
                tracing::warn!(%error, "cache write failed, keeping previous rows");
                return;
            }
        };
        for (recipe, outcome) in recipes.iter().zip(outcomes) {
            if outcome == UpsertOutcome::Conflict {
                // The row exists with enrichment fields a summary does
                // not carry; refresh only the summary fields.
                tracing::debug!(id = %recipe.id, "conflict on insert, updating summary only");
                if let Err(error) = self.store.update_summary(
                    &recipe.id,
                    &recipe.title,
                    &recipe.publisher,
                    &recipe.image_url,
                    recipe.social_rank,
                ) {
                    tracing::warn!(%error, id = %recipe.id, "summary update failed");
                }
            }
        }
    }
}

struct RecipeDetailStrategy {
    store: Arc<dyn RecipeStore>,
    api: Arc<dyn RecipeApi>,
    id: String,
    refresh_threshold: Duration,
}

impl SyncStrategy for RecipeDetailStrategy {
    type Cached = Option<Recipe>;
    type Body = RecipeLookupResponse;

    fn load_from_cache(&self) -> CacheSubscription<Option<Recipe>> {
        self.store.watch_recipe(&self.id)
    }

    fn should_fetch(&self, cached: &Option<Recipe>) -> bool {
        let Some(recipe) = cached else {
            return true;
        };
        let age = now_epoch_secs() - recipe.last_refreshed_at;
        let stale = age >= self.refresh_threshold.as_secs() as i64;
        tracing::debug!(id = %self.id, age_secs = age, stale, "staleness check");
        stale
    }

    fn create_call(&self) -> RemoteCall<RecipeLookupResponse> {
        let api = Arc::clone(&self.api);
        let id = self.id.clone();
        RemoteCall::new(move || api.get_recipe(&id))
    }

    fn save_call_result(&self, body: RecipeLookupResponse) {
        let Some(dto) = body.recipe else {
            tracing::debug!(id = %self.id, "lookup response carried no recipe");
            return;
        };
        let mut recipe = dto.into_recipe();
        recipe.last_refreshed_at = now_epoch_secs();
        if let Err(error) = self.store.replace(recipe) {
            tracing::warn!(%error, id = %self.id, "cache write failed, keeping previous row");
        }
    }
}
