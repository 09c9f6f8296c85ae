//! The remote source seam.

use crate::response::{ApiResponse, RecipeLookupResponse, RecipeSearchResponse};

/// A remote recipe source.
///
/// Each method issues one logical remote call and yields exactly one
/// terminal outcome. Implementations must be cheap to call from any
/// thread; the synchronization layer runs them off its ordering
/// context and never calls the same logical request twice
/// concurrently.
pub trait RecipeApi: Send + Sync {
    /// Fetches one page of search results.
    fn search_recipes(&self, query: &str, page: u32) -> ApiResponse<RecipeSearchResponse>;

    /// Fetches the full detail of one recipe.
    fn get_recipe(&self, id: &str) -> ApiResponse<RecipeLookupResponse>;
}
