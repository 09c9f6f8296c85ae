//! Call outcomes and JSON wire types.

use larder_core::Recipe;
use serde::{Deserialize, Serialize};

/// The single terminal outcome of one remote call.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiResponse<B> {
    /// The call succeeded and returned a body.
    Success {
        /// Decoded response body.
        body: B,
    },
    /// The call succeeded but the server sent nothing back. Represents
    /// "no update available"; the local cache is preserved as-is.
    Empty,
    /// The call failed.
    Error {
        /// Human-readable failure description.
        message: String,
    },
}

impl<B> ApiResponse<B> {
    /// Creates an error outcome from any displayable cause.
    pub fn error(cause: impl std::fmt::Display) -> Self {
        Self::Error {
            message: cause.to_string(),
        }
    }

    /// Returns true for the `Success` tag.
    pub fn is_success(&self) -> bool {
        matches!(self, ApiResponse::Success { .. })
    }

    /// Maps the body type, leaving `Empty` and `Error` untouched.
    pub fn map<T>(self, f: impl FnOnce(B) -> T) -> ApiResponse<T> {
        match self {
            ApiResponse::Success { body } => ApiResponse::Success { body: f(body) },
            ApiResponse::Empty => ApiResponse::Empty,
            ApiResponse::Error { message } => ApiResponse::Error { message },
        }
    }
}

/// A recipe as the remote API serializes it.
///
/// The search endpoint omits `ingredients`; only a detail lookup
/// carries them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeDto {
    /// Natural key assigned by the API.
    pub recipe_id: String,
    /// Display title.
    pub title: String,
    /// Publisher name.
    pub publisher: String,
    /// URL of the preview image.
    pub image_url: String,
    /// Popularity rank.
    pub social_rank: f32,
    /// Ingredient lines; absent on summary rows.
    #[serde(default)]
    pub ingredients: Vec<String>,
}

impl RecipeDto {
    /// Converts the wire representation into the cached entity.
    ///
    /// The refresh timestamp starts at zero; the detail save path
    /// stamps it when it writes.
    pub fn into_recipe(self) -> Recipe {
        Recipe {
            id: self.recipe_id,
            title: self.title,
            publisher: self.publisher,
            image_url: self.image_url,
            social_rank: self.social_rank,
            ingredients: self.ingredients,
            last_refreshed_at: 0,
        }
    }
}

/// Body of the paginated search endpoint.
///
/// `recipes` is `null` when the credential has expired; that decodes
/// as a success with nothing to save, not as an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeSearchResponse {
    /// Number of results in this page, when the server reports it.
    #[serde(default)]
    pub count: Option<u32>,
    /// Summary rows for this page.
    #[serde(default)]
    pub recipes: Option<Vec<RecipeDto>>,
}

/// Body of the single-recipe lookup endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeLookupResponse {
    /// The requested recipe, or `null` on an expired credential.
    #[serde(default)]
    pub recipe: Option<RecipeDto>,
}
