//! # Larder API
//!
//! Remote recipe source abstraction and wire types for larder.
//!
//! This crate provides:
//! - The [`RecipeApi`] trait, the seam to the remote authoritative source
//! - [`ApiResponse`], the single terminal outcome of one remote call
//! - JSON wire types for the search and lookup endpoints
//! - An HTTP binding over a pluggable [`HttpClient`]
//! - A mock source for tests and demos
//!
//! A remote call yields exactly one of three outcomes: success with a
//! body, success with an empty body ("no update available"), or an
//! error with a message. There is no automatic retry; a timeout or
//! transport failure surfaces as a single error outcome.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod error;
mod http;
mod mock;
mod response;
mod source;

pub use config::ApiConfig;
pub use error::ApiError;
pub use http::{HttpClient, HttpRecipeApi, HttpReply};
pub use mock::MockRecipeApi;
pub use response::{ApiResponse, RecipeDto, RecipeLookupResponse, RecipeSearchResponse};
pub use source::RecipeApi;
