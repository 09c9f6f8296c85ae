//! HTTP binding for the remote source.
//!
//! The actual HTTP client is abstracted via a trait to allow different
//! implementations (reqwest, ureq, a loopback for tests). This crate
//! only builds request URLs and maps replies into [`ApiResponse`]
//! outcomes; socket behaviour, including the configured timeouts,
//! belongs to the client implementation.

use crate::config::ApiConfig;
use crate::error::ApiError;
use crate::response::{ApiResponse, RecipeLookupResponse, RecipeSearchResponse};
use crate::source::RecipeApi;
use serde::de::DeserializeOwned;

/// A successful HTTP exchange as seen by the client.
#[derive(Debug, Clone)]
pub struct HttpReply {
    /// HTTP status code.
    pub status: u16,
    /// Raw response body.
    pub body: Vec<u8>,
}

/// HTTP client abstraction.
///
/// Implement this trait to provide the actual transport. `Err` means
/// the request never produced a response (timeout, connectivity);
/// non-success status codes come back as an `Ok` reply and are mapped
/// by the caller. Implementations should honour the timeouts from
/// [`ApiConfig`].
pub trait HttpClient: Send + Sync {
    /// Sends a GET request and returns the reply.
    fn get(&self, url: &str) -> Result<HttpReply, String>;

    /// Checks if the client is connected/healthy.
    fn is_healthy(&self) -> bool;
}

/// [`RecipeApi`] implementation over a pluggable [`HttpClient`].
pub struct HttpRecipeApi<C: HttpClient> {
    config: ApiConfig,
    client: C,
}

impl<C: HttpClient> HttpRecipeApi<C> {
    /// Creates a new HTTP-backed recipe source.
    pub fn new(config: ApiConfig, client: C) -> Self {
        Self { config, client }
    }

    /// Returns the configuration in use.
    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    fn get_json<T: DeserializeOwned>(&self, url: &str) -> ApiResponse<T> {
        if !self.client.is_healthy() {
            return ApiResponse::error(ApiError::Transport("client unhealthy".into()));
        }

        let reply = match self.client.get(url) {
            Ok(reply) => reply,
            Err(cause) => {
                tracing::debug!(url, %cause, "remote call failed in transport");
                return ApiResponse::error(ApiError::Transport(cause));
            }
        };

        if !(200..300).contains(&reply.status) {
            return ApiResponse::error(ApiError::Status(reply.status));
        }

        let trimmed = reply.body.trim_ascii();
        if trimmed.is_empty() || trimmed == b"null" {
            return ApiResponse::Empty;
        }

        match serde_json::from_slice(trimmed) {
            Ok(body) => ApiResponse::Success { body },
            Err(cause) => ApiResponse::error(ApiError::Decode(cause.to_string())),
        }
    }
}

impl<C: HttpClient> RecipeApi for HttpRecipeApi<C> {
    fn search_recipes(&self, query: &str, page: u32) -> ApiResponse<RecipeSearchResponse> {
        let url = format!(
            "{}/api/search?key={}&q={}&page={}",
            self.config.base_url,
            encode_query(&self.config.api_key),
            encode_query(query),
            page
        );
        self.get_json(&url)
    }

    fn get_recipe(&self, id: &str) -> ApiResponse<RecipeLookupResponse> {
        let url = format!(
            "{}/api/get?key={}&rId={}",
            self.config.base_url,
            encode_query(&self.config.api_key),
            encode_query(id)
        );
        self.get_json(&url)
    }
}

/// Percent-encodes a query parameter value.
fn encode_query(value: &str) -> String {
    let mut encoded = String::with_capacity(value.len());
    for byte in value.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                encoded.push(byte as char);
            }
            _ => {
                encoded.push('%');
                encoded.push_str(&format!("{byte:02X}"));
            }
        }
    }
    encoded
}
