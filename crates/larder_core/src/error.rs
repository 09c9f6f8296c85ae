//! Error types for the cache store.

use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur in a cache store backend.
///
/// The bundled in-memory store never fails, but the [`crate::RecipeStore`]
/// trait admits fallible backends (an embedded database, a file-backed
/// table). Callers in the synchronization layer treat any of these as
/// "no cache update" rather than failing the request.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The store has been closed and no longer accepts operations.
    #[error("store is closed")]
    Closed,

    /// The storage backend rejected the operation.
    #[error("storage backend error: {0}")]
    Backend(String),
}

impl StoreError {
    /// Creates a backend error from any displayable cause.
    pub fn backend(cause: impl std::fmt::Display) -> Self {
        Self::Backend(cause.to_string())
    }
}
