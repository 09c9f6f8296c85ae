//! Error types for the remote source.

use thiserror::Error;

/// Failures that can occur while talking to the remote source.
///
/// These never escape a [`crate::RecipeApi`] call as `Err`; they are
/// rendered into the message of an [`crate::ApiResponse::Error`]
/// outcome so the synchronization layer can degrade to cached data.
#[derive(Error, Debug)]
pub enum ApiError {
    /// The request never produced an HTTP response (timeout,
    /// connectivity, DNS).
    #[error("transport error: {0}")]
    Transport(String),

    /// The server answered with a non-success status code.
    #[error("server returned status {0}")]
    Status(u16),

    /// The response body could not be decoded.
    #[error("failed to decode response: {0}")]
    Decode(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        assert_eq!(
            ApiError::Transport("connection refused".into()).to_string(),
            "transport error: connection refused"
        );
        assert_eq!(ApiError::Status(404).to_string(), "server returned status 404");
    }
}
