//! Tagged request state.

/// The state of one logical request against a synchronized resource.
///
/// A request's stream of states is always a non-empty prefix of
/// `Loading*, (Success* | Error*)`: `Loading` may repeat while the
/// cache notifies, but once a terminal tag appears no `Loading` is
/// emitted again for that stream.
///
/// `Loading` and `Error` carry the best currently-known cached value,
/// which may be absent. `Success` always carries data.
#[derive(Debug, Clone, PartialEq)]
pub enum Resource<T> {
    /// The request is in flight; `data` is the last known cached value.
    Loading(Option<T>),
    /// The request settled with fresh data.
    Success(T),
    /// The request failed; `data` preserves the last known cached value.
    Error {
        /// Human-readable failure description.
        message: String,
        /// Last known cached value, if any.
        data: Option<T>,
    },
}

impl<T> Resource<T> {
    /// Creates an error state.
    pub fn error(message: impl Into<String>, data: Option<T>) -> Self {
        Self::Error {
            message: message.into(),
            data,
        }
    }

    /// Returns the carried data, if any.
    pub fn data(&self) -> Option<&T> {
        match self {
            Resource::Loading(data) => data.as_ref(),
            Resource::Success(data) => Some(data),
            Resource::Error { data, .. } => data.as_ref(),
        }
    }

    /// Consumes the state and returns the carried data, if any.
    pub fn into_data(self) -> Option<T> {
        match self {
            Resource::Loading(data) => data,
            Resource::Success(data) => Some(data),
            Resource::Error { data, .. } => data,
        }
    }

    /// Returns the error message if this is an `Error` state.
    pub fn error_message(&self) -> Option<&str> {
        match self {
            Resource::Error { message, .. } => Some(message),
            _ => None,
        }
    }

    /// Returns true for the `Loading` tag.
    pub fn is_loading(&self) -> bool {
        matches!(self, Resource::Loading(_))
    }

    /// Returns true for the `Success` tag.
    pub fn is_success(&self) -> bool {
        matches!(self, Resource::Success(_))
    }

    /// Returns true for the `Error` tag.
    pub fn is_error(&self) -> bool {
        matches!(self, Resource::Error { .. })
    }

    /// Returns true once the request has settled (success or error).
    pub fn is_terminal(&self) -> bool {
        !self.is_loading()
    }
}
