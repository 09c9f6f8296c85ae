//! The strategy seam: four operations over two abstract data types.

use larder_api::ApiResponse;
use larder_core::CacheSubscription;

/// A cold, one-shot remote operation.
///
/// Nothing happens until [`execute`](Self::execute); building the call
/// twice via [`SyncStrategy::create_call`] starts two independent
/// network operations.
pub struct RemoteCall<B> {
    call: Box<dyn FnOnce() -> ApiResponse<B> + Send>,
}

impl<B> RemoteCall<B> {
    /// Wraps a closure that performs the remote round-trip.
    pub fn new(call: impl FnOnce() -> ApiResponse<B> + Send + 'static) -> Self {
        Self {
            call: Box::new(call),
        }
    }

    /// Performs the round-trip and returns its single terminal outcome.
    pub fn execute(self) -> ApiResponse<B> {
        (self.call)()
    }
}

impl<B> std::fmt::Debug for RemoteCall<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteCall").finish_non_exhaustive()
    }
}

/// Defines one synchronized resource.
///
/// `Cached` is the locally persisted shape served to observers; `Body`
/// is the remote response shape. The two meet in
/// [`save_call_result`](Self::save_call_result), the only operation
/// allowed to write the cache.
///
/// # Contracts
///
/// - [`should_fetch`](Self::should_fetch) must be a pure, synchronous
///   predicate with no side effects; the engine evaluates it exactly
///   once per observation, on the first cache value.
/// - [`save_call_result`](Self::save_call_result) must accept zero, one
///   or many items and must not report failures through this interface.
///   Persistence problems are logged and degrade to "no cache update";
///   they are not the request's error.
/// - [`load_from_cache`](Self::load_from_cache) must return a live
///   query that emits its current value immediately.
pub trait SyncStrategy: Send + 'static {
    /// The locally cached shape served to observers.
    type Cached: Clone + PartialEq + Send + 'static;
    /// The decoded remote response body.
    type Body: Send + 'static;

    /// Opens a live cache query for this resource.
    fn load_from_cache(&self) -> CacheSubscription<Self::Cached>;

    /// Decides whether the cached value is fresh enough to serve.
    fn should_fetch(&self, cached: &Self::Cached) -> bool;

    /// Builds the cold remote call for this resource.
    fn create_call(&self) -> RemoteCall<Self::Body>;

    /// Persists a successful response body to the cache.
    fn save_call_result(&self, body: Self::Body);
}
