//! Cache store interface and in-memory implementation.
//!
//! The store is the shared, multiply-read, multiply-written resource of
//! the system. It offers point-in-time queries for one-shot reads and
//! *live* queries for observers: a live query emits its current value
//! immediately and re-emits after every committed write, in the manner
//! of a database invalidation tracker. Watchers are held as channel
//! senders and pruned when the receiving side disconnects.

use crate::error::StoreResult;
use crate::recipe::Recipe;
use parking_lot::RwLock;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering as AtomicOrdering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::time::Duration;

/// Maximum rows contributed by one result page.
///
/// Paginated queries are cumulative: page `n` returns up to
/// `n * RESULTS_PER_PAGE` rows, so the presented list grows without the
/// caller stitching pages together.
pub const RESULTS_PER_PAGE: u32 = 30;

/// Per-item outcome of a batch cache write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    /// The row was inserted; carries the assigned row id.
    Inserted(i64),
    /// A row with the same natural key already exists; nothing was
    /// written. The caller decides whether to follow up with a partial
    /// update.
    Conflict,
}

/// Unregisters a watcher when dropped.
///
/// Unregistration is eager: after the guard drops, the store will not
/// deliver any further values for that watcher.
pub struct WatchGuard {
    unregister: Option<Box<dyn FnOnce() + Send>>,
}

impl WatchGuard {
    /// Creates a guard that runs `unregister` on drop.
    pub fn new(unregister: impl FnOnce() + Send + 'static) -> Self {
        Self {
            unregister: Some(Box::new(unregister)),
        }
    }

    /// Creates a guard with nothing to unregister.
    ///
    /// Used by subscriptions built over a bare channel (tests, adapters).
    pub fn noop() -> Self {
        Self { unregister: None }
    }
}

impl Drop for WatchGuard {
    fn drop(&mut self) {
        if let Some(unregister) = self.unregister.take() {
            unregister();
        }
    }
}

impl fmt::Debug for WatchGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WatchGuard")
            .field("armed", &self.unregister.is_some())
            .finish()
    }
}

/// A live query subscription.
///
/// Emits the value current at subscription time, then one value per
/// committed store write. Dropping the subscription (or splitting it
/// with [`into_parts`](Self::into_parts) and dropping the guard)
/// unregisters the watcher.
#[derive(Debug)]
pub struct CacheSubscription<T> {
    rx: Receiver<T>,
    guard: WatchGuard,
}

impl<T> CacheSubscription<T> {
    /// Creates a subscription from a receiver and its watcher guard.
    pub fn new(rx: Receiver<T>, guard: WatchGuard) -> Self {
        Self { rx, guard }
    }

    /// Creates a subscription over a bare channel with no watcher to
    /// unregister.
    pub fn from_channel(rx: Receiver<T>) -> Self {
        Self::new(rx, WatchGuard::noop())
    }

    /// Blocks for the next value. Returns `None` once the source is
    /// disconnected.
    pub fn recv(&self) -> Option<T> {
        self.rx.recv().ok()
    }

    /// Blocks for the next value with a timeout.
    pub fn recv_timeout(&self, timeout: Duration) -> Option<T> {
        match self.rx.recv_timeout(timeout) {
            Ok(value) => Some(value),
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => None,
        }
    }

    /// Splits the subscription into its receiver and guard so they can
    /// live on different threads. The watcher stays registered until
    /// the guard drops.
    pub fn into_parts(self) -> (Receiver<T>, WatchGuard) {
        (self.rx, self.guard)
    }
}

/// Cache interface over persisted recipes.
///
/// Implementations must make each write atomic with respect to
/// readers and must deliver change notifications to every registered
/// watcher after a commit. No further locking is imposed by callers.
pub trait RecipeStore: Send + Sync {
    /// Point-in-time paginated query ordered by social rank descending.
    ///
    /// Pages are cumulative: page `n` returns up to
    /// `n * RESULTS_PER_PAGE` matching rows.
    fn search(&self, query: &str, page: u32) -> StoreResult<Vec<Recipe>>;

    /// Point lookup by natural key.
    fn get(&self, id: &str) -> StoreResult<Option<Recipe>>;

    /// Inserts each recipe that is not already present, reporting a
    /// per-item outcome order-aligned with the input. Existing rows are
    /// left untouched.
    fn upsert(&self, recipes: &[Recipe]) -> StoreResult<Vec<UpsertOutcome>>;

    /// Unconditionally writes the full row, replacing any existing one.
    fn replace(&self, recipe: Recipe) -> StoreResult<()>;

    /// Updates only the summary fields of an existing row, leaving
    /// `ingredients` and `last_refreshed_at` untouched. Missing rows
    /// are ignored.
    fn update_summary(
        &self,
        id: &str,
        title: &str,
        publisher: &str,
        image_url: &str,
        social_rank: f32,
    ) -> StoreResult<()>;

    /// Live variant of [`search`](Self::search).
    fn watch_search(&self, query: &str, page: u32) -> CacheSubscription<Vec<Recipe>>;

    /// Live variant of [`get`](Self::get).
    fn watch_recipe(&self, id: &str) -> CacheSubscription<Option<Recipe>>;
}

struct SearchWatcher {
    id: u64,
    query: String,
    page: u32,
    tx: Sender<Vec<Recipe>>,
}

struct RecipeWatcher {
    id: u64,
    recipe_id: String,
    tx: Sender<Option<Recipe>>,
}

#[derive(Default)]
struct Watchers {
    search: Vec<SearchWatcher>,
    recipe: Vec<RecipeWatcher>,
}

struct Shared {
    rows: RwLock<HashMap<String, Recipe>>,
    watchers: RwLock<Watchers>,
    next_watcher_id: AtomicU64,
    next_row_id: AtomicI64,
}

/// In-memory [`RecipeStore`] with change notifications.
///
/// Suitable as the cache for a single process; clones share the same
/// underlying table.
#[derive(Clone)]
pub struct MemoryRecipeStore {
    shared: Arc<Shared>,
}

impl MemoryRecipeStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Shared {
                rows: RwLock::new(HashMap::new()),
                watchers: RwLock::new(Watchers::default()),
                next_watcher_id: AtomicU64::new(1),
                next_row_id: AtomicI64::new(1),
            }),
        }
    }

    /// Returns the number of rows currently cached.
    pub fn len(&self) -> usize {
        self.shared.rows.read().len()
    }

    /// Returns true if no rows are cached.
    pub fn is_empty(&self) -> bool {
        self.shared.rows.read().is_empty()
    }

    /// Returns the number of registered watchers (both kinds).
    pub fn watcher_count(&self) -> usize {
        let watchers = self.shared.watchers.read();
        watchers.search.len() + watchers.recipe.len()
    }

    fn run_search(rows: &HashMap<String, Recipe>, query: &str, page: u32) -> Vec<Recipe> {
        let needle = query.trim().to_lowercase();
        let mut matched: Vec<Recipe> = rows
            .values()
            .filter(|recipe| Self::matches(recipe, &needle))
            .cloned()
            .collect();
        matched.sort_by(|a, b| {
            b.social_rank
                .partial_cmp(&a.social_rank)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.id.cmp(&b.id))
        });
        let limit = (page.max(1) as usize) * RESULTS_PER_PAGE as usize;
        matched.truncate(limit);
        matched
    }

    fn matches(recipe: &Recipe, needle: &str) -> bool {
        if needle.is_empty() {
            return true;
        }
        recipe.title.to_lowercase().contains(needle)
            || recipe
                .ingredients
                .iter()
                .any(|ingredient| ingredient.to_lowercase().contains(needle))
    }

    /// Re-runs every registered live query and delivers the results.
    /// Disconnected watchers are pruned.
    fn notify(&self) {
        let mut watchers = self.shared.watchers.write();
        let rows = self.shared.rows.read();
        watchers
            .search
            .retain(|w| w.tx.send(Self::run_search(&rows, &w.query, w.page)).is_ok());
        watchers
            .recipe
            .retain(|w| w.tx.send(rows.get(&w.recipe_id).cloned()).is_ok());
        tracing::trace!(
            search_watchers = watchers.search.len(),
            recipe_watchers = watchers.recipe.len(),
            "store notified watchers"
        );
    }

    fn next_watcher_id(&self) -> u64 {
        self.shared.next_watcher_id.fetch_add(1, AtomicOrdering::SeqCst)
    }
}

impl Default for MemoryRecipeStore {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for MemoryRecipeStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryRecipeStore")
            .field("rows", &self.len())
            .field("watchers", &self.watcher_count())
            .finish()
    }
}

impl RecipeStore for MemoryRecipeStore {
    fn search(&self, query: &str, page: u32) -> StoreResult<Vec<Recipe>> {
        let rows = self.shared.rows.read();
        Ok(Self::run_search(&rows, query, page))
    }

    fn get(&self, id: &str) -> StoreResult<Option<Recipe>> {
        Ok(self.shared.rows.read().get(id).cloned())
    }

    fn upsert(&self, recipes: &[Recipe]) -> StoreResult<Vec<UpsertOutcome>> {
        if recipes.is_empty() {
            return Ok(Vec::new());
        }
        let outcomes: Vec<UpsertOutcome> = {
            let mut rows = self.shared.rows.write();
            recipes
                .iter()
                .map(|recipe| {
                    if rows.contains_key(&recipe.id) {
                        UpsertOutcome::Conflict
                    } else {
                        rows.insert(recipe.id.clone(), recipe.clone());
                        let row_id =
                            self.shared.next_row_id.fetch_add(1, AtomicOrdering::SeqCst);
                        UpsertOutcome::Inserted(row_id)
                    }
                })
                .collect()
        };
        self.notify();
        Ok(outcomes)
    }

    fn replace(&self, recipe: Recipe) -> StoreResult<()> {
        self.shared.rows.write().insert(recipe.id.clone(), recipe);
        self.notify();
        Ok(())
    }

    fn update_summary(
        &self,
        id: &str,
        title: &str,
        publisher: &str,
        image_url: &str,
        social_rank: f32,
    ) -> StoreResult<()> {
        let updated = {
            let mut rows = self.shared.rows.write();
            match rows.get_mut(id) {
                Some(row) => {
                    row.title = title.to_string();
                    row.publisher = publisher.to_string();
                    row.image_url = image_url.to_string();
                    row.social_rank = social_rank;
                    true
                }
                None => false,
            }
        };
        if updated {
            self.notify();
        }
        Ok(())
    }

    fn watch_search(&self, query: &str, page: u32) -> CacheSubscription<Vec<Recipe>> {
        let (tx, rx) = mpsc::channel();
        let id = self.next_watcher_id();
        {
            let mut watchers = self.shared.watchers.write();
            let rows = self.shared.rows.read();
            let _ = tx.send(Self::run_search(&rows, query, page));
            watchers.search.push(SearchWatcher {
                id,
                query: query.to_string(),
                page,
                tx,
            });
        }
        let shared = Arc::downgrade(&self.shared);
        CacheSubscription::new(
            rx,
            WatchGuard::new(move || {
                if let Some(shared) = shared.upgrade() {
                    shared.watchers.write().search.retain(|w| w.id != id);
                }
            }),
        )
    }

    fn watch_recipe(&self, id: &str) -> CacheSubscription<Option<Recipe>> {
        let (tx, rx) = mpsc::channel();
        let watcher_id = self.next_watcher_id();
        {
            let mut watchers = self.shared.watchers.write();
            let rows = self.shared.rows.read();
            let _ = tx.send(rows.get(id).cloned());
            watchers.recipe.push(RecipeWatcher {
                id: watcher_id,
                recipe_id: id.to_string(),
                tx,
            });
        }
        let shared = Arc::downgrade(&self.shared);
        CacheSubscription::new(
            rx,
            WatchGuard::new(move || {
                if let Some(shared) = shared.upgrade() {
                    shared.watchers.write().recipe.retain(|w| w.id != watcher_id);
                }
            }),
        )
    }
}
