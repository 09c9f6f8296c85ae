//! End-to-end tests of the synchronization protocol over the in-memory
//! store and the mock remote source.

use larder_api::{ApiResponse, MockRecipeApi, RecipeDto, RecipeLookupResponse, RecipeSearchResponse};
use larder_core::{
    now_epoch_secs, CacheSubscription, MemoryRecipeStore, Recipe, RecipeStore, Resource,
};
use larder_sync::{observe, RecipeRepository, RemoteCall, ResourceStream, SyncConfig, SyncStrategy};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc;
use std::sync::Arc;
use std::time::Duration;

const DAY: i64 = 86_400;
const WAIT: Duration = Duration::from_secs(5);

fn dto(id: &str, title: &str, rank: f32) -> RecipeDto {
    RecipeDto {
        recipe_id: id.to_string(),
        title: title.to_string(),
        publisher: "pub".into(),
        image_url: format!("http://img/{id}.jpg"),
        social_rank: rank,
        ingredients: Vec::new(),
    }
}

fn cached(id: &str, title: &str, rank: f32, refreshed_at: i64) -> Recipe {
    Recipe {
        id: id.to_string(),
        title: title.to_string(),
        publisher: "pub".into(),
        image_url: format!("http://img/{id}.jpg"),
        social_rank: rank,
        ingredients: Vec::new(),
        last_refreshed_at: refreshed_at,
    }
}

fn search_page(dtos: Vec<RecipeDto>) -> ApiResponse<RecipeSearchResponse> {
    ApiResponse::Success {
        body: RecipeSearchResponse {
            count: Some(dtos.len() as u32),
            recipes: Some(dtos),
        },
    }
}

/// Collects states up to and including the first terminal one.
fn drain_until_terminal<T>(stream: &ResourceStream<T>) -> Vec<Resource<T>> {
    let mut states = Vec::new();
    while let Some(state) = stream.recv_timeout(WAIT) {
        let terminal = state.is_terminal();
        states.push(state);
        if terminal {
            break;
        }
    }
    states
}

fn repository(
    store: &MemoryRecipeStore,
    api: &Arc<MockRecipeApi>,
) -> RecipeRepository {
    RecipeRepository::new(
        Arc::new(store.clone()),
        Arc::clone(api) as Arc<dyn larder_api::RecipeApi>,
        SyncConfig::default(),
    )
}

#[test]
fn loading_is_emitted_before_any_cache_activity() {
    // A cache that never emits: the initial Loading must still arrive.
    struct SilentStrategy {
        _tx: mpsc::Sender<u32>,
        rx: Mutex<Option<mpsc::Receiver<u32>>>,
    }

    impl SyncStrategy for SilentStrategy {
        type Cached = u32;
        type Body = u32;

        fn load_from_cache(&self) -> CacheSubscription<u32> {
            CacheSubscription::from_channel(self.rx.lock().take().unwrap())
        }

        fn should_fetch(&self, _cached: &u32) -> bool {
            unreachable!("no cache value was ever delivered")
        }

        fn create_call(&self) -> RemoteCall<u32> {
            unreachable!("no fetch decision was ever made")
        }

        fn save_call_result(&self, _body: u32) {}
    }

    let (tx, rx) = mpsc::channel();
    let stream = observe(SilentStrategy {
        _tx: tx,
        rx: Mutex::new(Some(rx)),
    });
    assert_eq!(stream.recv_timeout(WAIT), Some(Resource::Loading(None)));
}

#[test]
fn fresh_cache_serves_without_fetch_or_error() {
    let store = MemoryRecipeStore::new();
    store
        .replace(cached("a", "Chicken soup", 90.0, now_epoch_secs() - DAY))
        .unwrap();
    let api = Arc::new(MockRecipeApi::new());
    let repo = repository(&store, &api);

    let states = drain_until_terminal(&repo.recipe("a"));

    assert_eq!(states.first(), Some(&Resource::Loading(None)));
    let last = states.last().unwrap();
    assert!(last.is_success(), "expected success, got {last:?}");
    assert_eq!(last.data().unwrap().as_ref().unwrap().title, "Chicken soup");
    assert!(states.iter().all(|s| !s.is_error()));
    assert_eq!(api.lookup_calls(), 0);
}

#[test]
fn stale_detail_fetches_saves_then_succeeds() {
    let store = MemoryRecipeStore::new();
    store
        .replace(cached("a", "Old title", 90.0, now_epoch_secs() - 31 * DAY))
        .unwrap();
    let api = Arc::new(MockRecipeApi::new());
    let mut full = dto("a", "New title", 95.0);
    full.ingredients = vec!["chicken".into(), "noodles".into()];
    api.push_lookup(ApiResponse::Success {
        body: RecipeLookupResponse { recipe: Some(full) },
    });
    let repo = repository(&store, &api);

    let states = drain_until_terminal(&repo.recipe("a"));

    // Everything before the terminal state is a Loading.
    let (terminal, prefix) = states.split_last().unwrap();
    assert!(prefix.iter().all(|s| s.is_loading()));

    // The terminal success reflects the saved row, so the write
    // happened strictly before this emission.
    let row = terminal.data().unwrap().as_ref().unwrap();
    assert!(terminal.is_success());
    assert_eq!(row.title, "New title");
    assert_eq!(row.ingredients.len(), 2);
    assert!(row.last_refreshed_at >= now_epoch_secs() - 60);

    assert_eq!(api.lookup_calls(), 1);
    let persisted = store.get("a").unwrap().unwrap();
    assert_eq!(persisted.title, "New title");
}

#[test]
fn absent_detail_row_fetches_and_inserts() {
    let store = MemoryRecipeStore::new();
    let api = Arc::new(MockRecipeApi::new());
    api.push_lookup(ApiResponse::Success {
        body: RecipeLookupResponse {
            recipe: Some(dto("a", "Fresh", 80.0)),
        },
    });
    let repo = repository(&store, &api);

    let states = drain_until_terminal(&repo.recipe("a"));
    let last = states.last().unwrap();
    assert!(last.is_success());
    assert_eq!(last.data().unwrap().as_ref().unwrap().title, "Fresh");
    assert!(store.get("a").unwrap().is_some());
}

/// Instrumented strategy over the real store: counts fetch decisions
/// and saves, and can mutate the cache from inside the remote call to
/// provoke interim notifications.
struct ProbeStrategy {
    store: MemoryRecipeStore,
    outcome: Mutex<Option<ApiResponse<RecipeSearchResponse>>>,
    mutate_during_call: Mutex<Option<Recipe>>,
    fetch_decisions: Arc<AtomicUsize>,
    saves: Arc<AtomicUsize>,
}

impl SyncStrategy for ProbeStrategy {
    type Cached = Vec<Recipe>;
    type Body = RecipeSearchResponse;

    fn load_from_cache(&self) -> CacheSubscription<Vec<Recipe>> {
        self.store.watch_search("", 1)
    }

    fn should_fetch(&self, _cached: &Vec<Recipe>) -> bool {
        self.fetch_decisions.fetch_add(1, Ordering::SeqCst);
        true
    }

    fn create_call(&self) -> RemoteCall<RecipeSearchResponse> {
        let store = self.store.clone();
        let outcome = self.outcome.lock().take().unwrap_or(ApiResponse::Empty);
        let mutation = self.mutate_during_call.lock().take();
        RemoteCall::new(move || {
            if let Some(recipe) = mutation {
                store.upsert(&[recipe]).unwrap();
            }
            outcome
        })
    }

    fn save_call_result(&self, body: RecipeSearchResponse) {
        self.saves.fetch_add(1, Ordering::SeqCst);
        if let Some(dtos) = body.recipes {
            let recipes: Vec<Recipe> = dtos.into_iter().map(|d| d.into_recipe()).collect();
            self.store.upsert(&recipes).unwrap();
        }
    }
}

#[test]
fn should_fetch_runs_once_despite_interim_notifications() {
    let store = MemoryRecipeStore::new();
    let fetch_decisions = Arc::new(AtomicUsize::new(0));
    let stream = observe(ProbeStrategy {
        store: store.clone(),
        outcome: Mutex::new(Some(ApiResponse::Empty)),
        // Committed mid-call: triggers an interim cache notification.
        mutate_during_call: Mutex::new(Some(cached("mid", "Mid call row", 5.0, 0))),
        fetch_decisions: Arc::clone(&fetch_decisions),
        saves: Arc::new(AtomicUsize::new(0)),
    });

    let states = drain_until_terminal(&stream);
    assert!(states.last().unwrap().is_success());
    assert_eq!(fetch_decisions.load(Ordering::SeqCst), 1);
}

#[test]
fn save_runs_exactly_once_and_before_success() {
    let store = MemoryRecipeStore::new();
    let saves = Arc::new(AtomicUsize::new(0));
    let stream = observe(ProbeStrategy {
        store: store.clone(),
        outcome: Mutex::new(Some(search_page(vec![dto("a", "Saved row", 9.0)]))),
        mutate_during_call: Mutex::new(None),
        fetch_decisions: Arc::new(AtomicUsize::new(0)),
        saves: Arc::clone(&saves),
    });

    let states = drain_until_terminal(&stream);
    let last = states.last().unwrap();
    assert!(last.is_success());
    // The first Success already carries the saved row: the write
    // completed before the post-fetch emission began.
    assert_eq!(last.data().unwrap()[0].title, "Saved row");
    assert_eq!(saves.load(Ordering::SeqCst), 1);
}

#[test]
fn remote_error_keeps_cache_and_skips_write() {
    let store = MemoryRecipeStore::new();
    store.replace(cached("a", "Chicken soup", 90.0, 0)).unwrap();
    let api = Arc::new(MockRecipeApi::new());
    api.push_search(ApiResponse::error("Unable to resolve host"));
    let repo = repository(&store, &api);

    let stream = repo.search_recipes("chicken", 1);
    let states = drain_until_terminal(&stream);

    let last = states.last().unwrap();
    assert_eq!(last.error_message(), Some("Unable to resolve host"));
    // The previously loaded cache value is re-emitted wrapped as Error.
    assert_eq!(last.data().unwrap().len(), 1);
    assert_eq!(store.len(), 1);

    // The errored stream stays subscribed: a later cache commit is
    // re-delivered under the same error tag.
    store.upsert(&[cached("b", "Chicken pie", 80.0, 0)]).unwrap();
    let follow_up = stream.recv_timeout(WAIT).unwrap();
    assert_eq!(follow_up.error_message(), Some("Unable to resolve host"));
    assert_eq!(follow_up.data().unwrap().len(), 2);
}

#[test]
fn empty_body_ends_in_success_with_unchanged_cache() {
    let store = MemoryRecipeStore::new();
    let before = cached("a", "Chicken soup", 90.0, 1_700_000_000);
    store.replace(before.clone()).unwrap();
    let api = Arc::new(MockRecipeApi::new());
    api.push_search(ApiResponse::Empty);
    let repo = repository(&store, &api);

    let states = drain_until_terminal(&repo.search_recipes("chicken", 1));
    let last = states.last().unwrap();
    assert!(last.is_success());
    assert_eq!(last.data().unwrap(), &vec![before.clone()]);
    assert_eq!(store.get("a").unwrap(), Some(before));
}

#[test]
fn conflicting_rows_get_summary_update_only() {
    let store = MemoryRecipeStore::new();
    let mut enriched = cached("a", "Old title", 90.0, 1_700_000_000);
    enriched.ingredients = vec!["chicken".into(), "noodles".into()];
    store.replace(enriched).unwrap();

    let api = Arc::new(MockRecipeApi::new());
    api.push_search(search_page(vec![
        dto("a", "New title", 95.0),
        dto("b", "Brand new", 70.0),
    ]));
    let repo = repository(&store, &api);

    let states = drain_until_terminal(&repo.search_recipes("", 1));
    assert!(states.last().unwrap().is_success());

    // The conflicting row was refreshed, not overwritten.
    let row = store.get("a").unwrap().unwrap();
    assert_eq!(row.title, "New title");
    assert_eq!(row.social_rank, 95.0);
    assert_eq!(row.ingredients.len(), 2);
    assert_eq!(row.last_refreshed_at, 1_700_000_000);
    // The new row was inserted.
    assert!(store.get("b").unwrap().is_some());
}

#[test]
fn null_row_list_saves_nothing() {
    let store = MemoryRecipeStore::new();
    let api = Arc::new(MockRecipeApi::new());
    api.push_search(ApiResponse::Success {
        body: RecipeSearchResponse {
            count: None,
            recipes: None,
        },
    });
    let repo = repository(&store, &api);

    let states = drain_until_terminal(&repo.search_recipes("anything", 1));
    let last = states.last().unwrap();
    assert!(last.is_success());
    assert!(last.data().unwrap().is_empty());
    assert!(store.is_empty());
}
