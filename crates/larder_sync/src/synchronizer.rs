//! The synchronization state machine.
//!
//! The original shape of this problem is a pair of observers rewiring
//! each other (watch cache, decide, watch cache + remote, rewire on the
//! outcome). Here it is an explicit machine instead: a shared emitter
//! holds the single current phase plus a subscription epoch, a worker
//! thread drives the protocol, and every emission funnels through one
//! channel so downstream sees a single consistent order.

use crate::strategy::SyncStrategy;
use larder_api::ApiResponse;
use larder_core::Resource;
use parking_lot::Mutex;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// The ordered state stream of one observation.
///
/// Dropping the stream ends the observation; an in-flight cache write
/// still completes and becomes visible to future observations through
/// the normal cache-notification path.
#[derive(Debug)]
pub struct ResourceStream<T> {
    rx: Receiver<Resource<T>>,
}

impl<T> ResourceStream<T> {
    /// Blocks for the next state. Returns `None` once the observation
    /// has ended.
    pub fn recv(&self) -> Option<Resource<T>> {
        self.rx.recv().ok()
    }

    /// Blocks for the next state with a timeout.
    pub fn recv_timeout(&self, timeout: Duration) -> Option<Resource<T>> {
        match self.rx.recv_timeout(timeout) {
            Ok(state) => Some(state),
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => None,
        }
    }

    /// Iterates over states without consuming the stream.
    pub fn iter(&self) -> impl Iterator<Item = Resource<T>> + '_ {
        self.rx.iter()
    }
}

impl<T> IntoIterator for ResourceStream<T> {
    type Item = Resource<T>;
    type IntoIter = mpsc::IntoIter<Resource<T>>;

    fn into_iter(self) -> Self::IntoIter {
        self.rx.into_iter()
    }
}

/// How a raw cache value is wrapped for emission.
#[derive(Debug, Clone)]
enum Phase {
    /// Remote call outstanding: wrap as `Loading(value)`.
    Loading,
    /// Cache is the source of truth: wrap as `Success(value)`.
    Success,
    /// Remote call failed: wrap as `Error(message, value)`.
    Error(String),
}

struct EmitterInner<T> {
    tx: Sender<Resource<T>>,
    phase: Phase,
    /// Bumped on every subscription rewire; values stamped with an
    /// older epoch belong to a superseded cache source and are dropped.
    epoch: u64,
    /// Set once a terminal tag has been emitted; suppresses any late
    /// `Loading`.
    sealed: bool,
    /// Downstream receiver still attached.
    open: bool,
    last_emitted: Option<Resource<T>>,
    last_cache: Option<T>,
}

/// Serializes all emissions of one observation and enforces the
/// ordering invariants.
struct Emitter<T> {
    inner: Mutex<EmitterInner<T>>,
}

impl<T: Clone + PartialEq> Emitter<T> {
    fn new(tx: Sender<Resource<T>>) -> Self {
        Self {
            inner: Mutex::new(EmitterInner {
                tx,
                phase: Phase::Loading,
                epoch: 0,
                sealed: false,
                open: true,
                last_emitted: None,
                last_cache: None,
            }),
        }
    }

    /// Emits a state directly, subject to the seal and dedup rules.
    /// Returns false once downstream has detached.
    fn emit(&self, state: Resource<T>) -> bool {
        let mut inner = self.inner.lock();
        Self::push(&mut inner, state)
    }

    /// Emits a cache value wrapped for the current phase, unless its
    /// subscription epoch has been superseded.
    fn emit_cache(&self, epoch: u64, value: T) -> bool {
        let mut inner = self.inner.lock();
        if epoch != inner.epoch {
            return inner.open;
        }
        inner.last_cache = Some(value.clone());
        let state = match &inner.phase {
            Phase::Loading => Resource::Loading(Some(value)),
            Phase::Success => Resource::Success(value),
            Phase::Error(message) => Resource::Error {
                message: message.clone(),
                data: Some(value),
            },
        };
        Self::push(&mut inner, state)
    }

    /// Swaps in a new phase for a replacement cache subscription and
    /// returns the new epoch. Values from the old subscription become
    /// stale atomically with the phase change.
    fn rewire(&self, phase: Phase) -> u64 {
        let mut inner = self.inner.lock();
        inner.phase = phase;
        inner.epoch += 1;
        inner.epoch
    }

    /// Changes the phase while keeping the current subscription.
    fn set_phase(&self, phase: Phase) {
        self.inner.lock().phase = phase;
    }

    /// Records the first cache value so an early failure can still
    /// carry it.
    fn seed_cache(&self, value: T) {
        self.inner.lock().last_cache = Some(value);
    }

    /// Emits an error carrying the last known cached value.
    fn fail(&self, message: &str) -> bool {
        let mut inner = self.inner.lock();
        let data = inner.last_cache.clone();
        Self::push(
            &mut inner,
            Resource::Error {
                message: message.to_string(),
                data,
            },
        )
    }

    fn push(inner: &mut EmitterInner<T>, state: Resource<T>) -> bool {
        if !inner.open {
            return false;
        }
        if inner.sealed && state.is_loading() {
            return true;
        }
        if inner.last_emitted.as_ref() == Some(&state) {
            return true;
        }
        if state.is_terminal() {
            inner.sealed = true;
        }
        if inner.tx.send(state.clone()).is_err() {
            inner.open = false;
            return false;
        }
        inner.last_emitted = Some(state);
        true
    }
}

/// Runs the synchronization protocol for one logical request.
///
/// Emits `Loading(None)` synchronously before any I/O, then drives the
/// rest on a worker thread:
///
/// 1. Read the first cache value and evaluate the staleness predicate
///    exactly once.
/// 2. Fresh: resubscribe and serve `Success` per cache notification.
/// 3. Stale: resubscribe and serve interim values as `Loading` while a
///    single remote call is outstanding, then
///    - success with body: unsubscribe, save, resubscribe, serve
///      `Success`;
///    - success with empty body: unsubscribe, resubscribe, serve
///      `Success` without writing;
///    - error: keep the subscription and serve `Error` with the last
///      known value.
///
/// The stream is cold in the sense that each call runs the full
/// protocol independently; callers wanting a second run call `observe`
/// again. Overlapping observations of the same resource are the
/// caller's responsibility to prevent.
pub fn observe<S: SyncStrategy>(strategy: S) -> ResourceStream<S::Cached> {
    let (tx, rx) = mpsc::channel();
    let emitter = Arc::new(Emitter::new(tx));
    emitter.emit(Resource::Loading(None));

    thread::spawn(move || run(strategy, emitter));

    ResourceStream { rx }
}

fn run<S: SyncStrategy>(strategy: S, emitter: Arc<Emitter<S::Cached>>) {
    // One-shot fetch decision on the first cache value. The scoped
    // subscription is dropped (unregistered) before any resubscription.
    let first = {
        let sub = strategy.load_from_cache();
        sub.recv()
    };
    let Some(v0) = first else {
        return;
    };

    if !strategy.should_fetch(&v0) {
        tracing::debug!("cache is fresh, serving without fetch");
        let epoch = emitter.rewire(Phase::Success);
        let sub = strategy.load_from_cache();
        while let Some(value) = sub.recv() {
            if !emitter.emit_cache(epoch, value) {
                break;
            }
        }
        return;
    }

    tracing::debug!("cache is stale or absent, fetching");
    emitter.seed_cache(v0);

    // Keep stale data visible while the call is outstanding: a helper
    // forwards interim cache values, stamped with this epoch. The
    // watcher guard stays with the worker so the success paths can
    // unsubscribe eagerly; the error path parks it with the helper
    // instead (see below).
    let epoch = emitter.rewire(Phase::Loading);
    let (interim_rx, interim_guard) = strategy.load_from_cache().into_parts();
    let (guard_tx, guard_rx) = mpsc::channel::<larder_core::WatchGuard>();
    {
        let emitter = Arc::clone(&emitter);
        thread::spawn(move || {
            // Dropping guard_rx at exit releases a parked guard, which
            // unregisters the watcher.
            let _parked = guard_rx;
            while let Ok(value) = interim_rx.recv() {
                if !emitter.emit_cache(epoch, value) {
                    break;
                }
            }
        });
    }

    match strategy.create_call().execute() {
        ApiResponse::Success { body } => {
            // Unsubscribe both sources, write through the cache, then
            // resubscribe so the post-save values flow as Success.
            drop(interim_guard);
            strategy.save_call_result(body);
            tracing::debug!("remote body saved, serving refreshed cache");
            let epoch = emitter.rewire(Phase::Success);
            let sub = strategy.load_from_cache();
            while let Some(value) = sub.recv() {
                if !emitter.emit_cache(epoch, value) {
                    break;
                }
            }
        }
        ApiResponse::Empty => {
            // No update available; the cache stays as-is.
            drop(interim_guard);
            tracing::debug!("remote had nothing newer, serving cache");
            let epoch = emitter.rewire(Phase::Success);
            let sub = strategy.load_from_cache();
            while let Some(value) = sub.recv() {
                if !emitter.emit_cache(epoch, value) {
                    break;
                }
            }
        }
        ApiResponse::Error { message } => {
            // Keep the existing cache subscription; the helper now
            // forwards values wrapped as Error. The watcher guard is
            // parked with the helper so it is released when the error
            // tail ends; if the helper is already gone the send fails
            // and the guard drops here.
            tracing::debug!(%message, "remote call failed, degrading to cached data");
            emitter.set_phase(Phase::Error(message.clone()));
            emitter.fail(&message);
            let _ = guard_tx.send(interim_guard);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn channel_emitter() -> (Arc<Emitter<u32>>, Receiver<Resource<u32>>) {
        let (tx, rx) = mpsc::channel();
        (Arc::new(Emitter::new(tx)), rx)
    }

    #[test]
    fn duplicate_states_are_suppressed() {
        let (emitter, rx) = channel_emitter();
        assert!(emitter.emit(Resource::Loading(None)));
        assert!(emitter.emit(Resource::Loading(None)));
        assert!(emitter.emit(Resource::Loading(Some(1))));

        drop(emitter);
        let seen: Vec<_> = rx.iter().collect();
        assert_eq!(seen, vec![Resource::Loading(None), Resource::Loading(Some(1))]);
    }

    #[test]
    fn loading_is_sealed_after_terminal() {
        let (emitter, rx) = channel_emitter();
        let epoch = emitter.rewire(Phase::Success);
        assert!(emitter.emit_cache(epoch, 1));
        // A straggling loading wrap must not resurface.
        assert!(emitter.emit(Resource::Loading(Some(2))));
        assert!(emitter.emit_cache(epoch, 3));

        drop(emitter);
        let seen: Vec<_> = rx.iter().collect();
        assert_eq!(seen, vec![Resource::Success(1), Resource::Success(3)]);
    }

    #[test]
    fn stale_epoch_values_are_dropped() {
        let (emitter, rx) = channel_emitter();
        let old = emitter.rewire(Phase::Loading);
        let new = emitter.rewire(Phase::Success);
        assert!(emitter.emit_cache(old, 1));
        assert!(emitter.emit_cache(new, 2));

        drop(emitter);
        let seen: Vec<_> = rx.iter().collect();
        assert_eq!(seen, vec![Resource::Success(2)]);
    }

    #[test]
    fn fail_carries_last_known_value() {
        let (emitter, rx) = channel_emitter();
        let epoch = emitter.rewire(Phase::Loading);
        assert!(emitter.emit_cache(epoch, 41));
        assert!(emitter.fail("remote down"));

        drop(emitter);
        let seen: Vec<_> = rx.iter().collect();
        assert_eq!(
            seen,
            vec![
                Resource::Loading(Some(41)),
                Resource::Error {
                    message: "remote down".into(),
                    data: Some(41),
                },
            ]
        );
    }

    #[test]
    fn emit_reports_detached_downstream() {
        let (emitter, rx) = channel_emitter();
        drop(rx);
        assert!(!emitter.emit(Resource::Loading(None)));
    }
}
