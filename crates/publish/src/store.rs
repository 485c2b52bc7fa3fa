//! Injectable state store with a generation counter.

use std::sync::Mutex;

use tokio::sync::watch;

use crate::state::{StateChange, UploadState};

/// Consistent read of the state and the current generation.
#[derive(Debug, Clone)]
pub struct StoreSnapshot {
    pub state: UploadState,
    pub generation: u64,
}

struct StoreInner {
    state: UploadState,
    generation: u64,
}

/// Holds the publish state and the attempt generation counter.
///
/// All mutation goes through [`apply`](Self::apply),
/// [`next_generation`](Self::next_generation) and
/// [`begin_attempt`](Self::begin_attempt); each takes the lock once and never
/// across an `.await`, so checkpoints never observe a torn state.
pub struct StateStore {
    inner: Mutex<StoreInner>,
    watch_tx: watch::Sender<UploadState>,
}

impl Default for StateStore {
    fn default() -> Self {
        Self::new()
    }
}

impl StateStore {
    /// Creates a store in the `Local` phase at generation 0.
    pub fn new() -> Self {
        let (watch_tx, _) = watch::channel(UploadState::default());
        Self {
            inner: Mutex::new(StoreInner {
                state: UploadState::default(),
                generation: 0,
            }),
            watch_tx,
        }
    }

    pub fn read(&self) -> StoreSnapshot {
        let inner = self.lock();
        StoreSnapshot {
            state: inner.state.clone(),
            generation: inner.generation,
        }
    }

    /// Merges `change` into the state and notifies watchers.
    pub fn apply(&self, change: StateChange) {
        let mut inner = self.lock();
        change.merge_into(&mut inner.state);
        self.watch_tx.send_replace(inner.state.clone());
    }

    /// Increments the generation and returns the new value.
    pub fn next_generation(&self) -> u64 {
        let mut inner = self.lock();
        inner.generation += 1;
        inner.generation
    }

    /// Mints a new generation and applies `change` under the same lock.
    ///
    /// Whichever attempt calls this last owns both the current generation and
    /// the state written by `change`, even when attempts race across threads.
    pub fn begin_attempt(&self, change: StateChange) -> u64 {
        let mut inner = self.lock();
        inner.generation += 1;
        change.merge_into(&mut inner.state);
        self.watch_tx.send_replace(inner.state.clone());
        inner.generation
    }

    /// Receiver that observes every applied state.
    pub fn subscribe(&self) -> watch::Receiver<UploadState> {
        self.watch_tx.subscribe()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, StoreInner> {
        // State is always left consistent by `apply`; a poisoned lock is still usable.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{CancelHandle, Phase};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU64, Ordering};

    #[test]
    fn starts_local_at_generation_zero() {
        let store = StateStore::new();
        let snap = store.read();
        assert_eq!(snap.state.phase, Phase::Local);
        assert_eq!(snap.generation, 0);
    }

    #[test]
    fn generations_strictly_increase() {
        let store = StateStore::new();
        let a = store.next_generation();
        let b = store.next_generation();
        assert_eq!(a, 1);
        assert_eq!(b, 2);
        assert_eq!(store.read().generation, 2);
    }

    #[test]
    fn apply_does_not_touch_generation() {
        let store = StateStore::new();
        store.next_generation();
        store.apply(StateChange::phase(Phase::Uploading));
        assert_eq!(store.read().generation, 1);
    }

    #[test]
    fn begin_attempt_bumps_generation_with_its_change() {
        let store = StateStore::new();
        store.next_generation();

        let generation = store.begin_attempt(
            StateChange::phase(Phase::Uploading)
                .with_progress(0.0)
                .with_cancellation(CancelHandle::from_fn(|| {})),
        );

        let snap = store.read();
        assert_eq!(generation, 2);
        assert_eq!(snap.generation, 2);
        assert_eq!(snap.state.phase, Phase::Uploading);
        assert!(snap.state.cancellation.is_some());
    }

    #[test]
    fn racing_attempts_keep_generation_and_handle_paired() {
        let store = Arc::new(StateStore::new());
        let threads: Vec<_> = (0..8)
            .map(|_| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    let cancelled = Arc::new(AtomicU64::new(0));
                    let slot = Arc::clone(&cancelled);
                    let handle = CancelHandle::from_fn(move || {
                        slot.store(1, Ordering::SeqCst);
                    });
                    let generation = store.begin_attempt(
                        StateChange::phase(Phase::Uploading).with_cancellation(handle),
                    );
                    (generation, cancelled)
                })
            })
            .collect();
        let attempts: Vec<_> = threads.into_iter().map(|t| t.join().unwrap()).collect();

        let snap = store.read();
        snap.state.cancellation.expect("handle stored").cancel();
        let (owner, _) = attempts
            .iter()
            .find(|(_, cancelled)| cancelled.load(Ordering::SeqCst) == 1)
            .expect("stored handle belongs to some attempt");
        assert_eq!(*owner, snap.generation);
        assert_eq!(snap.generation, 8);
    }

    #[tokio::test]
    async fn watchers_see_applied_states() {
        let store = StateStore::new();
        let mut rx = store.subscribe();

        store.apply(StateChange::phase(Phase::Uploading).with_progress(0.4));
        rx.changed().await.unwrap();
        let seen = rx.borrow_and_update().clone();
        assert_eq!(seen.phase, Phase::Uploading);
        assert_eq!(seen.upload_progress, 0.4);
    }
}
