use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::{watch, Notify};

use crate::model::{ScopeSet, Snapshot};

/// Lifecycle of the refresh engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshState {
    Idle,
    Refreshing,
    /// Invalidations arrived while a refresh was running; one more follows
    StalePending,
}

/// Owner of the current snapshot, the set of stale sections and the
/// refresh lifecycle.
///
/// Readers get an `Arc<Snapshot>` that is never torn: new snapshots replace
/// the old one whole. Only the refresh engine calls [`RepoModel::commit`].
/// The stale set and the refresh state change under the same lock, so an
/// invalidation that lands mid-refresh shows as `StalePending` at once.
#[derive(Clone)]
pub struct RepoModel {
    snapshot: Arc<watch::Sender<Arc<Snapshot>>>,
    stale: Arc<Mutex<ScopeSet>>,
    refresh: Arc<watch::Sender<RefreshState>>,
    wake: Arc<Notify>,
}

impl Default for RepoModel {
    fn default() -> Self {
        Self::new()
    }
}

impl RepoModel {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(Arc::new(Snapshot::default()));
        let (refresh, _rx) = watch::channel(RefreshState::Idle);
        Self {
            snapshot: Arc::new(tx),
            stale: Arc::new(Mutex::new(ScopeSet::NONE)),
            refresh: Arc::new(refresh),
            wake: Arc::new(Notify::new()),
        }
    }

    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.snapshot.borrow().clone()
    }

    /// Receiver that observes every committed snapshot
    pub fn watch(&self) -> watch::Receiver<Arc<Snapshot>> {
        self.snapshot.subscribe()
    }

    /// Mark sections stale and wake the refresh engine
    pub fn invalidate(&self, scopes: ScopeSet) {
        if scopes.is_empty() {
            return;
        }
        {
            let mut stale = self.stale.lock().unwrap_or_else(PoisonError::into_inner);
            stale.insert(scopes);
            self.refresh.send_if_modified(|state| {
                if *state == RefreshState::Refreshing {
                    *state = RefreshState::StalePending;
                    true
                } else {
                    false
                }
            });
        }
        self.wake.notify_one();
    }

    pub fn stale(&self) -> ScopeSet {
        *self.stale.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn refresh_state(&self) -> RefreshState {
        *self.refresh.borrow()
    }

    /// Receiver that observes every refresh state transition
    pub fn watch_refresh(&self) -> watch::Receiver<RefreshState> {
        self.refresh.subscribe()
    }

    /// Enter `Refreshing` and take the stale set for the next batch
    pub(crate) fn begin_refresh(&self) -> ScopeSet {
        let mut stale = self.stale.lock().unwrap_or_else(PoisonError::into_inner);
        self.refresh.send_replace(RefreshState::Refreshing);
        stale.take()
    }

    /// Leave `Refreshing`: back to `Idle`, or `StalePending` when sections
    /// went stale while the batch ran
    pub(crate) fn finish_refresh(&self) -> RefreshState {
        let stale = self.stale.lock().unwrap_or_else(PoisonError::into_inner);
        let next = if stale.is_empty() {
            RefreshState::Idle
        } else {
            RefreshState::StalePending
        };
        self.refresh.send_replace(next);
        next
    }

    pub(crate) fn wake(&self) -> Arc<Notify> {
        self.wake.clone()
    }

    /// Install the next snapshot, returning its generation
    pub(crate) fn commit(&self, mut next: Snapshot) -> u64 {
        let mut generation = 0;
        self.snapshot.send_modify(|current| {
            next.generation = current.generation + 1;
            generation = next.generation;
            *current = Arc::new(next);
        });
        generation
    }
}
