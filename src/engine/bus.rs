use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::mpsc;

use crate::error::{GitError, ValidationError};
use crate::model::{ActionId, ActionKind, ScopeSet};

/// What happened
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeKind {
    /// The model committed a new snapshot
    SnapshotUpdated { generation: u64 },
    /// A refresh could not read these sections; the snapshot keeps the old data
    RefreshFailed { error: GitError },
    ActionRejected {
        id: ActionId,
        action: ActionKind,
        reason: ValidationError,
    },
    ActionCompleted { id: ActionId, action: ActionKind },
    ActionFailed {
        id: ActionId,
        action: ActionKind,
        error: GitError,
    },
}

/// A notification delivered to subscribers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    /// Strictly increasing across the bus
    pub seq: u64,
    /// Snapshot sections the event concerns
    pub scopes: ScopeSet,
    pub kind: ChangeKind,
}

struct Subscriber {
    scopes: ScopeSet,
    tx: mpsc::UnboundedSender<ChangeEvent>,
}

#[derive(Default)]
struct Inner {
    seq: u64,
    subscribers: Vec<Subscriber>,
}

/// Fan-out of change events to scope-filtered subscribers.
///
/// Sequence numbers are assigned and events delivered under one lock, so
/// every subscriber sees events in publication order. Channels are
/// unbounded; a slow reader never causes drops.
#[derive(Clone, Default)]
pub struct EventBus {
    inner: Arc<Mutex<Inner>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, scopes: ScopeSet) -> Subscription {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        inner.subscribers.push(Subscriber { scopes, tx });
        Subscription { rx }
    }

    /// Publish an event and return its sequence number
    pub fn publish(&self, scopes: ScopeSet, kind: ChangeKind) -> u64 {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        inner.seq += 1;
        let event = ChangeEvent {
            seq: inner.seq,
            scopes,
            kind,
        };

        inner.subscribers.retain(|sub| {
            if sub.scopes.intersects(scopes) {
                sub.tx.send(event.clone()).is_ok()
            } else {
                !sub.tx.is_closed()
            }
        });

        event.seq
    }

    pub fn subscriber_count(&self) -> usize {
        let inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        inner.subscribers.len()
    }
}

/// Receiving end of a bus subscription
pub struct Subscription {
    rx: mpsc::UnboundedReceiver<ChangeEvent>,
}

impl Subscription {
    /// Wait for the next event. Returns `None` once the workspace is gone.
    pub async fn recv(&mut self) -> Option<ChangeEvent> {
        self.rx.recv().await
    }

    /// Next event if one is already queued
    pub fn try_recv(&mut self) -> Option<ChangeEvent> {
        self.rx.try_recv().ok()
    }
}
