use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::{AppError, AppResult, GitError};
use crate::model::{ActionId, ActionKind, PendingAction, ScopeSet, Snapshot, ValidationState};
use crate::service::{GitGateway, GitOperation, GitOutput};

use super::validate::{check_overwrites, validate, Validated};
use super::{ChangeKind, EventBus, RefreshHandle, RepoModel};

/// Result of one submitted action: the id of any commit it created
pub type ActionOutcome = AppResult<Option<String>>;

struct Job {
    action: PendingAction,
    cancel: CancellationToken,
    reply: oneshot::Sender<ActionOutcome>,
}

/// Handle to a submitted action
pub struct ActionTicket {
    id: ActionId,
    cancel: CancellationToken,
    reply: oneshot::Receiver<ActionOutcome>,
}

impl ActionTicket {
    pub fn id(&self) -> ActionId {
        self.id
    }

    /// Withdraw the action if it has not started yet. An action already
    /// running is left to finish.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub async fn wait(self) -> ActionOutcome {
        self.reply.await.unwrap_or_else(|_| Err(AppError::ShutDown))
    }
}

/// Queue of user actions processed one at a time, in submission order
#[derive(Clone)]
pub struct Dispatcher {
    tx: mpsc::UnboundedSender<Job>,
    next_id: Arc<AtomicU64>,
}

impl Dispatcher {
    /// Start the worker. `settle_timeout` bounds how long an action waits
    /// for pending refreshes before it is validated.
    pub fn spawn<G: GitGateway>(
        gateway: G,
        model: RepoModel,
        refresh: RefreshHandle,
        bus: EventBus,
        settle_timeout: Duration,
        shutdown: CancellationToken,
    ) -> (Self, JoinHandle<()>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let worker = Worker {
            gateway,
            model,
            refresh,
            bus,
            settle_timeout,
        };
        let task = tokio::spawn(worker.run(rx, shutdown));
        let dispatcher = Self {
            tx,
            next_id: Arc::new(AtomicU64::new(1)),
        };
        (dispatcher, task)
    }

    pub fn submit(&self, kind: ActionKind) -> ActionTicket {
        let id = ActionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let cancel = CancellationToken::new();
        let (reply, rx) = oneshot::channel();

        debug!(%id, action = %kind, "Action queued");
        let job = Job {
            action: PendingAction::new(id, kind),
            cancel: cancel.clone(),
            reply,
        };
        // A closed queue drops the job, and the ticket then reports shutdown
        let _ = self.tx.send(job);

        ActionTicket {
            id,
            cancel,
            reply: rx,
        }
    }
}

struct Worker<G> {
    gateway: G,
    model: RepoModel,
    refresh: RefreshHandle,
    bus: EventBus,
    settle_timeout: Duration,
}

impl<G: GitGateway> Worker<G> {
    async fn run(self, mut rx: mpsc::UnboundedReceiver<Job>, shutdown: CancellationToken) {
        loop {
            let job = tokio::select! {
                _ = shutdown.cancelled() => break,
                job = rx.recv() => match job {
                    Some(job) => job,
                    None => break,
                },
            };

            let Job {
                mut action,
                cancel,
                reply,
            } = job;
            let id = action.id;
            let outcome = self.process(&mut action, &cancel).await;
            if reply.send(outcome).is_err() {
                debug!(%id, "Nobody waiting for the result, discarded");
            }
        }

        debug!("Dispatcher stopped");
    }

    async fn process(&self, action: &mut PendingAction, cancel: &CancellationToken) -> ActionOutcome {
        if cancel.is_cancelled() {
            debug!(id = %action.id, "Skipping cancelled action");
            return Err(AppError::Cancelled);
        }

        // Earlier writes must be reflected before this one is judged
        if tokio::time::timeout(self.settle_timeout, self.refresh.settled())
            .await
            .is_err()
        {
            warn!(id = %action.id, "Validating against a snapshot that is still refreshing");
        }

        let snapshot = self.model.snapshot();
        let scopes = action.kind.affected_scopes();

        let validated = match self.check(&snapshot, &action.kind).await {
            Ok(validated) => validated,
            Err(AppError::Validation(reason)) => {
                info!(id = %action.id, action = %action.kind, %reason, "Action rejected");
                action.validation = ValidationState::Rejected(reason.clone());
                self.bus.publish(
                    scopes,
                    ChangeKind::ActionRejected {
                        id: action.id,
                        action: action.kind.clone(),
                        reason: reason.clone(),
                    },
                );
                return Err(AppError::Validation(reason));
            }
            Err(AppError::Git(error)) => {
                warn!(id = %action.id, %error, "Could not validate action");
                self.publish_failed(action, scopes, error.clone());
                return Err(AppError::Git(error));
            }
            Err(other) => return Err(other),
        };
        action.validation = ValidationState::Accepted;

        if cancel.is_cancelled() {
            debug!(id = %action.id, "Action cancelled before it ran");
            return Err(AppError::Cancelled);
        }

        let result = self.gateway.execute(validated.operation).await;

        match result {
            Ok(output) => {
                self.model.invalidate(scopes);
                info!(id = %action.id, action = %action.kind, "Action completed");
                self.bus.publish(
                    scopes,
                    ChangeKind::ActionCompleted {
                        id: action.id,
                        action: action.kind.clone(),
                    },
                );
                Ok(match output {
                    GitOutput::Created(sha) => Some(sha),
                    _ => None,
                })
            }
            Err(error) => {
                // After a timeout nothing about the repository can be assumed
                let scopes = if matches!(error, GitError::Timeout { .. }) {
                    ScopeSet::ALL
                } else {
                    scopes
                };
                self.model.invalidate(scopes);
                warn!(id = %action.id, action = %action.kind, %error, "Action failed");
                self.publish_failed(action, scopes, error.clone());
                Err(AppError::Git(error))
            }
        }
    }

    async fn check(&self, snapshot: &Snapshot, kind: &ActionKind) -> AppResult<Validated> {
        let validated = validate(snapshot, kind)?;

        if let Some(target) = &validated.compare_to {
            let changed = self
                .gateway
                .execute(GitOperation::ChangedPaths {
                    from: snapshot.head.target().map(str::to_string),
                    to: target.clone(),
                })
                .await
                .and_then(GitOutput::into_paths)?;
            check_overwrites(snapshot, &changed)?;
        }

        Ok(validated)
    }

    fn publish_failed(&self, action: &PendingAction, scopes: ScopeSet, error: GitError) {
        self.bus.publish(
            scopes,
            ChangeKind::ActionFailed {
                id: action.id,
                action: action.kind.clone(),
                error,
            },
        );
    }
}
