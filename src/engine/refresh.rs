use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::config::RefreshConfig;
use crate::error::GitError;
use crate::model::{ScopeSet, Snapshot};
use crate::service::{GitGateway, GitOperation, GitOutput};

use super::{ChangeKind, EventBus, RefreshState, RepoModel};

/// Result of querying the stale sections once
#[derive(Debug)]
pub struct Batch {
    pub snapshot: Snapshot,
    /// Sections read successfully
    pub updated: ScopeSet,
    pub failures: Vec<(ScopeSet, GitError)>,
}

/// Query every section in `scopes`, one gateway call each, concurrently.
/// Sections not requested, or whose query failed, are carried over from
/// `base`.
pub async fn load<G: GitGateway>(
    gateway: &G,
    base: &Snapshot,
    scopes: ScopeSet,
    log_limit: usize,
) -> Batch {
    let (status, branches, log) = tokio::join!(
        query(gateway, scopes.contains(ScopeSet::STATUS), GitOperation::Status),
        query(gateway, scopes.contains(ScopeSet::BRANCHES), GitOperation::Branches),
        query(
            gateway,
            scopes.contains(ScopeSet::LOG),
            GitOperation::Log { limit: log_limit }
        ),
    );

    let mut snapshot = base.clone();
    let mut updated = ScopeSet::NONE;
    let mut failures = Vec::new();

    if let Some(result) = status {
        match result.and_then(GitOutput::into_status) {
            Ok(files) => {
                snapshot.files = files;
                updated |= ScopeSet::STATUS;
            }
            Err(e) => failures.push((ScopeSet::STATUS, e)),
        }
    }
    if let Some(result) = branches {
        match result.and_then(GitOutput::into_branches) {
            Ok(listing) => {
                snapshot.apply_branches(listing);
                updated |= ScopeSet::BRANCHES;
            }
            Err(e) => failures.push((ScopeSet::BRANCHES, e)),
        }
    }
    if let Some(result) = log {
        match result.and_then(GitOutput::into_log) {
            Ok(commits) => {
                snapshot.commits = commits;
                updated |= ScopeSet::LOG;
            }
            Err(e) => failures.push((ScopeSet::LOG, e)),
        }
    }

    Batch {
        snapshot,
        updated,
        failures,
    }
}

async fn query<G: GitGateway>(
    gateway: &G,
    wanted: bool,
    operation: GitOperation,
) -> Option<Result<GitOutput, GitError>> {
    if !wanted {
        return None;
    }
    Some(gateway.execute(operation).await)
}

/// Background task that brings the model back in line with the repository
pub struct RefreshEngine<G> {
    gateway: G,
    model: RepoModel,
    bus: EventBus,
    debounce: Duration,
    log_limit: usize,
}

impl<G: GitGateway> RefreshEngine<G> {
    pub fn new(gateway: G, model: RepoModel, bus: EventBus, config: &RefreshConfig) -> Self {
        Self {
            gateway,
            model,
            bus,
            debounce: config.debounce,
            log_limit: config.log_limit,
        }
    }

    pub fn handle(&self) -> RefreshHandle {
        RefreshHandle {
            state: self.model.watch_refresh(),
            model: self.model.clone(),
        }
    }

    /// Run until `cancel` fires
    pub fn spawn(self, cancel: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(self.run(cancel))
    }

    async fn run(self, cancel: CancellationToken) {
        let wake = self.model.wake();

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = wake.notified() => {}
            }

            // Let a burst of invalidations land in the same batch
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(self.debounce) => {}
            }

            let scopes = self.model.begin_refresh();
            if !scopes.is_empty() {
                self.refresh(scopes).await;
            }

            // StalePending leaves a stored permit on `wake`, so the loop runs
            // exactly one follow-up batch for everything that arrived
            if self.model.finish_refresh() == RefreshState::StalePending {
                debug!(stale = %self.model.stale(), "Follow-up refresh pending");
            }
        }

        debug!("Refresh engine stopped");
    }

    async fn refresh(&self, scopes: ScopeSet) {
        debug!(%scopes, "Refreshing");
        let base = self.model.snapshot();
        let batch = load(&self.gateway, &base, scopes, self.log_limit).await;

        if !batch.updated.is_empty() {
            let generation = self.model.commit(batch.snapshot);
            debug!(updated = %batch.updated, generation, "Snapshot committed");
            self.bus.publish(
                batch.updated,
                ChangeKind::SnapshotUpdated { generation },
            );
        }

        for (scope, error) in batch.failures {
            warn!(%scope, %error, "Refresh failed");
            self.bus.publish(scope, ChangeKind::RefreshFailed { error });
        }
    }
}

/// Observer for the engine's progress
#[derive(Clone)]
pub struct RefreshHandle {
    state: watch::Receiver<RefreshState>,
    model: RepoModel,
}

impl RefreshHandle {
    pub fn state(&self) -> RefreshState {
        *self.state.borrow()
    }

    /// Resolve once the engine is idle with nothing stale. Returns early if
    /// the engine has stopped.
    pub async fn settled(&self) {
        let mut state = self.state.clone();
        loop {
            let nothing_stale = self.model.stale().is_empty();
            let idle = *state.borrow_and_update() == RefreshState::Idle;
            if nothing_stale && idle {
                return;
            }
            if state.changed().await.is_err() {
                return;
            }
        }
    }
}
