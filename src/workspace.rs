use std::path::Path;
use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::config::ServiceConfig;
use crate::engine::{
    self, canonical, ActionTicket, Dispatcher, EventBus, RefreshEngine, RefreshHandle,
    RefreshState, RepoModel, RepoWatcher, Subscription,
};
use crate::error::{AppError, AppResult, GitError};
use crate::model::{ActionKind, Diff, ScopeSet, Snapshot};
use crate::service::{Git2Gateway, GitGateway, GitOperation};

/// One open repository: the snapshot, its refresh engine, the action queue
/// and the event bus. Background tasks stop when the workspace is dropped.
pub struct Workspace<G: GitGateway = Git2Gateway> {
    gateway: G,
    model: RepoModel,
    bus: EventBus,
    refresh: RefreshHandle,
    dispatcher: Dispatcher,
    cancel: CancellationToken,
    tasks: Vec<JoinHandle<()>>,
    watcher: Option<RepoWatcher>,
}

impl Workspace<Git2Gateway> {
    /// Open the repository containing `path`
    pub async fn open(path: &Path, config: &ServiceConfig) -> AppResult<Self> {
        let gateway = Git2Gateway::open(path, config.timeouts.clone()).map_err(|e| match e {
            GitError::NotARepository(p) => AppError::NotARepository(p),
            other => AppError::Git(other),
        })?;
        let workdir = canonical(gateway.workdir());
        let git_dir = canonical(gateway.git_dir());

        let mut workspace = Self::start(gateway, config).await?;
        if config.refresh.watch {
            workspace.watcher = Some(RepoWatcher::start(
                &workdir,
                &git_dir,
                workspace.model.clone(),
            )?);
            // Edits between the initial load and arming the watcher
            workspace.model.invalidate(ScopeSet::STATUS);
        }

        info!(path = %workdir.display(), "Opened repository");
        Ok(workspace)
    }

    /// Create a repository at `path` and open it
    pub async fn init(path: &Path, config: &ServiceConfig) -> AppResult<Self> {
        Git2Gateway::init(path, config.timeouts.clone()).map_err(|e| match e {
            GitError::Conflict(_) => AppError::AlreadyARepository(path.to_path_buf()),
            other => AppError::Git(other),
        })?;
        info!(path = %path.display(), "Initialized repository");
        Self::open(path, config).await
    }

    /// Top of the working tree
    pub fn root(&self) -> &Path {
        self.gateway.workdir()
    }
}

impl<G: GitGateway> Workspace<G> {
    /// Load the full snapshot through `gateway` and start the background
    /// tasks. No file watching.
    pub async fn start(gateway: G, config: &ServiceConfig) -> AppResult<Self> {
        let model = RepoModel::new();
        let bus = EventBus::new();

        let batch = engine::load(
            &gateway,
            &Snapshot::default(),
            ScopeSet::ALL,
            config.refresh.log_limit,
        )
        .await;
        if let Some((_, error)) = batch.failures.into_iter().next() {
            return Err(error.into());
        }
        model.commit(batch.snapshot);

        let cancel = CancellationToken::new();
        let engine = RefreshEngine::new(gateway.clone(), model.clone(), bus.clone(), &config.refresh);
        let refresh = engine.handle();
        let mut tasks = vec![engine.spawn(cancel.clone())];

        let (dispatcher, task) = Dispatcher::spawn(
            gateway.clone(),
            model.clone(),
            refresh.clone(),
            bus.clone(),
            config.timeouts.git_write,
            cancel.clone(),
        );
        tasks.push(task);

        Ok(Self {
            gateway,
            model,
            bus,
            refresh,
            dispatcher,
            cancel,
            tasks,
            watcher: None,
        })
    }

    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.model.snapshot()
    }

    pub fn subscribe(&self, scopes: ScopeSet) -> Subscription {
        self.bus.subscribe(scopes)
    }

    pub fn submit(&self, action: ActionKind) -> ActionTicket {
        self.dispatcher.submit(action)
    }

    pub fn invalidate(&self, scopes: ScopeSet) {
        self.model.invalidate(scopes);
    }

    /// Re-read everything
    pub fn refresh(&self) {
        self.model.invalidate(ScopeSet::ALL);
    }

    pub fn refresh_state(&self) -> RefreshState {
        self.refresh.state()
    }

    /// Wait until no refresh is running or pending
    pub async fn settled(&self) {
        self.refresh.settled().await;
    }

    /// Staged or unstaged diff of one path, read on demand
    pub async fn diff(&self, path: &str, staged: bool) -> AppResult<Diff> {
        let output = self
            .gateway
            .execute(GitOperation::Diff {
                path: path.to_string(),
                staged,
            })
            .await?;
        Ok(output.into_diff()?)
    }

    /// Stop background work and wait for in-flight operations to finish
    pub async fn shutdown(mut self) {
        self.cancel.cancel();
        self.watcher = None;
        for task in std::mem::take(&mut self.tasks) {
            let _ = task.await;
        }
        debug!("Workspace shut down");
    }
}

impl<G: GitGateway> Drop for Workspace<G> {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

