//! Integration tests for thalia
//!
//! Each test builds a scratch repository with git2 in a temp directory and
//! drives it through a `Workspace`, the same way the TUI does.

use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use git2::{Repository, Signature};
use tempfile::TempDir;

use thalia::engine;
use thalia::{
    ActionKind, AppError, ChangeKind, Git2Gateway, GitError, GitGateway, GitOperation, GitOutput,
    RefreshState, ScopeSet, ServiceConfig, Timeouts, ValidationError, Workspace,
};

fn config() -> ServiceConfig {
    ServiceConfig::new()
        .with_debounce(Duration::from_millis(20))
        .with_watch(false)
}

/// Repository with an identity and one commit containing `a.txt` and `b.txt`
fn scratch_repo() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    let repo = Repository::init(dir.path()).unwrap();
    let mut cfg = repo.config().unwrap();
    cfg.set_str("user.name", "Test").unwrap();
    cfg.set_str("user.email", "test@example.com").unwrap();

    write(dir.path(), "a.txt", "one\n");
    write(dir.path(), "b.txt", "two\n");
    let mut index = repo.index().unwrap();
    index.add_path(Path::new("a.txt")).unwrap();
    index.add_path(Path::new("b.txt")).unwrap();
    index.write().unwrap();
    let tree = repo.find_tree(index.write_tree().unwrap()).unwrap();
    let sig = Signature::now("Test", "test@example.com").unwrap();
    repo.commit(Some("HEAD"), &sig, &sig, "initial", &tree, &[])
        .unwrap();

    dir
}

fn write(root: &Path, name: &str, content: &str) {
    std::fs::write(root.join(name), content).unwrap();
}

/// Wraps the real gateway, recording every operation and optionally
/// slowing down status reads or slowing down and timing out writes
#[derive(Clone)]
struct RecordingGateway {
    inner: Git2Gateway,
    calls: Arc<Mutex<Vec<&'static str>>>,
    status_delay: Duration,
    write_delay: Duration,
    writes_time_out: bool,
}

impl RecordingGateway {
    fn new(root: &Path) -> Self {
        Self {
            inner: Git2Gateway::open(root, Timeouts::default()).unwrap(),
            calls: Arc::new(Mutex::new(Vec::new())),
            status_delay: Duration::ZERO,
            write_delay: Duration::ZERO,
            writes_time_out: false,
        }
    }

    fn count(&self, name: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| **c == name)
            .count()
    }
}

impl GitGateway for RecordingGateway {
    async fn execute(&self, operation: GitOperation) -> Result<GitOutput, GitError> {
        self.calls.lock().unwrap().push(operation.name());
        if matches!(operation, GitOperation::Status) {
            tokio::time::sleep(self.status_delay).await;
        }
        if operation.is_write() {
            tokio::time::sleep(self.write_delay).await;
            if self.writes_time_out {
                return Err(GitError::Timeout {
                    operation: operation.name(),
                    after: self.write_delay,
                });
            }
        }
        self.inner.execute(operation).await
    }
}

fn stage(paths: &[&str]) -> ActionKind {
    ActionKind::Stage {
        paths: paths.iter().map(|p| p.to_string()).collect(),
    }
}

#[tokio::test]
async fn test_stage_then_commit_scenario() {
    let dir = scratch_repo();
    write(dir.path(), "a.txt", "one changed\n");
    write(dir.path(), "b.txt", "two changed\n");
    write(dir.path(), "notes.txt", "scratch\n");

    let workspace = Workspace::open(dir.path(), &config()).await.unwrap();
    let snapshot = workspace.snapshot();
    assert_eq!(snapshot.files.len(), 3);
    assert_eq!(snapshot.staged_count(), 0);

    // Queued back to back; the commit is validated after the stage landed
    let staged = workspace.submit(stage(&["a.txt", "b.txt"]));
    let committed = workspace.submit(ActionKind::Commit {
        message: "fix".to_string(),
    });
    staged.wait().await.unwrap();
    let sha = committed.wait().await.unwrap();
    workspace.settled().await;

    let snapshot = workspace.snapshot();
    assert_eq!(snapshot.commits[0].message, "fix");
    assert_eq!(Some(snapshot.commits[0].sha.clone()), sha);
    assert_eq!(snapshot.commits.len(), 2);
    assert_eq!(snapshot.staged_count(), 0);
    assert_eq!(snapshot.files.len(), 1);
    assert!(snapshot.files[0].is_untracked());
    assert_eq!(snapshot.head.target(), sha.as_deref());

    workspace.shutdown().await;
}

#[tokio::test]
async fn test_snapshot_matches_fresh_load_after_actions() {
    let dir = scratch_repo();
    write(dir.path(), "a.txt", "changed\n");
    write(dir.path(), "c.txt", "new\n");

    let gateway = Git2Gateway::open(dir.path(), Timeouts::default()).unwrap();
    let workspace = Workspace::start(gateway.clone(), &config()).await.unwrap();

    let actions = vec![
        stage(&["a.txt", "c.txt"]),
        ActionKind::Commit {
            message: "add c".to_string(),
        },
        ActionKind::CreateBranch {
            name: "topic".to_string(),
            start_point: None,
        },
        ActionKind::Checkout {
            branch: "topic".to_string(),
        },
    ];
    let tickets: Vec<_> = actions.into_iter().map(|a| workspace.submit(a)).collect();
    for ticket in tickets {
        ticket.wait().await.unwrap();
    }
    workspace.settled().await;

    let fresh = engine::load(
        &gateway,
        &Default::default(),
        ScopeSet::ALL,
        config().refresh.log_limit,
    )
    .await;
    assert!(fresh.failures.is_empty());

    let current = workspace.snapshot();
    assert_eq!(current.head, fresh.snapshot.head);
    assert_eq!(current.local_branches, fresh.snapshot.local_branches);
    assert_eq!(current.remote_branches, fresh.snapshot.remote_branches);
    assert_eq!(current.files, fresh.snapshot.files);
    assert_eq!(current.commits, fresh.snapshot.commits);
    assert_eq!(current.head.branch_name(), Some("topic"));

    workspace.shutdown().await;
}

#[tokio::test]
async fn test_invalidations_in_window_share_one_batch() {
    let dir = scratch_repo();
    let gateway = RecordingGateway::new(dir.path());
    let config = config().with_debounce(Duration::from_millis(100));
    let workspace = Workspace::start(gateway.clone(), &config).await.unwrap();
    assert_eq!(gateway.count("status"), 1);

    for _ in 0..5 {
        workspace.invalidate(ScopeSet::STATUS);
    }
    workspace.settled().await;

    assert_eq!(gateway.count("status"), 2);
    assert_eq!(workspace.refresh_state(), RefreshState::Idle);
    // Sections nobody invalidated are not re-read
    assert_eq!(gateway.count("branches"), 1);
    assert_eq!(gateway.count("log"), 1);

    workspace.shutdown().await;
}

#[tokio::test]
async fn test_invalidations_during_refresh_run_one_follow_up() {
    let dir = scratch_repo();
    let mut gateway = RecordingGateway::new(dir.path());
    gateway.status_delay = Duration::from_millis(200);
    let workspace = Workspace::start(gateway.clone(), &config()).await.unwrap();
    assert_eq!(gateway.count("status"), 1);

    workspace.invalidate(ScopeSet::STATUS);
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while workspace.refresh_state() != RefreshState::Refreshing {
        assert!(
            tokio::time::Instant::now() < deadline,
            "refresh never started"
        );
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    for _ in 0..10 {
        workspace.invalidate(ScopeSet::STATUS);
    }
    assert_eq!(workspace.refresh_state(), RefreshState::StalePending);

    workspace.settled().await;
    // The running batch plus exactly one follow-up for all ten
    assert_eq!(gateway.count("status"), 3);
    assert_eq!(workspace.refresh_state(), RefreshState::Idle);

    workspace.shutdown().await;
}

#[tokio::test]
async fn test_commit_validation() {
    let dir = scratch_repo();
    let workspace = Workspace::open(dir.path(), &config()).await.unwrap();
    let mut events = workspace.subscribe(ScopeSet::ALL);

    let err = workspace
        .submit(ActionKind::Commit {
            message: "nothing".to_string(),
        })
        .wait()
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        AppError::Validation(ValidationError::EmptyCommit)
    ));

    write(dir.path(), "a.txt", "changed\n");
    workspace.refresh();
    workspace.settled().await;
    workspace.submit(stage(&["a.txt"])).wait().await.unwrap();

    let err = workspace
        .submit(ActionKind::Commit {
            message: "   ".to_string(),
        })
        .wait()
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        AppError::Validation(ValidationError::EmptyMessage)
    ));

    // Rejections leave the repository untouched
    workspace.settled().await;
    assert_eq!(workspace.snapshot().commits.len(), 1);
    assert_eq!(workspace.snapshot().staged_count(), 1);

    let first = events.try_recv().unwrap();
    assert!(matches!(
        first.kind,
        ChangeKind::ActionRejected {
            reason: ValidationError::EmptyCommit,
            ..
        }
    ));

    workspace.shutdown().await;
}

#[tokio::test]
async fn test_checkout_refuses_to_overwrite_local_changes() {
    let dir = scratch_repo();
    let workspace = Workspace::open(dir.path(), &config()).await.unwrap();
    let main = workspace
        .snapshot()
        .head
        .branch_name()
        .unwrap()
        .to_string();

    // topic changes a.txt
    workspace
        .submit(ActionKind::CreateBranch {
            name: "topic".to_string(),
            start_point: None,
        })
        .wait()
        .await
        .unwrap();
    workspace
        .submit(ActionKind::Checkout {
            branch: "topic".to_string(),
        })
        .wait()
        .await
        .unwrap();
    write(dir.path(), "a.txt", "topic\n");
    workspace.refresh();
    workspace.settled().await;
    workspace.submit(stage(&["a.txt"])).wait().await.unwrap();
    workspace
        .submit(ActionKind::Commit {
            message: "topic work".to_string(),
        })
        .wait()
        .await
        .unwrap();
    workspace
        .submit(ActionKind::Checkout {
            branch: main.clone(),
        })
        .wait()
        .await
        .unwrap();

    // An edit to b.txt survives the switch, one to a.txt would be lost
    write(dir.path(), "b.txt", "local\n");
    workspace.refresh();
    workspace.settled().await;
    workspace
        .submit(ActionKind::Checkout {
            branch: "topic".to_string(),
        })
        .wait()
        .await
        .unwrap();
    workspace
        .submit(ActionKind::Checkout {
            branch: main.clone(),
        })
        .wait()
        .await
        .unwrap();

    write(dir.path(), "a.txt", "local\n");
    workspace.refresh();
    workspace.settled().await;
    let err = workspace
        .submit(ActionKind::Checkout {
            branch: "topic".to_string(),
        })
        .wait()
        .await
        .unwrap_err();
    match err {
        AppError::Validation(ValidationError::DirtyTree { paths }) => {
            assert_eq!(paths, vec!["a.txt".to_string()]);
        }
        other => panic!("expected dirty tree, got {other:?}"),
    }

    workspace.settled().await;
    assert_eq!(workspace.snapshot().head.branch_name(), Some(main.as_str()));
    let content = std::fs::read_to_string(dir.path().join("a.txt")).unwrap();
    assert_eq!(content, "local\n");

    let err = workspace
        .submit(ActionKind::Checkout {
            branch: "nowhere".to_string(),
        })
        .wait()
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        AppError::Validation(ValidationError::UnknownRef(_))
    ));

    workspace.shutdown().await;
}

#[tokio::test]
async fn test_writes_run_one_at_a_time_in_order() {
    let dir = scratch_repo();
    let mut gateway = RecordingGateway::new(dir.path());
    gateway.write_delay = Duration::from_millis(50);
    let workspace = Workspace::start(gateway.clone(), &config()).await.unwrap();

    let create = workspace.submit(ActionKind::CreateBranch {
        name: "topic".to_string(),
        start_point: None,
    });
    // Would be rejected as an unknown ref if judged before the first landed
    let checkout = workspace.submit(ActionKind::Checkout {
        branch: "topic".to_string(),
    });
    assert!(create.id() < checkout.id());

    create.wait().await.unwrap();
    checkout.wait().await.unwrap();
    workspace.settled().await;
    assert_eq!(workspace.snapshot().head.branch_name(), Some("topic"));

    let calls = gateway.calls.lock().unwrap().clone();
    let writes: Vec<_> = calls
        .iter()
        .filter(|c| **c == "create-branch" || **c == "checkout")
        .collect();
    assert_eq!(writes, vec![&"create-branch", &"checkout"]);

    workspace.shutdown().await;
}

#[tokio::test]
async fn test_cancelled_action_never_runs() {
    let dir = scratch_repo();
    write(dir.path(), "a.txt", "changed\n");
    write(dir.path(), "b.txt", "changed\n");
    let mut gateway = RecordingGateway::new(dir.path());
    gateway.write_delay = Duration::from_millis(200);
    let workspace = Workspace::start(gateway.clone(), &config()).await.unwrap();

    let first = workspace.submit(stage(&["a.txt"]));
    let second = workspace.submit(stage(&["b.txt"]));
    second.cancel();

    first.wait().await.unwrap();
    assert!(matches!(second.wait().await, Err(AppError::Cancelled)));
    assert_eq!(gateway.count("stage"), 1);

    workspace.settled().await;
    let snapshot = workspace.snapshot();
    assert!(snapshot.file("a.txt").unwrap().is_staged());
    assert!(!snapshot.file("b.txt").unwrap().is_staged());

    workspace.shutdown().await;
}

#[tokio::test]
async fn test_timed_out_write_forces_full_refresh() {
    let dir = scratch_repo();
    write(dir.path(), "a.txt", "changed\n");
    let mut gateway = RecordingGateway::new(dir.path());
    let workspace = Workspace::start(gateway.clone(), &config()).await.unwrap();

    // A completed stage only re-reads status
    workspace.submit(stage(&["a.txt"])).wait().await.unwrap();
    workspace.settled().await;
    assert_eq!(gateway.count("branches"), 1);
    assert_eq!(gateway.count("status"), 2);
    workspace.shutdown().await;

    gateway.writes_time_out = true;
    gateway.write_delay = Duration::from_millis(10);
    let workspace = Workspace::start(gateway.clone(), &config()).await.unwrap();
    let mut events = workspace.subscribe(ScopeSet::BRANCHES);

    write(dir.path(), "b.txt", "changed\n");
    workspace.refresh();
    workspace.settled().await;
    let branches_before = gateway.count("branches");
    let log_before = gateway.count("log");
    while events.try_recv().is_some() {}

    let err = workspace
        .submit(stage(&["b.txt"]))
        .wait()
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Git(GitError::Timeout { .. })));
    assert!(err.requires_resync());

    workspace.settled().await;
    assert_eq!(gateway.count("branches"), branches_before + 1);
    assert_eq!(gateway.count("log"), log_before + 1);

    let failed = events.try_recv().unwrap();
    assert_eq!(failed.scopes, ScopeSet::ALL);
    assert!(matches!(failed.kind, ChangeKind::ActionFailed { .. }));

    workspace.shutdown().await;
}

#[tokio::test]
async fn test_events_arrive_in_order() {
    let dir = scratch_repo();
    write(dir.path(), "a.txt", "changed\n");
    let workspace = Workspace::open(dir.path(), &config()).await.unwrap();
    let mut status = workspace.subscribe(ScopeSet::STATUS);
    let mut branches = workspace.subscribe(ScopeSet::BRANCHES);

    let ticket = workspace.submit(stage(&["a.txt"]));
    let id = ticket.id();
    ticket.wait().await.unwrap();
    workspace.settled().await;

    let completed = status.recv().await.unwrap();
    assert!(matches!(
        completed.kind,
        ChangeKind::ActionCompleted { id: done, .. } if done == id
    ));
    let updated = status.recv().await.unwrap();
    assert!(matches!(updated.kind, ChangeKind::SnapshotUpdated { .. }));
    assert!(updated.seq > completed.seq);

    // Staging touches neither branches nor history
    assert!(branches.try_recv().is_none());

    workspace.shutdown().await;
}

#[tokio::test]
async fn test_init_creates_and_refuses_reinit() {
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("nested").join("repo");

    let workspace = Workspace::init(&target, &config()).await.unwrap();
    let snapshot = workspace.snapshot();
    assert!(snapshot.head.is_unborn());
    assert!(snapshot.commits.is_empty());
    assert!(snapshot.files.is_empty());
    workspace.shutdown().await;

    let err = Workspace::init(&target, &config()).await.err().unwrap();
    assert!(matches!(err, AppError::AlreadyARepository(_)));
}

#[tokio::test]
async fn test_first_commit_on_unborn_branch() {
    let dir = tempfile::tempdir().unwrap();
    let repo = Repository::init(dir.path()).unwrap();
    let mut cfg = repo.config().unwrap();
    cfg.set_str("user.name", "Test").unwrap();
    cfg.set_str("user.email", "test@example.com").unwrap();
    write(dir.path(), "readme.md", "hello\n");

    let workspace = Workspace::open(dir.path(), &config()).await.unwrap();
    assert!(workspace.snapshot().head.is_unborn());

    let err = workspace
        .submit(ActionKind::CreateBranch {
            name: "topic".to_string(),
            start_point: None,
        })
        .wait()
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        AppError::Validation(ValidationError::Unsupported(_))
    ));

    workspace.submit(stage(&["readme.md"])).wait().await.unwrap();
    workspace
        .submit(ActionKind::Commit {
            message: "first".to_string(),
        })
        .wait()
        .await
        .unwrap();
    workspace.settled().await;

    let snapshot = workspace.snapshot();
    assert!(!snapshot.head.is_unborn());
    assert_eq!(snapshot.commits.len(), 1);
    assert!(snapshot.files.is_empty());
    assert_eq!(snapshot.local_branches.len(), 1);
    assert!(snapshot.local_branches[0].is_head);

    workspace.shutdown().await;
}

#[tokio::test]
async fn test_open_outside_repository_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    // tempdir may itself live inside a repository on some machines
    if Repository::discover(dir.path()).is_ok() {
        return;
    }
    let err = Workspace::open(dir.path(), &config()).await.err().unwrap();
    assert!(matches!(err, AppError::NotARepository(_)));
    assert_eq!(err.kind(), thalia::ErrorKind::Environment);
}

#[tokio::test]
async fn test_watcher_picks_up_outside_edits() {
    let dir = scratch_repo();
    let workspace = Workspace::open(dir.path(), &config().with_watch(true))
        .await
        .unwrap();
    assert!(workspace.snapshot().files.is_empty());

    write(dir.path(), "a.txt", "edited elsewhere\n");

    let deadline = tokio::time::Instant::now() + Duration::from_secs(10);
    loop {
        workspace.settled().await;
        if workspace.snapshot().file("a.txt").is_some() {
            break;
        }
        assert!(
            tokio::time::Instant::now() < deadline,
            "edit never reached the snapshot"
        );
        tokio::time::sleep(Duration::from_millis(50)).await;
    }

    workspace.shutdown().await;
}

#[tokio::test]
async fn test_opening_with_watcher_rereads_status() {
    let dir = scratch_repo();
    let workspace = Workspace::open(dir.path(), &config().with_watch(true))
        .await
        .unwrap();
    workspace.settled().await;

    // Initial load, then one status pass once the watcher is armed
    assert!(workspace.snapshot().generation >= 2);

    workspace.shutdown().await;
}

#[tokio::test]
async fn test_unstage_keeps_worktree_changes() {
    let dir = scratch_repo();
    write(dir.path(), "a.txt", "changed\n");
    let workspace = Workspace::open(dir.path(), &config()).await.unwrap();

    workspace.submit(stage(&["a.txt"])).wait().await.unwrap();
    workspace.settled().await;
    assert!(workspace.snapshot().file("a.txt").unwrap().is_staged());

    workspace
        .submit(ActionKind::Unstage {
            paths: vec!["a.txt".to_string()],
        })
        .wait()
        .await
        .unwrap();
    workspace.settled().await;

    let snapshot = workspace.snapshot();
    let file = snapshot.file("a.txt").unwrap();
    assert!(!file.is_staged());
    assert!(file.has_worktree_changes());

    workspace.shutdown().await;
}

#[tokio::test]
async fn test_amend_rewords_head() {
    let dir = scratch_repo();
    let workspace = Workspace::open(dir.path(), &config()).await.unwrap();
    let before = workspace.snapshot().commits[0].sha.clone();

    let sha = workspace
        .submit(ActionKind::Amend {
            message: "reworded".to_string(),
        })
        .wait()
        .await
        .unwrap();
    workspace.settled().await;

    let snapshot = workspace.snapshot();
    assert_eq!(snapshot.commits.len(), 1);
    assert_eq!(snapshot.commits[0].message, "reworded");
    assert_ne!(snapshot.commits[0].sha, before);
    assert_eq!(Some(snapshot.commits[0].sha.clone()), sha);
    assert_eq!(snapshot.head.target(), sha.as_deref());

    workspace.shutdown().await;
}

#[tokio::test]
async fn test_delete_branch() {
    let dir = scratch_repo();
    let workspace = Workspace::open(dir.path(), &config()).await.unwrap();
    let current = workspace
        .snapshot()
        .head
        .branch_name()
        .unwrap()
        .to_string();

    workspace
        .submit(ActionKind::CreateBranch {
            name: "topic".to_string(),
            start_point: None,
        })
        .wait()
        .await
        .unwrap();
    workspace
        .submit(ActionKind::DeleteBranch {
            name: "topic".to_string(),
        })
        .wait()
        .await
        .unwrap();
    workspace.settled().await;
    assert!(workspace.snapshot().local_branch("topic").is_none());

    let err = workspace
        .submit(ActionKind::DeleteBranch { name: current })
        .wait()
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        AppError::Validation(ValidationError::Unsupported(_))
    ));
    assert_eq!(workspace.snapshot().local_branches.len(), 1);

    workspace.shutdown().await;
}

#[tokio::test]
async fn test_ignore_hides_untracked_file() {
    let dir = scratch_repo();
    write(dir.path(), "notes.txt", "scratch\n");
    let workspace = Workspace::open(dir.path(), &config()).await.unwrap();
    assert!(workspace.snapshot().file("notes.txt").unwrap().is_untracked());

    workspace
        .submit(ActionKind::Ignore {
            path: "notes.txt".to_string(),
        })
        .wait()
        .await
        .unwrap();
    workspace.settled().await;

    let gitignore = std::fs::read_to_string(dir.path().join(".gitignore")).unwrap();
    assert_eq!(gitignore, "/notes.txt\n");
    let snapshot = workspace.snapshot();
    assert!(snapshot.file("notes.txt").is_none());
    assert!(snapshot.file(".gitignore").unwrap().is_untracked());

    workspace.shutdown().await;
}

#[tokio::test]
async fn test_stash_cleans_tree_and_lists_entry() {
    let dir = scratch_repo();
    write(dir.path(), "a.txt", "changed\n");
    let workspace = Workspace::open(dir.path(), &config()).await.unwrap();
    assert!(workspace.snapshot().stashes.is_empty());

    let sha = workspace
        .submit(ActionKind::Stash {
            message: Some("parked".to_string()),
        })
        .wait()
        .await
        .unwrap();
    workspace.settled().await;

    let snapshot = workspace.snapshot();
    assert!(snapshot.is_clean());
    assert_eq!(snapshot.stashes.len(), 1);
    assert_eq!(snapshot.stashes[0].refname(), "stash@{0}");
    assert!(snapshot.stashes[0].message.ends_with("parked"));
    assert_eq!(Some(snapshot.stashes[0].sha.clone()), sha);
    assert_eq!(
        std::fs::read_to_string(dir.path().join("a.txt")).unwrap(),
        "one\n"
    );

    // A clean tree has nothing left to stash
    let err = workspace
        .submit(ActionKind::Stash { message: None })
        .wait()
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        AppError::Validation(ValidationError::NothingToStash)
    ));

    workspace.shutdown().await;
}

#[tokio::test]
async fn test_checkout_remote_branch_creates_tracking_branch() {
    let dir = scratch_repo();
    {
        let repo = Repository::open(dir.path()).unwrap();
        let head = repo.head().unwrap().target().unwrap();
        repo.remote("origin", "https://example.invalid/thalia.git")
            .unwrap();
        repo.reference("refs/remotes/origin/feature", head, false, "test")
            .unwrap();
    }

    let workspace = Workspace::open(dir.path(), &config()).await.unwrap();
    let snapshot = workspace.snapshot();
    assert!(snapshot.local_branch("feature").is_none());
    assert_eq!(snapshot.remote_candidates("feature").len(), 1);

    workspace
        .submit(ActionKind::Checkout {
            branch: "feature".to_string(),
        })
        .wait()
        .await
        .unwrap();
    workspace.settled().await;

    let snapshot = workspace.snapshot();
    assert_eq!(snapshot.head.branch_name(), Some("feature"));
    let local = snapshot.local_branch("feature").unwrap();
    assert!(local.is_head);
    assert_eq!(local.upstream.as_deref(), Some("origin/feature"));

    workspace.shutdown().await;
}
