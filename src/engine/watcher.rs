use std::path::{Component, Path, PathBuf};

use notify::{Config, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tracing::{debug, warn};

use crate::error::AppResult;
use crate::model::ScopeSet;

use super::RepoModel;

/// Turns file system changes under the working tree into invalidations.
/// Watching stops when this value is dropped.
pub struct RepoWatcher {
    _watcher: RecommendedWatcher,
}

impl RepoWatcher {
    pub fn start(workdir: &Path, git_dir: &Path, model: RepoModel) -> AppResult<Self> {
        let root = workdir.to_path_buf();
        let git = git_dir.to_path_buf();

        let mut watcher = RecommendedWatcher::new(
            move |res: Result<notify::Event, notify::Error>| match res {
                Ok(event) => {
                    if !matches!(
                        event.kind,
                        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
                    ) {
                        return;
                    }
                    let scopes = event
                        .paths
                        .iter()
                        .fold(ScopeSet::NONE, |acc, p| acc | scopes_for_path(&root, &git, p));
                    if !scopes.is_empty() {
                        model.invalidate(scopes);
                    }
                }
                Err(e) => warn!(error = %e, "File watcher error"),
            },
            Config::default(),
        )?;

        watcher.watch(workdir, RecursiveMode::Recursive)?;
        // A git dir outside the working tree (worktrees, --separate-git-dir)
        if !git_dir.starts_with(workdir) {
            watcher.watch(git_dir, RecursiveMode::Recursive)?;
        }
        debug!(path = %workdir.display(), "Watching repository");

        Ok(Self { _watcher: watcher })
    }
}

/// Snapshot sections a change to `path` can affect
pub fn scopes_for_path(workdir: &Path, git_dir: &Path, path: &Path) -> ScopeSet {
    if let Ok(rel) = path.strip_prefix(git_dir) {
        return git_dir_scopes(rel);
    }

    let Ok(rel) = path.strip_prefix(workdir) else {
        return ScopeSet::NONE;
    };
    // Nested repositories and submodule internals
    if rel.components().any(|c| c == Component::Normal(".git".as_ref())) {
        return ScopeSet::NONE;
    }
    if rel.as_os_str().is_empty() {
        return ScopeSet::NONE;
    }
    ScopeSet::STATUS
}

fn git_dir_scopes(rel: &Path) -> ScopeSet {
    if rel.extension().map(|e| e == "lock").unwrap_or(false) {
        return ScopeSet::NONE;
    }
    if rel == Path::new("index") {
        ScopeSet::STATUS
    } else if rel == Path::new("HEAD")
        || rel == Path::new("packed-refs")
        || rel.starts_with("refs")
    {
        ScopeSet::BRANCHES | ScopeSet::LOG
    } else {
        ScopeSet::NONE
    }
}

/// Resolve symlinks so event paths and repository paths compare equal
pub fn canonical(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}
