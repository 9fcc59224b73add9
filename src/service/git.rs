use std::collections::{BTreeMap, BTreeSet};
use std::fs::OpenOptions;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

use chrono::{TimeZone, Utc};
use git2::build::CheckoutBuilder;
use git2::{
    BranchType, DiffOptions, ErrorCode, Repository, RepositoryInitOptions, Sort, Status,
    StatusOptions,
};
use tracing::debug;

use crate::config::Timeouts;
use crate::error::GitError;
use crate::model::{
    Branch, BranchListing, Commit, Diff, DiffLine, FileDiff, FileStatus, Head, Hunk, StagedState,
    StashEntry, WorktreeState,
};

use super::{GitGateway, GitOperation, GitOutput};

/// Gateway backed by libgit2.
///
/// Every call opens the repository on the blocking pool. A read/write lock
/// is taken inside the blocking job, so reads overlap each other but never a
/// write, and a write whose caller gave up waiting still holds the lock until
/// it actually finishes.
#[derive(Clone)]
pub struct Git2Gateway {
    workdir: PathBuf,
    git_dir: PathBuf,
    timeouts: Timeouts,
    lock: Arc<RwLock<()>>,
}

impl Git2Gateway {
    /// Open the repository containing `path`
    pub fn open(path: &Path, timeouts: Timeouts) -> Result<Self, GitError> {
        let repo = Repository::discover(path)
            .map_err(|_| GitError::NotARepository(path.to_path_buf()))?;
        Self::from_repo(&repo, path, timeouts)
    }

    /// Create a new repository at `path`, creating missing directories.
    /// Refuses to re-initialize an existing repository.
    pub fn init(path: &Path, timeouts: Timeouts) -> Result<Self, GitError> {
        let mut opts = RepositoryInitOptions::new();
        opts.no_reinit(true).mkdir(true).mkpath(true);
        let repo = Repository::init_opts(path, &opts).map_err(|e| match e.code() {
            ErrorCode::Exists => {
                GitError::Conflict(format!("{} already contains a repository", path.display()))
            }
            _ => GitError::from(e),
        })?;
        Self::from_repo(&repo, path, timeouts)
    }

    fn from_repo(repo: &Repository, path: &Path, timeouts: Timeouts) -> Result<Self, GitError> {
        let workdir = repo
            .workdir()
            .ok_or_else(|| GitError::NotARepository(path.to_path_buf()))?
            .to_path_buf();
        Ok(Self {
            workdir,
            git_dir: repo.path().to_path_buf(),
            timeouts,
            lock: Arc::new(RwLock::new(())),
        })
    }

    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    pub fn git_dir(&self) -> &Path {
        &self.git_dir
    }

    async fn run(&self, operation: GitOperation) -> Result<GitOutput, GitError> {
        let name = operation.name();
        let write = operation.is_write();
        let timeout = if write {
            self.timeouts.git_write
        } else {
            self.timeouts.git_read
        };
        let workdir = self.workdir.clone();
        let lock = self.lock.clone();

        debug!(operation = name, write, "git");

        let result = tokio::time::timeout(
            timeout,
            tokio::task::spawn_blocking(move || {
                if write {
                    let _guard = lock.write().unwrap_or_else(PoisonError::into_inner);
                    apply(&workdir, operation)
                } else {
                    let _guard = lock.read().unwrap_or_else(PoisonError::into_inner);
                    apply(&workdir, operation)
                }
            }),
        )
        .await;

        match result {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => Err(GitError::Operation(format!("Task failed: {}", e))),
            Err(_) => Err(GitError::Timeout {
                operation: name,
                after: timeout,
            }),
        }
    }
}

impl GitGateway for Git2Gateway {
    fn execute(
        &self,
        operation: GitOperation,
    ) -> impl std::future::Future<Output = Result<GitOutput, GitError>> + Send {
        let this = self.clone();
        async move { this.run(operation).await }
    }
}

fn apply(workdir: &Path, operation: GitOperation) -> Result<GitOutput, GitError> {
    let mut repo = Repository::open(workdir)
        .map_err(|_| GitError::NotARepository(workdir.to_path_buf()))?;

    match operation {
        GitOperation::Status => read_status(&repo).map(GitOutput::Status),
        GitOperation::Log { limit } => read_log(&repo, limit).map(GitOutput::Log),
        GitOperation::Branches => {
            let mut listing = read_branches(&repo)?;
            listing.stashes = read_stashes(&mut repo)?;
            Ok(GitOutput::Branches(listing))
        }
        GitOperation::ChangedPaths { from, to } => {
            changed_paths(&repo, from.as_deref(), &to).map(GitOutput::Paths)
        }
        GitOperation::Diff { path, staged } => read_diff(&repo, &path, staged).map(GitOutput::Diff),
        GitOperation::Stage { paths } => stage(&repo, &paths).map(|_| GitOutput::Done),
        GitOperation::Unstage { paths } => unstage(&repo, &paths).map(|_| GitOutput::Done),
        GitOperation::Commit { message, amend } => {
            commit(&repo, &message, amend).map(GitOutput::Created)
        }
        GitOperation::Checkout { branch, track } => {
            checkout(&repo, &branch, track.as_deref()).map(|_| GitOutput::Done)
        }
        GitOperation::CreateBranch { name, start_point } => {
            create_branch(&repo, &name, start_point.as_deref()).map(|_| GitOutput::Done)
        }
        GitOperation::DeleteBranch { name } => {
            repo.find_branch(&name, BranchType::Local)?.delete()?;
            Ok(GitOutput::Done)
        }
        GitOperation::Stash { message } => {
            stash(&mut repo, message.as_deref()).map(GitOutput::Created)
        }
        GitOperation::Ignore { path } => ignore(workdir, &path).map(|_| GitOutput::Done),
    }
}

fn decode_path(bytes: &[u8]) -> Result<String, GitError> {
    String::from_utf8(bytes.to_vec()).map_err(|_| {
        GitError::MalformedOutput(format!(
            "path is not valid UTF-8: {}",
            String::from_utf8_lossy(bytes)
        ))
    })
}

fn staged_state(status: Status) -> StagedState {
    if status.contains(Status::INDEX_NEW) {
        StagedState::Added
    } else if status.intersects(Status::INDEX_MODIFIED | Status::INDEX_TYPECHANGE) {
        StagedState::Modified
    } else if status.contains(Status::INDEX_DELETED) {
        StagedState::Deleted
    } else if status.contains(Status::INDEX_RENAMED) {
        StagedState::Renamed
    } else {
        StagedState::Unmodified
    }
}

fn worktree_state(status: Status) -> WorktreeState {
    if status.contains(Status::WT_NEW) {
        WorktreeState::Untracked
    } else if status.intersects(Status::WT_MODIFIED | Status::WT_TYPECHANGE) {
        WorktreeState::Modified
    } else if status.contains(Status::WT_DELETED) {
        WorktreeState::Deleted
    } else if status.contains(Status::WT_RENAMED) {
        WorktreeState::Renamed
    } else {
        WorktreeState::Unmodified
    }
}

fn read_status(repo: &Repository) -> Result<Vec<FileStatus>, GitError> {
    let mut opts = StatusOptions::new();
    opts.include_untracked(true)
        .recurse_untracked_dirs(true)
        .include_ignored(false)
        .renames_head_to_index(true);

    let statuses = repo.statuses(Some(&mut opts))?;

    // Keyed by path so each path appears once, in sorted order
    let mut by_path: BTreeMap<String, FileStatus> = BTreeMap::new();

    for entry in statuses.iter() {
        let status = entry.status();
        if status.contains(Status::IGNORED) {
            continue;
        }

        // A rename's entry path is the old name; report the new one
        let renamed = status.contains(Status::INDEX_RENAMED);
        let new_path = if renamed {
            entry
                .head_to_index()
                .and_then(|d| d.new_file().path_bytes().map(|b| b.to_vec()))
        } else {
            None
        };
        let path = match new_path {
            Some(bytes) => decode_path(&bytes)?,
            None => decode_path(entry.path_bytes())?,
        };

        let file = by_path
            .entry(path.clone())
            .or_insert_with(|| FileStatus::new(path));

        let staged = staged_state(status);
        if staged != StagedState::Unmodified {
            file.staged = staged;
        }
        let worktree = worktree_state(status);
        if worktree != WorktreeState::Unmodified {
            file.worktree = worktree;
        }
        if status.contains(Status::CONFLICTED) {
            file.conflicted = true;
        }
        if renamed {
            file.original_path = Some(decode_path(entry.path_bytes())?);
        }
    }

    Ok(by_path.into_values().collect())
}

fn is_unborn(repo: &Repository) -> Result<bool, GitError> {
    match repo.head() {
        Ok(_) => Ok(false),
        Err(e) if matches!(e.code(), ErrorCode::UnbornBranch | ErrorCode::NotFound) => Ok(true),
        Err(e) => Err(e.into()),
    }
}

fn read_log(repo: &Repository, limit: usize) -> Result<Vec<Commit>, GitError> {
    if limit == 0 || is_unborn(repo)? {
        return Ok(Vec::new());
    }

    let mut revwalk = repo.revwalk()?;
    revwalk.set_sorting(Sort::TOPOLOGICAL | Sort::TIME)?;
    revwalk.push_head()?;

    let mut commits = Vec::new();
    for oid_result in revwalk.take(limit) {
        let commit = repo.find_commit(oid_result?)?;
        commits.push(commit_to_model(&commit));
    }

    Ok(commits)
}

/// Convert a git2 commit to our Commit model
fn commit_to_model(commit: &git2::Commit) -> Commit {
    let time = commit.time();
    let date = Utc
        .timestamp_opt(time.seconds(), 0)
        .single()
        .unwrap_or_default();

    Commit {
        sha: commit.id().to_string(),
        parents: commit.parent_ids().map(|id| id.to_string()).collect(),
        author: String::from_utf8_lossy(commit.author().name_bytes()).into_owned(),
        message: String::from_utf8_lossy(commit.message_bytes())
            .trim_end()
            .to_string(),
        date,
    }
}

fn read_head(repo: &Repository) -> Result<Head, GitError> {
    match repo.head() {
        Ok(reference) if reference.is_branch() => {
            let name = decode_path(reference.shorthand_bytes())?;
            Ok(Head::Branch {
                name,
                target: reference.target().map(|oid| oid.to_string()),
            })
        }
        Ok(reference) => {
            let oid = reference
                .target()
                .ok_or_else(|| GitError::MalformedOutput("HEAD has no target".to_string()))?;
            Ok(Head::Detached {
                sha: oid.to_string(),
            })
        }
        Err(e) if matches!(e.code(), ErrorCode::UnbornBranch | ErrorCode::NotFound) => {
            let head = repo.find_reference("HEAD")?;
            let target = head.symbolic_target().ok_or_else(|| {
                GitError::MalformedOutput("unborn HEAD is not symbolic".to_string())
            })?;
            Ok(Head::Branch {
                name: target.strip_prefix("refs/heads/").unwrap_or(target).to_string(),
                target: None,
            })
        }
        Err(e) => Err(e.into()),
    }
}

fn read_branches(repo: &Repository) -> Result<BranchListing, GitError> {
    let head = read_head(repo)?;

    let mut local = Vec::new();
    for item in repo.branches(Some(BranchType::Local))? {
        let (branch, _) = item?;
        let Some(target) = branch.get().target() else {
            continue;
        };
        let upstream = match branch.upstream() {
            Ok(upstream) => Some(decode_path(upstream.name_bytes()?)?),
            Err(_) => None,
        };
        local.push(Branch {
            name: decode_path(branch.name_bytes()?)?,
            target: target.to_string(),
            upstream,
            is_head: branch.is_head(),
        });
    }

    let mut remote = Vec::new();
    for item in repo.branches(Some(BranchType::Remote))? {
        let (branch, _) = item?;
        // Symbolic refs such as origin/HEAD have no direct target
        let Some(target) = branch.get().target() else {
            continue;
        };
        remote.push(Branch {
            name: decode_path(branch.name_bytes()?)?,
            target: target.to_string(),
            upstream: None,
            is_head: false,
        });
    }

    local.sort_by(|a, b| a.name.cmp(&b.name));
    remote.sort_by(|a, b| a.name.cmp(&b.name));

    Ok(BranchListing {
        head,
        local,
        remote,
        stashes: Vec::new(),
    })
}

fn read_stashes(repo: &mut Repository) -> Result<Vec<StashEntry>, GitError> {
    let mut stashes = Vec::new();
    repo.stash_foreach(|index, message, oid| {
        stashes.push(StashEntry {
            index,
            message: message.to_string(),
            sha: oid.to_string(),
        });
        true
    })?;
    Ok(stashes)
}

fn changed_paths(repo: &Repository, from: Option<&str>, to: &str) -> Result<Vec<String>, GitError> {
    let from_tree = match from {
        Some(rev) => Some(repo.revparse_single(rev)?.peel_to_tree()?),
        None => None,
    };
    let to_tree = repo.revparse_single(to)?.peel_to_tree()?;
    let diff = repo.diff_tree_to_tree(from_tree.as_ref(), Some(&to_tree), None)?;

    let mut paths = BTreeSet::new();
    for delta in diff.deltas() {
        for file in [delta.old_file(), delta.new_file()] {
            if let Some(bytes) = file.path_bytes() {
                paths.insert(decode_path(bytes)?);
            }
        }
    }

    Ok(paths.into_iter().collect())
}

fn read_diff(repo: &Repository, path: &str, staged: bool) -> Result<Diff, GitError> {
    let mut opts = DiffOptions::new();
    opts.pathspec(path)
        .disable_pathspec_match(true)
        .context_lines(3);

    let diff = if staged {
        let head_tree = if is_unborn(repo)? {
            None
        } else {
            Some(repo.head()?.peel_to_tree()?)
        };
        repo.diff_tree_to_index(head_tree.as_ref(), None, Some(&mut opts))?
    } else {
        opts.include_untracked(true)
            .recurse_untracked_dirs(true)
            .show_untracked_content(true);
        repo.diff_index_to_workdir(None, Some(&mut opts))?
    };

    parse_diff(&diff)
}

fn parse_diff(diff: &git2::Diff) -> Result<Diff, GitError> {
    let mut files = Vec::new();

    for (idx, delta) in diff.deltas().enumerate() {
        let new_path = delta.new_file().path_bytes().map(decode_path).transpose()?;
        let old_path = delta.old_file().path_bytes().map(decode_path).transpose()?;
        let path = new_path
            .clone()
            .or_else(|| old_path.clone())
            .unwrap_or_else(|| "<unknown>".to_string());
        let old_path = old_path.filter(|old| Some(old) != new_path.as_ref());

        let is_binary = delta.flags().is_binary();
        let mut hunks = Vec::new();
        let mut additions = 0;
        let mut deletions = 0;

        if !is_binary {
            if let Some(patch) = git2::Patch::from_diff(diff, idx)? {
                for hunk_idx in 0..patch.num_hunks() {
                    let (hunk, _) = patch.hunk(hunk_idx)?;
                    let mut lines = Vec::new();

                    for line_idx in 0..patch.num_lines_in_hunk(hunk_idx)? {
                        let line = patch.line_in_hunk(hunk_idx, line_idx)?;
                        let content = String::from_utf8_lossy(line.content())
                            .trim_end_matches('\n')
                            .to_string();

                        match line.origin() {
                            '+' => {
                                additions += 1;
                                lines.push(DiffLine::Addition(content));
                            }
                            '-' => {
                                deletions += 1;
                                lines.push(DiffLine::Deletion(content));
                            }
                            ' ' => lines.push(DiffLine::Context(content)),
                            _ => {}
                        }
                    }

                    hunks.push(Hunk {
                        old_start: hunk.old_start(),
                        old_lines: hunk.old_lines(),
                        new_start: hunk.new_start(),
                        new_lines: hunk.new_lines(),
                        lines,
                    });
                }
            }
        }

        files.push(FileDiff {
            path,
            old_path,
            hunks,
            additions,
            deletions,
            is_binary,
        });
    }

    Ok(Diff { files })
}

fn stage(repo: &Repository, paths: &[String]) -> Result<(), GitError> {
    let workdir = repo
        .workdir()
        .ok_or_else(|| GitError::NotARepository(repo.path().to_path_buf()))?
        .to_path_buf();
    let mut index = repo.index()?;

    for path in paths {
        if workdir.join(path).symlink_metadata().is_ok() {
            index.add_path(Path::new(path))?;
        } else {
            index.remove_path(Path::new(path))?;
        }
    }

    index.write()?;
    Ok(())
}

fn unstage(repo: &Repository, paths: &[String]) -> Result<(), GitError> {
    if is_unborn(repo)? {
        let mut index = repo.index()?;
        for path in paths {
            index.remove_path(Path::new(path))?;
        }
        index.write()?;
        return Ok(());
    }

    let head = repo.head()?.peel_to_commit()?;
    repo.reset_default(Some(head.as_object()), paths.iter().map(String::as_str))?;
    Ok(())
}

fn commit(repo: &Repository, message: &str, amend: bool) -> Result<String, GitError> {
    let mut index = repo.index()?;
    let tree_oid = index.write_tree()?;
    let tree = repo.find_tree(tree_oid)?;
    let signature = repo.signature()?;

    let oid = if amend {
        let head = repo.head()?.peel_to_commit()?;
        head.amend(
            Some("HEAD"),
            None,
            Some(&signature),
            None,
            Some(message),
            Some(&tree),
        )?
    } else {
        let parent = if is_unborn(repo)? {
            None
        } else {
            Some(repo.head()?.peel_to_commit()?)
        };
        let parents: Vec<&git2::Commit> = parent.iter().collect();
        repo.commit(
            Some("HEAD"),
            &signature,
            &signature,
            message,
            &tree,
            &parents,
        )?
    };

    Ok(oid.to_string())
}

fn checkout(repo: &Repository, branch: &str, track: Option<&str>) -> Result<(), GitError> {
    if let Some(remote) = track {
        let remote_branch = repo.find_branch(remote, BranchType::Remote)?;
        let commit = remote_branch.get().peel_to_commit()?;
        let mut local = repo.branch(branch, &commit, false)?;
        local.set_upstream(Some(remote))?;
    }

    let refname = format!("refs/heads/{}", branch);
    let target = repo.revparse_single(&refname)?;

    let mut builder = CheckoutBuilder::new();
    builder.safe();
    repo.checkout_tree(&target, Some(&mut builder))?;
    repo.set_head(&refname)?;
    Ok(())
}

fn create_branch(repo: &Repository, name: &str, start_point: Option<&str>) -> Result<(), GitError> {
    let commit = match start_point {
        Some(rev) => repo.revparse_single(rev)?.peel_to_commit()?,
        None => repo.head()?.peel_to_commit()?,
    };
    repo.branch(name, &commit, false)?;
    Ok(())
}

fn stash(repo: &mut Repository, message: Option<&str>) -> Result<String, GitError> {
    let signature = repo.signature()?;
    let message = match message {
        Some(m) if !m.trim().is_empty() => m.trim().to_string(),
        _ => format!("WIP on {}", read_head(repo)?.label()),
    };
    let oid = repo.stash_save(&signature, &message, None)?;
    Ok(oid.to_string())
}

fn ignore(workdir: &Path, path: &str) -> Result<(), GitError> {
    let gitignore = workdir.join(".gitignore");
    let mut existing = String::new();
    if let Ok(mut file) = std::fs::File::open(&gitignore) {
        file.read_to_string(&mut existing)?;
    }

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&gitignore)?;
    if !existing.is_empty() && !existing.ends_with('\n') {
        file.write_all(b"\n")?;
    }
    writeln!(file, "/{}", escape_pattern(path.trim_start_matches('/')))?;
    Ok(())
}

/// Quote a literal path for .gitignore so it matches only itself. The
/// leading `/` written by `ignore` already keeps `!` and `#` literal.
fn escape_pattern(path: &str) -> String {
    let body = path.trim_end_matches(' ');
    let mut out = String::with_capacity(path.len());
    for c in body.chars() {
        if matches!(c, '\\' | '*' | '?' | '[') {
            out.push('\\');
        }
        out.push(c);
    }
    // Unescaped trailing spaces are dropped by git
    for _ in body.len()..path.len() {
        out.push_str("\\ ");
    }
    out
}
