use serde::Serialize;

use super::{Commit, FileStatus};

/// Where HEAD points
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Head {
    /// On a branch. `target` is `None` while the branch is unborn.
    Branch { name: String, target: Option<String> },
    /// Detached at a commit
    Detached { sha: String },
}

impl Default for Head {
    fn default() -> Self {
        Head::Branch {
            name: "main".to_string(),
            target: None,
        }
    }
}

impl Head {
    pub fn branch_name(&self) -> Option<&str> {
        match self {
            Head::Branch { name, .. } => Some(name),
            Head::Detached { .. } => None,
        }
    }

    pub fn target(&self) -> Option<&str> {
        match self {
            Head::Branch { target, .. } => target.as_deref(),
            Head::Detached { sha } => Some(sha),
        }
    }

    pub fn is_unborn(&self) -> bool {
        matches!(self, Head::Branch { target: None, .. })
    }

    /// Short label for display
    pub fn label(&self) -> String {
        match self {
            Head::Branch { name, .. } => name.clone(),
            Head::Detached { sha } => format!("({} detached)", &sha[..7.min(sha.len())]),
        }
    }
}

/// A local or remote-tracking branch
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Branch {
    /// Short name, e.g. `main` or `origin/main`
    pub name: String,
    pub target: String,
    /// Upstream tracking branch for local branches
    pub upstream: Option<String>,
    pub is_head: bool,
}

/// One entry of the stash list. Index 0 is the most recent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StashEntry {
    pub index: usize,
    pub message: String,
    pub sha: String,
}

impl StashEntry {
    /// Name git uses for the entry, e.g. `stash@{0}`
    pub fn refname(&self) -> String {
        format!("stash@{{{}}}", self.index)
    }
}

/// HEAD, branches and stashes as returned by one gateway query
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BranchListing {
    pub head: Head,
    pub local: Vec<Branch>,
    pub remote: Vec<Branch>,
    pub stashes: Vec<StashEntry>,
}

/// Consistent in-memory view of repository state at one point in time
#[derive(Debug, Clone, Default, Serialize)]
pub struct Snapshot {
    /// Increments every time the model commits a new snapshot
    pub generation: u64,
    pub head: Head,
    pub local_branches: Vec<Branch>,
    pub remote_branches: Vec<Branch>,
    /// Stash list, most recent first. Read with the branches.
    pub stashes: Vec<StashEntry>,
    /// One entry per path, sorted by path
    pub files: Vec<FileStatus>,
    /// Most recent commits from HEAD, newest first
    pub commits: Vec<Commit>,
}

// Snapshots compare by repository state; the generation only orders them.
impl PartialEq for Snapshot {
    fn eq(&self, other: &Self) -> bool {
        self.head == other.head
            && self.local_branches == other.local_branches
            && self.remote_branches == other.remote_branches
            && self.stashes == other.stashes
            && self.files == other.files
            && self.commits == other.commits
    }
}

impl Eq for Snapshot {}

impl Snapshot {
    pub fn staged_files(&self) -> impl Iterator<Item = &FileStatus> {
        self.files.iter().filter(|f| f.is_staged())
    }

    pub fn staged_count(&self) -> usize {
        self.staged_files().count()
    }

    pub fn conflicted_paths(&self) -> Vec<String> {
        self.files
            .iter()
            .filter(|f| f.conflicted)
            .map(|f| f.path.clone())
            .collect()
    }

    pub fn file(&self, path: &str) -> Option<&FileStatus> {
        self.files
            .binary_search_by(|f| f.path.as_str().cmp(path))
            .ok()
            .map(|idx| &self.files[idx])
    }

    pub fn local_branch(&self, name: &str) -> Option<&Branch> {
        self.local_branches.iter().find(|b| b.name == name)
    }

    /// Remote branches whose name after the remote prefix equals `name`
    pub fn remote_candidates(&self, name: &str) -> Vec<&Branch> {
        self.remote_branches
            .iter()
            .filter(|b| {
                b.name
                    .split_once('/')
                    .map(|(_, short)| short == name)
                    .unwrap_or(false)
            })
            .collect()
    }

    pub fn is_clean(&self) -> bool {
        self.files.is_empty()
    }

    pub fn apply_branches(&mut self, listing: BranchListing) {
        self.head = listing.head;
        self.local_branches = listing.local;
        self.remote_branches = listing.remote;
        self.stashes = listing.stashes;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{StagedState, WorktreeState};

    fn branch(name: &str) -> Branch {
        Branch {
            name: name.to_string(),
            target: "abc".to_string(),
            upstream: None,
            is_head: false,
        }
    }

    #[test]
    fn test_equality_ignores_generation() {
        let a = Snapshot {
            generation: 1,
            ..Default::default()
        };
        let b = Snapshot {
            generation: 7,
            ..Default::default()
        };
        assert_eq!(a, b);
    }

    #[test]
    fn test_file_lookup_on_sorted_entries() {
        let mut a = FileStatus::new("a.txt");
        a.staged = StagedState::Modified;
        let mut b = FileStatus::new("b.txt");
        b.worktree = WorktreeState::Untracked;
        let snapshot = Snapshot {
            files: vec![a, b],
            ..Default::default()
        };

        assert!(snapshot.file("b.txt").unwrap().is_untracked());
        assert!(snapshot.file("c.txt").is_none());
        assert_eq!(snapshot.staged_count(), 1);
    }

    #[test]
    fn test_remote_candidates() {
        let snapshot = Snapshot {
            remote_branches: vec![
                branch("origin/topic"),
                branch("upstream/topic"),
                branch("origin/main"),
            ],
            ..Default::default()
        };
        assert_eq!(snapshot.remote_candidates("topic").len(), 2);
        assert_eq!(snapshot.remote_candidates("main").len(), 1);
        assert!(snapshot.remote_candidates("missing").is_empty());
    }

    #[test]
    fn test_apply_branches_replaces_stashes() {
        let mut snapshot = Snapshot::default();
        snapshot.apply_branches(BranchListing {
            stashes: vec![StashEntry {
                index: 0,
                message: "WIP on main".to_string(),
                sha: "abc".to_string(),
            }],
            ..Default::default()
        });
        assert_eq!(snapshot.stashes[0].refname(), "stash@{0}");

        snapshot.apply_branches(BranchListing::default());
        assert!(snapshot.stashes.is_empty());
    }

    #[test]
    fn test_head_labels() {
        let detached = Head::Detached {
            sha: "0123456789".to_string(),
        };
        assert_eq!(detached.label(), "(0123456 detached)");
        assert!(Head::default().is_unborn());
    }
}
