use crate::error::GitError;
use crate::model::{BranchListing, Commit, Diff, FileStatus};

/// The closed set of git operations the gateway understands
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GitOperation {
    /// Index and working tree status in one pass
    Status,
    /// Commits reachable from HEAD, newest first
    Log { limit: usize },
    /// HEAD plus local and remote branches
    Branches,
    /// Paths that differ between two trees; `from: None` means the empty tree
    ChangedPaths { from: Option<String>, to: String },
    /// Staged (HEAD vs index) or unstaged (index vs worktree) diff of a path
    Diff { path: String, staged: bool },
    Stage { paths: Vec<String> },
    Unstage { paths: Vec<String> },
    Commit { message: String, amend: bool },
    /// Switch to a local branch, creating it from `track` (a remote branch) first
    Checkout {
        branch: String,
        track: Option<String>,
    },
    CreateBranch {
        name: String,
        start_point: Option<String>,
    },
    DeleteBranch { name: String },
    Stash { message: Option<String> },
    Ignore { path: String },
}

impl GitOperation {
    pub fn name(&self) -> &'static str {
        match self {
            GitOperation::Status => "status",
            GitOperation::Log { .. } => "log",
            GitOperation::Branches => "branches",
            GitOperation::ChangedPaths { .. } => "changed-paths",
            GitOperation::Diff { .. } => "diff",
            GitOperation::Stage { .. } => "stage",
            GitOperation::Unstage { .. } => "unstage",
            GitOperation::Commit { .. } => "commit",
            GitOperation::Checkout { .. } => "checkout",
            GitOperation::CreateBranch { .. } => "create-branch",
            GitOperation::DeleteBranch { .. } => "delete-branch",
            GitOperation::Stash { .. } => "stash",
            GitOperation::Ignore { .. } => "ignore",
        }
    }

    /// Whether the operation mutates the repository
    pub fn is_write(&self) -> bool {
        !matches!(
            self,
            GitOperation::Status
                | GitOperation::Log { .. }
                | GitOperation::Branches
                | GitOperation::ChangedPaths { .. }
                | GitOperation::Diff { .. }
        )
    }
}

/// Typed result of a gateway call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GitOutput {
    Status(Vec<FileStatus>),
    Log(Vec<Commit>),
    Branches(BranchListing),
    Paths(Vec<String>),
    Diff(Diff),
    /// Id of a newly written commit (commit, amend, stash)
    Created(String),
    Done,
}

impl GitOutput {
    fn kind(&self) -> &'static str {
        match self {
            GitOutput::Status(_) => "status",
            GitOutput::Log(_) => "log",
            GitOutput::Branches(_) => "branches",
            GitOutput::Paths(_) => "paths",
            GitOutput::Diff(_) => "diff",
            GitOutput::Created(_) => "created",
            GitOutput::Done => "done",
        }
    }

    fn unexpected(self, wanted: &str) -> GitError {
        GitError::MalformedOutput(format!("expected {} output, got {}", wanted, self.kind()))
    }

    pub fn into_status(self) -> Result<Vec<FileStatus>, GitError> {
        match self {
            GitOutput::Status(files) => Ok(files),
            other => Err(other.unexpected("status")),
        }
    }

    pub fn into_log(self) -> Result<Vec<Commit>, GitError> {
        match self {
            GitOutput::Log(commits) => Ok(commits),
            other => Err(other.unexpected("log")),
        }
    }

    pub fn into_branches(self) -> Result<BranchListing, GitError> {
        match self {
            GitOutput::Branches(listing) => Ok(listing),
            other => Err(other.unexpected("branches")),
        }
    }

    pub fn into_paths(self) -> Result<Vec<String>, GitError> {
        match self {
            GitOutput::Paths(paths) => Ok(paths),
            other => Err(other.unexpected("paths")),
        }
    }

    pub fn into_diff(self) -> Result<Diff, GitError> {
        match self {
            GitOutput::Diff(diff) => Ok(diff),
            other => Err(other.unexpected("diff")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_write_split() {
        assert!(!GitOperation::Status.is_write());
        assert!(!GitOperation::Log { limit: 10 }.is_write());
        assert!(GitOperation::Commit {
            message: "fix".to_string(),
            amend: false
        }
        .is_write());
        assert!(GitOperation::Ignore {
            path: "target".to_string()
        }
        .is_write());
    }

    #[test]
    fn test_wrong_output_is_malformed() {
        let err = GitOutput::Done.into_status().unwrap_err();
        assert_eq!(
            err,
            GitError::MalformedOutput("expected status output, got done".to_string())
        );
        assert!(GitOutput::Log(Vec::new()).into_log().unwrap().is_empty());
    }
}
