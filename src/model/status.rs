use std::time::Instant;

use serde::Serialize;

/// State of a path in the index relative to HEAD
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StagedState {
    #[default]
    Unmodified,
    Added,
    Modified,
    Deleted,
    Renamed,
}

/// State of a path in the working tree relative to the index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WorktreeState {
    #[default]
    Unmodified,
    Untracked,
    Modified,
    Deleted,
    Renamed,
}

/// Status of one path in the index and working tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileStatus {
    pub path: String,
    pub staged: StagedState,
    pub worktree: WorktreeState,
    /// Unresolved merge conflict
    pub conflicted: bool,
    /// Previous path when the entry is a rename
    pub original_path: Option<String>,
}

impl FileStatus {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            staged: StagedState::Unmodified,
            worktree: WorktreeState::Unmodified,
            conflicted: false,
            original_path: None,
        }
    }

    pub fn is_staged(&self) -> bool {
        self.staged != StagedState::Unmodified
    }

    pub fn is_untracked(&self) -> bool {
        self.worktree == WorktreeState::Untracked
    }

    /// Has working tree changes that could be staged
    pub fn has_worktree_changes(&self) -> bool {
        self.worktree != WorktreeState::Unmodified || self.conflicted
    }

    /// Has changes to tracked content, staged or not
    pub fn has_tracked_changes(&self) -> bool {
        self.is_staged()
            || matches!(
                self.worktree,
                WorktreeState::Modified | WorktreeState::Deleted | WorktreeState::Renamed
            )
    }

    /// Two-column short status code, like `git status --short`
    pub fn code(&self) -> String {
        if self.conflicted {
            return "UU".to_string();
        }
        if self.is_untracked() {
            return "??".to_string();
        }
        let staged = match self.staged {
            StagedState::Unmodified => ' ',
            StagedState::Added => 'A',
            StagedState::Modified => 'M',
            StagedState::Deleted => 'D',
            StagedState::Renamed => 'R',
        };
        let worktree = match self.worktree {
            WorktreeState::Unmodified | WorktreeState::Untracked => ' ',
            WorktreeState::Modified => 'M',
            WorktreeState::Deleted => 'D',
            WorktreeState::Renamed => 'R',
        };
        format!("{}{}", staged, worktree)
    }
}

/// A status message to show in the status bar
#[derive(Debug, Clone)]
pub struct StatusMessage {
    pub text: String,
    pub level: StatusLevel,
    pub expires: Option<Instant>,
}

/// Level of status message (affects styling)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLevel {
    Info,
    Success,
    Warning,
    Error,
}

impl StatusMessage {
    /// Create a new info message
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            level: StatusLevel::Info,
            expires: None,
        }
    }

    /// Create a new success message that expires
    pub fn success(text: impl Into<String>) -> Self {
        Self::expiring(text, StatusLevel::Success, 3)
    }

    /// Create a new error message
    pub fn error(text: impl Into<String>) -> Self {
        Self::expiring(text, StatusLevel::Error, 6)
    }

    /// Create a new warning message
    pub fn warning(text: impl Into<String>) -> Self {
        Self::expiring(text, StatusLevel::Warning, 4)
    }

    fn expiring(text: impl Into<String>, level: StatusLevel, secs: u64) -> Self {
        Self {
            text: text.into(),
            level,
            expires: Some(Instant::now() + std::time::Duration::from_secs(secs)),
        }
    }

    /// Check if the message has expired
    pub fn is_expired(&self) -> bool {
        self.expires.map(|e| Instant::now() > e).unwrap_or(false)
    }
}
