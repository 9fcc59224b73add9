use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Application-level errors
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Not a git repository: {0}")]
    NotARepository(PathBuf),

    #[error("Repository already exists at {0}")]
    AlreadyARepository(PathBuf),

    #[error("Action rejected: {0}")]
    Validation(#[from] ValidationError),

    #[error("Git error: {0}")]
    Git(#[from] GitError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Action was cancelled before it started")]
    Cancelled,

    #[error("Workspace has shut down")]
    ShutDown,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("File watcher error: {0}")]
    Watch(#[from] notify::Error),
}

/// Errors reported by the git gateway
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GitError {
    #[error("Not a git repository: {0}")]
    NotARepository(PathBuf),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("{operation} timed out after {after:?}")]
    Timeout {
        operation: &'static str,
        after: Duration,
    },

    #[error("Unexpected git output: {0}")]
    MalformedOutput(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("{0}")]
    Operation(String),
}

impl From<git2::Error> for GitError {
    fn from(e: git2::Error) -> Self {
        let message = e.message().to_string();
        match (e.code(), e.class()) {
            (
                git2::ErrorCode::Conflict
                | git2::ErrorCode::MergeConflict
                | git2::ErrorCode::Uncommitted
                | git2::ErrorCode::Locked,
                _,
            ) => GitError::Conflict(message),
            (git2::ErrorCode::NotFound, _) => GitError::NotFound(message),
            (git2::ErrorCode::Auth | git2::ErrorCode::Certificate, _) => {
                GitError::PermissionDenied(message)
            }
            (_, git2::ErrorClass::Os) if message.to_lowercase().contains("permission") => {
                GitError::PermissionDenied(message)
            }
            _ => GitError::Operation(message),
        }
    }
}

impl From<std::io::Error> for GitError {
    fn from(e: std::io::Error) -> Self {
        match e.kind() {
            std::io::ErrorKind::PermissionDenied => GitError::PermissionDenied(e.to_string()),
            std::io::ErrorKind::NotFound => GitError::NotFound(e.to_string()),
            _ => GitError::Operation(e.to_string()),
        }
    }
}

/// Reasons an action is refused before any git command runs
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Local changes would be overwritten: {}", .paths.join(", "))]
    DirtyTree { paths: Vec<String> },

    #[error("Nothing staged to commit")]
    EmptyCommit,

    #[error("Commit message is empty")]
    EmptyMessage,

    #[error("'{name}' matches several remote branches: {}", .candidates.join(", "))]
    AmbiguousRef {
        name: String,
        candidates: Vec<String>,
    },

    #[error("Unknown branch or revision '{0}'")]
    UnknownRef(String),

    #[error("Path has no matching changes: {0}")]
    UnknownPath(String),

    #[error("Branch '{0}' already exists")]
    BranchExists(String),

    #[error("No local changes to stash")]
    NothingToStash,

    #[error("Unsupported: {0}")]
    Unsupported(String),
}

/// Problems loading the settings file
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid settings in {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Invalid key binding '{0}'")]
    InvalidKey(String),
}

/// Coarse error classes used to decide how a failure is handled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The session has no usable repository (not a repo, permissions, settings)
    Environment,
    /// Rejected before execution; repository untouched
    Validation,
    /// Git ran and failed
    GitOperation,
    /// A gateway call exceeded its deadline
    Timeout,
    /// Git produced output we could not interpret
    Parse,
}

impl GitError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            GitError::NotARepository(_) | GitError::PermissionDenied(_) => ErrorKind::Environment,
            GitError::Timeout { .. } => ErrorKind::Timeout,
            GitError::MalformedOutput(_) => ErrorKind::Parse,
            GitError::Conflict(_) | GitError::NotFound(_) | GitError::Operation(_) => {
                ErrorKind::GitOperation
            }
        }
    }
}

impl AppError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::Validation(_) | AppError::Cancelled => ErrorKind::Validation,
            AppError::Git(e) => e.kind(),
            AppError::NotARepository(_)
            | AppError::AlreadyARepository(_)
            | AppError::Config(_)
            | AppError::ShutDown
            | AppError::Io(_)
            | AppError::Watch(_) => ErrorKind::Environment,
        }
    }

    /// Whether the in-memory snapshot can no longer be trusted after this error
    pub fn requires_resync(&self) -> bool {
        matches!(self.kind(), ErrorKind::GitOperation | ErrorKind::Timeout)
    }
}

/// Result type alias for app operations
pub type AppResult<T> = Result<T, AppError>;
