use std::fmt;

use crate::error::ValidationError;

use super::ScopeSet;

/// Identifier assigned to each submitted action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ActionId(pub u64);

impl fmt::Display for ActionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A mutation the user asked for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionKind {
    Stage { paths: Vec<String> },
    Unstage { paths: Vec<String> },
    Commit { message: String },
    /// Rewrite the HEAD commit with the current index and a new message
    Amend { message: String },
    Checkout { branch: String },
    CreateBranch {
        name: String,
        start_point: Option<String>,
    },
    DeleteBranch { name: String },
    Stash { message: Option<String> },
    /// Add the path to the top-level .gitignore
    Ignore { path: String },
}

impl ActionKind {
    pub fn name(&self) -> &'static str {
        match self {
            ActionKind::Stage { .. } => "stage",
            ActionKind::Unstage { .. } => "unstage",
            ActionKind::Commit { .. } => "commit",
            ActionKind::Amend { .. } => "amend",
            ActionKind::Checkout { .. } => "checkout",
            ActionKind::CreateBranch { .. } => "create-branch",
            ActionKind::DeleteBranch { .. } => "delete-branch",
            ActionKind::Stash { .. } => "stash",
            ActionKind::Ignore { .. } => "ignore",
        }
    }

    /// Snapshot sections that may change when this action runs
    pub fn affected_scopes(&self) -> ScopeSet {
        match self {
            ActionKind::Stage { .. } | ActionKind::Unstage { .. } | ActionKind::Ignore { .. } => {
                ScopeSet::STATUS
            }
            // The stash list is read with the branches
            ActionKind::Stash { .. } => ScopeSet::STATUS | ScopeSet::BRANCHES,
            ActionKind::Commit { .. } | ActionKind::Amend { .. } => ScopeSet::ALL,
            ActionKind::Checkout { .. } => ScopeSet::ALL,
            ActionKind::CreateBranch { .. } | ActionKind::DeleteBranch { .. } => {
                ScopeSet::BRANCHES
            }
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionKind::Stage { paths } if paths.len() == 1 => write!(f, "stage {}", paths[0]),
            ActionKind::Stage { paths } => write!(f, "stage {} files", paths.len()),
            ActionKind::Unstage { paths } if paths.len() == 1 => {
                write!(f, "unstage {}", paths[0])
            }
            ActionKind::Unstage { paths } => write!(f, "unstage {} files", paths.len()),
            ActionKind::Commit { .. } => write!(f, "commit"),
            ActionKind::Amend { .. } => write!(f, "amend last commit"),
            ActionKind::Checkout { branch } => write!(f, "checkout {}", branch),
            ActionKind::CreateBranch { name, .. } => write!(f, "create branch {}", name),
            ActionKind::DeleteBranch { name } => write!(f, "delete branch {}", name),
            ActionKind::Stash { .. } => write!(f, "stash changes"),
            ActionKind::Ignore { path } => write!(f, "ignore {}", path),
        }
    }
}

/// Outcome of validating an action against the current snapshot
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ValidationState {
    #[default]
    Pending,
    Accepted,
    Rejected(ValidationError),
}

/// A requested mutation travelling through the dispatcher. Never persisted.
#[derive(Debug, Clone)]
pub struct PendingAction {
    pub id: ActionId,
    pub kind: ActionKind,
    pub validation: ValidationState,
}

impl PendingAction {
    pub fn new(id: ActionId, kind: ActionKind) -> Self {
        Self {
            id,
            kind,
            validation: ValidationState::Pending,
        }
    }
}
