mod action;
mod commit;
mod diff;
mod scope;
mod snapshot;
mod status;

pub use action::{ActionId, ActionKind, PendingAction, ValidationState};
pub use commit::Commit;
pub use diff::{Diff, DiffLine, FileDiff, Hunk};
pub use scope::ScopeSet;
pub use snapshot::{Branch, BranchListing, Head, Snapshot, StashEntry};
pub use status::{FileStatus, StagedState, StatusLevel, StatusMessage, WorktreeState};
