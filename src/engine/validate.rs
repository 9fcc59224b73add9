use std::collections::BTreeSet;

use crate::error::ValidationError;
use crate::model::{ActionKind, Snapshot};
use crate::service::GitOperation;

/// An accepted action, ready for the gateway
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Validated {
    pub operation: GitOperation,
    /// Commit to compare against HEAD before running, for checkouts that
    /// would rewrite the working tree
    pub compare_to: Option<String>,
}

impl Validated {
    fn run(operation: GitOperation) -> Self {
        Self {
            operation,
            compare_to: None,
        }
    }
}

/// Check `action` against `snapshot` and translate it into a gateway call.
///
/// Pure: reads nothing but the snapshot. Checkouts that switch trees while
/// the working tree has changes come back with `compare_to` set and must
/// also pass [`check_overwrites`].
pub fn validate(snapshot: &Snapshot, action: &ActionKind) -> Result<Validated, ValidationError> {
    match action {
        ActionKind::Stage { paths } => {
            require_paths(paths)?;
            for path in paths {
                match snapshot.file(path) {
                    Some(file) if file.has_worktree_changes() => {}
                    _ => return Err(ValidationError::UnknownPath(path.clone())),
                }
            }
            Ok(Validated::run(GitOperation::Stage {
                paths: paths.clone(),
            }))
        }
        ActionKind::Unstage { paths } => {
            require_paths(paths)?;
            for path in paths {
                match snapshot.file(path) {
                    Some(file) if file.is_staged() => {}
                    _ => return Err(ValidationError::UnknownPath(path.clone())),
                }
            }
            Ok(Validated::run(GitOperation::Unstage {
                paths: paths.clone(),
            }))
        }
        ActionKind::Commit { message } => {
            reject_conflicts(snapshot)?;
            if snapshot.staged_count() == 0 {
                return Err(ValidationError::EmptyCommit);
            }
            let message = require_message(message)?;
            Ok(Validated::run(GitOperation::Commit {
                message,
                amend: false,
            }))
        }
        ActionKind::Amend { message } => {
            if snapshot.head.target().is_none() {
                return Err(ValidationError::Unsupported(
                    "there is no commit to amend yet".to_string(),
                ));
            }
            reject_conflicts(snapshot)?;
            let message = require_message(message)?;
            Ok(Validated::run(GitOperation::Commit {
                message,
                amend: true,
            }))
        }
        ActionKind::Checkout { branch } => validate_checkout(snapshot, branch),
        ActionKind::CreateBranch { name, start_point } => {
            if !git2::Branch::name_is_valid(name).unwrap_or(false) {
                return Err(ValidationError::Unsupported(format!(
                    "'{}' is not a valid branch name",
                    name
                )));
            }
            if snapshot.local_branch(name).is_some() {
                return Err(ValidationError::BranchExists(name.clone()));
            }
            if start_point.is_none() && snapshot.head.target().is_none() {
                return Err(ValidationError::Unsupported(
                    "cannot branch from an unborn HEAD".to_string(),
                ));
            }
            Ok(Validated::run(GitOperation::CreateBranch {
                name: name.clone(),
                start_point: start_point.clone(),
            }))
        }
        ActionKind::DeleteBranch { name } => {
            if snapshot.local_branch(name).is_none() {
                return Err(ValidationError::UnknownRef(name.clone()));
            }
            if snapshot.head.branch_name() == Some(name.as_str()) {
                return Err(ValidationError::Unsupported(format!(
                    "'{}' is checked out",
                    name
                )));
            }
            Ok(Validated::run(GitOperation::DeleteBranch { name: name.clone() }))
        }
        ActionKind::Stash { message } => {
            if !snapshot.files.iter().any(|f| f.has_tracked_changes()) {
                return Err(ValidationError::NothingToStash);
            }
            Ok(Validated::run(GitOperation::Stash {
                message: message.clone(),
            }))
        }
        ActionKind::Ignore { path } => match snapshot.file(path) {
            Some(file) if file.is_untracked() => {
                Ok(Validated::run(GitOperation::Ignore { path: path.clone() }))
            }
            _ => Err(ValidationError::UnknownPath(path.clone())),
        },
    }
}

fn validate_checkout(snapshot: &Snapshot, branch: &str) -> Result<Validated, ValidationError> {
    // Switching to the branch we are on changes nothing
    if snapshot.head.branch_name() == Some(branch) {
        return Ok(Validated::run(GitOperation::Checkout {
            branch: branch.to_string(),
            track: None,
        }));
    }

    reject_conflicts(snapshot)?;

    let (target, track) = match snapshot.local_branch(branch) {
        Some(local) => (local.target.clone(), None),
        None => {
            let candidates = snapshot.remote_candidates(branch);
            match candidates.as_slice() {
                [] => return Err(ValidationError::UnknownRef(branch.to_string())),
                [remote] => (remote.target.clone(), Some(remote.name.clone())),
                _ => {
                    return Err(ValidationError::AmbiguousRef {
                        name: branch.to_string(),
                        candidates: candidates.iter().map(|b| b.name.clone()).collect(),
                    })
                }
            }
        }
    };

    let same_tree = snapshot.head.target() == Some(target.as_str());
    let compare_to = if snapshot.is_clean() || same_tree {
        None
    } else {
        Some(target)
    };

    Ok(Validated {
        operation: GitOperation::Checkout {
            branch: branch.to_string(),
            track,
        },
        compare_to,
    })
}

/// Reject a checkout when any changed or untracked path would be
/// overwritten. `changed` lists the paths that differ between HEAD and the
/// target commit.
pub fn check_overwrites(snapshot: &Snapshot, changed: &[String]) -> Result<(), ValidationError> {
    let changed: BTreeSet<&str> = changed.iter().map(String::as_str).collect();
    let paths: Vec<String> = snapshot
        .files
        .iter()
        .filter(|f| {
            changed.contains(f.path.as_str())
                || f.original_path
                    .as_deref()
                    .map(|p| changed.contains(p))
                    .unwrap_or(false)
        })
        .map(|f| f.path.clone())
        .collect();

    if paths.is_empty() {
        Ok(())
    } else {
        Err(ValidationError::DirtyTree { paths })
    }
}

fn reject_conflicts(snapshot: &Snapshot) -> Result<(), ValidationError> {
    let paths = snapshot.conflicted_paths();
    if paths.is_empty() {
        Ok(())
    } else {
        Err(ValidationError::DirtyTree { paths })
    }
}

fn require_paths(paths: &[String]) -> Result<(), ValidationError> {
    if paths.is_empty() {
        Err(ValidationError::Unsupported("no paths given".to_string()))
    } else {
        Ok(())
    }
}

fn require_message(message: &str) -> Result<String, ValidationError> {
    let message = message.trim();
    if message.is_empty() {
        Err(ValidationError::EmptyMessage)
    } else {
        Ok(message.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Branch, FileStatus, Head, StagedState, WorktreeState};

    fn branch(name: &str, target: &str) -> Branch {
        Branch {
            name: name.to_string(),
            target: target.to_string(),
            upstream: None,
            is_head: false,
        }
    }

    fn modified(path: &str) -> FileStatus {
        let mut f = FileStatus::new(path);
        f.worktree = WorktreeState::Modified;
        f
    }

    fn staged(path: &str) -> FileStatus {
        let mut f = FileStatus::new(path);
        f.staged = StagedState::Modified;
        f
    }

    fn on_main() -> Snapshot {
        Snapshot {
            head: Head::Branch {
                name: "main".to_string(),
                target: Some("aaa".to_string()),
            },
            local_branches: vec![branch("main", "aaa"), branch("topic", "bbb")],
            remote_branches: vec![
                branch("origin/feature", "ccc"),
                branch("origin/shared", "ddd"),
                branch("upstream/shared", "eee"),
            ],
            ..Default::default()
        }
    }

    fn commit(message: &str) -> ActionKind {
        ActionKind::Commit {
            message: message.to_string(),
        }
    }

    fn checkout(branch: &str) -> ActionKind {
        ActionKind::Checkout {
            branch: branch.to_string(),
        }
    }

    #[test]
    fn test_commit_requires_staged_changes() {
        let mut snapshot = on_main();
        snapshot.files = vec![modified("a.txt")];
        assert_eq!(
            validate(&snapshot, &commit("fix")).unwrap_err(),
            ValidationError::EmptyCommit
        );

        snapshot.files.push(staged("b.txt"));
        let validated = validate(&snapshot, &commit("  fix\n")).unwrap();
        assert_eq!(
            validated.operation,
            GitOperation::Commit {
                message: "fix".to_string(),
                amend: false
            }
        );
    }

    #[test]
    fn test_commit_rejects_blank_message_and_conflicts() {
        let mut snapshot = on_main();
        snapshot.files = vec![staged("a.txt")];
        assert_eq!(
            validate(&snapshot, &commit("   ")).unwrap_err(),
            ValidationError::EmptyMessage
        );

        let mut conflicted = FileStatus::new("b.txt");
        conflicted.conflicted = true;
        snapshot.files.push(conflicted);
        assert!(matches!(
            validate(&snapshot, &commit("fix")).unwrap_err(),
            ValidationError::DirtyTree { paths } if paths == vec!["b.txt".to_string()]
        ));
    }

    #[test]
    fn test_amend_needs_a_commit() {
        let snapshot = Snapshot::default();
        let amend = ActionKind::Amend {
            message: "reword".to_string(),
        };
        assert!(matches!(
            validate(&snapshot, &amend).unwrap_err(),
            ValidationError::Unsupported(_)
        ));
        assert!(validate(&on_main(), &amend).is_ok());
    }

    #[test]
    fn test_checkout_clean_tree_skips_comparison() {
        let validated = validate(&on_main(), &checkout("topic")).unwrap();
        assert_eq!(validated.compare_to, None);
    }

    #[test]
    fn test_checkout_dirty_tree_compares_target() {
        let mut snapshot = on_main();
        snapshot.files = vec![modified("a.txt")];
        let validated = validate(&snapshot, &checkout("topic")).unwrap();
        assert_eq!(validated.compare_to.as_deref(), Some("bbb"));

        assert!(check_overwrites(&snapshot, &["b.txt".to_string()]).is_ok());
        assert_eq!(
            check_overwrites(&snapshot, &["a.txt".to_string()]).unwrap_err(),
            ValidationError::DirtyTree {
                paths: vec!["a.txt".to_string()]
            }
        );
    }

    #[test]
    fn test_checkout_remote_dwim() {
        let validated = validate(&on_main(), &checkout("feature")).unwrap();
        assert_eq!(
            validated.operation,
            GitOperation::Checkout {
                branch: "feature".to_string(),
                track: Some("origin/feature".to_string()),
            }
        );

        assert!(matches!(
            validate(&on_main(), &checkout("shared")).unwrap_err(),
            ValidationError::AmbiguousRef { candidates, .. } if candidates.len() == 2
        ));
        assert_eq!(
            validate(&on_main(), &checkout("nope")).unwrap_err(),
            ValidationError::UnknownRef("nope".to_string())
        );
    }

    #[test]
    fn test_checkout_current_branch_is_accepted() {
        let mut snapshot = on_main();
        let mut conflicted = FileStatus::new("a.txt");
        conflicted.conflicted = true;
        snapshot.files = vec![conflicted];
        assert!(validate(&snapshot, &checkout("main")).is_ok());
    }

    #[test]
    fn test_stage_and_unstage_paths() {
        let mut snapshot = on_main();
        snapshot.files = vec![modified("a.txt"), staged("b.txt")];

        let stage = |p: &str| ActionKind::Stage {
            paths: vec![p.to_string()],
        };
        let unstage = |p: &str| ActionKind::Unstage {
            paths: vec![p.to_string()],
        };

        assert!(validate(&snapshot, &stage("a.txt")).is_ok());
        assert_eq!(
            validate(&snapshot, &stage("b.txt")).unwrap_err(),
            ValidationError::UnknownPath("b.txt".to_string())
        );
        assert!(validate(&snapshot, &unstage("b.txt")).is_ok());
        assert!(validate(&snapshot, &unstage("a.txt")).is_err());
        assert!(validate(&snapshot, &ActionKind::Stage { paths: vec![] }).is_err());
    }

    #[test]
    fn test_branch_management() {
        let snapshot = on_main();
        let create = |name: &str| ActionKind::CreateBranch {
            name: name.to_string(),
            start_point: None,
        };
        let delete = |name: &str| ActionKind::DeleteBranch {
            name: name.to_string(),
        };

        assert!(validate(&snapshot, &create("new-work")).is_ok());
        assert_eq!(
            validate(&snapshot, &create("topic")).unwrap_err(),
            ValidationError::BranchExists("topic".to_string())
        );
        assert!(matches!(
            validate(&snapshot, &create("bad..name")).unwrap_err(),
            ValidationError::Unsupported(_)
        ));
        assert!(matches!(
            validate(&Snapshot::default(), &create("first")).unwrap_err(),
            ValidationError::Unsupported(_)
        ));

        assert!(validate(&snapshot, &delete("topic")).is_ok());
        assert!(matches!(
            validate(&snapshot, &delete("main")).unwrap_err(),
            ValidationError::Unsupported(_)
        ));
        assert_eq!(
            validate(&snapshot, &delete("gone")).unwrap_err(),
            ValidationError::UnknownRef("gone".to_string())
        );
    }

    #[test]
    fn test_stash_and_ignore() {
        let mut snapshot = on_main();
        let mut untracked = FileStatus::new("notes.txt");
        untracked.worktree = WorktreeState::Untracked;
        snapshot.files = vec![untracked];

        assert_eq!(
            validate(&snapshot, &ActionKind::Stash { message: None }).unwrap_err(),
            ValidationError::NothingToStash
        );
        assert!(validate(
            &snapshot,
            &ActionKind::Ignore {
                path: "notes.txt".to_string()
            }
        )
        .is_ok());

        snapshot.files.push(modified("src.rs"));
        assert!(validate(&snapshot, &ActionKind::Stash { message: None }).is_ok());
        assert!(validate(
            &snapshot,
            &ActionKind::Ignore {
                path: "src.rs".to_string()
            }
        )
        .is_err());
    }
}
