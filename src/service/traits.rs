use crate::error::GitError;

use super::{GitOperation, GitOutput};

/// Executes git operations on one repository.
///
/// Implementations never retry: a failed write may have partially applied,
/// and callers are expected to re-read repository state instead.
pub trait GitGateway: Clone + Send + Sync + 'static {
    fn execute(
        &self,
        operation: GitOperation,
    ) -> impl std::future::Future<Output = Result<GitOutput, GitError>> + Send;
}
