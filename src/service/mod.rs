mod git;
mod ops;
mod traits;

pub use git::Git2Gateway;
pub use ops::{GitOperation, GitOutput};
pub use traits::GitGateway;
