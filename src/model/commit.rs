use chrono::{DateTime, Utc};
use serde::Serialize;

/// A git commit
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Commit {
    pub sha: String,
    /// Parent ids in the order git records them
    pub parents: Vec<String>,
    pub author: String,
    pub message: String,
    pub date: DateTime<Utc>,
}

impl Commit {
    /// Get the short SHA (first 7 characters)
    pub fn short_sha(&self) -> &str {
        &self.sha[..7.min(self.sha.len())]
    }

    /// First line of the message
    pub fn summary(&self) -> &str {
        self.message.lines().next().unwrap_or("")
    }

    pub fn is_merge(&self) -> bool {
        self.parents.len() > 1
    }
}
