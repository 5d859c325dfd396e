use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{Commit, CommitWithBranch, Repository, SnapshotFile};

/// Commit listings never return more than this many entries.
pub const MAX_COMMIT_LIST: usize = 100;

#[derive(Debug, Deserialize)]
pub struct CreateRepositoryRequest {
    pub name: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateRepositoryResponse {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RepositoryListResponse {
    pub repositories: Vec<Repository>,
}

#[derive(Debug, Default, Deserialize)]
pub struct BranchParams {
    #[serde(default)]
    pub branch: Option<String>,
}

impl BranchParams {
    /// The requested branch. `?branch=` with no value counts as not given.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.branch.as_deref().filter(|b| !b.is_empty())
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CommitListResponse {
    pub commits: Vec<CommitWithBranch>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TreeEntryResponse {
    pub id: String,
    pub path: String,
    pub created_at: DateTime<Utc>,
}

impl From<SnapshotFile> for TreeEntryResponse {
    fn from(file: SnapshotFile) -> Self {
        Self {
            id: file.id,
            path: file.path,
            created_at: file.created_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TreeResponse {
    pub tree: Vec<TreeEntryResponse>,
    pub commit: Option<Commit>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PushResponse {
    pub success: bool,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(branch: Option<&str>) -> BranchParams {
        BranchParams {
            branch: branch.map(str::to_string),
        }
    }

    #[test]
    fn test_branch_name_treats_empty_as_absent() {
        assert_eq!(params(Some("dev")).name(), Some("dev"));
        assert_eq!(params(Some("")).name(), None);
        assert_eq!(params(None).name(), None);
    }
}
