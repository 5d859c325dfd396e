mod schema;
mod sqlite;
pub mod validation;

pub use sqlite::SqliteStore;

use crate::error::Result;
use crate::types::*;

/// Name of the branch created alongside every repository.
pub const DEFAULT_BRANCH: &str = "main";

/// Result of applying one push.
#[derive(Debug, Clone)]
pub struct PushOutcome {
    pub branch: Branch,
    pub commits: Vec<Commit>,
}

/// Store defines the persistence interface.
///
/// Every method is atomic on its own. `push` and `pull` additionally run all of
/// their steps inside a single transaction.
pub trait Store: Send + Sync {
    fn initialize(&self) -> Result<()>;

    // Repository operations
    fn create_repository(&self, name: &str) -> Result<Repository>;
    fn get_repository(&self, id: &str) -> Result<Option<Repository>>;
    fn get_repository_detail(&self, id: &str) -> Result<Option<RepositoryDetail>>;
    fn list_repositories(&self) -> Result<Vec<Repository>>;
    fn touch_repository(&self, id: &str) -> Result<()>;

    // Branch operations
    fn get_branch(&self, repo_id: &str, name: &str) -> Result<Option<Branch>>;
    fn list_branches(&self, repo_id: &str) -> Result<Vec<Branch>>;
    fn get_or_create_branch(&self, repo_id: &str, name: &str) -> Result<Branch>;

    // Commit operations
    fn append_commit(
        &self,
        repo_id: &str,
        branch_id: &str,
        message: &str,
        commit_hash: &str,
    ) -> Result<Commit>;
    fn list_commits(
        &self,
        repo_id: &str,
        branch_id: Option<&str>,
        limit: Option<usize>,
    ) -> Result<Vec<Commit>>;
    fn latest_commit(&self, repo_id: &str, branch_id: &str) -> Result<Option<Commit>>;
    fn count_commits(&self, repo_id: &str) -> Result<i64>;

    // File snapshot operations
    fn save_files(&self, repo_id: &str, commit_id: &str, files: &FileMap) -> Result<()>;
    fn list_files_for_commit(&self, repo_id: &str, commit_id: &str) -> Result<Vec<SnapshotFile>>;
    fn latest_snapshot(&self, repo_id: &str, branch_id: &str) -> Result<FileMap>;

    // Conversational history operations
    fn replace_history(&self, repo_id: &str, messages: &[HistoryEntry]) -> Result<()>;
    fn list_history(&self, repo_id: &str) -> Result<Vec<HistoryMessage>>;

    // Synchronization
    fn push(&self, repo_id: &str, req: &PushRequest) -> Result<PushOutcome>;
    fn pull(&self, repo_id: &str, branch: Option<&str>) -> Result<PullResponse>;
}

/// Picks the branch a pull reads from: the requested one if it exists, then
/// `main`, then the oldest branch. `branches` must be in creation order.
pub fn resolve_pull_branch<'a>(branches: &'a [Branch], requested: Option<&str>) -> Option<&'a Branch> {
    requested
        .and_then(|name| branches.iter().find(|b| b.name == name))
        .or_else(|| branches.iter().find(|b| b.name == DEFAULT_BRANCH))
        .or_else(|| branches.first())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn branch(name: &str) -> Branch {
        Branch {
            id: format!("br-{name}"),
            repo_id: "repo-1".to_string(),
            name: name.to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_resolve_prefers_requested_branch() {
        let branches = vec![branch("main"), branch("dev")];
        let picked = resolve_pull_branch(&branches, Some("dev")).unwrap();
        assert_eq!(picked.name, "dev");
    }

    #[test]
    fn test_resolve_unknown_request_falls_back_to_main() {
        let branches = vec![branch("dev"), branch("main")];
        let picked = resolve_pull_branch(&branches, Some("nope")).unwrap();
        assert_eq!(picked.name, "main");
    }

    #[test]
    fn test_resolve_without_main_uses_first_branch() {
        let branches = vec![branch("dev"), branch("feature")];
        let picked = resolve_pull_branch(&branches, None).unwrap();
        assert_eq!(picked.name, "dev");
    }

    #[test]
    fn test_resolve_empty() {
        assert!(resolve_pull_branch(&[], Some("main")).is_none());
    }
}
