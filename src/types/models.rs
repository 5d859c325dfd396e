use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Repository {
    pub id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Branch {
    pub id: String,
    pub repo_id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Commit {
    pub id: String,
    pub repo_id: String,
    pub branch_id: String,
    pub message: String,
    /// Client-supplied identifier, stored verbatim.
    pub commit_hash: String,
    pub created_at: DateTime<Utc>,
}

/// Full content of one path as of one commit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotFile {
    pub id: String,
    pub repo_id: String,
    pub commit_id: String,
    pub path: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Self::User),
            "assistant" => Ok(Self::Assistant),
            other => Err(format!("unknown role '{other}'")),
        }
    }
}

/// One stored line of a repository's conversational log.
///
/// `created_at` is the timestamp the client sent, kept as the exact RFC 3339
/// string it arrived as.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryMessage {
    pub id: String,
    pub repo_id: String,
    pub role: Role,
    pub content: String,
    pub created_at: String,
}

/// A commit annotated with the name of the branch it belongs to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitWithBranch {
    #[serde(flatten)]
    pub commit: Commit,
    pub branch_name: String,
}

/// A repository with its branches and commit total, read at one instant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepositoryDetail {
    pub repository: Repository,
    pub branches: Vec<Branch>,
    pub commit_count: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parsing() {
        assert_eq!("user".parse::<Role>().unwrap(), Role::User);
        assert_eq!("assistant".parse::<Role>().unwrap(), Role::Assistant);
        assert!("system".parse::<Role>().is_err());
        assert!("User".parse::<Role>().is_err());
    }

    #[test]
    fn test_role_serde_is_lowercase() {
        assert_eq!(serde_json::to_string(&Role::Assistant).unwrap(), "\"assistant\"");
        let role: Role = serde_json::from_str("\"user\"").unwrap();
        assert_eq!(role, Role::User);
    }
}
