use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{HistoryMessage, Role};

/// Path to full file content.
pub type FileMap = BTreeMap<String, String>;

/// Everything a client sends in one push.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushRequest {
    pub branch: String,
    #[serde(default)]
    pub commits: Vec<PushCommit>,
    #[serde(default)]
    pub files: FileMap,
    #[serde(default)]
    pub history: Vec<HistoryEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushCommit {
    pub hash: String,
    pub message: String,
    /// Branch the client recorded the commit on. The push-level branch wins.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
    /// Client-side commit time. The store stamps its own `created_at`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub role: Role,
    pub content: String,
    pub timestamp: String,
}

impl From<HistoryMessage> for HistoryEntry {
    fn from(msg: HistoryMessage) -> Self {
        Self {
            role: msg.role,
            content: msg.content,
            timestamp: msg.created_at,
        }
    }
}

/// Latest state of one branch plus the repository's whole conversational log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PullResponse {
    pub branch: String,
    pub files: FileMap,
    pub history: Vec<HistoryEntry>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_request_defaults_optional_sections() {
        let req: PushRequest = serde_json::from_str(r#"{"branch": "main"}"#).unwrap();
        assert_eq!(req.branch, "main");
        assert!(req.commits.is_empty());
        assert!(req.files.is_empty());
        assert!(req.history.is_empty());
    }

    #[test]
    fn test_push_commit_accepts_client_fields() {
        let commit: PushCommit = serde_json::from_str(
            r#"{"hash": "abc", "message": "m", "branch": "dev", "timestamp": "2025-01-01T00:00:00Z"}"#,
        )
        .unwrap();
        assert_eq!(commit.hash, "abc");
        assert_eq!(commit.branch.as_deref(), Some("dev"));
    }

    #[test]
    fn test_history_entry_rejects_unknown_role() {
        let result: Result<HistoryEntry, _> =
            serde_json::from_str(r#"{"role": "system", "content": "x", "timestamp": "t"}"#);
        assert!(result.is_err());
    }
}
