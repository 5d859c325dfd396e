use chrono::DateTime;

use crate::error::{Error, Result};
use crate::types::PushRequest;

pub fn validate_repo_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::Validation("Repository name is required".to_string()));
    }
    Ok(())
}

pub fn validate_branch_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::Validation("Branch name is required".to_string()));
    }
    Ok(())
}

fn validate_file_path(path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(Error::Validation("File path cannot be empty".to_string()));
    }
    if path.contains('\0') {
        return Err(Error::Validation(format!(
            "File path '{}' contains a NUL byte",
            path.escape_default()
        )));
    }
    Ok(())
}

pub fn validate_timestamp(timestamp: &str) -> Result<()> {
    DateTime::parse_from_rfc3339(timestamp)
        .map(|_| ())
        .map_err(|e| Error::Validation(format!("Invalid timestamp '{timestamp}': {e}")))
}

/// Checks a push body before any write happens.
pub fn validate_push(req: &PushRequest) -> Result<()> {
    validate_branch_name(&req.branch)?;

    for path in req.files.keys() {
        validate_file_path(path)?;
    }

    for entry in &req.history {
        validate_timestamp(&entry.timestamp)?;
    }

    Ok(())
}
