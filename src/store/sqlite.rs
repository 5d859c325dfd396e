use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use rusqlite::{Connection, OptionalExtension, Row, TransactionBehavior, params};
use uuid::Uuid;

use super::schema::SCHEMA;
use super::validation::{validate_branch_name, validate_push, validate_repo_name, validate_timestamp};
use super::{DEFAULT_BRANCH, PushOutcome, Store, resolve_pull_branch};
use crate::error::{Error, Result};
use crate::types::*;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let conn = Connection::open(db_path)?;

        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.busy_timeout(BUSY_TIMEOUT)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Raw connection access, for arranging states the `Store` API cannot
    /// produce (e.g. a repository without its `main` branch).
    pub fn connection(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn()
    }
}

fn parse_datetime(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|e| {
            tracing::error!("Invalid datetime in database: '{}' - {}", s, e);
            Utc::now()
        })
}

/// Fixed-width UTC so that text ordering in SQL is chronological.
fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Current time at the precision the database keeps.
fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

impl ToSql for Role {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(self.as_str().into())
    }
}

impl FromSql for Role {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|e: String| FromSqlError::Other(e.into()))
    }
}

fn repository_from_row(row: &Row<'_>) -> rusqlite::Result<Repository> {
    Ok(Repository {
        id: row.get(0)?,
        name: row.get(1)?,
        created_at: parse_datetime(&row.get::<_, String>(2)?),
        updated_at: parse_datetime(&row.get::<_, String>(3)?),
    })
}

fn branch_from_row(row: &Row<'_>) -> rusqlite::Result<Branch> {
    Ok(Branch {
        id: row.get(0)?,
        repo_id: row.get(1)?,
        name: row.get(2)?,
        created_at: parse_datetime(&row.get::<_, String>(3)?),
    })
}

fn commit_from_row(row: &Row<'_>) -> rusqlite::Result<Commit> {
    Ok(Commit {
        id: row.get(0)?,
        repo_id: row.get(1)?,
        branch_id: row.get(2)?,
        message: row.get(3)?,
        commit_hash: row.get(4)?,
        created_at: parse_datetime(&row.get::<_, String>(5)?),
    })
}

fn file_from_row(row: &Row<'_>) -> rusqlite::Result<SnapshotFile> {
    Ok(SnapshotFile {
        id: row.get(0)?,
        repo_id: row.get(1)?,
        commit_id: row.get(2)?,
        path: row.get(3)?,
        content: row.get(4)?,
        created_at: parse_datetime(&row.get::<_, String>(5)?),
    })
}

fn history_from_row(row: &Row<'_>) -> rusqlite::Result<HistoryMessage> {
    Ok(HistoryMessage {
        id: row.get(0)?,
        repo_id: row.get(1)?,
        role: row.get(2)?,
        content: row.get(3)?,
        created_at: row.get(4)?,
    })
}

// Statement helpers. Each takes a plain connection so the same code runs
// standalone or inside the caller's transaction.

fn insert_repository(conn: &Connection, name: &str) -> Result<Repository> {
    let created_at = now();
    let repo = Repository {
        id: new_id(),
        name: name.to_string(),
        created_at,
        updated_at: created_at,
    };

    conn.execute(
        "INSERT INTO repositories (id, name, created_at, updated_at) VALUES (?1, ?2, ?3, ?3)",
        params![repo.id, repo.name, format_datetime(&created_at)],
    )?;
    conn.execute(
        "INSERT INTO branches (id, repo_id, name, created_at) VALUES (?1, ?2, ?3, ?4)",
        params![new_id(), repo.id, DEFAULT_BRANCH, format_datetime(&created_at)],
    )?;

    Ok(repo)
}

fn select_repository(conn: &Connection, id: &str) -> Result<Option<Repository>> {
    conn.query_row(
        "SELECT id, name, created_at, updated_at FROM repositories WHERE id = ?1",
        params![id],
        repository_from_row,
    )
    .optional()
    .map_err(Error::from)
}

fn require_repository(conn: &Connection, id: &str) -> Result<Repository> {
    select_repository(conn, id)?.ok_or(Error::NotFound("Repository"))
}

/// Moves `updated_at` to now, never backwards.
fn touch(conn: &Connection, id: &str) -> Result<()> {
    let rows = conn.execute(
        "UPDATE repositories SET updated_at = MAX(updated_at, ?1) WHERE id = ?2",
        params![format_datetime(&now()), id],
    )?;

    if rows == 0 {
        return Err(Error::NotFound("Repository"));
    }
    Ok(())
}

fn select_branch(conn: &Connection, repo_id: &str, name: &str) -> Result<Option<Branch>> {
    conn.query_row(
        "SELECT id, repo_id, name, created_at FROM branches WHERE repo_id = ?1 AND name = ?2",
        params![repo_id, name],
        branch_from_row,
    )
    .optional()
    .map_err(Error::from)
}

fn select_branches(conn: &Connection, repo_id: &str) -> Result<Vec<Branch>> {
    let mut stmt = conn.prepare(
        "SELECT id, repo_id, name, created_at FROM branches
         WHERE repo_id = ?1 ORDER BY created_at, rowid",
    )?;

    let rows = stmt.query_map(params![repo_id], branch_from_row)?;

    rows.collect::<std::result::Result<Vec<_>, _>>()
        .map_err(Error::from)
}

/// Insert-or-ignore against UNIQUE(repo_id, name), then read back whichever
/// row won. Concurrent callers all observe the same branch.
fn upsert_branch(conn: &Connection, repo_id: &str, name: &str) -> Result<Branch> {
    conn.execute(
        "INSERT INTO branches (id, repo_id, name, created_at) VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT(repo_id, name) DO NOTHING",
        params![new_id(), repo_id, name, format_datetime(&now())],
    )?;

    select_branch(conn, repo_id, name)?.ok_or(Error::NotFound("Branch"))
}

fn insert_commit(
    conn: &Connection,
    repo_id: &str,
    branch_id: &str,
    message: &str,
    commit_hash: &str,
) -> Result<Commit> {
    let commit = Commit {
        id: new_id(),
        repo_id: repo_id.to_string(),
        branch_id: branch_id.to_string(),
        message: message.to_string(),
        commit_hash: commit_hash.to_string(),
        created_at: now(),
    };

    conn.execute(
        "INSERT INTO commits (id, repo_id, branch_id, message, commit_hash, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            commit.id,
            commit.repo_id,
            commit.branch_id,
            commit.message,
            commit.commit_hash,
            format_datetime(&commit.created_at),
        ],
    )?;

    Ok(commit)
}

fn select_commits(
    conn: &Connection,
    repo_id: &str,
    branch_id: Option<&str>,
    limit: Option<usize>,
) -> Result<Vec<Commit>> {
    // SQLite treats a negative LIMIT as unbounded.
    let limit = limit.map_or(-1, |l| i64::try_from(l).unwrap_or(i64::MAX));

    let mut stmt = conn.prepare(
        "SELECT id, repo_id, branch_id, message, commit_hash, created_at FROM commits
         WHERE repo_id = ?1 AND (?2 IS NULL OR branch_id = ?2)
         ORDER BY created_at DESC, rowid DESC
         LIMIT ?3",
    )?;

    let rows = stmt.query_map(params![repo_id, branch_id, limit], commit_from_row)?;

    rows.collect::<std::result::Result<Vec<_>, _>>()
        .map_err(Error::from)
}

fn insert_files(conn: &Connection, repo_id: &str, commit_id: &str, files: &FileMap) -> Result<()> {
    let created_at = format_datetime(&now());
    let mut stmt = conn.prepare_cached(
        "INSERT INTO files (id, repo_id, commit_id, path, content, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
    )?;

    for (path, content) in files {
        stmt.execute(params![new_id(), repo_id, commit_id, path, content, created_at])?;
    }
    Ok(())
}

fn select_files(conn: &Connection, repo_id: &str, commit_id: &str) -> Result<Vec<SnapshotFile>> {
    let mut stmt = conn.prepare(
        "SELECT id, repo_id, commit_id, path, content, created_at FROM files
         WHERE repo_id = ?1 AND commit_id = ?2 ORDER BY path",
    )?;

    let rows = stmt.query_map(params![repo_id, commit_id], file_from_row)?;

    rows.collect::<std::result::Result<Vec<_>, _>>()
        .map_err(Error::from)
}

fn snapshot_of_branch(conn: &Connection, repo_id: &str, branch_id: &str) -> Result<FileMap> {
    let Some(commit) = select_commits(conn, repo_id, Some(branch_id), Some(1))?
        .into_iter()
        .next()
    else {
        return Ok(FileMap::new());
    };

    Ok(select_files(conn, repo_id, &commit.id)?
        .into_iter()
        .map(|f| (f.path, f.content))
        .collect())
}

fn overwrite_history(conn: &Connection, repo_id: &str, messages: &[HistoryEntry]) -> Result<()> {
    conn.execute(
        "DELETE FROM history_messages WHERE repo_id = ?1",
        params![repo_id],
    )?;

    let mut stmt = conn.prepare_cached(
        "INSERT INTO history_messages (id, repo_id, role, content, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
    )?;

    for msg in messages {
        stmt.execute(params![new_id(), repo_id, msg.role, msg.content, msg.timestamp])?;
    }
    Ok(())
}

/// Oldest first by the instant each timestamp denotes; ties keep push order.
fn select_history(conn: &Connection, repo_id: &str) -> Result<Vec<HistoryMessage>> {
    let mut stmt = conn.prepare(
        "SELECT id, repo_id, role, content, created_at FROM history_messages
         WHERE repo_id = ?1 ORDER BY rowid",
    )?;

    let rows = stmt.query_map(params![repo_id], history_from_row)?;
    let mut messages = rows.collect::<std::result::Result<Vec<_>, _>>()?;

    messages.sort_by_cached_key(|m| DateTime::parse_from_rfc3339(&m.created_at).ok());
    Ok(messages)
}

fn count_commits(conn: &Connection, repo_id: &str) -> Result<i64> {
    let count = conn.query_row(
        "SELECT COUNT(*) FROM commits WHERE repo_id = ?1",
        params![repo_id],
        |row| row.get(0),
    )?;
    Ok(count)
}

impl Store for SqliteStore {
    fn initialize(&self) -> Result<()> {
        self.conn().execute_batch(SCHEMA)?;
        Ok(())
    }

    // Repository operations

    fn create_repository(&self, name: &str) -> Result<Repository> {
        validate_repo_name(name)?;

        let mut conn = self.conn();
        let tx = conn.transaction()?;
        let repo = insert_repository(&tx, name)?;
        tx.commit()?;

        Ok(repo)
    }

    fn get_repository(&self, id: &str) -> Result<Option<Repository>> {
        select_repository(&self.conn(), id)
    }

    fn get_repository_detail(&self, id: &str) -> Result<Option<RepositoryDetail>> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;

        let Some(repository) = select_repository(&tx, id)? else {
            return Ok(None);
        };
        let branches = select_branches(&tx, id)?;
        let commit_count = count_commits(&tx, id)?;
        tx.commit()?;

        Ok(Some(RepositoryDetail {
            repository,
            branches,
            commit_count,
        }))
    }

    fn list_repositories(&self) -> Result<Vec<Repository>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT id, name, created_at, updated_at FROM repositories
             ORDER BY updated_at DESC, rowid DESC",
        )?;

        let rows = stmt.query_map([], repository_from_row)?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn touch_repository(&self, id: &str) -> Result<()> {
        touch(&self.conn(), id)
    }

    // Branch operations

    fn get_branch(&self, repo_id: &str, name: &str) -> Result<Option<Branch>> {
        select_branch(&self.conn(), repo_id, name)
    }

    fn list_branches(&self, repo_id: &str) -> Result<Vec<Branch>> {
        select_branches(&self.conn(), repo_id)
    }

    fn get_or_create_branch(&self, repo_id: &str, name: &str) -> Result<Branch> {
        validate_branch_name(name)?;

        let conn = self.conn();
        require_repository(&conn, repo_id)?;
        upsert_branch(&conn, repo_id, name)
    }

    // Commit operations

    fn append_commit(
        &self,
        repo_id: &str,
        branch_id: &str,
        message: &str,
        commit_hash: &str,
    ) -> Result<Commit> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;
        let commit = insert_commit(&tx, repo_id, branch_id, message, commit_hash)?;
        touch(&tx, repo_id)?;
        tx.commit()?;

        Ok(commit)
    }

    fn list_commits(
        &self,
        repo_id: &str,
        branch_id: Option<&str>,
        limit: Option<usize>,
    ) -> Result<Vec<Commit>> {
        select_commits(&self.conn(), repo_id, branch_id, limit)
    }

    fn latest_commit(&self, repo_id: &str, branch_id: &str) -> Result<Option<Commit>> {
        Ok(select_commits(&self.conn(), repo_id, Some(branch_id), Some(1))?
            .into_iter()
            .next())
    }

    fn count_commits(&self, repo_id: &str) -> Result<i64> {
        count_commits(&self.conn(), repo_id)
    }

    // File snapshot operations

    fn save_files(&self, repo_id: &str, commit_id: &str, files: &FileMap) -> Result<()> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;
        insert_files(&tx, repo_id, commit_id, files)?;
        tx.commit()?;
        Ok(())
    }

    fn list_files_for_commit(&self, repo_id: &str, commit_id: &str) -> Result<Vec<SnapshotFile>> {
        select_files(&self.conn(), repo_id, commit_id)
    }

    fn latest_snapshot(&self, repo_id: &str, branch_id: &str) -> Result<FileMap> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;
        let files = snapshot_of_branch(&tx, repo_id, branch_id)?;
        tx.commit()?;
        Ok(files)
    }

    // Conversational history operations

    fn replace_history(&self, repo_id: &str, messages: &[HistoryEntry]) -> Result<()> {
        for msg in messages {
            validate_timestamp(&msg.timestamp)?;
        }

        let mut conn = self.conn();
        let tx = conn.transaction()?;
        overwrite_history(&tx, repo_id, messages)?;
        tx.commit()?;
        Ok(())
    }

    fn list_history(&self, repo_id: &str) -> Result<Vec<HistoryMessage>> {
        select_history(&self.conn(), repo_id)
    }

    // Synchronization

    fn push(&self, repo_id: &str, req: &PushRequest) -> Result<PushOutcome> {
        validate_push(req)?;

        let mut conn = self.conn();
        // Take the write lock up front so a concurrent writer waits on
        // busy_timeout instead of failing at the first insert.
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        require_repository(&tx, repo_id)?;
        let branch = upsert_branch(&tx, repo_id, &req.branch)?;

        let mut commits = Vec::with_capacity(req.commits.len());
        for pushed in &req.commits {
            let commit = insert_commit(&tx, repo_id, &branch.id, &pushed.message, &pushed.hash)?;
            insert_files(&tx, repo_id, &commit.id, &req.files)?;
            commits.push(commit);
        }

        overwrite_history(&tx, repo_id, &req.history)?;
        touch(&tx, repo_id)?;
        tx.commit()?;

        Ok(PushOutcome { branch, commits })
    }

    fn pull(&self, repo_id: &str, branch: Option<&str>) -> Result<PullResponse> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;

        require_repository(&tx, repo_id)?;
        let branches = select_branches(&tx, repo_id)?;
        let target = resolve_pull_branch(&branches, branch).ok_or(Error::NotFound("Branch"))?;

        let files = snapshot_of_branch(&tx, repo_id, &target.id)?;
        let history = select_history(&tx, repo_id)?;
        tx.commit()?;

        Ok(PullResponse {
            branch: target.name.clone(),
            files,
            history: history.into_iter().map(HistoryEntry::from).collect(),
        })
    }
}
