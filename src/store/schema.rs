pub const SCHEMA: &str = r#"
-- Named containers; updated_at moves forward on every push
CREATE TABLE IF NOT EXISTS repositories (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

-- Independent commit timelines; one row per (repo, name)
CREATE TABLE IF NOT EXISTS branches (
    id TEXT PRIMARY KEY,
    repo_id TEXT NOT NULL REFERENCES repositories(id) ON DELETE CASCADE,
    name TEXT NOT NULL,
    created_at TEXT NOT NULL,

    UNIQUE(repo_id, name)
);

-- Append-only sync points; ordered by created_at, never by hash
CREATE TABLE IF NOT EXISTS commits (
    id TEXT PRIMARY KEY,
    repo_id TEXT NOT NULL REFERENCES repositories(id) ON DELETE CASCADE,
    branch_id TEXT NOT NULL REFERENCES branches(id) ON DELETE CASCADE,
    message TEXT NOT NULL,
    commit_hash TEXT NOT NULL,    -- opaque, client-supplied
    created_at TEXT NOT NULL
);

-- Full snapshot rows; every commit carries its own copy of every path
CREATE TABLE IF NOT EXISTS files (
    id TEXT PRIMARY KEY,
    repo_id TEXT NOT NULL REFERENCES repositories(id) ON DELETE CASCADE,
    commit_id TEXT NOT NULL REFERENCES commits(id) ON DELETE CASCADE,
    path TEXT NOT NULL,
    content TEXT NOT NULL,
    created_at TEXT NOT NULL,

    UNIQUE(commit_id, path)
);

-- Conversational log, replaced wholesale on every push
CREATE TABLE IF NOT EXISTS history_messages (
    id TEXT PRIMARY KEY,
    repo_id TEXT NOT NULL REFERENCES repositories(id) ON DELETE CASCADE,
    role TEXT NOT NULL CHECK (role IN ('user', 'assistant')),
    content TEXT NOT NULL,
    created_at TEXT NOT NULL      -- client timestamp, verbatim
);

CREATE INDEX IF NOT EXISTS idx_repositories_updated ON repositories(updated_at);
CREATE INDEX IF NOT EXISTS idx_branches_repo ON branches(repo_id);
CREATE INDEX IF NOT EXISTS idx_commits_repo ON commits(repo_id, created_at);
CREATE INDEX IF NOT EXISTS idx_commits_branch ON commits(branch_id, created_at);
CREATE INDEX IF NOT EXISTS idx_files_commit ON files(commit_id);
CREATE INDEX IF NOT EXISTS idx_history_repo ON history_messages(repo_id);
"#;
