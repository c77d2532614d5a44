// src/store/migration.rs
//! Schema setup. Every statement is idempotent; run the whole set at startup
//! to guarantee the tables match the current entity layout.

use anyhow::Result;
use sqlx::{Executor, SqlitePool};
use tracing::info;

const CREATE_USERS: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY,
    login TEXT NOT NULL
);
"#;

const CREATE_REPOSITORIES: &str = r#"
CREATE TABLE IF NOT EXISTS repositories (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    full_name TEXT NOT NULL UNIQUE,
    owner_id INTEGER REFERENCES users(id)
);
"#;

/// Pull ids come from the source API, never auto-generated.
const CREATE_PULLS: &str = r#"
CREATE TABLE IF NOT EXISTS pulls (
    id INTEGER PRIMARY KEY,
    number INTEGER NOT NULL,
    title TEXT NOT NULL DEFAULT '',
    body TEXT NOT NULL DEFAULT '',
    user_id INTEGER REFERENCES users(id),
    created_at TEXT NOT NULL,
    closed_at TEXT,
    assignee_id INTEGER REFERENCES users(id),
    repository_id INTEGER NOT NULL REFERENCES repositories(id),
    author_association TEXT NOT NULL,
    merged INTEGER NOT NULL DEFAULT 0,
    additions INTEGER NOT NULL DEFAULT 0,
    deletions INTEGER NOT NULL DEFAULT 0
);
"#;

const CREATE_PULL_ASSIGNEES: &str = r#"
CREATE TABLE IF NOT EXISTS pull_assignees (
    pull_id INTEGER NOT NULL REFERENCES pulls(id),
    user_id INTEGER NOT NULL REFERENCES users(id),
    PRIMARY KEY (pull_id, user_id)
);
"#;

const CREATE_REVIEWS: &str = r#"
CREATE TABLE IF NOT EXISTS reviews (
    id INTEGER PRIMARY KEY,
    pull_id INTEGER NOT NULL REFERENCES pulls(id),
    user_id INTEGER REFERENCES users(id),
    body TEXT NOT NULL DEFAULT '',
    state TEXT NOT NULL,
    author_association TEXT NOT NULL,
    submitted_at TEXT
);
"#;

const CREATE_FILES: &str = r#"
CREATE TABLE IF NOT EXISTS files (
    filename TEXT NOT NULL,
    repository_id INTEGER NOT NULL REFERENCES repositories(id),
    first_merged TEXT,
    last_deleted TEXT,
    PRIMARY KEY (filename, repository_id)
);
"#;

const CREATE_FILE_CHANGES: &str = r#"
CREATE TABLE IF NOT EXISTS file_changes (
    filename TEXT NOT NULL,
    repository_id INTEGER NOT NULL,
    pull_id INTEGER NOT NULL REFERENCES pulls(id),
    additions INTEGER NOT NULL DEFAULT 0,
    deletions INTEGER NOT NULL DEFAULT 0,
    changes INTEGER NOT NULL DEFAULT 0,
    PRIMARY KEY (filename, repository_id, pull_id),
    FOREIGN KEY (filename, repository_id) REFERENCES files(filename, repository_id)
);
"#;

const CREATE_BUG_ISSUES: &str = r#"
CREATE TABLE IF NOT EXISTS bug_issues (
    id INTEGER PRIMARY KEY,
    number INTEGER NOT NULL,
    repository_id INTEGER NOT NULL REFERENCES repositories(id)
);
"#;

/// Commit-level change metrics from the external CSV feed.
const CREATE_COMMITS: &str = r#"
CREATE TABLE IF NOT EXISTS commits (
    id TEXT PRIMARY KEY,
    buggy INTEGER NOT NULL DEFAULT 0,
    project TEXT NOT NULL DEFAULT '',
    lines_added INTEGER NOT NULL DEFAULT 0,
    lines_deleted INTEGER NOT NULL DEFAULT 0,
    files_touched INTEGER NOT NULL DEFAULT 0,
    dirs_touched INTEGER NOT NULL DEFAULT 0,
    subsystems_touched INTEGER NOT NULL DEFAULT 0,
    entropy REAL NOT NULL DEFAULT 0,
    developers REAL NOT NULL DEFAULT 0,
    age REAL NOT NULL DEFAULT 0,
    unique_changes REAL NOT NULL DEFAULT 0,
    author_experience INTEGER NOT NULL DEFAULT 0,
    author_recent_experience REAL NOT NULL DEFAULT 0,
    author_subsystem_experience REAL NOT NULL DEFAULT 0
);
"#;

const CREATE_PULL_COMMITS: &str = r#"
CREATE TABLE IF NOT EXISTS pull_commits (
    pull_id INTEGER NOT NULL REFERENCES pulls(id),
    commit_id TEXT NOT NULL REFERENCES commits(id),
    PRIMARY KEY (pull_id, commit_id)
);
"#;

const CREATE_INDICES: &str = r#"
CREATE INDEX IF NOT EXISTS idx_pulls_repository ON pulls(repository_id);
CREATE INDEX IF NOT EXISTS idx_pulls_closed_at ON pulls(closed_at);
CREATE INDEX IF NOT EXISTS idx_reviews_pull ON reviews(pull_id);
CREATE INDEX IF NOT EXISTS idx_file_changes_file ON file_changes(filename, repository_id);
CREATE INDEX IF NOT EXISTS idx_bug_issues_repo ON bug_issues(repository_id);
"#;

pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    for statement in [
        CREATE_USERS,
        CREATE_REPOSITORIES,
        CREATE_PULLS,
        CREATE_PULL_ASSIGNEES,
        CREATE_REVIEWS,
        CREATE_FILES,
        CREATE_FILE_CHANGES,
        CREATE_BUG_ISSUES,
        CREATE_COMMITS,
        CREATE_PULL_COMMITS,
        CREATE_INDICES,
    ] {
        pool.execute(statement).await?;
    }
    info!("Store schema ready");
    Ok(())
}
