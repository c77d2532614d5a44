// src/store/files.rs
// File lifecycle rows and the per-pull file-change join entities.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};

use super::{query, Store};
use crate::models::{FileChange, FileRecord, PullRequest};

/// One entry of a pull request's file-change payload, as the ingestion
/// pipeline hands it over.
#[derive(Debug, Clone)]
pub struct ChangedFile {
    pub filename: String,
    /// Upstream status string: "added", "deleted", "modified", ...
    pub status: String,
    pub additions: i64,
    pub deletions: i64,
    pub changes: i64,
}

impl Store {
    /// Record one changed file for an already-committed pull request.
    ///
    /// The file row's lifecycle bounds are adjusted with a single atomic
    /// upsert (concurrent pulls touching the same file serialize on the row,
    /// no read-modify-write), then the join row is inserted unless a replay
    /// already created it.
    pub async fn record_file_change(&self, pull: &PullRequest, file: &ChangedFile) -> Result<()> {
        let first_merged: Option<DateTime<Utc>> =
            (file.status == "added").then_some(pull.closed_at).flatten();
        let last_deleted: Option<DateTime<Utc>> =
            (file.status == "deleted").then_some(pull.closed_at).flatten();

        let mut tx = self.pool.begin().await?;

        sqlx::query(query::UPSERT_FILE_BOUNDS)
            .bind(&file.filename)
            .bind(pull.repository_id)
            .bind(first_merged)
            .bind(last_deleted)
            .execute(&mut *tx)
            .await
            .context("Failed to adjust file lifecycle bounds")?;

        sqlx::query(query::INSERT_FILE_CHANGE)
            .bind(&file.filename)
            .bind(pull.repository_id)
            .bind(pull.id)
            .bind(file.additions)
            .bind(file.deletions)
            .bind(file.changes)
            .execute(&mut *tx)
            .await
            .context("Failed to insert file change")?;

        tx.commit().await.context("Failed to commit file change")?;
        Ok(())
    }

    pub async fn get_file(&self, filename: &str, repository_id: i64) -> Result<Option<FileRecord>> {
        let file = sqlx::query_as::<_, FileRecord>(query::GET_FILE)
            .bind(filename)
            .bind(repository_id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch file record")?;
        Ok(file)
    }

    pub async fn file_changes_for_pull(&self, pull_id: i64) -> Result<Vec<FileChange>> {
        let rows = sqlx::query_as::<_, FileChange>(
            "SELECT filename, repository_id, pull_id, additions, deletions, changes \
             FROM file_changes WHERE pull_id = ?",
        )
        .bind(pull_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to fetch file changes")?;
        Ok(rows)
    }
}
