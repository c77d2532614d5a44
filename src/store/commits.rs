// src/store/commits.rs

use anyhow::{Context, Result};

use super::{query, Store};
use crate::models::CommitMetrics;

impl Store {
    /// Merge one commit-metrics row by commit id.
    pub async fn upsert_commit_metrics(&self, commit: &CommitMetrics) -> Result<()> {
        sqlx::query(query::UPSERT_COMMIT_METRICS)
            .bind(&commit.id)
            .bind(commit.buggy)
            .bind(&commit.project)
            .bind(commit.lines_added)
            .bind(commit.lines_deleted)
            .bind(commit.files_touched)
            .bind(commit.dirs_touched)
            .bind(commit.subsystems_touched)
            .bind(commit.entropy)
            .bind(commit.developers)
            .bind(commit.age)
            .bind(commit.unique_changes)
            .bind(commit.author_experience)
            .bind(commit.author_recent_experience)
            .bind(commit.author_subsystem_experience)
            .execute(&self.pool)
            .await
            .context("Failed to upsert commit metrics")?;
        Ok(())
    }
}
