// src/store/analysis.rs

//! Read-only aggregate queries consumed by the evaluation engine and the
//! impact calculator. These never write.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};

use super::{query, Store};
use crate::models::PullRequest;

/// Received-review floor below which an author is never flagged as having a
/// review buddy.
pub const REVIEW_BUDDY_MIN_REVIEWS: i64 = 50;

/// Review rounds per (pull, reviewer) above which the exchange counts as
/// ping-pong.
pub const PING_PONG_MAX_ROUNDS: i64 = 3;

impl Store {
    /// Merged pulls of the repository with a non-empty diff — the universe
    /// every detector filters from.
    pub async fn considered_pulls(&self, repository_id: i64) -> Result<Vec<PullRequest>> {
        let pulls = sqlx::query_as::<_, PullRequest>(query::CONSIDERED_PULLS)
            .bind(repository_id)
            .fetch_all(&self.pool)
            .await
            .context("Failed to fetch considered pulls")?;
        Ok(pulls)
    }

    /// Ids of pulls that received at least one review not authored by the
    /// pull's own author.
    pub async fn non_author_reviewed_ids(&self, repository_id: i64) -> Result<Vec<i64>> {
        let rows = sqlx::query_as::<_, (i64,)>(query::NON_AUTHOR_REVIEWED_IDS)
            .bind(repository_id)
            .fetch_all(&self.pool)
            .await
            .context("Failed to fetch reviewed pull ids")?;
        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    /// (pull id, reviewer id) for every review in the repository.
    pub async fn review_pairs(&self, repository_id: i64) -> Result<Vec<(i64, Option<i64>)>> {
        let rows = sqlx::query_as::<_, (i64, Option<i64>)>(query::REVIEW_PAIRS)
            .bind(repository_id)
            .fetch_all(&self.pool)
            .await
            .context("Failed to fetch review pairs")?;
        Ok(rows)
    }

    /// Repository-wide (author, reviewer) pairs where the reviewer covers more
    /// than half of the author's received reviews, with the received total
    /// above `REVIEW_BUDDY_MIN_REVIEWS`.
    pub async fn review_buddy_pairs(&self, repository_id: i64) -> Result<Vec<(i64, i64)>> {
        let rows = sqlx::query_as::<_, (i64, i64)>(query::REVIEW_BUDDY_PAIRS)
            .bind(repository_id)
            .bind(REVIEW_BUDDY_MIN_REVIEWS)
            .fetch_all(&self.pool)
            .await
            .context("Failed to compute review buddy pairs")?;
        Ok(rows)
    }

    pub async fn ping_pong_pull_ids(&self, repository_id: i64) -> Result<Vec<i64>> {
        let rows = sqlx::query_as::<_, (i64,)>(query::PING_PONG_PULL_IDS)
            .bind(repository_id)
            .bind(PING_PONG_MAX_ROUNDS)
            .fetch_all(&self.pool)
            .await
            .context("Failed to compute ping-pong pull ids")?;
        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    pub async fn filenames_for_pull(&self, pull_id: i64) -> Result<Vec<String>> {
        let rows = sqlx::query_as::<_, (String,)>(query::FILENAMES_FOR_PULL)
            .bind(pull_id)
            .fetch_all(&self.pool)
            .await
            .context("Failed to fetch filenames for pull")?;
        Ok(rows.into_iter().map(|(f,)| f).collect())
    }

    /// Ids of the pulls that next touched the file after `after`, nearest
    /// first, bounded by `limit`.
    pub async fn next_changed_pull_ids(
        &self,
        repository_id: i64,
        filename: &str,
        after: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<i64>> {
        let rows = sqlx::query_as::<_, (i64,)>(query::NEXT_CHANGED_PULL_IDS)
            .bind(repository_id)
            .bind(filename)
            .bind(after)
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .context("Failed to fetch next file changes")?;
        Ok(rows.into_iter().map(|(id,)| id).collect())
    }
}
