// src/store/issues.rs

use anyhow::{Context, Result};

use super::{query, Store};
use crate::models::BugIssue;

impl Store {
    pub async fn upsert_bug_issue(&self, issue: &BugIssue) -> Result<()> {
        sqlx::query(query::UPSERT_BUG_ISSUE)
            .bind(issue.id)
            .bind(issue.number)
            .bind(issue.repository_id)
            .execute(&self.pool)
            .await
            .context("Failed to upsert bug issue")?;
        Ok(())
    }

    pub async fn bug_issue_ids(&self, repository_id: i64) -> Result<Vec<i64>> {
        let rows = sqlx::query_as::<_, (i64,)>(query::BUG_ISSUE_IDS)
            .bind(repository_id)
            .fetch_all(&self.pool)
            .await
            .context("Failed to fetch bug issue ids")?;
        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    pub async fn bug_issue_numbers(&self, repository_id: i64) -> Result<Vec<i64>> {
        let rows = sqlx::query_as::<_, (i64,)>(query::BUG_ISSUE_NUMBERS)
            .bind(repository_id)
            .fetch_all(&self.pool)
            .await
            .context("Failed to fetch bug issue numbers")?;
        Ok(rows.into_iter().map(|(n,)| n).collect())
    }
}
