// src/store/pulls.rs
// Upsert operations for users, repositories, pull requests and reviews.

use anyhow::{Context, Result};

use super::{query, Store};
use crate::models::{PullRequest, Repository, Review, User};

impl Store {
    pub async fn upsert_user(&self, user: &User) -> Result<()> {
        sqlx::query(query::UPSERT_USER)
            .bind(user.id)
            .bind(&user.login)
            .execute(&self.pool)
            .await
            .context("Failed to upsert user")?;
        Ok(())
    }

    pub async fn upsert_repository(&self, repo: &Repository) -> Result<()> {
        sqlx::query(query::UPSERT_REPOSITORY)
            .bind(repo.id)
            .bind(&repo.name)
            .bind(&repo.full_name)
            .bind(repo.owner_id)
            .execute(&self.pool)
            .await
            .context("Failed to upsert repository")?;
        Ok(())
    }

    pub async fn repository_by_full_name(&self, full_name: &str) -> Result<Option<Repository>> {
        let repo = sqlx::query_as::<_, Repository>(query::GET_REPOSITORY_BY_FULL_NAME)
            .bind(full_name)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to look up repository")?;
        Ok(repo)
    }

    pub async fn get_pull(&self, id: i64) -> Result<Option<PullRequest>> {
        let pull = sqlx::query_as::<_, PullRequest>(query::GET_PULL)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch pull request")?;
        Ok(pull)
    }

    /// Write one pull request together with its referenced users, assignee
    /// set and reviews, committed as a single transaction. Safe to repeat:
    /// every row merges by primary key.
    pub async fn upsert_pull_with_reviews(
        &self,
        users: &[User],
        pull: &PullRequest,
        assignee_ids: &[i64],
        reviews: &[Review],
    ) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        for user in users {
            sqlx::query(query::UPSERT_USER)
                .bind(user.id)
                .bind(&user.login)
                .execute(&mut *tx)
                .await
                .context("Failed to upsert referenced user")?;
        }

        sqlx::query(query::UPSERT_PULL)
            .bind(pull.id)
            .bind(pull.number)
            .bind(&pull.title)
            .bind(&pull.body)
            .bind(pull.user_id)
            .bind(pull.created_at)
            .bind(pull.closed_at)
            .bind(pull.assignee_id)
            .bind(pull.repository_id)
            .bind(pull.author_association)
            .bind(pull.merged)
            .bind(pull.additions)
            .bind(pull.deletions)
            .execute(&mut *tx)
            .await
            .context("Failed to upsert pull request")?;

        for user_id in assignee_ids {
            sqlx::query(query::INSERT_PULL_ASSIGNEE)
                .bind(pull.id)
                .bind(user_id)
                .execute(&mut *tx)
                .await
                .context("Failed to link assignee")?;
        }

        for review in reviews {
            sqlx::query(query::UPSERT_REVIEW)
                .bind(review.id)
                .bind(review.pull_id)
                .bind(review.user_id)
                .bind(&review.body)
                .bind(review.state)
                .bind(review.author_association)
                .bind(review.submitted_at)
                .execute(&mut *tx)
                .await
                .context("Failed to upsert review")?;
        }

        tx.commit().await.context("Failed to commit pull request bundle")?;
        Ok(())
    }
}
