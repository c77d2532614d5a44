// tests/common/mod.rs
// Shared fixtures: an in-memory store and entity builders.
#![allow(dead_code)]

use chrono::{DateTime, Duration, TimeZone, Utc};
use sqlx::sqlite::SqlitePoolOptions;

use prospector::models::{AuthorAssociation, PullRequest, Repository, Review, ReviewState, User};
use prospector::store::{migration, Store};

pub async fn memory_store() -> Store {
    // One connection: every pooled connection of a :memory: database would
    // otherwise see its own empty schema.
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("create in-memory sqlite");
    migration::run_migrations(&pool).await.expect("apply schema");
    Store::new(pool)
}

pub fn epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2021, 6, 1, 12, 0, 0).unwrap()
}

pub fn user(id: i64, login: &str) -> User {
    User {
        id,
        login: login.to_string(),
    }
}

pub fn repo(id: i64, full_name: &str) -> Repository {
    Repository {
        id,
        name: full_name.split('/').next_back().unwrap_or(full_name).to_string(),
        full_name: full_name.to_string(),
        owner_id: None,
    }
}

pub fn merged_pull(id: i64, repo_id: i64, author: i64, additions: i64, deletions: i64) -> PullRequest {
    PullRequest {
        id,
        number: id,
        title: format!("Change {id}"),
        body: "first line\nsecond line".to_string(),
        user_id: Some(author),
        created_at: epoch(),
        closed_at: Some(epoch() + Duration::hours(6)),
        assignee_id: None,
        repository_id: repo_id,
        author_association: AuthorAssociation::Member,
        merged: true,
        additions,
        deletions,
    }
}

pub fn review(id: i64, pull_id: i64, reviewer: Option<i64>) -> Review {
    Review {
        id,
        pull_id,
        user_id: reviewer,
        body: String::new(),
        state: ReviewState::Approved,
        author_association: AuthorAssociation::Member,
        submitted_at: Some(epoch() + Duration::hours(1)),
    }
}

pub async fn seed_repo(store: &Store, repository: &Repository) {
    store.upsert_repository(repository).await.expect("seed repository");
}

pub async fn seed_pull(store: &Store, pull: &PullRequest, reviews: &[Review]) {
    let mut users = Vec::new();
    if let Some(author) = pull.user_id {
        users.push(user(author, &format!("user{author}")));
    }
    for review in reviews {
        if let Some(reviewer) = review.user_id {
            users.push(user(reviewer, &format!("user{reviewer}")));
        }
    }
    store
        .upsert_pull_with_reviews(&users, pull, &[], reviews)
        .await
        .expect("seed pull");
}

pub async fn count(store: &Store, table: &str) -> i64 {
    let (n,): (i64,) = sqlx::query_as(&format!("SELECT COUNT(*) FROM {table}"))
        .fetch_one(&store.pool)
        .await
        .expect("count rows");
    n
}
