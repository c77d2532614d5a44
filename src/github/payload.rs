// src/github/payload.rs

//! Wire models for the slices of the GitHub REST API this pipeline consumes.
//! Only the fields we persist are declared; everything else is ignored.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::str::FromStr;

use crate::models::{AuthorAssociation, BugIssue, PullRequest, Repository, Review, ReviewState, User};

#[derive(Debug, Clone, Deserialize)]
pub struct Actor {
    pub id: i64,
    pub login: String,
}

impl Actor {
    pub fn to_user(&self) -> User {
        User {
            id: self.id,
            login: self.login.clone(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RepoPayload {
    pub id: i64,
    pub name: String,
    pub full_name: String,
    pub owner: Actor,
}

impl RepoPayload {
    pub fn to_repository(&self) -> Repository {
        Repository {
            id: self.id,
            name: self.name.clone(),
            full_name: self.full_name.clone(),
            owner_id: Some(self.owner.id),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct BasePayload {
    pub repo: RepoPayload,
}

/// One entry of the pull-request list endpoint; only the detail link matters.
#[derive(Debug, Clone, Deserialize)]
pub struct ListEntry {
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PullPayload {
    pub id: i64,
    pub number: i64,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
    pub user: Option<Actor>,
    pub created_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub assignee: Option<Actor>,
    #[serde(default)]
    pub assignees: Vec<Actor>,
    pub base: BasePayload,
    #[serde(default)]
    pub author_association: String,
    #[serde(default)]
    pub merged: bool,
    #[serde(default)]
    pub additions: i64,
    #[serde(default)]
    pub deletions: i64,
}

impl PullPayload {
    pub fn to_model(&self) -> PullRequest {
        PullRequest {
            id: self.id,
            number: self.number,
            title: self.title.clone().unwrap_or_default(),
            body: self.body.clone().unwrap_or_default(),
            user_id: self.user.as_ref().map(|u| u.id),
            created_at: self.created_at,
            closed_at: self.closed_at,
            assignee_id: self.assignee.as_ref().map(|u| u.id),
            repository_id: self.base.repo.id,
            author_association: AuthorAssociation::from_str(&self.author_association)
                .unwrap_or(AuthorAssociation::None),
            merged: self.merged,
            additions: self.additions,
            deletions: self.deletions,
        }
    }

    /// Every user this payload references: author, assignee, assignees.
    pub fn referenced_users(&self) -> Vec<User> {
        let mut users: Vec<User> = Vec::new();
        if let Some(author) = &self.user {
            users.push(author.to_user());
        }
        if let Some(assignee) = &self.assignee {
            users.push(assignee.to_user());
        }
        for assignee in &self.assignees {
            users.push(assignee.to_user());
        }
        users
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReviewPayload {
    pub id: i64,
    pub user: Option<Actor>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub author_association: String,
    pub submitted_at: Option<DateTime<Utc>>,
}

impl ReviewPayload {
    pub fn to_model(&self, pull_id: i64) -> Review {
        Review {
            id: self.id,
            pull_id,
            user_id: self.user.as_ref().map(|u| u.id),
            body: self.body.clone().unwrap_or_default(),
            state: ReviewState::from_str(&self.state).unwrap_or(ReviewState::Commented),
            author_association: AuthorAssociation::from_str(&self.author_association)
                .unwrap_or(AuthorAssociation::None),
            submitted_at: self.submitted_at,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct FilePayload {
    pub filename: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub additions: i64,
    #[serde(default)]
    pub deletions: i64,
    #[serde(default)]
    pub changes: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IssuePayload {
    pub id: i64,
    pub number: i64,
}

impl IssuePayload {
    pub fn to_bug_issue(&self, repository_id: i64) -> BugIssue {
        BugIssue {
            id: self.id,
            number: self.number,
            repository_id,
        }
    }
}
