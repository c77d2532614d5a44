// src/models/mod.rs

//! Entity types for the relational store. Field layout mirrors the schema in
//! `store::migration`; enums are stored as their upstream string form.

use chrono::{DateTime, Utc};
use std::str::FromStr;

/// Relationship of a pull-request or review author to the repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuthorAssociation {
    Owner,
    Member,
    Collaborator,
    Contributor,
    None,
}

impl AuthorAssociation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Owner => "OWNER",
            Self::Member => "MEMBER",
            Self::Collaborator => "COLLABORATOR",
            Self::Contributor => "CONTRIBUTOR",
            Self::None => "NONE",
        }
    }
}

impl FromStr for AuthorAssociation {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "OWNER" => Ok(Self::Owner),
            "MEMBER" => Ok(Self::Member),
            "COLLABORATOR" => Ok(Self::Collaborator),
            "CONTRIBUTOR" => Ok(Self::Contributor),
            "NONE" => Ok(Self::None),
            _ => Err(()),
        }
    }
}

/// Final state of a submitted review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReviewState {
    ChangesRequested,
    Commented,
    Approved,
    Dismissed,
}

impl ReviewState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ChangesRequested => "CHANGES_REQUESTED",
            Self::Commented => "COMMENTED",
            Self::Approved => "APPROVED",
            Self::Dismissed => "DISMISSED",
        }
    }
}

impl FromStr for ReviewState {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CHANGES_REQUESTED" => Ok(Self::ChangesRequested),
            "COMMENTED" => Ok(Self::Commented),
            "APPROVED" => Ok(Self::Approved),
            "DISMISSED" => Ok(Self::Dismissed),
            _ => Err(()),
        }
    }
}

/// External identity, merged on first reference and never deleted.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub login: String,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Repository {
    pub id: i64,
    pub name: String,
    /// `owner/name`, the lookup key for CLI operations.
    pub full_name: String,
    pub owner_id: Option<i64>,
}

/// One pull request as stored. Assignees live in the `pull_assignees` join
/// table and are fetched separately when needed.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PullRequest {
    pub id: i64,
    pub number: i64,
    pub title: String,
    pub body: String,
    pub user_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
    pub assignee_id: Option<i64>,
    pub repository_id: i64,
    pub author_association: AuthorAssociation,
    pub merged: bool,
    pub additions: i64,
    pub deletions: i64,
}

impl PullRequest {
    pub fn changed_lines(&self) -> i64 {
        self.additions + self.deletions
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Review {
    pub id: i64,
    pub pull_id: i64,
    /// None when the reviewing account has been deleted.
    pub user_id: Option<i64>,
    pub body: String,
    pub state: ReviewState,
    pub author_association: AuthorAssociation,
    pub submitted_at: Option<DateTime<Utc>>,
}

/// Lifecycle record for one file within one repository. Both bounds move
/// monotonically as changes arrive in any order: `first_merged` only earlier,
/// `last_deleted` only later.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct FileRecord {
    pub filename: String,
    pub repository_id: i64,
    pub first_merged: Option<DateTime<Utc>>,
    pub last_deleted: Option<DateTime<Utc>>,
}

/// Join entity: one file's diff inside one pull request.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct FileChange {
    pub filename: String,
    pub repository_id: i64,
    pub pull_id: i64,
    pub additions: i64,
    pub deletions: i64,
    pub changes: i64,
}

/// An issue carrying the bug label; used to recognize bug-fixing pulls.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct BugIssue {
    pub id: i64,
    pub number: i64,
    pub repository_id: i64,
}

/// Change-metric record from the external CSV feed, keyed by commit sha.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CommitMetrics {
    pub id: String,
    pub buggy: bool,
    pub project: String,
    pub lines_added: i64,
    pub lines_deleted: i64,
    pub files_touched: i64,
    pub dirs_touched: i64,
    pub subsystems_touched: i64,
    pub entropy: f64,
    pub developers: f64,
    pub age: f64,
    pub unique_changes: f64,
    pub author_experience: i64,
    pub author_recent_experience: f64,
    pub author_subsystem_experience: f64,
}
