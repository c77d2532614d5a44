// src/smells/mod.rs

//! The detector catalogue. Every detector filters the same "considered"
//! universe (merged pulls with a non-empty diff) down to a smelly subset;
//! union and intersection combine detectors over that shared universe.

use std::collections::{BTreeSet, HashMap, HashSet};

use anyhow::Result;
use futures::future::BoxFuture;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::{PullRequest, Repository};
use crate::store::Store;

/// Additions + deletions above which a changeset counts as large.
pub const LARGE_CHANGESET_LINES: i64 = 500;
/// Open-to-close window at or above which a review counts as sleeping.
pub const SLEEPING_REVIEW_DAYS: i64 = 2;

static ISSUE_REF: Lazy<Regex> = Lazy::new(|| Regex::new(r"#[0-9]+").unwrap());

#[derive(Debug, thiserror::Error)]
pub enum EvalError {
    #[error("repository {0} does not exist in the store")]
    UnknownRepository(String),
    #[error("no considered pull requests to take a percentage over")]
    EmptyConsidered,
}

/// The closed set of detectors. Combinators nest arbitrarily.
#[derive(Debug, Clone)]
pub enum Detector {
    LackOfReview,
    MissingDescription,
    LargeChangeset,
    SleepingReviews,
    ReviewBuddies,
    PingPong,
    Union(Vec<Detector>),
    Intersection(Vec<Detector>),
}

/// Result of applying one detector: the universe it filtered from and the
/// smelly subset. `smelly ⊆ considered` always holds.
#[derive(Debug, Clone)]
pub struct Evaluation {
    pub name: String,
    pub considered: BTreeSet<i64>,
    pub smelly: BTreeSet<i64>,
}

impl Evaluation {
    pub fn considered_count(&self) -> usize {
        self.considered.len()
    }

    pub fn smelly_count(&self) -> usize {
        self.smelly.len()
    }

    /// Smelly share of the considered universe. Errors when the universe is
    /// empty; callers must check `considered_count` first.
    pub fn percentage(&self) -> Result<f64, EvalError> {
        if self.considered.is_empty() {
            return Err(EvalError::EmptyConsidered);
        }
        Ok(self.smelly.len() as f64 / self.considered.len() as f64)
    }

    /// The clean partition: considered minus smelly.
    pub fn ok_ids(&self) -> BTreeSet<i64> {
        self.considered.difference(&self.smelly).copied().collect()
    }
}

impl Detector {
    /// The fixed single-detector catalogue, in reporting order.
    pub fn catalogue() -> Vec<Detector> {
        vec![
            Detector::LackOfReview,
            Detector::MissingDescription,
            Detector::LargeChangeset,
            Detector::SleepingReviews,
            Detector::ReviewBuddies,
            Detector::PingPong,
        ]
    }

    /// The review-practice detectors combined in the impact report.
    pub fn review_related() -> Vec<Detector> {
        vec![
            Detector::LackOfReview,
            Detector::SleepingReviews,
            Detector::ReviewBuddies,
            Detector::PingPong,
        ]
    }

    pub fn name(&self) -> String {
        match self {
            Detector::LackOfReview => "Lack of code review".to_string(),
            Detector::MissingDescription => "Missing PR description".to_string(),
            Detector::LargeChangeset => "Large changeset".to_string(),
            Detector::SleepingReviews => "Sleeping reviews".to_string(),
            Detector::ReviewBuddies => "Review buddies".to_string(),
            Detector::PingPong => "Ping-pong reviews".to_string(),
            Detector::Union(inner) => composite_name("At least one of:", inner),
            Detector::Intersection(inner) => composite_name("All of:", inner),
        }
    }

    /// Apply this detector against the repository's considered universe.
    pub async fn apply(&self, store: &Store, repo: &Repository) -> Result<Evaluation> {
        let considered = store.considered_pulls(repo.id).await?;
        let smelly = self.smelly_ids(store, repo, &considered).await?;
        Ok(Evaluation {
            name: self.name(),
            considered: considered.iter().map(|p| p.id).collect(),
            smelly,
        })
    }

    // Boxed so the combinator variants can recurse.
    fn smelly_ids<'a>(
        &'a self,
        store: &'a Store,
        repo: &'a Repository,
        considered: &'a [PullRequest],
    ) -> BoxFuture<'a, Result<BTreeSet<i64>>> {
        Box::pin(async move {
            match self {
                Detector::LackOfReview => {
                    let reviewed: HashSet<i64> =
                        store.non_author_reviewed_ids(repo.id).await?.into_iter().collect();
                    Ok(considered
                        .iter()
                        .map(|p| p.id)
                        .filter(|id| !reviewed.contains(id))
                        .collect())
                }
                Detector::MissingDescription => Ok(considered
                    .iter()
                    .filter(|p| missing_description(p))
                    .map(|p| p.id)
                    .collect()),
                Detector::LargeChangeset => Ok(considered
                    .iter()
                    .filter(|p| p.changed_lines() > LARGE_CHANGESET_LINES)
                    .map(|p| p.id)
                    .collect()),
                Detector::SleepingReviews => Ok(considered
                    .iter()
                    .filter(|p| is_sleeping(p))
                    .map(|p| p.id)
                    .collect()),
                Detector::ReviewBuddies => {
                    let pairs: HashSet<(i64, i64)> =
                        store.review_buddy_pairs(repo.id).await?.into_iter().collect();
                    if pairs.is_empty() {
                        return Ok(BTreeSet::new());
                    }
                    let authors: HashMap<i64, Option<i64>> =
                        considered.iter().map(|p| (p.id, p.user_id)).collect();
                    let mut smelly = BTreeSet::new();
                    for (pull_id, reviewer) in store.review_pairs(repo.id).await? {
                        let (Some(Some(author)), Some(reviewer)) =
                            (authors.get(&pull_id), reviewer)
                        else {
                            continue;
                        };
                        if pairs.contains(&(*author, reviewer)) {
                            smelly.insert(pull_id);
                        }
                    }
                    Ok(smelly)
                }
                Detector::PingPong => {
                    let considered_ids: HashSet<i64> = considered.iter().map(|p| p.id).collect();
                    Ok(store
                        .ping_pong_pull_ids(repo.id)
                        .await?
                        .into_iter()
                        .filter(|id| considered_ids.contains(id))
                        .collect())
                }
                Detector::Union(inner) => {
                    let mut smelly = BTreeSet::new();
                    for detector in inner {
                        smelly.extend(detector.smelly_ids(store, repo, considered).await?);
                    }
                    Ok(smelly)
                }
                Detector::Intersection(inner) => {
                    let mut smelly: BTreeSet<i64> = considered.iter().map(|p| p.id).collect();
                    for detector in inner {
                        let part = detector.smelly_ids(store, repo, considered).await?;
                        smelly.retain(|id| part.contains(id));
                    }
                    Ok(smelly)
                }
            }
        })
    }
}

fn composite_name(prefix: &str, inner: &[Detector]) -> String {
    let mut name = prefix.to_string();
    for detector in inner {
        name.push_str("\n- ");
        name.push_str(&detector.name());
    }
    name
}

/// Resolve the repository by full name and apply the detector. An unknown
/// repository is an operator-facing skip, not a crash.
pub async fn evaluate(store: &Store, project: &str, detector: &Detector) -> Result<Evaluation> {
    let repo = store
        .repository_by_full_name(project)
        .await?
        .ok_or_else(|| EvalError::UnknownRepository(project.to_string()))?;
    detector.apply(store, &repo).await
}

/// Empty title short-circuits; otherwise an empty body, or a single-line body
/// that neither mentions fixes/ticket nor references an issue number.
fn missing_description(pull: &PullRequest) -> bool {
    if pull.title.is_empty() || pull.body.is_empty() {
        return true;
    }
    if pull.body.contains('\n') {
        return false;
    }
    let lower = pull.body.to_lowercase();
    !(lower.contains("fixes") || lower.contains("ticket") || ISSUE_REF.is_match(&pull.body))
}

fn is_sleeping(pull: &PullRequest) -> bool {
    match pull.closed_at {
        Some(closed_at) => {
            closed_at - pull.created_at >= chrono::Duration::days(SLEEPING_REVIEW_DAYS)
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AuthorAssociation;
    use chrono::{Duration, TimeZone, Utc};

    fn pull(title: &str, body: &str) -> PullRequest {
        let created = Utc.with_ymd_and_hms(2021, 3, 1, 12, 0, 0).unwrap();
        PullRequest {
            id: 1,
            number: 1,
            title: title.to_string(),
            body: body.to_string(),
            user_id: Some(10),
            created_at: created,
            closed_at: Some(created + Duration::hours(4)),
            assignee_id: None,
            repository_id: 1,
            author_association: AuthorAssociation::Member,
            merged: true,
            additions: 10,
            deletions: 2,
        }
    }

    #[test]
    fn empty_title_is_smelly_regardless_of_body() {
        assert!(missing_description(&pull("", "Fixes #42")));
    }

    #[test]
    fn empty_body_is_smelly() {
        assert!(missing_description(&pull("Add parser", "")));
    }

    #[test]
    fn multi_line_body_is_fine() {
        assert!(!missing_description(&pull("Add parser", "line one\nline two")));
    }

    #[test]
    fn single_line_body_needs_a_reference() {
        assert!(missing_description(&pull("Add parser", "small cleanup")));
        assert!(!missing_description(&pull("Add parser", "Fixes the flaky test")));
        assert!(!missing_description(&pull("Add parser", "see TICKET-12")));
        assert!(!missing_description(&pull("Add parser", "closes #42")));
    }

    #[test]
    fn sleeping_threshold_is_two_days() {
        let mut p = pull("t", "b\nb");
        p.closed_at = Some(p.created_at + Duration::days(2));
        assert!(is_sleeping(&p));
        p.closed_at = Some(p.created_at + Duration::days(2) - Duration::seconds(1));
        assert!(!is_sleeping(&p));
        p.closed_at = None;
        assert!(!is_sleeping(&p));
    }

    #[test]
    fn ticket_check_is_case_insensitive() {
        assert!(!missing_description(&pull("t", "references Ticket 9")));
        assert!(!missing_description(&pull("t", "FIXES a regression")));
    }

    #[test]
    fn composite_names_list_members() {
        let u = Detector::Union(vec![Detector::LackOfReview, Detector::PingPong]);
        assert_eq!(
            u.name(),
            "At least one of:\n- Lack of code review\n- Ping-pong reviews"
        );
        let i = Detector::Intersection(vec![Detector::LargeChangeset]);
        assert_eq!(i.name(), "All of:\n- Large changeset");
    }
}
