// src/impact/mod.rs

//! Bug-proneness impact. For every pull request in a detector's smelly/ok
//! partition: did a bug-fixing pull request touch any of its files soon
//! after? The forward walk through each file's change history is depth
//! bounded; the scoring over that walk is the pluggable part.

use std::collections::{BTreeSet, HashMap, HashSet};

use anyhow::Result;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::{PullRequest, Repository};
use crate::smells::Detector;
use crate::store::Store;

static ISSUE_NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"#([0-9]+)").unwrap());

const BUG_KEYWORDS: [&str; 3] = ["bug", "error", "fix"];

/// How a pull request's look-ahead is scored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BugSignal {
    /// Only the single nearest subsequent change per file; a pull request is
    /// bug-impacting iff any file's next change fixes a bug.
    NextChange,
    /// Up to `depth` subsequent changes per file, weighted by inverse
    /// distance and normalized by the number of files the pull touched.
    Bugginess { depth: u32 },
}

impl BugSignal {
    fn walk_limit(&self) -> i64 {
        match self {
            BugSignal::NextChange => 1,
            BugSignal::Bugginess { depth } => i64::from(*depth),
        }
    }
}

/// Bug-proneness rates for the two partitions of one detector's universe.
/// An empty partition yields NaN, deliberately — check before arithmetic.
#[derive(Debug, Clone)]
pub struct ImpactReport {
    pub detector_name: String,
    pub ok_rate: f64,
    pub smelly_rate: f64,
}

impl ImpactReport {
    pub fn delta(&self) -> f64 {
        self.smelly_rate - self.ok_rate
    }
}

/// Known bug issues of one repository, loaded once per calculation.
struct BugContext {
    issue_ids: HashSet<i64>,
    issue_numbers: HashSet<i64>,
    verdicts: HashMap<i64, bool>,
}

pub async fn calc_impact(
    store: &Store,
    repo: &Repository,
    detector: &Detector,
    signal: BugSignal,
) -> Result<ImpactReport> {
    let evaluation = detector.apply(store, repo).await?;

    let mut ctx = BugContext {
        issue_ids: store.bug_issue_ids(repo.id).await?.into_iter().collect(),
        issue_numbers: store.bug_issue_numbers(repo.id).await?.into_iter().collect(),
        verdicts: HashMap::new(),
    };

    let ok_rate = partition_rate(store, repo, &evaluation.ok_ids(), signal, &mut ctx).await?;
    let smelly_rate = partition_rate(store, repo, &evaluation.smelly, signal, &mut ctx).await?;

    Ok(ImpactReport {
        detector_name: evaluation.name,
        ok_rate,
        smelly_rate,
    })
}

async fn partition_rate(
    store: &Store,
    repo: &Repository,
    pull_ids: &BTreeSet<i64>,
    signal: BugSignal,
    ctx: &mut BugContext,
) -> Result<f64> {
    if pull_ids.is_empty() {
        return Ok(f64::NAN);
    }
    let mut total = 0.0;
    for &pull_id in pull_ids {
        total += pull_score(store, repo, pull_id, signal, ctx).await?;
    }
    Ok(total / pull_ids.len() as f64)
}

async fn pull_score(
    store: &Store,
    repo: &Repository,
    pull_id: i64,
    signal: BugSignal,
    ctx: &mut BugContext,
) -> Result<f64> {
    let Some(pull) = store.get_pull(pull_id).await? else {
        return Ok(0.0);
    };
    let Some(closed_at) = pull.closed_at else {
        return Ok(0.0);
    };
    let filenames = store.filenames_for_pull(pull_id).await?;
    if filenames.is_empty() {
        return Ok(0.0);
    }

    match signal {
        BugSignal::NextChange => {
            for filename in &filenames {
                let next = store
                    .next_changed_pull_ids(repo.id, filename, closed_at, signal.walk_limit())
                    .await?;
                if let Some(&next_id) = next.first() {
                    if cached_fixes_bug(store, next_id, ctx).await? {
                        return Ok(1.0);
                    }
                }
            }
            Ok(0.0)
        }
        BugSignal::Bugginess { .. } => {
            let mut score = 0.0;
            for filename in &filenames {
                let walk = store
                    .next_changed_pull_ids(repo.id, filename, closed_at, signal.walk_limit())
                    .await?;
                for (distance, &next_id) in walk.iter().enumerate() {
                    if cached_fixes_bug(store, next_id, ctx).await? {
                        score += 1.0 / (distance + 1) as f64;
                    }
                }
            }
            Ok(score / filenames.len() as f64)
        }
    }
}

async fn cached_fixes_bug(store: &Store, pull_id: i64, ctx: &mut BugContext) -> Result<bool> {
    if let Some(&verdict) = ctx.verdicts.get(&pull_id) {
        return Ok(verdict);
    }
    let verdict = match store.get_pull(pull_id).await? {
        Some(pull) => pr_fixes_bug(&pull, &ctx.issue_ids, &ctx.issue_numbers),
        None => false,
    };
    ctx.verdicts.insert(pull_id, verdict);
    Ok(verdict)
}

/// A pull request fixes a bug iff it is linked to a known bug issue by id,
/// its text carries a bug keyword, or it references a known bug issue number.
pub fn pr_fixes_bug(
    pull: &PullRequest,
    bug_issue_ids: &HashSet<i64>,
    bug_issue_numbers: &HashSet<i64>,
) -> bool {
    if bug_issue_ids.contains(&pull.id) {
        return true;
    }
    if has_bug_keyword(&pull.title) || has_bug_keyword(&pull.body) {
        return true;
    }
    referenced_numbers(&pull.title)
        .chain(referenced_numbers(&pull.body))
        .any(|n| bug_issue_numbers.contains(&n))
}

fn has_bug_keyword(text: &str) -> bool {
    let lower = text.to_lowercase();
    BUG_KEYWORDS.iter().any(|kw| lower.contains(kw))
}

fn referenced_numbers(text: &str) -> impl Iterator<Item = i64> + '_ {
    ISSUE_NUMBER
        .captures_iter(text)
        .filter_map(|caps| caps[1].parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AuthorAssociation;
    use chrono::{TimeZone, Utc};

    fn pull(id: i64, title: &str, body: &str) -> PullRequest {
        PullRequest {
            id,
            number: id,
            title: title.to_string(),
            body: body.to_string(),
            user_id: Some(1),
            created_at: Utc.with_ymd_and_hms(2021, 1, 1, 0, 0, 0).unwrap(),
            closed_at: Some(Utc.with_ymd_and_hms(2021, 1, 2, 0, 0, 0).unwrap()),
            assignee_id: None,
            repository_id: 1,
            author_association: AuthorAssociation::Contributor,
            merged: true,
            additions: 1,
            deletions: 0,
        }
    }

    #[test]
    fn linked_bug_issue_id_wins() {
        let ids: HashSet<i64> = [77].into_iter().collect();
        let numbers = HashSet::new();
        assert!(pr_fixes_bug(&pull(77, "tidy imports", "nothing"), &ids, &numbers));
        assert!(!pr_fixes_bug(&pull(78, "tidy imports", "nothing"), &ids, &numbers));
    }

    #[test]
    fn keywords_match_case_insensitively() {
        let none = HashSet::new();
        assert!(pr_fixes_bug(&pull(1, "Fix crash on resume", ""), &none, &none));
        assert!(pr_fixes_bug(&pull(1, "", "found a BUG in the walker"), &none, &none));
        assert!(pr_fixes_bug(&pull(1, "Error handling", ""), &none, &none));
        assert!(!pr_fixes_bug(&pull(1, "Add dark mode", "pretty colors"), &none, &none));
    }

    #[test]
    fn referenced_bug_number_matches_within_repo() {
        let none = HashSet::new();
        let numbers: HashSet<i64> = [42].into_iter().collect();
        assert!(pr_fixes_bug(&pull(1, "resolves #42", ""), &none, &numbers));
        assert!(!pr_fixes_bug(&pull(1, "resolves #43", ""), &none, &numbers));
    }

    #[test]
    fn walk_limit_follows_signal() {
        assert_eq!(BugSignal::NextChange.walk_limit(), 1);
        assert_eq!(BugSignal::Bugginess { depth: 4 }.walk_limit(), 4);
    }
}
