// src/metrics/mod.rs
// Plain metric extractors over the considered universe; no smelly/ok split.

use anyhow::Result;

use crate::models::{PullRequest, Repository};
use crate::store::Store;

#[derive(Debug, Clone)]
pub struct MetricReport {
    pub name: &'static str,
    /// (pull id, value) per considered pull request.
    pub values: Vec<(i64, f64)>,
}

fn window_minutes(pull: &PullRequest) -> Option<f64> {
    let closed_at = pull.closed_at?;
    Some(((closed_at - pull.created_at).num_seconds() as f64 / 60.0).trunc())
}

/// Minutes each considered pull request stayed open.
pub async fn review_window(store: &Store, repo: &Repository) -> Result<MetricReport> {
    let values = store
        .considered_pulls(repo.id)
        .await?
        .iter()
        .filter_map(|p| window_minutes(p).map(|m| (p.id, m)))
        .collect();
    Ok(MetricReport {
        name: "review_window",
        values,
    })
}

/// Open minutes divided by changed lines. Considered pulls always have a
/// non-empty diff, so the division is safe.
pub async fn review_window_per_line(store: &Store, repo: &Repository) -> Result<MetricReport> {
    let values = store
        .considered_pulls(repo.id)
        .await?
        .iter()
        .filter_map(|p| {
            window_minutes(p).map(|m| (p.id, (m / p.changed_lines() as f64).trunc()))
        })
        .collect();
    Ok(MetricReport {
        name: "review_window_per_line",
        values,
    })
}
