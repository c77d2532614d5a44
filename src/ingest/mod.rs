// src/ingest/mod.rs

//! Ingestion pipeline. Per project: discover the page count, then walk pages
//! strictly in order; within a page every pull request's detail fetch runs
//! concurrently. Each item commits in two steps — the pull request with its
//! reviews first, the file changes second — and retries on its own without
//! disturbing its siblings.

mod progress;

use anyhow::{Context, Result};
use tokio::task::JoinSet;
use tokio::time::sleep;
use tracing::{info, warn};

use crate::github::payload::{FilePayload, IssuePayload, ListEntry, PullPayload, ReviewPayload};
use crate::github::ApiClient;
use crate::store::{ChangedFile, Store};
use progress::Progress;

const ITEM_RETRY_COOL_DOWN: std::time::Duration = std::time::Duration::from_secs(60);
const PER_PAGE: u32 = 100;

pub struct Ingestor {
    store: Store,
    client: ApiClient,
}

impl Ingestor {
    pub fn new(store: Store, client: ApiClient) -> Self {
        Self { store, client }
    }

    /// Ingest all closed pull requests of `project` (an `owner/name` full
    /// name). Safe to re-run: every row merges by primary key.
    pub async fn ingest_project(&self, project: &str) -> Result<()> {
        let progress = Progress::start();
        let list_url = self.client.url(&format!(
            "/repos/{project}/pulls?state=closed&direction=asc&per_page={PER_PAGE}"
        ));

        let pages = self.client.probe_page_count(&list_url, &self.store).await;
        if pages == 0 {
            info!(project, "No pull request pages to ingest");
            return Ok(());
        }

        for page in 1..=pages {
            progress.report("Pull request pages", page - 1, pages);
            let body = self.client.fetch(&format!("{list_url}&page={page}")).await;
            let entries: Vec<ListEntry> = serde_json::from_str(&body)
                .with_context(|| format!("Unexpected pull list payload on page {page}"))?;

            let mut batch = JoinSet::new();
            for entry in entries {
                let store = self.store.clone();
                let client = self.client.clone();
                batch.spawn(async move { ingest_pull(&store, &client, &entry.url).await });
            }
            // A failed item retries inside its own task; only a panic
            // surfaces here, and it must not abort the rest of the batch.
            while let Some(joined) = batch.join_next().await {
                if let Err(e) = joined {
                    warn!(error = %e, "Pull ingestion task aborted");
                }
            }
            progress.report("Pull request pages", page, pages);
        }

        info!(project, pages, "Pull request ingestion complete");
        Ok(())
    }

    /// Ingest closed issues labeled as bugs. The repository row must already
    /// exist (pull ingestion seeds it); otherwise this reports and skips.
    pub async fn ingest_bug_issues(&self, project: &str) -> Result<()> {
        let Some(repository) = self.store.repository_by_full_name(project).await? else {
            warn!(project, "Repository is unknown, skipping bug issue ingestion");
            return Ok(());
        };

        let progress = Progress::start();
        let list_url = self.client.url(&format!(
            "/repos/{project}/issues?labels=bug&state=closed&direction=asc&per_page={PER_PAGE}"
        ));

        let pages = self.client.probe_page_count(&list_url, &self.store).await;
        for page in 1..=pages {
            progress.report("Bug issue pages", page - 1, pages);
            let body = self.client.fetch(&format!("{list_url}&page={page}")).await;
            let issues: Vec<IssuePayload> = serde_json::from_str(&body)
                .with_context(|| format!("Unexpected issue list payload on page {page}"))?;
            for issue in issues {
                self.store
                    .upsert_bug_issue(&issue.to_bug_issue(repository.id))
                    .await?;
            }
            progress.report("Bug issue pages", page, pages);
        }

        info!(project, pages, "Bug issue ingestion complete");
        Ok(())
    }
}

/// Drive one pull request to completion, retrying with a cool-down on any
/// failure. Never gives up; resumability comes from merge-semantics upserts.
async fn ingest_pull(store: &Store, client: &ApiClient, url: &str) {
    loop {
        match try_ingest_pull(store, client, url).await {
            Ok(()) => return,
            Err(e) => {
                warn!(url, error = %e, "Pull ingestion failed, next attempt in 60s");
                sleep(ITEM_RETRY_COOL_DOWN).await;
            }
        }
    }
}

async fn try_ingest_pull(store: &Store, client: &ApiClient, url: &str) -> Result<()> {
    let pull: PullPayload = client.fetch_json(url).await?;
    let reviews: Vec<ReviewPayload> = client.fetch_json(&format!("{url}/reviews")).await?;
    let files: Vec<FilePayload> = client.fetch_json(&format!("{url}/files")).await?;

    // First transaction: the pull request, everyone it references, and its
    // reviews land together.
    let review_users: Vec<_> = reviews
        .iter()
        .filter_map(|r| r.user.as_ref().map(|u| u.to_user()))
        .collect();
    let mut users = pull.referenced_users();
    users.extend(review_users);

    let model = pull.to_model();
    let assignee_ids: Vec<i64> = pull.assignees.iter().map(|a| a.id).collect();
    let review_models: Vec<_> = reviews.iter().map(|r| r.to_model(pull.id)).collect();

    store
        .upsert_pull_with_reviews(&users, &model, &assignee_ids, &review_models)
        .await?;

    // Second transaction(s): file rows resolve their lifecycle timestamps
    // against the just-committed pull row.
    let stored = store
        .get_pull(pull.id)
        .await?
        .context("Committed pull request not found on read-back")?;
    for file in &files {
        let change = ChangedFile {
            filename: file.filename.clone(),
            status: file.status.clone(),
            additions: file.additions,
            deletions: file.deletions,
            changes: file.changes,
        };
        store.record_file_change(&stored, &change).await?;
    }

    Ok(())
}
