// src/github/mod.rs

//! Rate-limited GitHub API client. Transient conditions are never surfaced:
//! 403 waits out the server-provided reset window, everything else sleeps a
//! fixed cool-down, and the request is retried until it succeeds. The
//! external rate limit, not an internal cap, bounds completion.

pub mod payload;

use chrono::Utc;
use once_cell::sync::Lazy;
use rand::seq::IndexedRandom;
use regex::Regex;
use reqwest::header::{HeaderMap, AUTHORIZATION};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::warn;

use crate::store::Store;

/// Added on top of the server-provided reset instant before retrying.
const SAFETY_MARGIN_SECS: i64 = 60;
/// Fixed sleep for generic errors and network failures.
const COOL_DOWN: Duration = Duration::from_secs(60);

static LAST_PAGE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r#"([0-9]+)>; rel="last""#).unwrap());

/// Page count communicated through the final page's "last" relation; a
/// missing header means exactly one page.
pub fn parse_last_page(link_header: Option<&str>) -> u32 {
    link_header
        .and_then(|value| LAST_PAGE_RE.captures(value))
        .and_then(|caps| caps[1].parse().ok())
        .unwrap_or(1)
}

#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    tokens: Arc<Vec<String>>,
}

impl ApiClient {
    pub fn new(base_url: String, tokens: Vec<String>) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent("prospector")
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            tokens: Arc::new(tokens),
        })
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// One credential per request, picked at random from the pool.
    fn auth_header(&self) -> Option<String> {
        self.tokens
            .choose(&mut rand::rng())
            .map(|token| format!("token {token}"))
    }

    /// Fetch a URL, retrying until the server answers below 400.
    pub async fn fetch(&self, url: &str) -> String {
        loop {
            let mut request = self.http.get(url);
            if let Some(auth) = self.auth_header() {
                request = request.header(AUTHORIZATION, auth);
            }
            match request.send().await {
                Ok(response) => {
                    let status = response.status();
                    if status == StatusCode::FORBIDDEN {
                        let wait = rate_limit_wait(response.headers());
                        warn!(
                            url,
                            wait_secs = wait.as_secs(),
                            "Exceeded request quota, waiting for the reset window"
                        );
                        sleep(wait).await;
                    } else if status.as_u16() >= 400 {
                        warn!(url, status = %status, "Request failed, next attempt in 60s");
                        sleep(COOL_DOWN).await;
                    } else {
                        match response.text().await {
                            Ok(body) => return body,
                            Err(e) => {
                                warn!(url, error = %e, "Failed to read response body, next attempt in 60s");
                                sleep(COOL_DOWN).await;
                            }
                        }
                    }
                }
                Err(e) => {
                    warn!(url, error = %e, "Network error, next attempt in 60s");
                    sleep(COOL_DOWN).await;
                }
            }
        }
    }

    /// Fetch and deserialize. A malformed payload is an error for the caller
    /// to handle; transport-level trouble is retried away inside `fetch`.
    pub async fn fetch_json<T: DeserializeOwned>(&self, url: &str) -> anyhow::Result<T> {
        let body = self.fetch(url).await;
        serde_json::from_str(&body)
            .map_err(|e| anyhow::anyhow!("Unexpected payload from {url}: {e}"))
    }

    /// Probe how many pages a paginated listing spans. Returns 0 when the
    /// probe itself fails (terminal: nothing to ingest).
    ///
    /// Side effect: the first successful probe doubles as repository
    /// discovery — the repo and its owner are seeded from the response body.
    /// Best-effort only; a payload without that shape is silently ignored.
    pub async fn probe_page_count(&self, url: &str, store: &Store) -> u32 {
        let mut request = self.http.get(url);
        if let Some(auth) = self.auth_header() {
            request = request.header(AUTHORIZATION, auth);
        }
        let response = match request.send().await {
            Ok(r) => r,
            Err(e) => {
                warn!(url, error = %e, "Failed to fetch the number of pages");
                return 0;
            }
        };
        if response.status() != StatusCode::OK {
            warn!(url, status = %response.status(), "Failed to fetch the number of pages");
            return 0;
        }

        let link = response
            .headers()
            .get("link")
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);
        let body = response.text().await.unwrap_or_default();
        self.seed_repository(store, &body).await;

        parse_last_page(link.as_deref())
    }

    async fn seed_repository(&self, store: &Store, body: &str) {
        let Ok(value) = serde_json::from_str::<serde_json::Value>(body) else {
            return;
        };
        let Ok(repo) =
            serde_json::from_value::<payload::RepoPayload>(value[0]["base"]["repo"].clone())
        else {
            return;
        };
        let _ = store.upsert_user(&repo.owner.to_user()).await;
        let _ = store.upsert_repository(&repo.to_repository()).await;
    }
}

fn rate_limit_wait(headers: &HeaderMap) -> Duration {
    let reset_epoch = headers
        .get("x-ratelimit-reset")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.parse::<i64>().ok());
    match reset_epoch {
        Some(epoch) => {
            let wait = epoch - Utc::now().timestamp() + SAFETY_MARGIN_SECS;
            Duration::from_secs(wait.max(0) as u64)
        }
        // Forbidden without a reset header gets the generic cool-down.
        None => COOL_DOWN,
    }
}
