// tests/metrics.rs
// Review-window extractors over the considered universe.

mod common;

use chrono::Duration;

use common::*;
use prospector::metrics::{review_window, review_window_per_line};

#[tokio::test]
async fn review_window_truncates_to_whole_minutes() {
    let store = memory_store().await;
    let repository = repo(1, "acme/widgets");
    seed_repo(&store, &repository).await;

    // Six hours open.
    seed_pull(&store, &merged_pull(1, 1, 10, 5, 0), &[]).await;
    // Ninety seconds open: 1.5 minutes truncates to 1.
    let mut quick = merged_pull(2, 1, 10, 5, 0);
    quick.closed_at = Some(quick.created_at + Duration::seconds(90));
    seed_pull(&store, &quick, &[]).await;
    // Merged but never closed: no window to measure.
    let mut open_ended = merged_pull(3, 1, 10, 5, 0);
    open_ended.closed_at = None;
    seed_pull(&store, &open_ended, &[]).await;

    let report = review_window(&store, &repository).await.unwrap();
    assert_eq!(report.name, "review_window");
    assert_eq!(report.values, vec![(1, 360.0), (2, 1.0)]);
}

#[tokio::test]
async fn review_window_skips_unconsidered_pulls() {
    let store = memory_store().await;
    let repository = repo(1, "acme/widgets");
    seed_repo(&store, &repository).await;

    seed_pull(&store, &merged_pull(1, 1, 10, 5, 0), &[]).await;
    let mut unmerged = merged_pull(2, 1, 10, 5, 0);
    unmerged.merged = false;
    seed_pull(&store, &unmerged, &[]).await;

    let report = review_window(&store, &repository).await.unwrap();
    assert_eq!(report.values, vec![(1, 360.0)]);
}

#[tokio::test]
async fn per_line_window_divides_by_changed_lines() {
    let store = memory_store().await;
    let repository = repo(1, "acme/widgets");
    seed_repo(&store, &repository).await;

    // 360 minutes over 7 changed lines truncates to 51.
    seed_pull(&store, &merged_pull(1, 1, 10, 4, 3), &[]).await;
    // 360 minutes over 360 changed lines is exactly 1.
    seed_pull(&store, &merged_pull(2, 1, 10, 300, 60), &[]).await;

    let report = review_window_per_line(&store, &repository).await.unwrap();
    assert_eq!(report.name, "review_window_per_line");
    assert_eq!(report.values, vec![(1, 51.0), (2, 1.0)]);
}
