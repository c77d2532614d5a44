// tests/impact.rs
// Bug-proneness calculation over seeded file-change history.

mod common;

use chrono::Duration;

use common::*;
use prospector::impact::{calc_impact, BugSignal};
use prospector::models::BugIssue;
use prospector::smells::Detector;
use prospector::store::ChangedFile;

fn touch(filename: &str) -> ChangedFile {
    ChangedFile {
        filename: filename.to_string(),
        status: "modified".to_string(),
        additions: 2,
        deletions: 1,
        changes: 3,
    }
}

#[tokio::test]
async fn next_change_linked_to_bug_issue_counts() {
    let store = memory_store().await;
    let repository = repo(1, "acme/widgets");
    seed_repo(&store, &repository).await;

    // Smelly origin: a large pull touching core.rs.
    let mut origin = merged_pull(1, 1, 10, 600, 10);
    origin.closed_at = Some(epoch());
    seed_pull(&store, &origin, &[]).await;
    store.record_file_change(&origin, &touch("core.rs")).await.unwrap();

    // The next change to core.rs, linked to a bug issue by id. Title and
    // body carry no keywords so only the issue link can match.
    let mut follow = merged_pull(2, 1, 11, 5, 0);
    follow.title = "Adjust retry window".to_string();
    follow.closed_at = Some(epoch() + Duration::days(1));
    seed_pull(&store, &follow, &[]).await;
    store.record_file_change(&follow, &touch("core.rs")).await.unwrap();

    store
        .upsert_bug_issue(&BugIssue { id: 2, number: 77, repository_id: 1 })
        .await
        .unwrap();

    let report = calc_impact(&store, &repository, &Detector::LargeChangeset, BugSignal::NextChange)
        .await
        .unwrap();

    // Partition: smelly = {origin}, ok = {follow}. The origin's file is next
    // touched by the bug-linked pull; the follow-up has no later change.
    assert!((report.smelly_rate - 1.0).abs() < 1e-9);
    assert!(report.ok_rate.abs() < 1e-9);
    assert!((report.delta() - 1.0).abs() < 1e-9);
}

#[tokio::test]
async fn next_change_only_looks_one_step_ahead() {
    let store = memory_store().await;
    let repository = repo(1, "acme/widgets");
    seed_repo(&store, &repository).await;

    let mut origin = merged_pull(1, 1, 10, 600, 10);
    origin.closed_at = Some(epoch());
    seed_pull(&store, &origin, &[]).await;
    store.record_file_change(&origin, &touch("core.rs")).await.unwrap();

    // Nearest change is clean; the one after fixes a bug. Depth 1 must not
    // see past the nearest.
    let mut clean = merged_pull(2, 1, 11, 5, 0);
    clean.title = "Rename helpers".to_string();
    clean.closed_at = Some(epoch() + Duration::days(1));
    seed_pull(&store, &clean, &[]).await;
    store.record_file_change(&clean, &touch("core.rs")).await.unwrap();

    let mut bugfix = merged_pull(3, 1, 11, 5, 0);
    bugfix.title = "Fix overflow in core".to_string();
    bugfix.closed_at = Some(epoch() + Duration::days(2));
    seed_pull(&store, &bugfix, &[]).await;
    store.record_file_change(&bugfix, &touch("core.rs")).await.unwrap();

    let report = calc_impact(&store, &repository, &Detector::LargeChangeset, BugSignal::NextChange)
        .await
        .unwrap();
    assert!(report.smelly_rate.abs() < 1e-9);

    // The deeper walk does see it, discounted by distance and the number of
    // files the origin touched (one).
    let report = calc_impact(
        &store,
        &repository,
        &Detector::LargeChangeset,
        BugSignal::Bugginess { depth: 4 },
    )
    .await
    .unwrap();
    assert!((report.smelly_rate - 0.5).abs() < 1e-9);
}

#[tokio::test]
async fn bugginess_weights_decay_with_distance() {
    let store = memory_store().await;
    let repository = repo(1, "acme/widgets");
    seed_repo(&store, &repository).await;

    let mut origin = merged_pull(1, 1, 10, 600, 10);
    origin.closed_at = Some(epoch());
    seed_pull(&store, &origin, &[]).await;
    store.record_file_change(&origin, &touch("w.rs")).await.unwrap();

    // Walk: clean, bugfix, bugfix at distances 1, 2, 3.
    let titles = ["Rename helpers", "Fix walker bug", "Error path cleanup"];
    for (i, title) in titles.iter().enumerate() {
        let id = 2 + i as i64;
        let mut next = merged_pull(id, 1, 11, 5, 0);
        next.title = (*title).to_string();
        next.closed_at = Some(epoch() + Duration::days(1 + i as i64));
        seed_pull(&store, &next, &[]).await;
        store.record_file_change(&next, &touch("w.rs")).await.unwrap();
    }

    let report = calc_impact(
        &store,
        &repository,
        &Detector::LargeChangeset,
        BugSignal::Bugginess { depth: 4 },
    )
    .await
    .unwrap();

    // 1/2 for distance 2 plus 1/3 for distance 3, one file touched.
    assert!((report.smelly_rate - (0.5 + 1.0 / 3.0)).abs() < 1e-9);
}

#[tokio::test]
async fn empty_partition_yields_nan_not_an_error() {
    let store = memory_store().await;
    let repository = repo(1, "acme/widgets");
    seed_repo(&store, &repository).await;

    // Every considered pull is small: the smelly partition is empty.
    seed_pull(&store, &merged_pull(1, 1, 10, 5, 0), &[]).await;
    seed_pull(&store, &merged_pull(2, 1, 10, 5, 0), &[]).await;

    let report = calc_impact(&store, &repository, &Detector::LargeChangeset, BugSignal::NextChange)
        .await
        .unwrap();
    assert!(report.smelly_rate.is_nan());
    assert!(report.ok_rate.abs() < 1e-9);
}

#[tokio::test]
async fn referenced_bug_number_in_next_change_counts() {
    let store = memory_store().await;
    let repository = repo(1, "acme/widgets");
    seed_repo(&store, &repository).await;

    let mut origin = merged_pull(1, 1, 10, 600, 10);
    origin.closed_at = Some(epoch());
    seed_pull(&store, &origin, &[]).await;
    store.record_file_change(&origin, &touch("core.rs")).await.unwrap();

    // Neutral wording, but the body references the bug issue number.
    let mut follow = merged_pull(2, 1, 11, 5, 0);
    follow.title = "Adjust retry window".to_string();
    follow.body = "see #77".to_string();
    follow.closed_at = Some(epoch() + Duration::days(1));
    seed_pull(&store, &follow, &[]).await;
    store.record_file_change(&follow, &touch("core.rs")).await.unwrap();

    store
        .upsert_bug_issue(&BugIssue { id: 999, number: 77, repository_id: 1 })
        .await
        .unwrap();

    let report = calc_impact(&store, &repository, &Detector::LargeChangeset, BugSignal::NextChange)
        .await
        .unwrap();
    assert!((report.smelly_rate - 1.0).abs() < 1e-9);
}
