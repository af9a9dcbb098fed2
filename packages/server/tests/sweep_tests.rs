//! Scheduled sweep tests: tier partitioning, cooldown dedupe and the
//! daily summary. The sweeps run once per call here; the cron wiring
//! around them is plumbing only.

mod common;

use chrono::{Duration, Utc};
use common::{count_of, drain_events, TestHarness};
use server_core::domains::applications::models::{
    ApplicationRecord, ApplicationStatus, EventType,
};
use server_core::domains::applications::sweeps::{
    run_daily_summary, run_hourly_sweep, run_intensive_sweep,
};
use server_core::kernel::traits::BaseApplicationStore;

async fn seed(h: &TestHarness, id: &str, deadline_in: Duration, status: ApplicationStatus) {
    let mut input = common::sample_input(std::time::Duration::ZERO, std::time::Duration::ZERO);
    input.deadline = Utc::now() + deadline_in;
    let mut record = ApplicationRecord::new(id, &input);
    record.status = status;
    h.app_store.insert(record).await.unwrap();
}

#[tokio::test]
async fn test_hourly_sweep_partitions_and_dedupes() {
    let h = TestHarness::new();
    let (_, mut rx) = h.hub.subscribe().await;

    seed(&h, "urgent", Duration::hours(10), ApplicationStatus::Pending).await;
    seed(&h, "soon", Duration::days(2), ApplicationStatus::Pending).await;
    seed(&h, "far", Duration::days(10), ApplicationStatus::Pending).await;
    seed(&h, "overdue", Duration::hours(-1), ApplicationStatus::Pending).await;
    seed(&h, "offered", Duration::hours(10), ApplicationStatus::Offer).await;

    let outcome = run_hourly_sweep(&h.deps).await.unwrap();
    assert_eq!(outcome.notified_urgent, 1);
    assert_eq!(outcome.notified_approaching, 1);

    let events = drain_events(&mut rx);
    assert_eq!(count_of(&events, EventType::UrgentReminder), 1);
    assert_eq!(count_of(&events, EventType::Reminder), 1);
    assert!(events.iter().all(|e| e.application_id != "far"));
    assert!(events.iter().all(|e| e.application_id != "overdue"));
    assert!(events.iter().all(|e| e.application_id != "offered"));

    // Second run inside the cooldown windows notifies nobody.
    let outcome = run_hourly_sweep(&h.deps).await.unwrap();
    assert_eq!(outcome.notified_urgent, 0);
    assert_eq!(outcome.notified_approaching, 0);
    assert!(drain_events(&mut rx).is_empty());
}

#[tokio::test]
async fn test_intensive_sweep_bypasses_cooldown_in_final_hours() {
    let h = TestHarness::new();
    let (_, mut rx) = h.hub.subscribe().await;

    seed(&h, "final", Duration::minutes(90), ApplicationStatus::Pending).await;
    seed(&h, "mid", Duration::hours(4), ApplicationStatus::Pending).await;
    seed(&h, "outside", Duration::hours(8), ApplicationStatus::Pending).await;

    let outcome = run_intensive_sweep(&h.deps).await.unwrap();
    assert_eq!(outcome.notified_urgent, 2);

    // The final-hours reminder repeats on every pass; the 2-6h band
    // respects the urgent cooldown.
    let outcome = run_intensive_sweep(&h.deps).await.unwrap();
    assert_eq!(outcome.notified_urgent, 1);

    let events = drain_events(&mut rx);
    assert_eq!(count_of(&events, EventType::ManualReminder), 2);
    assert_eq!(count_of(&events, EventType::UrgentReminder), 1);
    assert!(events.iter().all(|e| e.application_id != "outside"));
}

#[tokio::test]
async fn test_sweeps_share_the_cooldown_ledger() {
    let h = TestHarness::new();
    let (_, mut rx) = h.hub.subscribe().await;

    seed(&h, "mid", Duration::hours(4), ApplicationStatus::Pending).await;

    // Intensive sweep notifies first; the hourly sweep then backs off
    // because the urgent cooldown is shared.
    let outcome = run_intensive_sweep(&h.deps).await.unwrap();
    assert_eq!(outcome.notified_urgent, 1);
    let outcome = run_hourly_sweep(&h.deps).await.unwrap();
    assert_eq!(outcome.notified_urgent, 0);

    assert_eq!(drain_events(&mut rx).len(), 1);
}

#[tokio::test]
async fn test_daily_summary_counts_without_notifying() {
    let h = TestHarness::new();
    let (_, mut rx) = h.hub.subscribe().await;

    seed(&h, "urgent", Duration::hours(10), ApplicationStatus::Pending).await;
    seed(&h, "soon", Duration::days(2), ApplicationStatus::Pending).await;
    seed(&h, "far", Duration::days(10), ApplicationStatus::Pending).await;
    seed(&h, "overdue", Duration::hours(-2), ApplicationStatus::Pending).await;

    let summary = run_daily_summary(&h.deps).await.unwrap();
    assert_eq!(summary.total, 4);
    assert_eq!(summary.urgent, 1);
    assert_eq!(summary.approaching, 1);
    assert_eq!(summary.overdue, 1);

    assert!(drain_events(&mut rx).is_empty());
}
