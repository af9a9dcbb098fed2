//! Scheduled sweeps over pending applications.
//!
//! The sweeps are a safety net behind the per-instance reminder loops:
//! they re-scan the record store on a schedule and notify anything the
//! loops missed (crashed instance, restored backup, manually inserted
//! row). The shared cooldown ledger keeps the two paths from stacking
//! duplicate notifications.

use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use tracing::{debug, info};

use crate::domains::applications::activities::send_notification;
use crate::domains::applications::models::{
    ApplicationRecord, ApplicationStatus, NotificationEvent,
};
use crate::kernel::dedupe::UrgencyTier;
use crate::kernel::TrackerDeps;

const URGENT_WINDOW_HOURS: i64 = 24;
const APPROACHING_WINDOW_DAYS: i64 = 3;
const URGENT_COOLDOWN_HOURS: i64 = 2;
const APPROACHING_COOLDOWN_HOURS: i64 = 24;
const INTENSIVE_FLOOR_HOURS: i64 = 2;
const INTENSIVE_CEILING_HOURS: i64 = 6;

#[derive(Debug, Default, PartialEq, Eq)]
pub struct SweepOutcome {
    pub notified_urgent: usize,
    pub notified_approaching: usize,
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct DailySummary {
    pub urgent: usize,
    pub approaching: usize,
    pub overdue: usize,
    pub total: usize,
}

/// Hourly sweep: urgent reminders under 24h, approaching reminders
/// under 3 days. Overdue applications are the workflow's business, not
/// the sweep's.
pub async fn run_hourly_sweep(deps: &TrackerDeps) -> Result<SweepOutcome> {
    let pending = pending_applications(deps).await?;
    let now = Utc::now();
    let mut outcome = SweepOutcome::default();

    for record in &pending {
        let remaining = record.deadline - now;
        if remaining <= Duration::zero() {
            continue;
        }

        if remaining < Duration::hours(URGENT_WINDOW_HOURS) {
            if deps
                .ledger
                .should_notify(
                    &record.id,
                    UrgencyTier::Urgent,
                    Duration::hours(URGENT_COOLDOWN_HOURS),
                )
                .await
            {
                send_notification(
                    deps,
                    NotificationEvent::urgent_reminder(
                        &record.id,
                        &record.company,
                        &record.role,
                        remaining,
                    ),
                )
                .await;
                outcome.notified_urgent += 1;
            }
        } else if remaining < Duration::days(APPROACHING_WINDOW_DAYS) {
            if deps
                .ledger
                .should_notify(
                    &record.id,
                    UrgencyTier::Approaching,
                    Duration::hours(APPROACHING_COOLDOWN_HOURS),
                )
                .await
            {
                send_notification(
                    deps,
                    NotificationEvent::reminder(
                        &record.id,
                        &record.company,
                        &record.role,
                        remaining,
                    ),
                )
                .await;
                outcome.notified_approaching += 1;
            }
        }
    }

    info!(
        scanned = pending.len(),
        urgent = outcome.notified_urgent,
        approaching = outcome.notified_approaching,
        "hourly sweep complete"
    );
    Ok(outcome)
}

/// High-frequency sweep for the final hours. Under 2h remaining the
/// reminder bypasses the cooldown check entirely (but still records,
/// so the hourly sweep backs off); 2-6h falls back to the urgent tier
/// with its normal cooldown.
pub async fn run_intensive_sweep(deps: &TrackerDeps) -> Result<SweepOutcome> {
    let pending = pending_applications(deps).await?;
    let now = Utc::now();
    let mut outcome = SweepOutcome::default();

    for record in &pending {
        let remaining = record.deadline - now;
        if remaining <= Duration::zero() {
            continue;
        }

        if remaining < Duration::hours(INTENSIVE_FLOOR_HOURS) {
            send_notification(
                deps,
                NotificationEvent::manual_reminder(
                    &record.id,
                    &record.company,
                    &record.role,
                    remaining,
                ),
            )
            .await;
            deps.ledger.record(&record.id, UrgencyTier::Urgent).await;
            outcome.notified_urgent += 1;
        } else if remaining < Duration::hours(INTENSIVE_CEILING_HOURS)
            && deps
                .ledger
                .should_notify(
                    &record.id,
                    UrgencyTier::Urgent,
                    Duration::hours(URGENT_COOLDOWN_HOURS),
                )
                .await
        {
            send_notification(
                deps,
                NotificationEvent::urgent_reminder(
                    &record.id,
                    &record.company,
                    &record.role,
                    remaining,
                ),
            )
            .await;
            outcome.notified_urgent += 1;
        }
    }

    debug!(
        scanned = pending.len(),
        notified = outcome.notified_urgent,
        "intensive sweep complete"
    );
    Ok(outcome)
}

/// Morning digest. Counts only; the numbers go to the log, not the
/// notification hub.
pub async fn run_daily_summary(deps: &TrackerDeps) -> Result<DailySummary> {
    let pending = pending_applications(deps).await?;
    let now = Utc::now();
    let mut summary = DailySummary {
        total: pending.len(),
        ..Default::default()
    };

    for record in &pending {
        let remaining = record.deadline - now;
        if remaining <= Duration::zero() {
            summary.overdue += 1;
        } else if remaining < Duration::hours(URGENT_WINDOW_HOURS) {
            summary.urgent += 1;
        } else if remaining < Duration::days(APPROACHING_WINDOW_DAYS) {
            summary.approaching += 1;
        }
    }

    info!(
        total = summary.total,
        urgent = summary.urgent,
        approaching = summary.approaching,
        overdue = summary.overdue,
        "daily deadline summary"
    );
    Ok(summary)
}

async fn pending_applications(deps: &TrackerDeps) -> Result<Vec<ApplicationRecord>> {
    deps.store
        .find_where(ApplicationStatus::Pending)
        .await
        .context("failed to list pending applications")
}
