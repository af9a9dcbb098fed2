//! Core application record types.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Status of a job application.
///
/// `Offer`, `Rejected`, `Withdrawn` and `Archived` are terminal: once an
/// application reaches one of them, no further timer-driven notification
/// or archival may occur. `Interview` is not terminal — the lifecycle
/// keeps monitoring the deadline and the status can revert to `Pending`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    Pending,
    Interview,
    Offer,
    Rejected,
    Withdrawn,
    Archived,
}

impl ApplicationStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ApplicationStatus::Offer
                | ApplicationStatus::Rejected
                | ApplicationStatus::Withdrawn
                | ApplicationStatus::Archived
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "pending",
            ApplicationStatus::Interview => "interview",
            ApplicationStatus::Offer => "offer",
            ApplicationStatus::Rejected => "rejected",
            ApplicationStatus::Withdrawn => "withdrawn",
            ApplicationStatus::Archived => "archived",
        }
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable input snapshot captured when a lifecycle instance starts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationInput {
    pub company: String,
    pub role: String,
    pub description: String,
    pub resume: String,
    pub deadline: DateTime<Utc>,
    pub grace_period: Duration,
}

impl ApplicationInput {
    /// Grace period as expressed on the wire (`gracePeriodDays`).
    pub fn grace_period_days(days: u64) -> Duration {
        Duration::from_secs(days * 24 * 60 * 60)
    }
}

/// An application row as held by the record store.
///
/// The store is an eventually-consistent mirror written by activities;
/// the lifecycle instance owns the in-flight status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationRecord {
    pub id: String,
    pub company: String,
    pub role: String,
    pub description: String,
    pub resume: String,
    pub deadline: DateTime<Utc>,
    pub status: ApplicationStatus,
    pub notes: Option<String>,
    pub cover_letter: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ApplicationRecord {
    pub fn new(id: impl Into<String>, input: &ApplicationInput) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            company: input.company.clone(),
            role: input.role.clone(),
            description: input.description.clone(),
            resume: input.resume.clone(),
            deadline: input.deadline,
            status: ApplicationStatus::Pending,
            notes: None,
            cover_letter: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Partial update applied through the record store seam.
#[derive(Debug, Clone, Default)]
pub struct ApplicationPatch {
    pub status: Option<ApplicationStatus>,
    pub notes: Option<String>,
    pub cover_letter: Option<String>,
}

impl ApplicationPatch {
    pub fn status(status: ApplicationStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }

    pub fn notes(notes: impl Into<String>) -> Self {
        Self {
            notes: Some(notes.into()),
            ..Default::default()
        }
    }

    pub fn cover_letter(cover_letter: impl Into<String>) -> Self {
        Self {
            cover_letter: Some(cover_letter.into()),
            ..Default::default()
        }
    }
}
