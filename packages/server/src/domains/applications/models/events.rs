//! Notification events pushed to connected clients.
//!
//! Events are immutable once created. The wire format is JSON with
//! camelCase keys and an RFC 3339 timestamp:
//! `{type, applicationId, company, role, status?, message, timestamp}`.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::common::format_remaining;

use super::application::ApplicationStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    Reminder,
    Deadline,
    DeadlineMonitor,
    UrgentReminder,
    ManualReminder,
    Archive,
    StatusUpdate,
    CoverLetterGenerated,
    ApplicationDeleted,
    Error,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::Reminder => "reminder",
            EventType::Deadline => "deadline",
            EventType::DeadlineMonitor => "deadline_monitor",
            EventType::UrgentReminder => "urgent_reminder",
            EventType::ManualReminder => "manual_reminder",
            EventType::Archive => "archive",
            EventType::StatusUpdate => "status_update",
            EventType::CoverLetterGenerated => "cover_letter_generated",
            EventType::ApplicationDeleted => "application_deleted",
            EventType::Error => "error",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationEvent {
    #[serde(rename = "type")]
    pub event_type: EventType,
    pub application_id: String,
    pub company: String,
    pub role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ApplicationStatus>,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

impl NotificationEvent {
    fn new(
        event_type: EventType,
        application_id: &str,
        company: &str,
        role: &str,
        status: Option<ApplicationStatus>,
        message: String,
    ) -> Self {
        Self {
            event_type,
            application_id: application_id.to_string(),
            company: company.to_string(),
            role: role.to_string(),
            status,
            message,
            timestamp: Utc::now(),
        }
    }

    pub fn cover_letter_generated(application_id: &str, company: &str, role: &str) -> Self {
        Self::new(
            EventType::CoverLetterGenerated,
            application_id,
            company,
            role,
            None,
            format!("Cover letter ready for {} at {}", role, company),
        )
    }

    pub fn deadline_monitor(
        application_id: &str,
        company: &str,
        role: &str,
        remaining: Duration,
    ) -> Self {
        Self::new(
            EventType::DeadlineMonitor,
            application_id,
            company,
            role,
            None,
            format!(
                "Tracking deadline for {} at {} ({} left)",
                role,
                company,
                format_remaining(remaining)
            ),
        )
    }

    pub fn urgent_reminder(
        application_id: &str,
        company: &str,
        role: &str,
        remaining: Duration,
    ) -> Self {
        Self::new(
            EventType::UrgentReminder,
            application_id,
            company,
            role,
            None,
            format!(
                "Deadline for {} at {} in {}",
                role,
                company,
                format_remaining(remaining)
            ),
        )
    }

    pub fn reminder(application_id: &str, company: &str, role: &str, remaining: Duration) -> Self {
        Self::new(
            EventType::Reminder,
            application_id,
            company,
            role,
            None,
            format!(
                "Deadline for {} at {} approaching ({} left)",
                role,
                company,
                format_remaining(remaining)
            ),
        )
    }

    pub fn manual_reminder(
        application_id: &str,
        company: &str,
        role: &str,
        remaining: Duration,
    ) -> Self {
        Self::new(
            EventType::ManualReminder,
            application_id,
            company,
            role,
            None,
            format!(
                "Final call: {} at {} closes in {}",
                role,
                company,
                format_remaining(remaining)
            ),
        )
    }

    pub fn deadline(application_id: &str, company: &str, role: &str) -> Self {
        Self::new(
            EventType::Deadline,
            application_id,
            company,
            role,
            Some(ApplicationStatus::Pending),
            format!("Deadline reached for {} at {}", role, company),
        )
    }

    pub fn archive(application_id: &str, company: &str, role: &str) -> Self {
        Self::new(
            EventType::Archive,
            application_id,
            company,
            role,
            Some(ApplicationStatus::Archived),
            format!(
                "Application for {} at {} archived after grace period",
                role, company
            ),
        )
    }

    pub fn status_update(
        application_id: &str,
        company: &str,
        role: &str,
        status: ApplicationStatus,
    ) -> Self {
        Self::new(
            EventType::StatusUpdate,
            application_id,
            company,
            role,
            Some(status),
            format!("Application for {} at {} moved to {}", role, company, status),
        )
    }

    pub fn application_deleted(application_id: &str, company: &str, role: &str) -> Self {
        Self::new(
            EventType::ApplicationDeleted,
            application_id,
            company,
            role,
            None,
            format!("Application for {} at {} deleted", role, company),
        )
    }

    pub fn error(application_id: &str, company: &str, role: &str, message: String) -> Self {
        Self::new(EventType::Error, application_id, company, role, None, message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_format_camel_case() {
        let event = NotificationEvent::deadline("app-1", "Acme", "Engineer");
        let json = serde_json::to_value(&event).unwrap();

        assert_eq!(json["type"], "deadline");
        assert_eq!(json["applicationId"], "app-1");
        assert_eq!(json["company"], "Acme");
        assert_eq!(json["role"], "Engineer");
        assert_eq!(json["status"], "pending");
        assert!(json["message"].as_str().unwrap().contains("Engineer"));
    }

    #[test]
    fn test_status_omitted_when_absent() {
        let event =
            NotificationEvent::urgent_reminder("app-1", "Acme", "Engineer", Duration::minutes(30));
        let json = serde_json::to_value(&event).unwrap();
        assert!(json.get("status").is_none());
        assert!(json["message"].as_str().unwrap().contains("30 minutes"));
    }

    #[test]
    fn test_timestamp_is_rfc3339() {
        let event = NotificationEvent::archive("app-1", "Acme", "Engineer");
        let json = serde_json::to_value(&event).unwrap();
        let raw = json["timestamp"].as_str().unwrap();
        assert!(DateTime::parse_from_rfc3339(raw).is_ok());
    }

    #[test]
    fn test_roundtrip() {
        let event = NotificationEvent::status_update(
            "app-2",
            "Globex",
            "Designer",
            ApplicationStatus::Interview,
        );
        let json = serde_json::to_string(&event).unwrap();
        let back: NotificationEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
    }
}
