//! Cooldown ledger for deadline notifications.
//!
//! Both the per-instance reminder loop and the sweep jobs record here,
//! so the sweeps do not re-notify an application the workflow already
//! covered inside the cooldown window. The ledger is process-local and
//! lost on restart; a lost entry only risks one extra notification.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::RwLock;
use tracing::debug;

/// Urgency tier a notification was sent under. Each tier has its own
/// cooldown window per application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UrgencyTier {
    Urgent,
    Approaching,
}

#[derive(Clone, Default)]
pub struct DedupeLedger {
    entries: Arc<RwLock<HashMap<(String, UrgencyTier), DateTime<Utc>>>>,
}

impl DedupeLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true (and records the send) if no notification for this
    /// application and tier went out within the cooldown window.
    pub async fn should_notify(
        &self,
        application_id: &str,
        tier: UrgencyTier,
        cooldown: Duration,
    ) -> bool {
        let now = Utc::now();
        let key = (application_id.to_string(), tier);
        let mut entries = self.entries.write().await;
        if let Some(last) = entries.get(&key) {
            if now - *last < cooldown {
                debug!(application_id, ?tier, "within cooldown, skipping notification");
                return false;
            }
        }
        entries.insert(key, now);
        true
    }

    /// Record a send without checking the cooldown (used by paths that
    /// notify unconditionally, e.g. the reminder loop).
    pub async fn record(&self, application_id: &str, tier: UrgencyTier) {
        let mut entries = self.entries.write().await;
        entries.insert((application_id.to_string(), tier), Utc::now());
    }
}
