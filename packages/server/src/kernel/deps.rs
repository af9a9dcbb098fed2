//! Dependency container for activities and sweeps.
//!
//! Every activity call receives this context explicitly — there are no
//! ambient globals. External services sit behind trait objects so tests
//! can swap them out.

use std::sync::Arc;

use crate::domains::applications::workflows::LifecycleConfig;
use crate::kernel::dedupe::DedupeLedger;
use crate::kernel::notify_hub::NotificationHub;
use crate::kernel::retry::RetryPolicy;
use crate::kernel::traits::{BaseApplicationStore, BaseCoverLetterService};

/// Dependencies owned by the worker that executes activities.
#[derive(Clone)]
pub struct TrackerDeps {
    /// Record store mirror of application state.
    pub store: Arc<dyn BaseApplicationStore>,
    /// Text-generation collaborator for cover letters.
    pub cover_letters: Arc<dyn BaseCoverLetterService>,
    /// Broadcast hub for client-facing notifications.
    pub hub: NotificationHub,
    /// Cooldown ledger shared by sweeps and the reminder loop.
    pub ledger: DedupeLedger,
    /// Retry policy applied to activity calls.
    pub retry: RetryPolicy,
    /// Timer windows for the lifecycle workflow.
    pub lifecycle: LifecycleConfig,
}

impl TrackerDeps {
    pub fn new(
        store: Arc<dyn BaseApplicationStore>,
        cover_letters: Arc<dyn BaseCoverLetterService>,
        hub: NotificationHub,
        ledger: DedupeLedger,
        retry: RetryPolicy,
        lifecycle: LifecycleConfig,
    ) -> Self {
        Self {
            store,
            cover_letters,
            hub,
            ledger,
            retry,
            lifecycle,
        }
    }
}
