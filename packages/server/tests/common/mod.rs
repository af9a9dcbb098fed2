//! Shared harness for the lifecycle and sweep integration tests.
//!
//! The real engine runs against in-memory stores with timer windows
//! shrunk to milliseconds, so every test exercises the actual select
//! loops and checkpointing rather than mocks of them.

#![allow(dead_code)]

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::mpsc;

use server_core::domains::applications::models::{
    ApplicationInput, ApplicationPatch, ApplicationRecord, ApplicationStatus, EventType,
    NotificationEvent,
};
use server_core::domains::applications::store::InMemoryApplicationStore;
use server_core::domains::applications::workflows::LifecycleConfig;
use server_core::kernel::dedupe::DedupeLedger;
use server_core::kernel::engine::{in_memory_store, InstanceStore, LifecycleEngine};
use server_core::kernel::notify_hub::NotificationHub;
use server_core::kernel::retry::RetryPolicy;
use server_core::kernel::traits::{BaseApplicationStore, BaseCoverLetterService};
use server_core::kernel::TrackerDeps;

/// Cover letter service scripted to fail a fixed number of times before
/// succeeding.
pub struct ScriptedCoverLetters {
    fail_times: AtomicU32,
    pub calls: AtomicU32,
}

impl ScriptedCoverLetters {
    pub fn new(fail_times: u32) -> Self {
        Self {
            fail_times: AtomicU32::new(fail_times),
            calls: AtomicU32::new(0),
        }
    }
}

#[async_trait]
impl BaseCoverLetterService for ScriptedCoverLetters {
    async fn generate(&self, _prompt: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let remaining = self.fail_times.load(Ordering::SeqCst);
        if remaining > 0 {
            self.fail_times.store(remaining - 1, Ordering::SeqCst);
            return Err(anyhow!("scripted generation failure"));
        }
        Ok("Dear hiring team, I would be a great fit.".to_string())
    }
}

/// Millisecond-scale timer windows so a full lifecycle fits in a test.
pub fn fast_lifecycle() -> LifecycleConfig {
    LifecycleConfig {
        urgent_window: Duration::from_secs(10),
        reminder_interval: Duration::from_millis(50),
    }
}

pub fn fast_retry() -> RetryPolicy {
    RetryPolicy {
        initial_backoff: Duration::from_millis(1),
        max_backoff: Duration::from_millis(4),
        max_attempts: 3,
        attempt_timeout: Duration::from_millis(500),
    }
}

pub struct TestHarness {
    pub deps: Arc<TrackerDeps>,
    pub engine: Arc<LifecycleEngine>,
    pub app_store: Arc<InMemoryApplicationStore>,
    pub snapshots: Arc<dyn InstanceStore>,
    pub hub: NotificationHub,
    pub letters: Arc<ScriptedCoverLetters>,
}

impl TestHarness {
    pub fn new() -> Self {
        Self::with(0, fast_lifecycle())
    }

    pub fn with(cover_letter_failures: u32, lifecycle: LifecycleConfig) -> Self {
        let app_store = Arc::new(InMemoryApplicationStore::new());
        let letters = Arc::new(ScriptedCoverLetters::new(cover_letter_failures));
        let hub = NotificationHub::new();
        let deps = Arc::new(TrackerDeps::new(
            app_store.clone(),
            letters.clone(),
            hub.clone(),
            DedupeLedger::new(),
            fast_retry(),
            lifecycle,
        ));
        let snapshots = in_memory_store();
        let engine = Arc::new(LifecycleEngine::new(deps.clone(), snapshots.clone()));
        Self {
            deps,
            engine,
            app_store,
            snapshots,
            hub,
            letters,
        }
    }

    /// Insert the record and start its lifecycle instance, mirroring
    /// what the CRUD layer does on create.
    pub async fn start_application(
        &self,
        id: &str,
        deadline_in: Duration,
        grace_period: Duration,
    ) -> ApplicationInput {
        let input = sample_input(deadline_in, grace_period);
        self.app_store
            .insert(ApplicationRecord::new(id, &input))
            .await
            .unwrap();
        self.engine.start(id, input.clone()).await.unwrap();
        input
    }

    /// Persist a status change and signal the running instance,
    /// mirroring what the CRUD layer does on update.
    pub async fn set_status(&self, id: &str, status: ApplicationStatus) {
        self.app_store
            .update(id, ApplicationPatch::status(status))
            .await
            .unwrap();
        self.engine.signal_status(id, status).await.unwrap();
    }

    /// A second engine over the same stores, as after a process restart.
    pub fn restarted_engine(&self) -> Arc<LifecycleEngine> {
        Arc::new(LifecycleEngine::new(
            self.deps.clone(),
            self.snapshots.clone(),
        ))
    }

    pub async fn stored_status(&self, id: &str) -> ApplicationStatus {
        self.app_store.get(id).await.unwrap().unwrap().status
    }
}

pub fn sample_input(deadline_in: Duration, grace_period: Duration) -> ApplicationInput {
    ApplicationInput {
        company: "Acme".into(),
        role: "Engineer".into(),
        description: "Build reliable systems".into(),
        resume: "Ten years of reliable systems".into(),
        deadline: Utc::now() + chrono::Duration::from_std(deadline_in).unwrap(),
        grace_period,
    }
}

/// Pull everything currently queued on a subscriber channel.
pub fn drain_events(rx: &mut mpsc::Receiver<NotificationEvent>) -> Vec<NotificationEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

pub fn count_of(events: &[NotificationEvent], event_type: EventType) -> usize {
    events.iter().filter(|e| e.event_type == event_type).count()
}
