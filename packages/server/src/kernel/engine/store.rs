//! Instance snapshots and their persistence seam.
//!
//! The engine checkpoints a snapshot at every status or phase change so
//! that `resume_all` can re-spawn running instances after a process
//! restart at the correct logical point. Timer waits are recomputed
//! from the wall-clock deadline; the phase gate keeps completed side
//! effects from re-applying.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domains::applications::models::{ApplicationInput, ApplicationStatus};

/// Where a lifecycle instance is in its main sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowPhase {
    /// Cover letter not yet generated.
    CoverLetter,
    /// Waiting for the deadline (including the reminder sub-loop).
    Monitoring,
    /// Deadline passed, grace period running.
    Grace,
    /// Main sequence finished; no further timers.
    Finished,
}

/// Terminal disposition of one run, visible via `query_info`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum RunStatus {
    Running,
    Completed,
    Cancelled,
    Failed { error: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstanceSnapshot {
    pub application_id: String,
    pub run_id: Uuid,
    pub input: ApplicationInput,
    pub status: ApplicationStatus,
    pub phase: WorkflowPhase,
    pub run_status: RunStatus,
    pub updated_at: DateTime<Utc>,
}

impl InstanceSnapshot {
    pub fn new(application_id: impl Into<String>, run_id: Uuid, input: ApplicationInput) -> Self {
        Self {
            application_id: application_id.into(),
            run_id,
            input,
            status: ApplicationStatus::Pending,
            phase: WorkflowPhase::CoverLetter,
            run_status: RunStatus::Running,
            updated_at: Utc::now(),
        }
    }

    /// Stable workflow identifier derived from the application id.
    pub fn instance_id(&self) -> String {
        format!("application-{}", self.application_id)
    }
}

/// Persistence seam for instance snapshots.
#[async_trait]
pub trait InstanceStore: Send + Sync {
    async fn put(&self, snapshot: InstanceSnapshot) -> Result<()>;
    async fn get(&self, application_id: &str) -> Result<Option<InstanceSnapshot>>;
    async fn list(&self) -> Result<Vec<InstanceSnapshot>>;
    async fn remove(&self, application_id: &str) -> Result<()>;
}

/// In-memory snapshot store. A deployment wanting resume across real
/// process restarts swaps in a durable implementation.
#[derive(Default)]
pub struct InMemoryInstanceStore {
    snapshots: RwLock<HashMap<String, InstanceSnapshot>>,
}

impl InMemoryInstanceStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl InstanceStore for InMemoryInstanceStore {
    async fn put(&self, snapshot: InstanceSnapshot) -> Result<()> {
        let mut snapshots = self.snapshots.write().await;
        snapshots.insert(snapshot.application_id.clone(), snapshot);
        Ok(())
    }

    async fn get(&self, application_id: &str) -> Result<Option<InstanceSnapshot>> {
        let snapshots = self.snapshots.read().await;
        Ok(snapshots.get(application_id).cloned())
    }

    async fn list(&self) -> Result<Vec<InstanceSnapshot>> {
        let snapshots = self.snapshots.read().await;
        Ok(snapshots.values().cloned().collect())
    }

    async fn remove(&self, application_id: &str) -> Result<()> {
        let mut snapshots = self.snapshots.write().await;
        snapshots.remove(application_id);
        Ok(())
    }
}

/// Convenience for sharing a store behind the trait object the engine
/// expects.
pub fn in_memory_store() -> Arc<dyn InstanceStore> {
    Arc::new(InMemoryInstanceStore::new())
}
