//! Lifecycle engine: spawns, addresses and resumes workflow instances.
//!
//! One tokio task per application, addressed by application id. The
//! engine owns the handle map; the tasks own their state and talk back
//! only through the snapshot store. Signals are delivered over a
//! bounded mpsc channel per instance.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Context;
use thiserror::Error;
use tokio::sync::{mpsc, RwLock};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use uuid::Uuid;

use crate::domains::applications::activities::send_notification;
use crate::domains::applications::models::{
    ApplicationInput, ApplicationStatus, NotificationEvent,
};
use crate::domains::applications::workflows::{LifecycleRun, LifecycleSignal};
use crate::kernel::engine::store::{InstanceSnapshot, InstanceStore, RunStatus, WorkflowPhase};
use crate::kernel::TrackerDeps;

const SIGNAL_BUFFER: usize = 16;

#[derive(Debug, Error)]
pub enum ControlError {
    /// A live instance already exists for this application id.
    #[error("lifecycle instance already running for application {0}")]
    AlreadyExists(String),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

/// Result of a signal delivery attempt. Signalling an id with no live
/// instance is not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalOutcome {
    Delivered,
    NotFound,
}

#[derive(Debug, Clone)]
pub struct StartedInstance {
    pub application_id: String,
    pub run_id: Uuid,
}

/// Point-in-time view of one instance, combining the live handle map
/// with the persisted snapshot.
#[derive(Debug, Clone)]
pub struct InstanceInfo {
    pub instance_id: String,
    pub run_id: Uuid,
    pub application_id: String,
    pub status: ApplicationStatus,
    pub phase: WorkflowPhase,
    pub run_status: RunStatus,
}

struct InstanceHandle {
    run_id: Uuid,
    signals: mpsc::Sender<LifecycleSignal>,
    cancel: CancellationToken,
}

pub struct LifecycleEngine {
    deps: Arc<TrackerDeps>,
    store: Arc<dyn InstanceStore>,
    instances: Arc<RwLock<HashMap<String, InstanceHandle>>>,
    shutdown: CancellationToken,
}

impl LifecycleEngine {
    pub fn new(deps: Arc<TrackerDeps>, store: Arc<dyn InstanceStore>) -> Self {
        Self {
            deps,
            store,
            instances: Arc::new(RwLock::new(HashMap::new())),
            shutdown: CancellationToken::new(),
        }
    }

    /// Start a new lifecycle instance for an application. Fails if an
    /// instance is already live for the same id; a finished instance
    /// does not block a restart.
    pub async fn start(
        &self,
        application_id: &str,
        input: ApplicationInput,
    ) -> Result<StartedInstance, ControlError> {
        let run_id = Uuid::new_v4();
        let snapshot = InstanceSnapshot::new(application_id, run_id, input);

        // Reserve the slot before checkpointing so two concurrent
        // starts cannot both win.
        let (tx, rx) = mpsc::channel(SIGNAL_BUFFER);
        let cancel = CancellationToken::new();
        {
            let mut instances = self.instances.write().await;
            if instances.contains_key(application_id) {
                return Err(ControlError::AlreadyExists(application_id.to_string()));
            }
            instances.insert(
                application_id.to_string(),
                InstanceHandle {
                    run_id,
                    signals: tx,
                    cancel: cancel.clone(),
                },
            );
        }

        if let Err(e) = self
            .store
            .put(snapshot.clone())
            .await
            .context("failed to persist initial instance snapshot")
        {
            let mut instances = self.instances.write().await;
            instances.remove(application_id);
            return Err(ControlError::Internal(e));
        }

        self.spawn_instance(snapshot, rx, cancel);
        info!(application_id, run_id = %run_id, "lifecycle instance scheduled");

        Ok(StartedInstance {
            application_id: application_id.to_string(),
            run_id,
        })
    }

    /// Deliver a status change to a running instance.
    pub async fn signal_status(
        &self,
        application_id: &str,
        status: ApplicationStatus,
    ) -> Result<SignalOutcome, ControlError> {
        self.signal(application_id, LifecycleSignal::Status(status))
            .await
    }

    /// Deliver a notes update to a running instance.
    pub async fn signal_notes(
        &self,
        application_id: &str,
        notes: String,
    ) -> Result<SignalOutcome, ControlError> {
        self.signal(application_id, LifecycleSignal::Notes(notes))
            .await
    }

    async fn signal(
        &self,
        application_id: &str,
        signal: LifecycleSignal,
    ) -> Result<SignalOutcome, ControlError> {
        // Clone the sender out so delivery never holds the map lock.
        let sender = {
            let instances = self.instances.read().await;
            match instances.get(application_id) {
                Some(handle) => handle.signals.clone(),
                None => return Ok(SignalOutcome::NotFound),
            }
        };

        match sender.send(signal).await {
            Ok(()) => Ok(SignalOutcome::Delivered),
            // Receiver dropped: the task finished between lookup and send.
            Err(_) => Ok(SignalOutcome::NotFound),
        }
    }

    /// Cancel an instance (application deleted). Idempotent; unknown
    /// ids report NotFound without error.
    pub async fn cancel(&self, application_id: &str) -> Result<SignalOutcome, ControlError> {
        let handle_cancel = {
            let instances = self.instances.read().await;
            instances.get(application_id).map(|h| h.cancel.clone())
        };

        let Some(token) = handle_cancel else {
            return Ok(SignalOutcome::NotFound);
        };

        // Announce the deletion before the task observes cancellation,
        // so subscribers see the event even if the task exits fast.
        if let Ok(Some(snapshot)) = self.store.get(application_id).await {
            send_notification(
                &self.deps,
                NotificationEvent::application_deleted(
                    application_id,
                    &snapshot.input.company,
                    &snapshot.input.role,
                ),
            )
            .await;
        }

        token.cancel();
        info!(application_id, "lifecycle instance cancelled");
        Ok(SignalOutcome::Delivered)
    }

    /// Current stored status for an application, if an instance has
    /// ever run for it.
    pub async fn query_status(
        &self,
        application_id: &str,
    ) -> Result<Option<ApplicationStatus>, ControlError> {
        let snapshot = self
            .store
            .get(application_id)
            .await
            .context("failed to read instance snapshot")?;
        Ok(snapshot.map(|s| s.status))
    }

    /// Full instance view from the snapshot store.
    pub async fn query_info(
        &self,
        application_id: &str,
    ) -> Result<Option<InstanceInfo>, ControlError> {
        let snapshot = self
            .store
            .get(application_id)
            .await
            .context("failed to read instance snapshot")?;
        Ok(snapshot.map(|s| InstanceInfo {
            instance_id: s.instance_id(),
            run_id: s.run_id,
            application_id: s.application_id,
            status: s.status,
            phase: s.phase,
            run_status: s.run_status,
        }))
    }

    /// Re-spawn every snapshot still marked Running that has no live
    /// task. Timer positions are recomputed from the wall clock; the
    /// phase gate skips side effects that already happened.
    pub async fn resume_all(&self) -> Result<usize, ControlError> {
        let snapshots = self
            .store
            .list()
            .await
            .context("failed to list instance snapshots")?;

        let mut resumed = 0;
        for snapshot in snapshots {
            if snapshot.run_status != RunStatus::Running {
                continue;
            }

            let (tx, rx) = mpsc::channel(SIGNAL_BUFFER);
            let cancel = CancellationToken::new();
            {
                let mut instances = self.instances.write().await;
                if instances.contains_key(&snapshot.application_id) {
                    continue;
                }
                instances.insert(
                    snapshot.application_id.clone(),
                    InstanceHandle {
                        run_id: snapshot.run_id,
                        signals: tx,
                        cancel: cancel.clone(),
                    },
                );
            }

            info!(
                application_id = %snapshot.application_id,
                run_id = %snapshot.run_id,
                phase = ?snapshot.phase,
                "resuming lifecycle instance"
            );
            self.spawn_instance(snapshot, rx, cancel);
            resumed += 1;
        }

        if resumed > 0 {
            info!(count = resumed, "resumed lifecycle instances");
        }
        Ok(resumed)
    }

    /// How many instances currently have a live task.
    pub async fn running_count(&self) -> usize {
        let instances = self.instances.read().await;
        instances.len()
    }

    /// Suspend all instances without marking them cancelled. Their
    /// snapshots stay Running so `resume_all` picks them back up.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    fn spawn_instance(
        &self,
        snapshot: InstanceSnapshot,
        signals: mpsc::Receiver<LifecycleSignal>,
        cancel: CancellationToken,
    ) {
        let application_id = snapshot.application_id.clone();
        let run_id = snapshot.run_id;
        let run = LifecycleRun::new(
            snapshot,
            self.deps.clone(),
            self.store.clone(),
            signals,
            cancel,
            self.shutdown.clone(),
        );

        let instances = self.instances.clone();
        tokio::spawn(async move {
            run.run().await;

            // Only remove our own handle: a newer run for the same id
            // may have replaced it.
            let mut instances = instances.write().await;
            if let Some(handle) = instances.get(&application_id) {
                if handle.run_id == run_id {
                    instances.remove(&application_id);
                } else {
                    warn!(application_id = %application_id, "handle replaced by newer run, leaving it");
                }
            }
        });
    }
}
