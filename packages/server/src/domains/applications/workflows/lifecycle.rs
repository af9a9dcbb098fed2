//! Application lifecycle workflow
//!
//! One instance runs per application and drives the whole deadline
//! sequence:
//! 1. Generate the cover letter (retryable; exhaustion is fatal).
//! 2. Suspend until 24h before the deadline, or a terminal signal.
//! 3. Inside the urgent window, loop urgent reminders on a fixed
//!    interval while the application is still pending.
//! 4. At the deadline, send a single "deadline reached" notice.
//! 5. Wait out the grace period, re-check the record store, and archive
//!    if nothing moved.
//!
//! Status signals always win a race against a timer firing the same
//! tick (`biased` select), and a terminal status cancels only the
//! reminder sub-scope — cooperatively, within one sleep interval.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::domains::applications::activities::{
    archive, check_status, generate_cover_letter, send_notification, update_notes,
};
use crate::domains::applications::models::{
    ApplicationInput, ApplicationStatus, NotificationEvent,
};
use crate::kernel::dedupe::UrgencyTier;
use crate::kernel::engine::{InstanceSnapshot, InstanceStore, RunStatus, WorkflowPhase};
use crate::kernel::retry::run_with_retry;
use crate::kernel::TrackerDeps;

/// Timer windows for the lifecycle workflow. Tests shrink these to
/// milliseconds; production uses the defaults.
#[derive(Debug, Clone)]
pub struct LifecycleConfig {
    /// How long before the deadline the urgent reminder loop starts.
    pub urgent_window: Duration,
    /// Fixed nap between urgent reminders.
    pub reminder_interval: Duration,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            urgent_window: Duration::from_secs(24 * 60 * 60),
            reminder_interval: Duration::from_secs(60),
        }
    }
}

/// External message delivered into a running instance.
#[derive(Debug, Clone)]
pub enum LifecycleSignal {
    /// User-driven status change; terminal statuses stop all timers.
    Status(ApplicationStatus),
    /// Fire-and-forget notes update; no status or timer effect.
    Notes(String),
}

enum WaitOutcome {
    /// The target instant was reached.
    Elapsed,
    /// A non-terminal status was applied; caller should re-evaluate.
    StatusChanged,
    /// A terminal status was applied; all timers stop.
    TerminalStatus,
    /// The instance was cancelled.
    Cancelled,
    /// Engine shutdown; leave the snapshot as-is for resume.
    Suspended,
}

/// State of one running lifecycle instance. Owned by its task; the
/// engine communicates only through signals and the snapshot store.
pub struct LifecycleRun {
    application_id: String,
    run_id: Uuid,
    input: ApplicationInput,
    deps: Arc<TrackerDeps>,
    store: Arc<dyn InstanceStore>,
    signals: mpsc::Receiver<LifecycleSignal>,
    cancel: CancellationToken,
    shutdown: CancellationToken,
    status: ApplicationStatus,
    phase: WorkflowPhase,
    run_status: RunStatus,
    reminder_scope: Option<CancellationToken>,
    suspended: bool,
}

impl LifecycleRun {
    pub fn new(
        snapshot: InstanceSnapshot,
        deps: Arc<TrackerDeps>,
        store: Arc<dyn InstanceStore>,
        signals: mpsc::Receiver<LifecycleSignal>,
        cancel: CancellationToken,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            application_id: snapshot.application_id,
            run_id: snapshot.run_id,
            input: snapshot.input,
            deps,
            store,
            signals,
            cancel,
            shutdown,
            status: snapshot.status,
            phase: snapshot.phase,
            run_status: RunStatus::Running,
            reminder_scope: None,
            suspended: false,
        }
    }

    pub async fn run(mut self) {
        info!(
            application_id = %self.application_id,
            run_id = %self.run_id,
            deadline = %self.input.deadline,
            phase = ?self.phase,
            "lifecycle instance started"
        );

        let result = self.execute().await;

        if self.suspended && self.phase != WorkflowPhase::Finished && result.is_ok() {
            // Snapshot stays Running so the next process resumes here.
            info!(application_id = %self.application_id, "instance suspended for shutdown");
            return;
        }

        self.run_status = match result {
            Err(e) => {
                let chain = format!("{:#}", e);
                error!(application_id = %self.application_id, error = %chain, "lifecycle instance failed");
                send_notification(
                    &self.deps,
                    NotificationEvent::error(
                        &self.application_id,
                        &self.input.company,
                        &self.input.role,
                        format!("Lifecycle failed: {}", chain),
                    ),
                )
                .await;
                RunStatus::Failed { error: chain }
            }
            Ok(()) if self.cancel.is_cancelled() && self.phase != WorkflowPhase::Finished => {
                RunStatus::Cancelled
            }
            Ok(()) => RunStatus::Completed,
        };
        self.checkpoint().await;

        info!(
            application_id = %self.application_id,
            run_status = ?self.run_status,
            "lifecycle instance finished"
        );
    }

    async fn execute(&mut self) -> anyhow::Result<()> {
        if self.status.is_terminal() {
            self.finish().await;
            return Ok(());
        }

        if self.phase == WorkflowPhase::CoverLetter {
            self.cover_letter_step().await?;
        }

        if self.phase == WorkflowPhase::Monitoring {
            if !self.monitor_until_deadline().await {
                if self.status.is_terminal() {
                    self.finish().await;
                }
                return Ok(());
            }

            self.drain_signals().await;
            if self.status.is_terminal() {
                self.finish().await;
                return Ok(());
            }
            if self.status == ApplicationStatus::Pending {
                send_notification(
                    &self.deps,
                    NotificationEvent::deadline(
                        &self.application_id,
                        &self.input.company,
                        &self.input.role,
                    ),
                )
                .await;
            }
            self.phase = WorkflowPhase::Grace;
            self.checkpoint().await;
        }

        if self.phase == WorkflowPhase::Grace {
            self.grace_period().await;
        }

        Ok(())
    }

    /// Step 1: generate and persist the cover letter. The only step
    /// whose retry exhaustion fails the whole instance.
    async fn cover_letter_step(&mut self) -> anyhow::Result<()> {
        let deps = self.deps.clone();
        let id = self.application_id.clone();
        let input = self.input.clone();
        run_with_retry("generate_cover_letter", &self.deps.retry, move || {
            let deps = deps.clone();
            let id = id.clone();
            let input = input.clone();
            async move { generate_cover_letter(&deps, &id, &input).await.map(|_| ()) }
        })
        .await?;

        self.phase = WorkflowPhase::Monitoring;
        self.checkpoint().await;

        send_notification(
            &self.deps,
            NotificationEvent::cover_letter_generated(
                &self.application_id,
                &self.input.company,
                &self.input.role,
            ),
        )
        .await;
        Ok(())
    }

    /// Steps 2-3: wait for the urgent window, then loop reminders until
    /// the deadline. Returns true when the deadline elapsed, false when
    /// the instance should stop (terminal status, cancel, shutdown).
    async fn monitor_until_deadline(&mut self) -> bool {
        let mut monitor_announced = false;
        loop {
            self.drain_signals().await;
            if self.status.is_terminal() || self.cancel.is_cancelled() {
                return false;
            }
            if self.shutdown.is_cancelled() {
                self.suspended = true;
                return false;
            }

            let now = Utc::now();
            if now >= self.input.deadline {
                return true;
            }

            if self.status == ApplicationStatus::Pending {
                let urgent_at = self.input.deadline - window(self.deps.lifecycle.urgent_window);
                if now < urgent_at {
                    match self.wait_until(urgent_at).await {
                        WaitOutcome::Elapsed | WaitOutcome::StatusChanged => continue,
                        WaitOutcome::TerminalStatus
                        | WaitOutcome::Cancelled
                        | WaitOutcome::Suspended => return false,
                    }
                }

                if !monitor_announced {
                    monitor_announced = true;
                    send_notification(
                        &self.deps,
                        NotificationEvent::deadline_monitor(
                            &self.application_id,
                            &self.input.company,
                            &self.input.role,
                            self.input.deadline - Utc::now(),
                        ),
                    )
                    .await;
                }
                self.reminder_loop().await;
                continue;
            }

            // Non-pending, non-terminal (interview): keep waiting for
            // the deadline or a signal reverting to pending.
            match self.wait_until(self.input.deadline).await {
                WaitOutcome::Elapsed => return true,
                WaitOutcome::StatusChanged => continue,
                WaitOutcome::TerminalStatus | WaitOutcome::Cancelled | WaitOutcome::Suspended => {
                    return false
                }
            }
        }
    }

    /// The urgent reminder sub-loop. Runs under its own cancellation
    /// scope: a terminal status signal cancels the scope, and the loop
    /// polls it at the head and after every sleep.
    async fn reminder_loop(&mut self) {
        let scope = self.cancel.child_token();
        self.reminder_scope = Some(scope.clone());
        debug!(application_id = %self.application_id, "entering urgent reminder loop");

        loop {
            if scope.is_cancelled() || self.shutdown.is_cancelled() {
                break;
            }
            self.drain_signals().await;
            if self.status != ApplicationStatus::Pending {
                break;
            }
            let now = Utc::now();
            if now >= self.input.deadline {
                break;
            }

            let remaining = self.input.deadline - now;
            send_notification(
                &self.deps,
                NotificationEvent::urgent_reminder(
                    &self.application_id,
                    &self.input.company,
                    &self.input.role,
                    remaining,
                ),
            )
            .await;
            self.deps
                .ledger
                .record(&self.application_id, UrgencyTier::Urgent)
                .await;

            // Fixed-interval nap, capped at the deadline itself.
            let wake = (now + window(self.deps.lifecycle.reminder_interval)).min(self.input.deadline);
            match self.wait_until(wake).await {
                WaitOutcome::Elapsed | WaitOutcome::StatusChanged => continue,
                WaitOutcome::TerminalStatus | WaitOutcome::Cancelled | WaitOutcome::Suspended => {
                    break
                }
            }
        }

        self.reminder_scope = None;
        debug!(application_id = %self.application_id, "left urgent reminder loop");
    }

    /// Steps 4-5: wait out the grace period, then archive if the
    /// application is still pending on both sides of the seam.
    async fn grace_period(&mut self) {
        let grace_end = self.input.deadline + window(self.input.grace_period);
        loop {
            match self.wait_until(grace_end).await {
                WaitOutcome::Elapsed => break,
                WaitOutcome::StatusChanged => continue,
                WaitOutcome::TerminalStatus => {
                    self.finish().await;
                    return;
                }
                WaitOutcome::Cancelled | WaitOutcome::Suspended => return,
            }
        }

        self.drain_signals().await;
        if self.status.is_terminal() {
            self.finish().await;
            return;
        }

        let stored = match check_status(&self.deps, &self.application_id).await {
            Ok(status) => status,
            Err(e) => {
                warn!(
                    application_id = %self.application_id,
                    error = %e,
                    "status check failed, falling back to instance status"
                );
                self.status
            }
        };

        if stored != ApplicationStatus::Pending || self.status != ApplicationStatus::Pending {
            debug!(
                application_id = %self.application_id,
                stored = %stored,
                "status moved on during grace period, skipping archival"
            );
            self.finish().await;
            return;
        }

        let archived = run_with_retry("archive", &self.deps.retry, || {
            let deps = self.deps.clone();
            let id = self.application_id.clone();
            async move { archive(&deps, &id).await }
        })
        .await;

        match archived {
            Ok(()) => {
                self.status = ApplicationStatus::Archived;
                self.finish().await;
                send_notification(
                    &self.deps,
                    NotificationEvent::archive(
                        &self.application_id,
                        &self.input.company,
                        &self.input.role,
                    ),
                )
                .await;
            }
            Err(e) => {
                let chain = format!("{:#}", e);
                error!(
                    application_id = %self.application_id,
                    error = %chain,
                    "archive failed after retries"
                );
                self.finish().await;
            }
        }
    }

    /// Sleep until `at`, waking early for signals, cancellation or
    /// shutdown. Signals take priority over a timer firing the same
    /// tick.
    async fn wait_until(&mut self, at: DateTime<Utc>) -> WaitOutcome {
        enum Wake {
            Shutdown,
            Cancelled,
            Signal(Option<LifecycleSignal>),
            Timer,
        }

        let shutdown = self.shutdown.clone();
        let cancel = self.cancel.clone();
        loop {
            let now = Utc::now();
            if now >= at {
                return WaitOutcome::Elapsed;
            }
            let nap = (at - now).to_std().unwrap_or_default();

            let wake = tokio::select! {
                biased;
                _ = shutdown.cancelled() => Wake::Shutdown,
                _ = cancel.cancelled() => Wake::Cancelled,
                sig = self.signals.recv() => Wake::Signal(sig),
                _ = tokio::time::sleep(nap) => Wake::Timer,
            };

            match wake {
                Wake::Shutdown => {
                    self.suspended = true;
                    return WaitOutcome::Suspended;
                }
                Wake::Cancelled | Wake::Signal(None) => return WaitOutcome::Cancelled,
                Wake::Signal(Some(LifecycleSignal::Status(next))) => {
                    let terminal = self.apply_status(next).await;
                    return if terminal {
                        WaitOutcome::TerminalStatus
                    } else {
                        WaitOutcome::StatusChanged
                    };
                }
                Wake::Signal(Some(LifecycleSignal::Notes(notes))) => {
                    // Keep waiting; notes never affect timers.
                    self.apply_notes(&notes).await;
                }
                Wake::Timer => return WaitOutcome::Elapsed,
            }
        }
    }

    /// Apply any queued signals without blocking. Called at every
    /// decision point so cancellation takes effect within one interval.
    async fn drain_signals(&mut self) {
        while let Ok(sig) = self.signals.try_recv() {
            match sig {
                LifecycleSignal::Status(next) => {
                    self.apply_status(next).await;
                }
                LifecycleSignal::Notes(notes) => self.apply_notes(&notes).await,
            }
        }
    }

    /// Returns true if the new status is terminal.
    async fn apply_status(&mut self, next: ApplicationStatus) -> bool {
        if next == self.status {
            return next.is_terminal();
        }
        info!(
            application_id = %self.application_id,
            from = %self.status,
            to = %next,
            "status signal applied"
        );
        self.status = next;
        self.checkpoint().await;

        if next.is_terminal() {
            if let Some(scope) = &self.reminder_scope {
                scope.cancel();
            }
        }

        send_notification(
            &self.deps,
            NotificationEvent::status_update(
                &self.application_id,
                &self.input.company,
                &self.input.role,
                next,
            ),
        )
        .await;
        next.is_terminal()
    }

    async fn apply_notes(&self, notes: &str) {
        if let Err(e) = update_notes(&self.deps, &self.application_id, notes).await {
            warn!(
                application_id = %self.application_id,
                error = %e,
                "notes update failed"
            );
        }
    }

    async fn finish(&mut self) {
        self.phase = WorkflowPhase::Finished;
        self.checkpoint().await;
    }

    async fn checkpoint(&self) {
        let snapshot = InstanceSnapshot {
            application_id: self.application_id.clone(),
            run_id: self.run_id,
            input: self.input.clone(),
            status: self.status,
            phase: self.phase,
            run_status: self.run_status.clone(),
            updated_at: Utc::now(),
        };
        if let Err(e) = self.store.put(snapshot).await {
            error!(
                application_id = %self.application_id,
                error = %e,
                "failed to checkpoint instance snapshot"
            );
        }
    }
}

fn window(d: Duration) -> chrono::Duration {
    chrono::Duration::from_std(d).unwrap_or_else(|_| chrono::Duration::zero())
}
