//! In-process notification broadcast hub.
//!
//! Fans lifecycle and sweep events out to connected subscribers over
//! per-connection mpsc channels, keeps a bounded history buffer, and
//! replays the most recent events to new subscribers.
//!
//! Producers (activities, sweeps):
//!   hub.broadcast(event).await;
//!
//! Consumers (SSE endpoints):
//!   let (id, rx) = hub.subscribe().await;
//!
//! Delivery is at-least-once: a subscriber that falls behind or
//! disconnects is marked inactive and removed by the idle sweeper; it
//! never blocks delivery to the others.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{mpsc, RwLock};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::domains::applications::models::NotificationEvent;

/// Buffered events retained for replay.
pub const DEFAULT_HISTORY_CAPACITY: usize = 100;
/// Events replayed to a new subscriber.
pub const DEFAULT_REPLAY_LIMIT: usize = 10;
/// Per-connection delivery buffer.
const DELIVERY_BUFFER: usize = 64;

#[derive(Debug, Clone)]
pub struct HubConfig {
    pub history_capacity: usize,
    pub replay_limit: usize,
    /// Connections silent for longer than this are purged.
    pub idle_timeout: Duration,
    /// How often the idle sweeper runs.
    pub sweep_interval: Duration,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            replay_limit: DEFAULT_REPLAY_LIMIT,
            idle_timeout: Duration::from_secs(5 * 60),
            sweep_interval: Duration::from_secs(30),
        }
    }
}

struct Connection {
    tx: mpsc::Sender<NotificationEvent>,
    connected_at: DateTime<Utc>,
    last_active_at: DateTime<Utc>,
    is_active: bool,
}

struct HubState {
    connections: HashMap<Uuid, Connection>,
    history: VecDeque<NotificationEvent>,
}

/// Read-only snapshot of one connection, for introspection.
#[derive(Debug, Clone, Serialize)]
pub struct ConnectionSummary {
    pub id: Uuid,
    pub connected_at: DateTime<Utc>,
    pub last_active_at: DateTime<Utc>,
    pub is_active: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct HubStats {
    pub total: usize,
    pub active: usize,
    pub connections: Vec<ConnectionSummary>,
}

/// Thread-safe, cloneable broadcast hub.
#[derive(Clone)]
pub struct NotificationHub {
    state: Arc<RwLock<HubState>>,
    config: HubConfig,
}

impl NotificationHub {
    pub fn new() -> Self {
        Self::with_config(HubConfig::default())
    }

    pub fn with_config(config: HubConfig) -> Self {
        Self {
            state: Arc::new(RwLock::new(HubState {
                connections: HashMap::new(),
                history: VecDeque::new(),
            })),
            config,
        }
    }

    /// Register a new subscriber and return its delivery channel.
    ///
    /// The most recent buffered events (up to the replay limit) are
    /// queued on the channel before any live event.
    pub async fn subscribe(&self) -> (Uuid, mpsc::Receiver<NotificationEvent>) {
        let (tx, rx) = mpsc::channel(DELIVERY_BUFFER);
        let mut state = self.state.write().await;

        let replay_from = state.history.len().saturating_sub(self.config.replay_limit);
        for event in state.history.iter().skip(replay_from) {
            // Fresh channel with capacity > replay limit, cannot fail
            let _ = tx.try_send(event.clone());
        }

        let id = Uuid::new_v4();
        let now = Utc::now();
        state.connections.insert(
            id,
            Connection {
                tx,
                connected_at: now,
                last_active_at: now,
                is_active: true,
            },
        );

        info!(connection_id = %id, total = state.connections.len(), "subscriber connected");
        (id, rx)
    }

    /// Append an event to history and push it to every active connection.
    ///
    /// A failure delivering to one connection marks only that connection
    /// inactive; this never raises to the caller.
    pub async fn broadcast(&self, event: NotificationEvent) {
        // Stable snapshot of active senders so subscribe/unsubscribe
        // cannot corrupt an in-flight broadcast.
        let targets: Vec<(Uuid, mpsc::Sender<NotificationEvent>)> = {
            let mut state = self.state.write().await;
            state.history.push_back(event.clone());
            while state.history.len() > self.config.history_capacity {
                state.history.pop_front();
            }
            state
                .connections
                .iter()
                .filter(|(_, c)| c.is_active)
                .map(|(id, c)| (*id, c.tx.clone()))
                .collect()
        };

        let mut delivered = Vec::new();
        let mut failed = Vec::new();
        for (id, tx) in targets {
            match tx.try_send(event.clone()) {
                Ok(()) => delivered.push(id),
                Err(e) => {
                    warn!(connection_id = %id, error = %e, "delivery failed, marking connection inactive");
                    failed.push(id);
                }
            }
        }

        if !delivered.is_empty() || !failed.is_empty() {
            let now = Utc::now();
            let mut state = self.state.write().await;
            for id in delivered {
                if let Some(conn) = state.connections.get_mut(&id) {
                    conn.last_active_at = now;
                }
            }
            for id in failed {
                if let Some(conn) = state.connections.get_mut(&id) {
                    conn.is_active = false;
                }
            }
        }
    }

    /// Mark a connection inactive and remove it.
    pub async fn unsubscribe(&self, id: Uuid) {
        let mut state = self.state.write().await;
        if state.connections.remove(&id).is_some() {
            info!(connection_id = %id, total = state.connections.len(), "subscriber disconnected");
        }
    }

    /// Remove connections that are inactive or idle past the timeout.
    /// Returns the number removed.
    pub async fn purge_idle(&self) -> usize {
        let now = Utc::now();
        let timeout = self.config.idle_timeout;
        let mut state = self.state.write().await;
        let before = state.connections.len();
        state.connections.retain(|id, conn| {
            let idle = (now - conn.last_active_at)
                .to_std()
                .map(|d| d > timeout)
                .unwrap_or(false);
            let keep = conn.is_active && !idle;
            if !keep {
                debug!(connection_id = %id, idle, "purging connection");
            }
            keep
        });
        let removed = before - state.connections.len();
        if removed > 0 {
            info!(removed, remaining = state.connections.len(), "idle sweep removed connections");
        }
        removed
    }

    /// Spawn the background idle sweeper. Cancel the token to stop it.
    pub fn spawn_idle_sweeper(&self, shutdown: CancellationToken) -> JoinHandle<()> {
        let hub = self.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(hub.config.sweep_interval);
            interval.tick().await; // skip the immediate first tick
            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    _ = interval.tick() => {
                        hub.purge_idle().await;
                    }
                }
            }
        })
    }

    /// Read-only introspection of connection state.
    pub async fn stats(&self) -> HubStats {
        let state = self.state.read().await;
        let connections: Vec<ConnectionSummary> = state
            .connections
            .iter()
            .map(|(id, c)| ConnectionSummary {
                id: *id,
                connected_at: c.connected_at,
                last_active_at: c.last_active_at,
                is_active: c.is_active,
            })
            .collect();
        HubStats {
            total: connections.len(),
            active: connections.iter().filter(|c| c.is_active).count(),
            connections,
        }
    }

    #[cfg(test)]
    async fn history_messages(&self) -> Vec<String> {
        let state = self.state.read().await;
        state.history.iter().map(|e| e.message.clone()).collect()
    }
}

impl Default for NotificationHub {
    fn default() -> Self {
        Self::new()
    }
}
