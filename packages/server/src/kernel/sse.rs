//! Lightweight SSE server for streaming notifications to clients.
//!
//! Subscribes to the notification hub and forwards events as SSE.
//! New connections first receive the hub's replay of recent events,
//! then the live stream.

use std::convert::Infallible;

use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::StreamExt;
use tracing::debug;

use super::notify_hub::NotificationHub;

/// Shared state for the SSE server.
#[derive(Clone)]
pub struct SseState {
    pub hub: NotificationHub,
}

/// Build the axum router for SSE endpoints.
pub fn router(state: SseState) -> Router {
    Router::new()
        .route("/api/streams/events", get(stream_handler))
        .route("/api/streams/stats", get(stats_handler))
        .with_state(state)
}

/// SSE handler — subscribes to the hub and streams notifications.
async fn stream_handler(State(state): State<SseState>) -> impl IntoResponse {
    let (connection_id, rx) = state.hub.subscribe().await;
    debug!(connection_id = %connection_id, "sse subscriber connected");

    let stream = ReceiverStream::new(rx).map(|event| {
        let data = serde_json::to_string(&event).unwrap_or_else(|_| "{}".to_string());
        Ok::<_, Infallible>(Event::default().event(event.event_type.as_str()).data(data))
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}

/// Connection stats, for debugging dangling subscribers.
async fn stats_handler(State(state): State<SseState>) -> impl IntoResponse {
    Json(state.hub.stats().await)
}
