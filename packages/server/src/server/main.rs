// Main entry point for the application tracker server

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::routing::get;
use axum::Router;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use server_core::domains::applications::store::InMemoryApplicationStore;
use server_core::domains::applications::workflows::LifecycleConfig;
use server_core::kernel::ai::OpenAICoverLetterService;
use server_core::kernel::dedupe::DedupeLedger;
use server_core::kernel::engine::{in_memory_store, LifecycleEngine};
use server_core::kernel::notify_hub::NotificationHub;
use server_core::kernel::retry::RetryPolicy;
use server_core::kernel::scheduled_tasks::start_scheduler;
use server_core::kernel::sse::{self, SseState};
use server_core::kernel::TrackerDeps;
use server_core::Config;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,server_core=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Application Tracker");

    let config = Config::from_env().context("Failed to load configuration")?;
    tracing::info!("Configuration loaded");

    let mut lifecycle = LifecycleConfig::default();
    if let Some(secs) = config.reminder_interval_secs {
        lifecycle.reminder_interval = Duration::from_secs(secs);
    }

    let hub = NotificationHub::new();
    let deps = Arc::new(TrackerDeps::new(
        Arc::new(InMemoryApplicationStore::new()),
        Arc::new(OpenAICoverLetterService::new(&config.openai_api_key)),
        hub.clone(),
        DedupeLedger::new(),
        RetryPolicy::default(),
        lifecycle,
    ));

    // Lifecycle engine; resume anything still marked running
    let snapshots = in_memory_store();
    let engine = Arc::new(LifecycleEngine::new(deps.clone(), snapshots));
    let resumed = engine.resume_all().await.map_err(anyhow::Error::from)?;
    if resumed > 0 {
        tracing::info!(resumed, "Resumed lifecycle instances");
    }

    // Scheduled sweeps
    let mut scheduler = start_scheduler(deps.clone())
        .await
        .context("Failed to start scheduled sweeps")?;

    // Idle connection sweeper for the notification hub
    let sweeper_token = CancellationToken::new();
    let sweeper = hub.spawn_idle_sweeper(sweeper_token.clone());

    // HTTP surface: health + SSE streams
    let app = Router::new()
        .route("/health", get(|| async { "ok" }))
        .merge(sse::router(SseState { hub: hub.clone() }))
        .layer(TraceLayer::new_for_http());

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("Starting server on {}", addr);
    tracing::info!("Event stream: http://localhost:{}/api/streams/events", config.port);
    tracing::info!("Health check: http://localhost:{}/health", config.port);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutdown signal received");
        })
        .await
        .context("Server error")?;

    // Orderly shutdown: suspend instances first so their snapshots stay
    // resumable, then stop the background machinery.
    engine.shutdown();
    scheduler
        .shutdown()
        .await
        .context("Failed to stop scheduler")?;
    sweeper_token.cancel();
    let _ = sweeper.await;

    tracing::info!("Shutdown complete");
    Ok(())
}
