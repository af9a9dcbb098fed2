//! Infrastructure layer: dependency container, trait seams, the
//! lifecycle engine, the notification hub and scheduled sweeps.
//! No business rules live here; those belong to the domains.

pub mod ai;
pub mod dedupe;
pub mod deps;
pub mod engine;
pub mod notify_hub;
pub mod retry;
pub mod scheduled_tasks;
pub mod sse;
pub mod traits;

pub use deps::TrackerDeps;
