//! Record store activities: status read, archival, notes.

use anyhow::{anyhow, Result};
use tracing::info;

use crate::domains::applications::models::{ApplicationPatch, ApplicationStatus};
use crate::kernel::TrackerDeps;

/// Pure read of the stored status.
pub async fn check_status(deps: &TrackerDeps, application_id: &str) -> Result<ApplicationStatus> {
    let record = deps
        .store
        .get(application_id)
        .await?
        .ok_or_else(|| anyhow!("application {} not found", application_id))?;
    Ok(record.status)
}

/// Set the stored status to `archived`. Safe to call twice: overwriting
/// `archived` with `archived` is a no-op.
pub async fn archive(deps: &TrackerDeps, application_id: &str) -> Result<()> {
    deps.store
        .update(
            application_id,
            ApplicationPatch::status(ApplicationStatus::Archived),
        )
        .await?;
    info!(application_id, "application archived");
    Ok(())
}

/// Overwrite the notes field. No status effect.
pub async fn update_notes(deps: &TrackerDeps, application_id: &str, notes: &str) -> Result<()> {
    deps.store
        .update(application_id, ApplicationPatch::notes(notes))
        .await?;
    info!(application_id, "notes updated");
    Ok(())
}
