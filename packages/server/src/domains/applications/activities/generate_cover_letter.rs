//! Generate cover letter activity
//!
//! Calls the text-generation collaborator and persists the result on
//! the application record. This is the only activity whose exhaustion
//! is fatal to a lifecycle instance.

use anyhow::{Context, Result};
use tracing::info;

use crate::domains::applications::models::{ApplicationInput, ApplicationPatch};
use crate::kernel::TrackerDeps;

pub async fn generate_cover_letter(
    deps: &TrackerDeps,
    application_id: &str,
    input: &ApplicationInput,
) -> Result<String> {
    let prompt = build_prompt(input);

    let letter = deps
        .cover_letters
        .generate(&prompt)
        .await
        .context("cover letter generation failed")?;

    deps.store
        .update(application_id, ApplicationPatch::cover_letter(letter.clone()))
        .await
        .context("failed to persist cover letter")?;

    info!(
        application_id,
        letter_length = letter.len(),
        "cover letter generated"
    );
    Ok(letter)
}

fn build_prompt(input: &ApplicationInput) -> String {
    format!(
        "Write a concise, professional cover letter for the following application.\n\n\
         Company: {}\nRole: {}\n\nJob description:\n{}\n\nCandidate resume:\n{}",
        input.company, input.role, input.description, input.resume
    )
}
