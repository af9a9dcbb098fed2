// Trait definitions for dependency injection
//
// These are INFRASTRUCTURE traits only - no business logic.
// Business logic (like "when to remind") lives in domain functions
// that use these traits.
//
// Naming convention: Base* for trait names

use anyhow::Result;
use async_trait::async_trait;

use crate::domains::applications::models::{
    ApplicationPatch, ApplicationRecord, ApplicationStatus,
};

// =============================================================================
// Record store (external collaborator — the tracker never owns the schema)
// =============================================================================

#[async_trait]
pub trait BaseApplicationStore: Send + Sync {
    /// Fetch a single application by id.
    async fn get(&self, id: &str) -> Result<Option<ApplicationRecord>>;

    /// Insert a new application row. Used by the CRUD layer and tests.
    async fn insert(&self, record: ApplicationRecord) -> Result<()>;

    /// Apply a partial update and return the updated row.
    /// Fails if the application does not exist.
    async fn update(&self, id: &str, patch: ApplicationPatch) -> Result<ApplicationRecord>;

    /// List all applications currently in the given status.
    async fn find_where(&self, status: ApplicationStatus) -> Result<Vec<ApplicationRecord>>;
}

// =============================================================================
// Cover letter generation (external text-generation collaborator)
// =============================================================================

#[async_trait]
pub trait BaseCoverLetterService: Send + Sync {
    /// Generate a cover letter from a fully rendered prompt.
    async fn generate(&self, prompt: &str) -> Result<String>;
}
