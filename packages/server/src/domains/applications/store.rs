//! In-memory record store implementation.
//!
//! The production record store lives outside this system; this
//! implementation backs local runs and the test suites.

use std::collections::HashMap;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::kernel::traits::BaseApplicationStore;

use super::models::{ApplicationPatch, ApplicationRecord, ApplicationStatus};

#[derive(Default)]
pub struct InMemoryApplicationStore {
    records: RwLock<HashMap<String, ApplicationRecord>>,
}

impl InMemoryApplicationStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BaseApplicationStore for InMemoryApplicationStore {
    async fn get(&self, id: &str) -> Result<Option<ApplicationRecord>> {
        let records = self.records.read().await;
        Ok(records.get(id).cloned())
    }

    async fn insert(&self, record: ApplicationRecord) -> Result<()> {
        let mut records = self.records.write().await;
        records.insert(record.id.clone(), record);
        Ok(())
    }

    async fn update(&self, id: &str, patch: ApplicationPatch) -> Result<ApplicationRecord> {
        let mut records = self.records.write().await;
        let record = records
            .get_mut(id)
            .ok_or_else(|| anyhow!("application {} not found", id))?;

        if let Some(status) = patch.status {
            record.status = status;
        }
        if let Some(notes) = patch.notes {
            record.notes = Some(notes);
        }
        if let Some(cover_letter) = patch.cover_letter {
            record.cover_letter = Some(cover_letter);
        }
        record.updated_at = Utc::now();

        Ok(record.clone())
    }

    async fn find_where(&self, status: ApplicationStatus) -> Result<Vec<ApplicationRecord>> {
        let records = self.records.read().await;
        Ok(records
            .values()
            .filter(|r| r.status == status)
            .cloned()
            .collect())
    }
}
