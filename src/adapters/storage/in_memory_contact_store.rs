//! In-Memory Contact Store Adapter
//!
//! Keeps contact records in memory with append semantics.
//! Useful for testing and development.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::contact::{latest_thread_for, ContactRecord, EmailAddress};
use crate::domain::foundation::ThreadId;
use crate::ports::{ContactStore, ContactStoreError, RecordOutcome};

/// In-memory storage for contact records
#[derive(Debug, Clone, Default)]
pub struct InMemoryContactStore {
    records: Arc<RwLock<Vec<ContactRecord>>>,
}

impl InMemoryContactStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with records
    pub fn with_records(records: Vec<ContactRecord>) -> Self {
        Self {
            records: Arc::new(RwLock::new(records)),
        }
    }

    /// Get the number of stored records
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    /// Check whether the store is empty
    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl ContactStore for InMemoryContactStore {
    async fn find_thread(
        &self,
        email: &EmailAddress,
    ) -> Result<Option<ThreadId>, ContactStoreError> {
        let records = self.records.read().await;
        Ok(latest_thread_for(&records, email).cloned())
    }

    async fn record(
        &self,
        email: &EmailAddress,
        thread_id: &ThreadId,
    ) -> Result<RecordOutcome, ContactStoreError> {
        let mut records = self.records.write().await;
        if let Some(existing) = latest_thread_for(&records, email) {
            return Ok(RecordOutcome::Existing(existing.clone()));
        }
        records.push(ContactRecord::new(email.clone(), thread_id.clone()));
        Ok(RecordOutcome::Recorded)
    }

    async fn records(&self) -> Result<Vec<ContactRecord>, ContactStoreError> {
        Ok(self.records.read().await.clone())
    }
}
