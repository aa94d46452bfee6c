//! Contact Store Port - Interface for the email-to-thread ledger.

use async_trait::async_trait;

use crate::domain::contact::{ContactRecord, EmailAddress};
use crate::domain::foundation::ThreadId;

/// Errors that can occur during contact store operations
#[derive(Debug, thiserror::Error)]
pub enum ContactStoreError {
    #[error("IO error: {0}")]
    IoError(String),
}

/// What `record` did with the association it was given.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordOutcome {
    /// The email was new and the association was stored.
    Recorded,
    /// The email already had a thread; storage is unchanged and the caller
    /// should switch to this thread.
    Existing(ThreadId),
}

/// Port for persisting which thread each email address belongs to
#[async_trait]
pub trait ContactStore: Send + Sync {
    /// Find the thread for an email
    ///
    /// # Returns
    /// The thread of the last record for `email`, or `None` if there is none.
    /// A store that was never written to is empty, not an error.
    async fn find_thread(
        &self,
        email: &EmailAddress,
    ) -> Result<Option<ThreadId>, ContactStoreError>;

    /// Associate an email with a thread unless it already has one
    ///
    /// Existing associations are never overwritten.
    ///
    /// # Errors
    /// Returns `ContactStoreError` if reading or writing the ledger fails
    async fn record(
        &self,
        email: &EmailAddress,
        thread_id: &ThreadId,
    ) -> Result<RecordOutcome, ContactStoreError>;

    /// All records in ledger order
    async fn records(&self) -> Result<Vec<ContactRecord>, ContactStoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contact_store_error_io() {
        let err = ContactStoreError::IoError("permission denied".to_string());
        assert_eq!(err.to_string(), "IO error: permission denied");
    }

    #[test]
    fn test_record_outcome_existing_carries_thread() {
        let outcome = RecordOutcome::Existing(ThreadId::new("thread_1").unwrap());
        assert_ne!(outcome, RecordOutcome::Recorded);
    }
}
