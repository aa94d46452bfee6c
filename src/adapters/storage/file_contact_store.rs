//! File-based Contact Store Adapter
//!
//! Stores the email-to-thread ledger as a plain-text file, one
//! `email: thread_id` record per line.
//!
//! Writes go to a temporary file in the ledger's directory which is then
//! renamed over the ledger, so readers never observe a partial write. All
//! writers sharing one `FileContactStore` (clones included) are serialised
//! through a single async mutex.

use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::config::LedgerMode;
use crate::domain::contact::{latest_thread_for, parse_ledger, ContactRecord, EmailAddress};
use crate::domain::foundation::ThreadId;
use crate::ports::{ContactStore, ContactStoreError, RecordOutcome};

/// File-based storage for contact records
#[derive(Debug, Clone)]
pub struct FileContactStore {
    path: PathBuf,
    mode: LedgerMode,
    write_lock: Arc<Mutex<()>>,
}

impl FileContactStore {
    /// Create a new store backed by the ledger at `path`
    ///
    /// The file and its parent directory are created on first write.
    ///
    /// # Example
    /// ```ignore
    /// let store = FileContactStore::new("./collected_data/customer_data.txt");
    /// ```
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            mode: LedgerMode::default(),
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Sets how new records are written
    pub fn with_mode(mut self, mode: LedgerMode) -> Self {
        self.mode = mode;
        self
    }

    /// Path of the ledger file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the ledger, treating a missing file as empty
    async fn read_contents(&self) -> Result<String, ContactStoreError> {
        match fs::read_to_string(&self.path).await {
            Ok(contents) => Ok(contents),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(String::new()),
            Err(e) => Err(ContactStoreError::IoError(e.to_string())),
        }
    }

    /// Replace the ledger with `contents` via temp file and rename
    async fn write_atomically(&self, contents: &str) -> Result<(), ContactStoreError> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir)
            .await
            .map_err(|e| ContactStoreError::IoError(e.to_string()))?;

        let file_name = self
            .path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "contacts".to_string());
        let temp_path = dir.join(format!(".{}.{}.tmp", file_name, Uuid::new_v4()));

        if let Err(e) = fs::write(&temp_path, contents).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(ContactStoreError::IoError(e.to_string()));
        }

        if let Err(e) = fs::rename(&temp_path, &self.path).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(ContactStoreError::IoError(e.to_string()));
        }

        Ok(())
    }
}

#[async_trait]
impl ContactStore for FileContactStore {
    async fn find_thread(
        &self,
        email: &EmailAddress,
    ) -> Result<Option<ThreadId>, ContactStoreError> {
        let contents = self.read_contents().await?;
        let records = parse_ledger(&contents);
        Ok(latest_thread_for(&records, email).cloned())
    }

    async fn record(
        &self,
        email: &EmailAddress,
        thread_id: &ThreadId,
    ) -> Result<RecordOutcome, ContactStoreError> {
        let _guard = self.write_lock.lock().await;

        let contents = self.read_contents().await?;
        let records = parse_ledger(&contents);
        if let Some(existing) = latest_thread_for(&records, email) {
            tracing::debug!(email = %email, thread_id = %existing, "Contact already recorded");
            return Ok(RecordOutcome::Existing(existing.clone()));
        }

        let line = ContactRecord::new(email.clone(), thread_id.clone()).to_line();
        let updated = match self.mode {
            LedgerMode::Append => {
                let mut updated = contents;
                if !updated.is_empty() && !updated.ends_with('\n') {
                    updated.push('\n');
                }
                updated.push_str(&line);
                updated
            }
            LedgerMode::Replace => {
                if !records.is_empty() {
                    tracing::warn!(
                        dropped = records.len(),
                        "Replace mode discards existing contact records"
                    );
                }
                line
            }
        };

        self.write_atomically(&updated).await?;
        tracing::info!(email = %email, thread_id = %thread_id, "Recorded new contact");
        Ok(RecordOutcome::Recorded)
    }

    async fn records(&self) -> Result<Vec<ContactRecord>, ContactStoreError> {
        let contents = self.read_contents().await?;
        Ok(parse_ledger(&contents))
    }
}
