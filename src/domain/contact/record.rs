//! Contact ledger records.
//!
//! The ledger is newline-delimited text, one `email: thread_id` record per line.

use serde::{Deserialize, Serialize};

use super::EmailAddress;
use crate::domain::foundation::ThreadId;

const SEPARATOR: &str = ": ";

/// Association between an email address and the thread it started.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactRecord {
    pub email: EmailAddress,
    pub thread_id: ThreadId,
}

impl ContactRecord {
    pub fn new(email: EmailAddress, thread_id: ThreadId) -> Self {
        Self { email, thread_id }
    }

    /// Renders the record as a ledger line, including the trailing newline.
    pub fn to_line(&self) -> String {
        format!("{}{}{}\n", self.email, SEPARATOR, self.thread_id)
    }

    /// Parses a single ledger line.
    ///
    /// Both sides are trimmed and commas are dropped from the thread id.
    /// Returns `None` for blank or malformed lines.
    pub fn parse_line(line: &str) -> Option<Self> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }
        let (email, thread_id) = line.split_once(SEPARATOR)?;
        let email = EmailAddress::new(email.trim()).ok()?;
        let thread_id = ThreadId::new(thread_id.trim().replace(',', "")).ok()?;
        Some(Self { email, thread_id })
    }
}

/// Parses ledger contents, skipping malformed lines.
pub fn parse_ledger(contents: &str) -> Vec<ContactRecord> {
    contents
        .lines()
        .filter(|line| !line.trim().is_empty())
        .filter_map(|line| {
            let parsed = ContactRecord::parse_line(line);
            if parsed.is_none() {
                tracing::warn!(line = %line, "Skipping malformed contact ledger line");
            }
            parsed
        })
        .collect()
}

/// Returns the thread of the last record for `email`, in ledger order.
pub fn latest_thread_for<'a>(
    records: &'a [ContactRecord],
    email: &EmailAddress,
) -> Option<&'a ThreadId> {
    records
        .iter()
        .rev()
        .find(|record| &record.email == email)
        .map(|record| &record.thread_id)
}
