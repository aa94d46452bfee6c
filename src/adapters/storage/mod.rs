//! Storage Adapters
//!
//! Implementations of the ContactStore and SessionStore ports.
//!
//! ## Available Adapters
//!
//! - **FileContactStore** - Contact ledger as a text file on disk
//! - **InMemoryContactStore** - Contact ledger in memory (testing/development)
//! - **InMemorySessionStore** - Per-session conversation state
//!
//! ## Usage
//!
//! ```ignore
//! use adapters::storage::{FileContactStore, InMemoryContactStore};
//!
//! // Production: file-based ledger
//! let contacts = FileContactStore::new("./collected_data/customer_data.txt");
//!
//! // Testing: in-memory ledger
//! let contacts = InMemoryContactStore::new();
//! ```

mod file_contact_store;
mod in_memory_contact_store;
mod in_memory_session_store;

pub use file_contact_store::FileContactStore;
pub use in_memory_contact_store::InMemoryContactStore;
pub use in_memory_session_store::InMemorySessionStore;
