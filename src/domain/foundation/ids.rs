//! Strongly-typed identifier value objects.
//!
//! Remote identifiers (threads, runs, assistants, ...) are opaque strings issued
//! by the assistant service. Session identifiers are issued locally.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::ValidationError;

/// Declares an opaque, non-empty string identifier issued by the remote service.
macro_rules! remote_id {
    ($(#[$meta:meta])* $name:ident, $field:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Creates a new identifier, returning error if empty.
            pub fn new(id: impl Into<String>) -> Result<Self, ValidationError> {
                let id = id.into();
                if id.trim().is_empty() {
                    return Err(ValidationError::empty_field($field));
                }
                Ok(Self(id))
            }

            /// Returns the inner string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = ValidationError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::new(s)
            }
        }
    };
}

remote_id!(
    /// Conversation thread on the assistant service.
    ThreadId,
    "thread_id"
);
remote_id!(
    /// Assistant entity configured with instructions and a knowledge index.
    AssistantId,
    "assistant_id"
);
remote_id!(
    /// One invocation of the assistant against a thread.
    RunId,
    "run_id"
);
remote_id!(
    /// Message within a thread.
    MessageId,
    "message_id"
);
remote_id!(
    /// Uploaded file.
    FileId,
    "file_id"
);
remote_id!(
    /// Searchable index built from uploaded files.
    VectorStoreId,
    "vector_store_id"
);

/// Identifier for a client conversation session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(Uuid);

impl SessionId {
    /// Creates a new random SessionId.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a SessionId from an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the inner UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for SessionId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}
