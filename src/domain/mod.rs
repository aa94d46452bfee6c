//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (identifiers, error codes)
//! - `contact` - Email extraction and the email-to-thread ledger format
//! - `conversation` - Conversation state, runs and reply extraction

pub mod contact;
pub mod conversation;
pub mod foundation;
