//! Contact module - email to thread associations.
//!
//! Returning users are recognised by the email address they mention in a
//! message; the ledger remembers which thread that address first started.

mod email;
mod record;

pub use email::{extract_email, EmailAddress};
pub use record::{latest_thread_for, parse_ledger, ContactRecord};
