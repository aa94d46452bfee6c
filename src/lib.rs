//! Assistant Relay - Chat relay to a hosted assistant
//!
//! This crate forwards user messages to a hosted assistant service, waits for
//! the assistant's run to finish, and returns its reply. Users who share an
//! email address are moved back onto their earlier conversation thread.

pub mod adapters;
pub mod app;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
