//! Crawl domain model.
//!
//! # Responsibility
//! - Define the persisted account/repository records.
//! - Define the activity events consumed from the remote platform.
//!
//! # Invariants
//! - Account names are unique and case-sensitive.
//! - Repository names never carry the owner prefix.

pub mod account;
pub mod event;
