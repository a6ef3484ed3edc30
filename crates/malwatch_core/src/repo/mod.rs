//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the crawl store contract consumed by the crawl engine.
//! - Isolate SQLite query details from crawl orchestration.
//!
//! # Invariants
//! - Every write is committed before the call returns.
//! - Duplicate inserts are no-ops, never errors.

pub mod account_repo;
