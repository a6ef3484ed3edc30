//! Crawl use-case services.
//!
//! # Responsibility
//! - Turn raw activity into per-account deltas.
//! - Drive the frontier expansion loop over store and gateway contracts.

pub mod crawl_service;
pub mod digest;
