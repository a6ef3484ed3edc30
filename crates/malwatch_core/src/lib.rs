//! Core crawl logic for malwatch.
//! Tracks suspicious platform accounts by expanding a seed set through their
//! watchers, forks and created repositories.

pub mod classifier;
pub mod config;
pub mod db;
pub mod gateway;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use classifier::{classify, classify_actor, Classification};
pub use config::{is_valid_login, ConfigError, CrawlConfig, CrawlOptions, GatewayConfig};
pub use gateway::{
    AccountLookup, ActivityGateway, GatewayError, GatewayResult, GitHubGateway, Identity,
};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::account::{Account, AccountId, Repository};
pub use model::event::{split_repository_name, ActivityEvent, ActorProfile, EventKind, RepoRef};
pub use repo::account_repo::{
    AccountStore, SqliteAccountStore, StoreError, StoreResult, StoreStats, DEFAULT_SEED_ACCOUNTS,
};
pub use service::crawl_service::{
    AccountDelta, AccountOutcome, CrawlEngine, CrawlError, CrawlReport, CrawlResult,
};
pub use service::digest::ActivityDigest;

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
