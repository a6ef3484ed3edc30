//! Tracked account and repository records.
//!
//! # Invariants
//! - `name` is unique across the store and compared case-sensitively.
//! - `removed` accounts are retained, never hard-deleted for being gone.

use serde::{Deserialize, Serialize};

/// Surrogate integer key assigned by the store.
pub type AccountId = i64;

/// One tracked suspicious account.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    /// Login handle exactly as the platform reports it.
    pub name: String,
    /// Activity for this account has been fetched and applied.
    pub processed: bool,
    /// The remote profile answered not-found.
    pub removed: bool,
}

impl Account {
    /// Public profile page, used in progress log lines.
    pub fn profile_url(&self) -> String {
        profile_url(&self.name)
    }
}

/// Repository discovered through a create or fork event of its owner.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Repository {
    pub id: i64,
    /// Repository-local name, without the `owner/` prefix.
    pub name: String,
    pub owner_id: AccountId,
    pub is_fork: bool,
}

/// Builds the public profile URL for a login.
pub fn profile_url(login: &str) -> String {
    format!("https://github.com/{login}")
}
