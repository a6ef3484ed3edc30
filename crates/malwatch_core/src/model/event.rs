//! Activity events as returned by the platform's public event feeds.
//!
//! Only the fields the crawl reads are modeled; everything else in the
//! payload is ignored during decoding.

use serde::{Deserialize, Serialize};

/// Event type tag. Unknown tags collapse into `Other` and are ignored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    #[serde(rename = "ForkEvent")]
    Fork,
    #[serde(rename = "CreateEvent")]
    Create,
    #[serde(rename = "WatchEvent")]
    Watch,
    #[default]
    #[serde(other)]
    Other,
}

/// Repository reference carried by an event, in `owner/name` form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoRef {
    #[serde(default)]
    pub name: Option<String>,
}

/// Snapshot of the account that triggered an event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorProfile {
    #[serde(default)]
    pub login: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub blog: Option<String>,
}

impl ActorProfile {
    /// Profile snapshot carrying only a login.
    pub fn with_login(login: impl Into<String>) -> Self {
        Self {
            login: Some(login.into()),
            ..Self::default()
        }
    }

    /// Returns whether any auxiliary profile field is filled in.
    pub fn has_profile_details(&self) -> bool {
        [
            &self.company,
            &self.bio,
            &self.location,
            &self.email,
            &self.blog,
        ]
        .into_iter()
        .any(|field| field.as_deref().is_some_and(|value| !value.is_empty()))
    }
}

/// One entry of a performed or received activity feed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityEvent {
    #[serde(rename = "type", default)]
    pub kind: EventKind,
    #[serde(default)]
    pub repo: Option<RepoRef>,
    #[serde(default)]
    pub actor: Option<ActorProfile>,
}

impl ActivityEvent {
    /// Full `owner/name` repository reference, when present.
    pub fn repo_full_name(&self) -> Option<&str> {
        self.repo.as_ref().and_then(|repo| repo.name.as_deref())
    }
}

/// Strips the owner prefix from an `owner/name` reference.
///
/// Returns `None` when the reference has no `/` separator. Only the first
/// separator splits, so `a/b/c` yields `b/c`.
pub fn split_repository_name(full_name: &str) -> Option<&str> {
    full_name.split_once('/').map(|(_, name)| name)
}
