//! Partitioning of one account's activity into store deltas.
//!
//! # Invariants
//! - Every output collection is a set keyed by name; event order is
//!   irrelevant to the result.
//! - Repository names are stored without the owner prefix.

use crate::classifier::{classify_actor, Classification};
use crate::model::account::profile_url;
use crate::model::event::{split_repository_name, ActivityEvent, EventKind};
use log::{info, warn};
use std::collections::HashSet;

/// Deltas derived from the activity of one tracked account.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActivityDigest {
    pub created_repositories: HashSet<String>,
    pub forked_repositories: HashSet<String>,
    /// Watchers that look human; untracked if present in the store.
    pub legitimate_accounts: HashSet<String>,
    /// Watchers that look like bots; added to the frontier.
    pub suspicious_accounts: HashSet<String>,
}

impl ActivityDigest {
    /// Digests `events` observed for the account `self_login`.
    pub fn from_events(self_login: &str, events: &[ActivityEvent]) -> Self {
        let mut digest = Self::default();
        for event in events {
            digest.record(self_login, event);
        }
        digest
    }

    fn record(&mut self, self_login: &str, event: &ActivityEvent) {
        match event.kind {
            EventKind::Fork => {
                if let Some(name) = repository_name(event) {
                    self.forked_repositories.insert(name);
                }
            }
            EventKind::Create => {
                if let Some(name) = repository_name(event) {
                    self.created_repositories.insert(name);
                }
            }
            EventKind::Watch => {
                let Some(actor) = event.actor.as_ref() else {
                    return;
                };
                match classify_actor(actor, self_login) {
                    Classification::Skip => {}
                    Classification::Legitimate => {
                        let login = actor.login.clone().unwrap_or_default();
                        info!(
                            "event=legitimate_watcher module=crawl status=ok watcher={} watched={}",
                            profile_url(&login),
                            profile_url(self_login)
                        );
                        self.legitimate_accounts.insert(login);
                    }
                    Classification::Suspicious => {
                        self.suspicious_accounts
                            .insert(actor.login.clone().unwrap_or_default());
                    }
                }
            }
            EventKind::Other => {}
        }
    }
}

fn repository_name(event: &ActivityEvent) -> Option<String> {
    let full_name = event.repo_full_name()?;
    match split_repository_name(full_name) {
        Some(name) => Some(name.to_string()),
        None => {
            warn!(
                "event=malformed_repository module=crawl status=skipped repository={}",
                full_name
            );
            None
        }
    }
}
