//! Frontier expansion loop.
//!
//! # Responsibility
//! - Repeatedly load the frontier, process every account in it and apply
//!   the resulting deltas until no unprocessed account remains.
//! - Decide which remote failures are recoverable.
//!
//! # Invariants
//! - The frontier is re-read from the store at the start of every pass.
//! - Store failures abort the run; remote failures never do.
//! - An account is marked processed only after all of its deltas are written.
//! - Activity-fetch failures for a removed account are swallowed.
//!
//! Retry is at-least-once: a deferred account stays unprocessed and is picked
//! up by the next pass or the next process run.

use crate::config::CrawlOptions;
use crate::gateway::{AccountLookup, ActivityGateway, Identity};
use crate::model::account::{profile_url, Account};
use crate::repo::account_repo::{AccountStore, StoreError};
use crate::service::digest::ActivityDigest;
use log::{debug, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

pub type CrawlResult<T> = Result<T, CrawlError>;

/// Fatal crawl error.
#[derive(Debug)]
pub enum CrawlError {
    Store(StoreError),
}

impl Display for CrawlError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Store(err) => write!(f, "crawl store failure: {err}"),
        }
    }
}

impl Error for CrawlError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Store(err) => Some(err),
        }
    }
}

impl From<StoreError> for CrawlError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

/// Rows actually changed while applying one account's digest.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AccountDelta {
    pub removed: bool,
    pub created_repositories: usize,
    pub forked_repositories: usize,
    pub accounts_untracked: usize,
    pub accounts_discovered: usize,
}

/// Result of processing one frontier account.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountOutcome {
    Processed(AccountDelta),
    /// Activity could not be fetched; the account stays in the frontier.
    Deferred,
}

/// Totals for one crawl run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CrawlReport {
    pub passes: u32,
    pub processed: u64,
    pub deferred: u64,
    pub removed: u64,
    pub repositories_inserted: u64,
    pub accounts_discovered: u64,
    pub accounts_untracked: u64,
    /// A pass deferred every account it saw; the run stopped early.
    pub stalled: bool,
    /// `max_passes` was reached with accounts still pending.
    pub pass_limit_reached: bool,
}

impl CrawlReport {
    /// The frontier was drained.
    pub fn is_complete(&self) -> bool {
        !self.stalled && !self.pass_limit_reached
    }

    fn record(&mut self, outcome: AccountOutcome) {
        match outcome {
            AccountOutcome::Processed(delta) => {
                self.processed += 1;
                if delta.removed {
                    self.removed += 1;
                }
                self.repositories_inserted +=
                    (delta.created_repositories + delta.forked_repositories) as u64;
                self.accounts_discovered += delta.accounts_discovered as u64;
                self.accounts_untracked += delta.accounts_untracked as u64;
            }
            AccountOutcome::Deferred => self.deferred += 1,
        }
    }
}

/// Crawl engine over injected store and gateway implementations.
pub struct CrawlEngine<S: AccountStore, G: ActivityGateway> {
    store: S,
    gateway: G,
    options: CrawlOptions,
}

impl<S: AccountStore, G: ActivityGateway> CrawlEngine<S, G> {
    pub fn new(store: S, gateway: G, options: CrawlOptions) -> Self {
        Self {
            store,
            gateway,
            options,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    /// Runs passes until the frontier is empty.
    ///
    /// Also stops when `max_passes` is reached or when a whole pass made no
    /// progress; both leave the remaining frontier for a later run.
    pub fn run(&self) -> CrawlResult<CrawlReport> {
        let started_at = Instant::now();
        let mut report = CrawlReport::default();

        loop {
            let frontier = self.store.list_unprocessed()?;
            if frontier.is_empty() {
                break;
            }

            if let Some(max_passes) = self.options.max_passes {
                if report.passes >= max_passes {
                    warn!(
                        "event=crawl_pass_limit module=crawl status=stopped passes={} pending={}",
                        report.passes,
                        frontier.len()
                    );
                    report.pass_limit_reached = true;
                    break;
                }
            }

            report.passes += 1;
            info!(
                "event=crawl_pass module=crawl status=start pass={} frontier={}",
                report.passes,
                frontier.len()
            );

            let mut progressed = false;
            for account in &frontier {
                let outcome = self.process_account(account)?;
                progressed |= matches!(outcome, AccountOutcome::Processed(_));
                report.record(outcome);
            }

            if !progressed {
                warn!(
                    "event=crawl_pass module=crawl status=stalled pass={} deferred={}",
                    report.passes,
                    frontier.len()
                );
                report.stalled = true;
                break;
            }
        }

        info!(
            "event=crawl_run module=crawl status=done passes={} processed={} deferred={} discovered={} untracked={} repositories={} duration_ms={}",
            report.passes,
            report.processed,
            report.deferred,
            report.accounts_discovered,
            report.accounts_untracked,
            report.repositories_inserted,
            started_at.elapsed().as_millis()
        );
        Ok(report)
    }

    /// Fetches, digests and applies the activity of one frontier account.
    pub fn process_account(&self, account: &Account) -> CrawlResult<AccountOutcome> {
        let removed = self.account_is_gone(account);
        if removed {
            info!(
                "event=account_removed module=crawl status=ok account={}",
                account.profile_url()
            );
            self.store.mark_removed(account.id)?;
        }

        let identity = if removed && self.options.anonymous_fallback {
            Identity::Anonymous
        } else {
            Identity::Authenticated
        };

        info!(
            "event=account_fetch module=crawl status=start account={} identity={:?}",
            account.profile_url(),
            identity
        );
        let events = match self.gateway.fetch_activity(&account.name, identity) {
            Ok(events) => events,
            Err(err) if removed => {
                debug!(
                    "event=account_fetch module=crawl status=suppressed account={} rate_limited={} error={}",
                    account.name,
                    err.is_rate_limited(),
                    err
                );
                Vec::new()
            }
            Err(err) => {
                warn!(
                    "event=account_fetch module=crawl status=deferred account={} error={}",
                    account.name, err
                );
                return Ok(AccountOutcome::Deferred);
            }
        };

        let digest = ActivityDigest::from_events(&account.name, &events);
        let mut delta = self.apply_digest(account, &digest)?;
        delta.removed = removed;
        self.store.mark_processed(account.id)?;

        Ok(AccountOutcome::Processed(delta))
    }

    fn account_is_gone(&self, account: &Account) -> bool {
        match self.gateway.lookup_account(&account.name) {
            Ok(AccountLookup::NotFound) => true,
            Ok(AccountLookup::Found) => false,
            Err(err) => {
                warn!(
                    "event=account_lookup module=crawl status=error account={} error={}",
                    account.profile_url(),
                    err
                );
                false
            }
        }
    }

    fn apply_digest(&self, account: &Account, digest: &ActivityDigest) -> CrawlResult<AccountDelta> {
        let mut delta = AccountDelta::default();

        if !digest.created_repositories.is_empty() {
            info!(
                "event=repositories_insert module=crawl kind=created count={} account={}",
                digest.created_repositories.len(),
                account.profile_url()
            );
            for name in &digest.created_repositories {
                if self.store.insert_repository_if_absent(name, account.id, false)? {
                    delta.created_repositories += 1;
                }
            }
        }

        if !digest.forked_repositories.is_empty() {
            info!(
                "event=repositories_insert module=crawl kind=forked count={} account={}",
                digest.forked_repositories.len(),
                account.profile_url()
            );
            for name in &digest.forked_repositories {
                if self.store.insert_repository_if_absent(name, account.id, true)? {
                    delta.forked_repositories += 1;
                }
            }
        }

        if !digest.legitimate_accounts.is_empty() {
            info!(
                "event=accounts_untrack module=crawl count={} account={}",
                digest.legitimate_accounts.len(),
                account.profile_url()
            );
            for name in &digest.legitimate_accounts {
                if self.store.delete_account_by_name(name)? {
                    info!(
                        "event=account_untracked module=crawl status=ok account={}",
                        profile_url(name)
                    );
                    delta.accounts_untracked += 1;
                }
            }
        }

        if !digest.suspicious_accounts.is_empty() {
            info!(
                "event=accounts_insert module=crawl count={} account={}",
                digest.suspicious_accounts.len(),
                account.profile_url()
            );
            for name in &digest.suspicious_accounts {
                if self.store.insert_account_if_absent(name)? {
                    delta.accounts_discovered += 1;
                }
            }
        }

        Ok(delta)
    }
}
