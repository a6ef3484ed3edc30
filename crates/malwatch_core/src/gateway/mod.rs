//! Remote account/activity gateway.
//!
//! # Responsibility
//! - Define the read-only contract the crawl engine uses to reach the
//!   platform: profile lookup and the two public activity feeds.
//! - Report failures as typed errors; recovery policy lives in the engine.
//!
//! # Invariants
//! - A not-found profile is a successful lookup, not an error.
//! - Activity is the concatenation of performed and received feeds, in no
//!   guaranteed order.

use crate::model::event::ActivityEvent;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod github;

pub use github::GitHubGateway;

pub type GatewayResult<T> = Result<T, GatewayError>;

/// Credentials used for one remote call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Identity {
    /// Sends the configured token.
    Authenticated,
    /// Sends no credentials. Still sees public activity of removed accounts.
    Anonymous,
}

/// Outcome of a profile lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountLookup {
    Found,
    NotFound,
}

#[derive(Debug)]
pub enum GatewayError {
    /// HTTP client could not be constructed.
    Client(reqwest::Error),
    /// Request never produced a response, or the body could not be read.
    Transport { url: String, source: reqwest::Error },
    /// Non-success status other than a not-found profile lookup.
    Status {
        url: String,
        status: u16,
        rate_limit_remaining: Option<u32>,
    },
    /// Response body was not the expected JSON shape.
    Decode {
        url: String,
        source: serde_json::Error,
    },
}

impl GatewayError {
    /// Returns whether the platform refused the call for rate limiting.
    pub fn is_rate_limited(&self) -> bool {
        match self {
            Self::Status {
                status,
                rate_limit_remaining,
                ..
            } => *status == 429 || (*status == 403 && *rate_limit_remaining == Some(0)),
            _ => false,
        }
    }
}

impl Display for GatewayError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Client(err) => write!(f, "failed to build HTTP client: {err}"),
            Self::Transport { url, source } => write!(f, "request to {url} failed: {source}"),
            Self::Status {
                url,
                status,
                rate_limit_remaining,
            } => match rate_limit_remaining {
                Some(remaining) => write!(
                    f,
                    "{url} returned status {status} (rate limit remaining {remaining})"
                ),
                None => write!(f, "{url} returned status {status}"),
            },
            Self::Decode { url, source } => {
                write!(f, "failed to decode response from {url}: {source}")
            }
        }
    }
}

impl Error for GatewayError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Client(err) => Some(err),
            Self::Transport { source, .. } => Some(source),
            Self::Status { .. } => None,
            Self::Decode { source, .. } => Some(source),
        }
    }
}

/// Read-only access to account profiles and activity feeds.
pub trait ActivityGateway {
    /// Looks up a profile by login.
    fn lookup_account(&self, login: &str) -> GatewayResult<AccountLookup>;
    /// Fetches performed and received events for a login.
    fn fetch_activity(&self, login: &str, identity: Identity) -> GatewayResult<Vec<ActivityEvent>>;
}

#[cfg(test)]
mod tests {
    use super::GatewayError;

    fn status(status: u16, rate_limit_remaining: Option<u32>) -> GatewayError {
        GatewayError::Status {
            url: "https://api.github.com/users/a/events/public".to_string(),
            status,
            rate_limit_remaining,
        }
    }

    #[test]
    fn rate_limit_detection_uses_status_and_remaining_quota() {
        assert!(status(429, None).is_rate_limited());
        assert!(status(403, Some(0)).is_rate_limited());
        assert!(!status(403, Some(12)).is_rate_limited());
        assert!(!status(500, Some(0)).is_rate_limited());
    }

    #[test]
    fn status_error_mentions_remaining_quota() {
        let message = status(403, Some(0)).to_string();
        assert!(message.contains("403"));
        assert!(message.contains("rate limit remaining 0"));
    }
}
