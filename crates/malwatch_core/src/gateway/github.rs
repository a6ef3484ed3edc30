//! GitHub REST implementation of the activity gateway.
//!
//! # Responsibility
//! - Issue blocking profile and event-feed requests against the REST API.
//! - Translate HTTP outcomes into `AccountLookup` or `GatewayError`.
//!
//! # Invariants
//! - Anonymous calls never carry the token.
//! - Exactly one page is requested per feed.

use super::{AccountLookup, ActivityGateway, GatewayError, GatewayResult, Identity};
use crate::config::GatewayConfig;
use crate::model::event::ActivityEvent;
use log::debug;
use reqwest::blocking::{Client, Response};
use reqwest::header::{HeaderMap, ACCEPT};
use reqwest::StatusCode;

const GITHUB_JSON_MEDIA_TYPE: &str = "application/vnd.github+json";
const API_VERSION_HEADER: &str = "X-GitHub-Api-Version";
const API_VERSION: &str = "2022-11-28";
const RATE_LIMIT_REMAINING_HEADER: &str = "x-ratelimit-remaining";

/// Blocking GitHub REST client holding both identities.
pub struct GitHubGateway {
    client: Client,
    base_url: String,
    token: String,
    per_page: u32,
}

impl GitHubGateway {
    pub fn new(config: &GatewayConfig) -> GatewayResult<Self> {
        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(GatewayError::Client)?;

        Ok(Self {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            token: config.token.clone(),
            per_page: config.per_page,
        })
    }

    fn profile_url(&self, login: &str) -> String {
        format!("{}/users/{login}", self.base_url)
    }

    fn performed_events_url(&self, login: &str) -> String {
        format!(
            "{}/users/{login}/events/public?per_page={}",
            self.base_url, self.per_page
        )
    }

    fn received_events_url(&self, login: &str) -> String {
        format!(
            "{}/users/{login}/received_events/public?per_page={}",
            self.base_url, self.per_page
        )
    }

    fn get(&self, url: &str, identity: Identity) -> GatewayResult<Response> {
        let mut request = self
            .client
            .get(url)
            .header(ACCEPT, GITHUB_JSON_MEDIA_TYPE)
            .header(API_VERSION_HEADER, API_VERSION);
        if identity == Identity::Authenticated {
            request = request.bearer_auth(&self.token);
        }

        let response = request.send().map_err(|source| GatewayError::Transport {
            url: url.to_string(),
            source,
        })?;
        debug!(
            "event=gateway_request module=gateway status={} identity={:?} url={}",
            response.status().as_u16(),
            identity,
            url
        );
        Ok(response)
    }

    fn get_events(&self, url: &str, identity: Identity) -> GatewayResult<Vec<ActivityEvent>> {
        let response = self.get(url, identity)?;
        if !response.status().is_success() {
            return Err(status_error(url, &response));
        }

        let body = response.text().map_err(|source| GatewayError::Transport {
            url: url.to_string(),
            source,
        })?;
        decode_events(url, &body)
    }
}

impl ActivityGateway for GitHubGateway {
    fn lookup_account(&self, login: &str) -> GatewayResult<AccountLookup> {
        let url = self.profile_url(login);
        let response = self.get(&url, Identity::Authenticated)?;
        match response.status() {
            StatusCode::NOT_FOUND => Ok(AccountLookup::NotFound),
            status if status.is_success() => Ok(AccountLookup::Found),
            _ => Err(status_error(&url, &response)),
        }
    }

    fn fetch_activity(&self, login: &str, identity: Identity) -> GatewayResult<Vec<ActivityEvent>> {
        let mut events = self.get_events(&self.performed_events_url(login), identity)?;
        events.extend(self.get_events(&self.received_events_url(login), identity)?);
        Ok(events)
    }
}

/// Decodes one event-feed page.
pub fn decode_events(url: &str, body: &str) -> GatewayResult<Vec<ActivityEvent>> {
    serde_json::from_str(body).map_err(|source| GatewayError::Decode {
        url: url.to_string(),
        source,
    })
}

fn status_error(url: &str, response: &Response) -> GatewayError {
    GatewayError::Status {
        url: url.to_string(),
        status: response.status().as_u16(),
        rate_limit_remaining: rate_limit_remaining(response.headers()),
    }
}

fn rate_limit_remaining(headers: &HeaderMap) -> Option<u32> {
    headers
        .get(RATE_LIMIT_REMAINING_HEADER)?
        .to_str()
        .ok()?
        .trim()
        .parse()
        .ok()
}

#[cfg(test)]
mod tests {
    use super::{decode_events, rate_limit_remaining, GitHubGateway};
    use crate::config::GatewayConfig;
    use crate::gateway::GatewayError;
    use crate::model::event::EventKind;
    use reqwest::header::{HeaderMap, HeaderValue};

    const FEED: &str = r#"[
        {
            "id": "1",
            "type": "WatchEvent",
            "actor": {"id": 7, "login": "zzz", "display_login": "zzz"},
            "repo": {"id": 9, "name": "lazysmock/payload"},
            "payload": {"action": "started"},
            "public": true
        },
        {
            "id": "2",
            "type": "CreateEvent",
            "actor": {"login": "lazysmock"},
            "repo": {"name": "lazysmock/payload"},
            "payload": {"ref_type": "repository"}
        },
        {
            "id": "3",
            "type": "IssuesEvent",
            "actor": {"login": "lazysmock"},
            "repo": {"name": "lazysmock/payload"}
        }
    ]"#;

    fn gateway(base_url: &str) -> GitHubGateway {
        let mut config = GatewayConfig::new("token");
        config.api_base_url = base_url.to_string();
        config.per_page = 50;
        GitHubGateway::new(&config).expect("client should build")
    }

    #[test]
    fn urls_target_public_feeds_with_page_size() {
        let gateway = gateway("https://ghe.example.com/api/v3/");
        assert_eq!(
            gateway.profile_url("lazysmock"),
            "https://ghe.example.com/api/v3/users/lazysmock"
        );
        assert_eq!(
            gateway.performed_events_url("lazysmock"),
            "https://ghe.example.com/api/v3/users/lazysmock/events/public?per_page=50"
        );
        assert_eq!(
            gateway.received_events_url("lazysmock"),
            "https://ghe.example.com/api/v3/users/lazysmock/received_events/public?per_page=50"
        );
    }

    #[test]
    fn decode_events_keeps_relevant_fields() {
        let events = decode_events("feed", FEED).unwrap();
        assert_eq!(events.len(), 3);

        assert_eq!(events[0].kind, EventKind::Watch);
        let actor = events[0].actor.as_ref().unwrap();
        assert_eq!(actor.login.as_deref(), Some("zzz"));
        assert!(actor.bio.is_none());

        assert_eq!(events[1].kind, EventKind::Create);
        assert_eq!(events[1].repo_full_name(), Some("lazysmock/payload"));
        assert_eq!(events[2].kind, EventKind::Other);
    }

    #[test]
    fn decode_events_reports_malformed_body() {
        let err = decode_events("https://api.github.com/x", r#"{"message":"Not Found"}"#)
            .unwrap_err();
        assert!(matches!(err, GatewayError::Decode { ref url, .. } if url == "https://api.github.com/x"));
    }

    #[test]
    fn rate_limit_header_is_parsed_when_present() {
        let mut headers = HeaderMap::new();
        assert_eq!(rate_limit_remaining(&headers), None);

        headers.insert("x-ratelimit-remaining", HeaderValue::from_static("0"));
        assert_eq!(rate_limit_remaining(&headers), Some(0));

        headers.insert("x-ratelimit-remaining", HeaderValue::from_static("n/a"));
        assert_eq!(rate_limit_remaining(&headers), None);
    }
}
