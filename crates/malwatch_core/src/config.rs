//! Crawl run configuration.
//!
//! # Responsibility
//! - Carry database, seed, gateway and run-control settings into core.
//! - Validate settings before any store or network work starts.
//!
//! # Invariants
//! - A validated config always has a non-empty token.
//! - The token never appears in `Debug` output.

use crate::repo::account_repo::DEFAULT_SEED_ACCOUNTS;
use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};
use std::path::PathBuf;

pub const DEFAULT_API_BASE_URL: &str = "https://api.github.com";
pub const DEFAULT_DATABASE_PATH: &str = "malicious.sqlite";
/// Page size the platform applies when none is requested.
pub const DEFAULT_PER_PAGE: u32 = 30;
pub const MAX_PER_PAGE: u32 = 100;

static LOGIN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9](?:[A-Za-z0-9-]{0,37}[A-Za-z0-9])?$").expect("valid login regex")
});

/// Returns whether `login` is shaped like a platform account handle.
pub fn is_valid_login(login: &str) -> bool {
    LOGIN_RE.is_match(login) && !login.contains("--")
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    MissingToken,
    InvalidPerPage(u32),
    InvalidBaseUrl(String),
    InvalidSeed(String),
    ZeroMaxPasses,
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingToken => write!(f, "GitHub token is empty; set GITHUB_TOKEN"),
            Self::InvalidPerPage(value) => {
                write!(f, "per_page must be within 1..={MAX_PER_PAGE}, got {value}")
            }
            Self::InvalidBaseUrl(value) => write!(f, "invalid API base URL `{value}`"),
            Self::InvalidSeed(value) => write!(f, "invalid seed account name `{value}`"),
            Self::ZeroMaxPasses => write!(f, "max_passes must be greater than zero"),
        }
    }
}

impl Error for ConfigError {}

/// Settings for the remote gateway.
#[derive(Clone, PartialEq, Eq)]
pub struct GatewayConfig {
    pub api_base_url: String,
    pub token: String,
    pub user_agent: String,
    pub per_page: u32,
}

impl GatewayConfig {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            token: token.into(),
            user_agent: format!("malwatch/{}", env!("CARGO_PKG_VERSION")),
            per_page: DEFAULT_PER_PAGE,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.token.trim().is_empty() {
            return Err(ConfigError::MissingToken);
        }
        if self.per_page == 0 || self.per_page > MAX_PER_PAGE {
            return Err(ConfigError::InvalidPerPage(self.per_page));
        }
        match reqwest::Url::parse(&self.api_base_url) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => Ok(()),
            _ => Err(ConfigError::InvalidBaseUrl(self.api_base_url.clone())),
        }
    }
}

impl Debug for GatewayConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("api_base_url", &self.api_base_url)
            .field("token", &"<redacted>")
            .field("user_agent", &self.user_agent)
            .field("per_page", &self.per_page)
            .finish()
    }
}

/// Run controls for the crawl engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrawlOptions {
    /// Fetch activity of not-found accounts without credentials.
    pub anonymous_fallback: bool,
    /// Stop after this many passes even when the frontier is not empty.
    pub max_passes: Option<u32>,
}

impl Default for CrawlOptions {
    fn default() -> Self {
        Self {
            anonymous_fallback: true,
            max_passes: None,
        }
    }
}

/// Full configuration of one crawl run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlConfig {
    pub database_path: PathBuf,
    /// Bootstrap accounts inserted idempotently before the first pass.
    pub seeds: Vec<String>,
    pub gateway: GatewayConfig,
    pub options: CrawlOptions,
}

impl CrawlConfig {
    /// Builds a config with the default database path and seed list.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            database_path: PathBuf::from(DEFAULT_DATABASE_PATH),
            seeds: DEFAULT_SEED_ACCOUNTS
                .iter()
                .map(|name| name.to_string())
                .collect(),
            gateway: GatewayConfig::new(token),
            options: CrawlOptions::default(),
        }
    }

    /// Appends extra seeds, skipping names already listed.
    pub fn with_extra_seeds<I, S>(mut self, seeds: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for seed in seeds {
            let seed = seed.into();
            if !self.seeds.contains(&seed) {
                self.seeds.push(seed);
            }
        }
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.gateway.validate()?;
        if let Some(seed) = self.seeds.iter().find(|seed| !is_valid_login(seed)) {
            return Err(ConfigError::InvalidSeed(seed.clone()));
        }
        if self.options.max_passes == Some(0) {
            return Err(ConfigError::ZeroMaxPasses);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{is_valid_login, ConfigError, CrawlConfig, DEFAULT_PER_PAGE};

    #[test]
    fn default_config_is_valid_and_seeds_bootstrap_accounts() {
        let config = CrawlConfig::new("token");
        config.validate().expect("defaults should validate");
        assert_eq!(config.gateway.per_page, DEFAULT_PER_PAGE);
        assert_eq!(
            config.seeds,
            vec!["lazysmock", "unkemptdefe", "ultimatepate"]
        );
        assert!(config.options.anonymous_fallback);
    }

    #[test]
    fn empty_token_is_rejected() {
        let config = CrawlConfig::new("  ");
        assert_eq!(config.validate(), Err(ConfigError::MissingToken));
    }

    #[test]
    fn per_page_and_base_url_are_checked() {
        let mut config = CrawlConfig::new("token");
        config.gateway.per_page = 101;
        assert_eq!(config.validate(), Err(ConfigError::InvalidPerPage(101)));

        config.gateway.per_page = 100;
        config.gateway.api_base_url = "ftp://example.com".to_string();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidBaseUrl(_))
        ));
    }

    #[test]
    fn extra_seeds_are_deduplicated_and_validated() {
        let config = CrawlConfig::new("token").with_extra_seeds(["lazysmock", "newbot"]);
        assert_eq!(config.seeds.len(), 4);

        let config = config.with_extra_seeds(["not a login"]);
        assert_eq!(
            config.validate(),
            Err(ConfigError::InvalidSeed("not a login".to_string()))
        );
    }

    #[test]
    fn login_shape_matches_platform_rules() {
        assert!(is_valid_login("a"));
        assert!(is_valid_login("Foo-bar9"));
        assert!(!is_valid_login("-foo"));
        assert!(!is_valid_login("foo-"));
        assert!(!is_valid_login("foo--bar"));
        assert!(!is_valid_login(&"a".repeat(40)));
    }

    #[test]
    fn debug_output_redacts_token() {
        let config = CrawlConfig::new("ghp_secret");
        assert!(!format!("{config:?}").contains("ghp_secret"));
    }
}
