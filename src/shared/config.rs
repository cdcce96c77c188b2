//! Application configuration. API credentials, endpoints, cadence.

use crate::domain::DomainError;
use crate::shared::retry::RetryPolicy;
use serde::Deserialize;
use std::time::Duration;

pub const DEFAULT_TWITCH_API_URL: &str = "https://api.twitch.tv/helix";
pub const DEFAULT_TWITCH_AUTH_URL: &str = "https://id.twitch.tv/oauth2/token";
pub const DEFAULT_SOCIAL_API_URL: &str = "https://api.x.com/2/tweets";
/// Seconds between reconciliation cycles.
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 60;
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Deserialize, Default)]
pub struct AppConfig {
    /// Twitch application client id. Read from NOTIFY_TWITCH_CLIENT_ID or TWITCH_CLIENT_ID.
    #[serde(default)]
    pub twitch_client_id: Option<String>,

    /// Twitch application secret. Read from NOTIFY_TWITCH_CLIENT_SECRET or TWITCH_CLIENT_SECRET.
    #[serde(default)]
    pub twitch_client_secret: Option<String>,

    #[serde(default)]
    pub twitch_api_url: Option<String>,

    #[serde(default)]
    pub twitch_auth_url: Option<String>,

    /// Directory holding streams.db. Defaults to ./data.
    #[serde(default)]
    pub data_dir: Option<String>,

    #[serde(default)]
    pub poll_interval_secs: Option<u64>,

    #[serde(default)]
    pub http_timeout_secs: Option<u64>,

    /// Start the monitor directly instead of showing the menu.
    #[serde(default)]
    pub headless: Option<bool>,

    // ─────────────────────────────────────────────────────────────────────────
    // Social posting
    // ─────────────────────────────────────────────────────────────────────────
    /// OAuth2 user token for posting. Read from NOTIFY_SOCIAL_ACCESS_TOKEN or TWITTER_ACCESS_TOKEN.
    #[serde(default)]
    pub social_access_token: Option<String>,

    #[serde(default)]
    pub social_api_url: Option<String>,

    /// Retries after the first failed post (default 3).
    #[serde(default)]
    pub social_max_retries: Option<u32>,

    /// Delay before the first retry in ms (default 2000, doubling).
    #[serde(default)]
    pub social_retry_delay_ms: Option<u64>,
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        let mut c = config::Config::builder();
        if let Ok(path) = std::env::var("NOTIFY_CONFIG") {
            c = c.add_source(config::File::with_name(&path));
        }
        c = c.add_source(config::Environment::with_prefix("NOTIFY"));
        c.build()?.try_deserialize()
    }

    /// Check what the service cannot run without.
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.twitch_client_id().is_none() || self.twitch_client_secret().is_none() {
            return Err(DomainError::Config(
                "Twitch API configuration is required (TWITCH_CLIENT_ID, TWITCH_CLIENT_SECRET)"
                    .into(),
            ));
        }
        if self.poll_interval().is_zero() {
            return Err(DomainError::Config(
                "poll interval must be at least one second".into(),
            ));
        }
        Ok(())
    }

    /// Returns Twitch client id from config or TWITCH_CLIENT_ID env.
    pub fn twitch_client_id(&self) -> Option<String> {
        non_empty(
            self.twitch_client_id
                .clone()
                .or_else(|| std::env::var("TWITCH_CLIENT_ID").ok()),
        )
    }

    /// Returns Twitch client secret from config or TWITCH_CLIENT_SECRET env.
    pub fn twitch_client_secret(&self) -> Option<String> {
        non_empty(
            self.twitch_client_secret
                .clone()
                .or_else(|| std::env::var("TWITCH_CLIENT_SECRET").ok()),
        )
    }

    pub fn twitch_api_url_or_default(&self) -> String {
        self.twitch_api_url
            .clone()
            .unwrap_or_else(|| DEFAULT_TWITCH_API_URL.to_string())
    }

    pub fn twitch_auth_url_or_default(&self) -> String {
        self.twitch_auth_url
            .clone()
            .unwrap_or_else(|| DEFAULT_TWITCH_AUTH_URL.to_string())
    }

    pub fn data_dir_or_default(&self) -> String {
        self.data_dir.clone().unwrap_or_else(|| "./data".to_string())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs.unwrap_or(DEFAULT_POLL_INTERVAL_SECS))
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs.unwrap_or(DEFAULT_HTTP_TIMEOUT_SECS))
    }

    pub fn is_headless(&self) -> bool {
        self.headless.unwrap_or(false)
    }

    /// Returns the social posting token from config or TWITTER_ACCESS_TOKEN env.
    pub fn social_access_token(&self) -> Option<String> {
        non_empty(
            self.social_access_token
                .clone()
                .or_else(|| std::env::var("TWITTER_ACCESS_TOKEN").ok()),
        )
    }

    pub fn social_api_url_or_default(&self) -> String {
        self.social_api_url
            .clone()
            .unwrap_or_else(|| DEFAULT_SOCIAL_API_URL.to_string())
    }

    /// Retry policy for social posts. Missing values fall back to 3 retries / 2s.
    pub fn social_retry_policy(&self) -> RetryPolicy {
        let default = RetryPolicy::default();
        RetryPolicy::new(
            self.social_max_retries.unwrap_or(default.max_retries),
            self.social_retry_delay_ms
                .map(Duration::from_millis)
                .unwrap_or(default.base_delay),
        )
    }

    /// Returns true if social posting is configured (token present).
    pub fn is_social_configured(&self) -> bool {
        self.social_access_token().is_some()
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
