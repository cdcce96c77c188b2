//! App access token for Helix via the client-credentials grant.
//!
//! The cached credential sits behind a tokio Mutex held for the whole
//! check → fetch → store sequence, so concurrent callers never race and at
//! most one refresh is in flight.

use crate::adapters::twitch::mapper::TokenResponse;
use crate::domain::DomainError;
use reqwest::Client;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, info};

/// Bearer token plus the instant it stops being usable. Process-local only.
#[derive(Debug, Clone)]
pub struct AccessCredential {
    pub token: String,
    pub expires_at: Instant,
}

impl AccessCredential {
    /// Valid strictly before `expires_at`; no safety margin is applied.
    pub fn is_valid_at(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

/// Fetches and caches the app access token.
pub struct TokenProvider {
    http: Client,
    auth_url: String,
    client_id: String,
    client_secret: String,
    cached: Mutex<Option<AccessCredential>>,
}

impl TokenProvider {
    pub fn new(http: Client, auth_url: String, client_id: String, client_secret: String) -> Self {
        Self {
            http,
            auth_url,
            client_id,
            client_secret,
            cached: Mutex::new(None),
        }
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// Current bearer token, refreshed first if missing or expired.
    pub async fn token(&self) -> Result<String, DomainError> {
        let mut cached = self.cached.lock().await;
        if let Some(cred) = cached.as_ref() {
            if cred.is_valid_at(Instant::now()) {
                return Ok(cred.token.clone());
            }
            debug!("cached Twitch token expired");
        }
        let fresh = self.fetch().await?;
        let token = fresh.token.clone();
        *cached = Some(fresh);
        Ok(token)
    }

    /// Drop the cached token if it is still `stale`. A token already replaced
    /// by another caller is left alone.
    pub async fn invalidate(&self, stale: &str) {
        let mut cached = self.cached.lock().await;
        if cached.as_ref().is_some_and(|c| c.token == stale) {
            *cached = None;
        }
    }

    async fn fetch(&self) -> Result<AccessCredential, DomainError> {
        let res = self
            .http
            .post(&self.auth_url)
            .form(&[
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("grant_type", "client_credentials"),
            ])
            .send()
            .await
            .map_err(|e| DomainError::Upstream(format!("auth request failed: {}", e)))?;

        if !res.status().is_success() {
            return Err(DomainError::Upstream(format!(
                "Twitch auth failed with status {}",
                res.status()
            )));
        }

        let body = res
            .text()
            .await
            .map_err(|e| DomainError::Upstream(format!("auth response read failed: {}", e)))?;
        let parsed: TokenResponse = serde_json::from_str(&body)
            .map_err(|e| DomainError::Decode(format!("auth response: {}", e)))?;

        let expires_at = Instant::now()
            .checked_add(Duration::from_secs(parsed.expires_in))
            .ok_or_else(|| DomainError::Decode("auth response: expires_in out of range".into()))?;
        info!(expires_in = parsed.expires_in, "obtained Twitch app access token");
        Ok(AccessCredential {
            token: parsed.access_token,
            expires_at,
        })
    }
}
