//! Implements StatusSource against the Twitch Helix API.
//!
//! Batches live-status lookups (`user_login` repeated, up to 100 per call) and
//! retries a request once with a fresh token when Helix answers 401.

use crate::adapters::twitch::auth::TokenProvider;
use crate::adapters::twitch::mapper::{self, DataEnvelope, HelixStream, HelixUser};
use crate::domain::{ChannelIdentity, DomainError, LiveEvent};
use crate::ports::StatusSource;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use std::collections::{BTreeSet, HashMap};
use tracing::{debug, warn};

/// Helix accepts at most this many `user_login` filters per request.
pub const MAX_LOGINS_PER_REQUEST: usize = 100;

/// Twitch Helix gateway.
pub struct HelixClient {
    http: Client,
    api_url: String,
    tokens: TokenProvider,
}

impl HelixClient {
    /// `api_url` is the Helix base (e.g. `https://api.twitch.tv/helix`),
    /// `auth_url` the OAuth token endpoint. No request is made here.
    pub fn new(
        http: Client,
        api_url: String,
        auth_url: String,
        client_id: String,
        client_secret: String,
    ) -> Self {
        let tokens = TokenProvider::new(http.clone(), auth_url, client_id, client_secret);
        Self {
            http,
            api_url: api_url.trim_end_matches('/').to_string(),
            tokens,
        }
    }

    /// Authenticated GET returning decoded JSON. A 401 triggers one re-auth + retry.
    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, DomainError> {
        let url = format!("{}{}", self.api_url, path);
        let mut reauthenticated = false;

        loop {
            let token = self.tokens.token().await?;
            let res = self
                .http
                .get(&url)
                .query(query)
                .header("Client-ID", self.tokens.client_id())
                .bearer_auth(&token)
                .send()
                .await
                .map_err(|e| DomainError::Upstream(format!("GET {} failed: {}", path, e)))?;

            let status = res.status();
            if status == StatusCode::UNAUTHORIZED && !reauthenticated {
                warn!(path, "Helix rejected token; re-authenticating once");
                self.tokens.invalidate(&token).await;
                reauthenticated = true;
                continue;
            }
            if !status.is_success() {
                let text = res.text().await.unwrap_or_default();
                return Err(DomainError::Upstream(format!(
                    "GET {} returned {}: {}",
                    path,
                    status,
                    text.chars().take(200).collect::<String>()
                )));
            }

            let body = res
                .text()
                .await
                .map_err(|e| DomainError::Upstream(format!("GET {} body: {}", path, e)))?;
            return serde_json::from_str(&body)
                .map_err(|e| DomainError::Decode(format!("GET {}: {}", path, e)));
        }
    }
}

#[async_trait]
impl StatusSource for HelixClient {
    async fn authenticate(&self) -> Result<(), DomainError> {
        self.tokens.token().await.map(|_| ())
    }

    async fn resolve_identity(&self, name: &str) -> Result<ChannelIdentity, DomainError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(DomainError::Validation("username cannot be empty".into()));
        }

        let page: DataEnvelope<HelixUser> = self
            .get_json("/users", &[("login", name)])
            .await
            .map_err(|e| match e {
                DomainError::Decode(m) => DomainError::Upstream(m),
                other => other,
            })?;
        page.data
            .into_iter()
            .next()
            .map(mapper::identity_from_user)
            .ok_or_else(|| DomainError::NotFound(format!("streamer not found: {}", name)))
    }

    async fn query_live_batch(
        &self,
        names: &BTreeSet<String>,
    ) -> Result<HashMap<String, LiveEvent>, DomainError> {
        let normalized: BTreeSet<String> = names
            .iter()
            .map(|n| n.trim().to_lowercase())
            .filter(|n| !n.is_empty())
            .collect();
        let logins: Vec<&str> = normalized.iter().map(String::as_str).collect();
        let mut live = HashMap::new();
        if logins.is_empty() {
            return Ok(live);
        }

        for chunk in logins.chunks(MAX_LOGINS_PER_REQUEST) {
            let first = chunk.len().to_string();
            let mut query: Vec<(&str, &str)> = Vec::with_capacity(chunk.len() + 1);
            query.push(("first", first.as_str()));
            query.extend(chunk.iter().map(|login| ("user_login", *login)));

            let page: DataEnvelope<HelixStream> = self.get_json("/streams", &query).await?;
            for stream in page.data {
                if let Some(event) = mapper::live_event_from_stream(stream) {
                    live.insert(event.username.clone(), event);
                }
            }
        }

        debug!(queried = logins.len(), live = live.len(), "live status fetched");
        Ok(live)
    }
}
