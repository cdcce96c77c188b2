//! Domain entities. Pure data structures for the core business.
//!
//! No HTTP/SQL types here; adapters map into these.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::DomainError;

/// A streamer being monitored. Owned by the tracking store; only the
/// reconciliation loop changes its live-state fields.
///
/// Invariant: `is_live == true` implies `last_stream_start.is_some()`.
/// Use [`TrackedEntity::mark_live`] / [`TrackedEntity::mark_offline`] to keep it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackedEntity {
    pub id: i64,
    /// Platform login. Immutable once tracked.
    pub username: String,
    pub display_name: String,
    pub is_live: bool,
    pub last_stream_start: Option<DateTime<Utc>>,
    pub last_notification_sent: Option<DateTime<Utc>>,
}

impl TrackedEntity {
    /// Offline → Live. `started_at` is the upstream stream start when known;
    /// otherwise `now` is used. `now` is also recorded as the notification time.
    pub fn mark_live(&mut self, started_at: Option<DateTime<Utc>>, now: DateTime<Utc>) {
        self.is_live = true;
        self.last_stream_start = Some(started_at.unwrap_or(now));
        self.last_notification_sent = Some(now);
    }

    /// Live → Offline. Timestamps are kept as history.
    pub fn mark_offline(&mut self) {
        self.is_live = false;
    }
}

/// Canonical identity of a platform user, as resolved from a typed-in name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelIdentity {
    pub id: String,
    pub login: String,
    pub display_name: String,
}

/// Closed set of notification sinks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DestinationKind {
    /// Discord-style incoming webhook; address is the webhook URL.
    ChatWebhook,
    /// Social status update; address is the account handle.
    SocialPost,
}

impl DestinationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DestinationKind::ChatWebhook => "chat_webhook",
            DestinationKind::SocialPost => "social_post",
        }
    }
}

impl fmt::Display for DestinationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DestinationKind {
    type Err = DomainError;

    /// Accepts the stored names and the legacy `discord` / `twitter` tags.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "chat_webhook" | "webhook" | "discord" => Ok(DestinationKind::ChatWebhook),
            "social_post" | "social" | "twitter" => Ok(DestinationKind::SocialPost),
            other => Err(DomainError::Validation(format!(
                "unknown destination kind: {other}"
            ))),
        }
    }
}

/// A configured notification sink. Read-only to the reconciliation loop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationDestination {
    pub id: i64,
    pub kind: DestinationKind,
    pub address: String,
    pub enabled: bool,
}

/// One go-live transition. Built per transition, consumed by dispatch, dropped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiveEvent {
    pub username: String,
    pub display_name: String,
    pub title: String,
    pub game_name: String,
    pub thumbnail_url: String,
    pub viewer_count: u64,
    /// Upstream stream start; `None` when the platform omitted or garbled it.
    pub started_at: Option<DateTime<Utc>>,
}

impl LiveEvent {
    /// Public channel link for the streamer.
    pub fn channel_url(&self) -> String {
        format!("https://twitch.tv/{}", self.username)
    }
}
