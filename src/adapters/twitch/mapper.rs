//! Map Helix wire types to domain entities.
//!
//! Only streams whose `type` is `"live"` become [`LiveEvent`]s.

use crate::domain::{ChannelIdentity, LiveEvent};
use chrono::{DateTime, Utc};
use serde::Deserialize;

/// Thumbnail size substituted into Helix `{width}x{height}` templates.
const THUMBNAIL_WIDTH: &str = "1280";
const THUMBNAIL_HEIGHT: &str = "720";

/// Client-credentials grant response.
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub expires_in: u64,
}

/// Every Helix collection endpoint wraps its items in `data`.
#[derive(Debug, Deserialize)]
pub struct DataEnvelope<T> {
    pub data: Vec<T>,
}

/// Entry of `GET /users`.
#[derive(Debug, Deserialize)]
pub struct HelixUser {
    pub id: String,
    pub login: String,
    pub display_name: String,
}

/// Entry of `GET /streams`.
#[derive(Debug, Deserialize)]
pub struct HelixStream {
    pub user_login: String,
    pub user_name: String,
    #[serde(default)]
    pub game_name: String,
    #[serde(rename = "type", default)]
    pub stream_type: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub viewer_count: u64,
    #[serde(default)]
    pub started_at: Option<String>,
    #[serde(default)]
    pub thumbnail_url: String,
}

pub fn identity_from_user(user: HelixUser) -> ChannelIdentity {
    ChannelIdentity {
        id: user.id,
        login: user.login.to_lowercase(),
        display_name: user.display_name,
    }
}

/// Build a [`LiveEvent`] from a stream entry, or `None` if it is not live.
pub fn live_event_from_stream(stream: HelixStream) -> Option<LiveEvent> {
    if stream.stream_type != "live" {
        return None;
    }
    let display_name = if stream.user_name.is_empty() {
        stream.user_login.clone()
    } else {
        stream.user_name
    };
    Some(LiveEvent {
        username: stream.user_login.to_lowercase(),
        display_name,
        title: stream.title,
        game_name: stream.game_name,
        thumbnail_url: sized_thumbnail(&stream.thumbnail_url),
        viewer_count: stream.viewer_count,
        started_at: stream.started_at.as_deref().and_then(parse_started_at),
    })
}

/// RFC 3339 → UTC. Empty or malformed input yields `None`.
pub fn parse_started_at(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw.trim())
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Fill the `{width}`/`{height}` placeholders Helix leaves in thumbnail URLs.
pub fn sized_thumbnail(template: &str) -> String {
    template
        .replace("{width}", THUMBNAIL_WIDTH)
        .replace("{height}", THUMBNAIL_HEIGHT)
}
