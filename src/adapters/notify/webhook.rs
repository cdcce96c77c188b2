//! Chat webhook notifier (Discord-compatible embeds).
//!
//! One POST per event, no internal retry. 200 and 204 are success.

use crate::domain::{DestinationKind, DomainError, LiveEvent, NotificationDestination};
use crate::ports::NotifierPort;
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::{Client, StatusCode};
use serde::Serialize;
use tracing::info;

/// Twitch purple.
const EMBED_COLOR: u32 = 0x6441A4;

#[derive(Debug, Serialize)]
pub struct WebhookMessage {
    pub content: String,
    pub embeds: Vec<Embed>,
}

#[derive(Debug, Serialize)]
pub struct Embed {
    pub title: String,
    pub description: String,
    pub url: String,
    pub color: u32,
    pub timestamp: String,
    pub thumbnail: Thumbnail,
    pub fields: Vec<EmbedField>,
}

#[derive(Debug, Serialize)]
pub struct Thumbnail {
    pub url: String,
}

#[derive(Debug, Serialize)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

/// Build the webhook body. `now` stands in for a missing stream start.
pub fn build_message(event: &LiveEvent, now: DateTime<Utc>) -> WebhookMessage {
    let started = event.started_at.unwrap_or(now);
    WebhookMessage {
        content: String::new(),
        embeds: vec![Embed {
            title: format!("{} is now live on Twitch!", event.display_name),
            description: event.title.clone(),
            url: event.channel_url(),
            color: EMBED_COLOR,
            timestamp: started.to_rfc3339_opts(SecondsFormat::Secs, true),
            thumbnail: Thumbnail {
                url: event.thumbnail_url.clone(),
            },
            fields: vec![
                EmbedField {
                    name: "Game".into(),
                    value: event.game_name.clone(),
                    inline: true,
                },
                EmbedField {
                    name: "Viewers".into(),
                    value: event.viewer_count.to_string(),
                    inline: true,
                },
            ],
        }],
    }
}

/// Posts embeds to the webhook URL stored as the destination address.
pub struct WebhookNotifier {
    client: Client,
}

impl WebhookNotifier {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait::async_trait]
impl NotifierPort for WebhookNotifier {
    fn kind(&self) -> DestinationKind {
        DestinationKind::ChatWebhook
    }

    async fn send(
        &self,
        destination: &NotificationDestination,
        event: &LiveEvent,
    ) -> Result<(), DomainError> {
        let body = build_message(event, Utc::now());
        let res = self
            .client
            .post(&destination.address)
            .json(&body)
            .send()
            .await
            .map_err(|e| DomainError::Dispatch(format!("webhook request failed: {}", e)))?;

        let status = res.status();
        if status != StatusCode::OK && status != StatusCode::NO_CONTENT {
            return Err(DomainError::Dispatch(format!(
                "webhook returned error status {}",
                status
            )));
        }

        info!(
            destination_id = destination.id,
            streamer = %event.username,
            "webhook notification sent"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::test_support::serve;
    use axum::Router;
    use axum::extract::State;
    use axum::http::StatusCode as AxumStatus;
    use axum::routing::post;
    use chrono::TimeZone;
    use serde_json::Value;
    use std::sync::{Arc, Mutex};

    fn event() -> LiveEvent {
        LiveEvent {
            username: "alice".into(),
            display_name: "Alice".into(),
            title: "Playing".into(),
            game_name: "X".into(),
            thumbnail_url: "https://cdn/alice.jpg".into(),
            viewer_count: 10,
            started_at: Some(Utc.with_ymd_and_hms(2024, 5, 1, 18, 0, 0).unwrap()),
        }
    }

    fn destination(address: String) -> NotificationDestination {
        NotificationDestination {
            id: 7,
            kind: DestinationKind::ChatWebhook,
            address,
            enabled: true,
        }
    }

    #[derive(Clone)]
    struct Hook {
        status: AxumStatus,
        bodies: Arc<Mutex<Vec<Value>>>,
    }

    async fn hook(State(hook): State<Hook>, axum::Json(body): axum::Json<Value>) -> AxumStatus {
        hook.bodies.lock().unwrap().push(body);
        hook.status
    }

    async fn stub(status: AxumStatus) -> (String, Arc<Mutex<Vec<Value>>>) {
        let bodies = Arc::new(Mutex::new(Vec::new()));
        let app = Router::new().route("/hook", post(hook)).with_state(Hook {
            status,
            bodies: Arc::clone(&bodies),
        });
        (format!("{}/hook", serve(app).await), bodies)
    }

    #[test]
    fn test_message_shape() {
        let msg = serde_json::to_value(build_message(&event(), Utc::now())).unwrap();
        let embed = &msg["embeds"][0];
        assert_eq!(msg["content"], "");
        assert_eq!(embed["title"], "Alice is now live on Twitch!");
        assert_eq!(embed["description"], "Playing");
        assert_eq!(embed["url"], "https://twitch.tv/alice");
        assert_eq!(embed["color"], 0x6441A4);
        assert_eq!(embed["timestamp"], "2024-05-01T18:00:00Z");
        assert_eq!(embed["thumbnail"]["url"], "https://cdn/alice.jpg");
        assert_eq!(embed["fields"][0]["name"], "Game");
        assert_eq!(embed["fields"][0]["value"], "X");
        assert_eq!(embed["fields"][1]["value"], "10");
        assert_eq!(embed["fields"][1]["inline"], true);
    }

    #[test]
    fn test_missing_start_uses_now() {
        let now = Utc.with_ymd_and_hms(2024, 6, 2, 9, 30, 0).unwrap();
        let mut e = event();
        e.started_at = None;
        let msg = build_message(&e, now);
        assert_eq!(msg.embeds[0].timestamp, "2024-06-02T09:30:00Z");
    }

    #[tokio::test]
    async fn test_no_content_is_success() {
        let (url, bodies) = stub(AxumStatus::NO_CONTENT).await;
        let notifier = WebhookNotifier::new(Client::new());
        notifier.send(&destination(url), &event()).await.unwrap();
        assert_eq!(bodies.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_ok_is_success() {
        let (url, _) = stub(AxumStatus::OK).await;
        let notifier = WebhookNotifier::new(Client::new());
        assert!(notifier.send(&destination(url), &event()).await.is_ok());
    }

    #[tokio::test]
    async fn test_server_error_is_single_failed_attempt() {
        let (url, bodies) = stub(AxumStatus::INTERNAL_SERVER_ERROR).await;
        let notifier = WebhookNotifier::new(Client::new());
        let err = notifier.send(&destination(url), &event()).await.unwrap_err();
        assert!(matches!(err, DomainError::Dispatch(_)));
        assert_eq!(bodies.lock().unwrap().len(), 1);
    }
}
