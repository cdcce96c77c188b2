//! Social post notifier (X API v2, OAuth2 user token).
//!
//! Posts a bounded-length status and retries with exponential backoff.

use crate::domain::{DestinationKind, DomainError, LiveEvent, NotificationDestination};
use crate::ports::NotifierPort;
use crate::shared::retry::RetryPolicy;
use reqwest::Client;
use serde_json::json;
use tracing::info;

/// Platform limit for a single post.
pub const MAX_POST_CHARS: usize = 280;

/// Compose the post text. The stream title is shortened first so the name,
/// category and link always fit in [`MAX_POST_CHARS`].
pub fn compose_post(event: &LiveEvent) -> String {
    let head = format!("{} is now live on Twitch!", event.display_name);
    let tail = if event.game_name.is_empty() {
        event.channel_url()
    } else {
        format!("Playing: {}\n\n{}", event.game_name, event.channel_url())
    };

    let fixed = head.chars().count() + tail.chars().count() + 4;
    let title = truncate_chars(event.title.trim(), MAX_POST_CHARS.saturating_sub(fixed));
    let text = if title.is_empty() {
        format!("{}\n\n{}", head, tail)
    } else {
        format!("{}\n\n{}\n\n{}", head, title, tail)
    };
    truncate_chars(&text, MAX_POST_CHARS)
}

fn truncate_chars(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    if max == 0 {
        return String::new();
    }
    let mut out: String = text.chars().take(max - 1).collect();
    out.push('…');
    out
}

/// Posts status updates for the account the token belongs to. The destination
/// address is the account handle and is only used for logging.
pub struct SocialNotifier {
    client: Client,
    api_url: String,
    access_token: String,
    retry: RetryPolicy,
}

impl SocialNotifier {
    pub fn new(client: Client, api_url: String, access_token: String, retry: RetryPolicy) -> Self {
        Self {
            client,
            api_url,
            access_token,
            retry,
        }
    }

    async fn post_once(&self, text: &str) -> Result<(), DomainError> {
        let res = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.access_token)
            .json(&json!({ "text": text }))
            .send()
            .await
            .map_err(|e| DomainError::Dispatch(format!("social post request failed: {}", e)))?;

        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(DomainError::Dispatch(format!(
                "social post returned {}: {}",
                status,
                body.chars().take(200).collect::<String>()
            )));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl NotifierPort for SocialNotifier {
    fn kind(&self) -> DestinationKind {
        DestinationKind::SocialPost
    }

    async fn send(
        &self,
        destination: &NotificationDestination,
        event: &LiveEvent,
    ) -> Result<(), DomainError> {
        let text = compose_post(event);
        let text_ref = text.as_str();
        self.retry
            .run("social post", move |_| self.post_once(text_ref))
            .await?;

        info!(
            destination_id = destination.id,
            account = %destination.address,
            streamer = %event.username,
            "social notification posted"
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
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::post;
    use serde_json::Value;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    fn event(title: &str) -> LiveEvent {
        LiveEvent {
            username: "alice".into(),
            display_name: "Alice".into(),
            title: title.into(),
            game_name: "X".into(),
            thumbnail_url: String::new(),
            viewer_count: 10,
            started_at: None,
        }
    }

    fn destination() -> NotificationDestination {
        NotificationDestination {
            id: 3,
            kind: DestinationKind::SocialPost,
            address: "@alice_alerts".into(),
            enabled: true,
        }
    }

    #[derive(Default)]
    struct FakeApi {
        calls: AtomicUsize,
        failures_before_success: AtomicUsize,
        texts: Mutex<Vec<String>>,
    }

    async fn tweets(
        State(api): State<Arc<FakeApi>>,
        headers: HeaderMap,
        axum::Json(body): axum::Json<Value>,
    ) -> StatusCode {
        let n = api.calls.fetch_add(1, Ordering::SeqCst);
        if headers.get("authorization").and_then(|v| v.to_str().ok()) != Some("Bearer user-token")
        {
            return StatusCode::UNAUTHORIZED;
        }
        api.texts
            .lock()
            .unwrap()
            .push(body["text"].as_str().unwrap_or_default().to_string());
        if n < api.failures_before_success.load(Ordering::SeqCst) {
            StatusCode::SERVICE_UNAVAILABLE
        } else {
            StatusCode::CREATED
        }
    }

    async fn setup(failures: usize) -> (Arc<FakeApi>, SocialNotifier) {
        let api = Arc::new(FakeApi::default());
        api.failures_before_success.store(failures, Ordering::SeqCst);
        let app = Router::new()
            .route("/2/tweets", post(tweets))
            .with_state(Arc::clone(&api));
        let base = serve(app).await;
        let notifier = SocialNotifier::new(
            Client::new(),
            format!("{}/2/tweets", base),
            "user-token".into(),
            RetryPolicy::new(3, Duration::from_millis(5)),
        );
        (api, notifier)
    }

    #[test]
    fn test_compose_post() {
        let text = compose_post(&event("Speedrun night"));
        assert_eq!(
            text,
            "Alice is now live on Twitch!\n\nSpeedrun night\n\nPlaying: X\n\nhttps://twitch.tv/alice"
        );
    }

    #[test]
    fn test_long_title_is_shortened_to_fit() {
        let text = compose_post(&event(&"a".repeat(400)));
        assert_eq!(text.chars().count(), MAX_POST_CHARS);
        assert!(text.ends_with("https://twitch.tv/alice"));
        assert!(text.contains('…'));
    }

    #[test]
    fn test_empty_title_and_game() {
        let mut e = event("  ");
        e.game_name.clear();
        assert_eq!(
            compose_post(&e),
            "Alice is now live on Twitch!\n\nhttps://twitch.tv/alice"
        );
    }

    #[tokio::test]
    async fn test_posts_on_first_attempt() {
        let (api, notifier) = setup(0).await;
        notifier.send(&destination(), &event("Hi")).await.unwrap();
        assert_eq!(api.calls.load(Ordering::SeqCst), 1);
        assert!(api.texts.lock().unwrap()[0].contains("Hi"));
    }

    #[tokio::test]
    async fn test_succeeds_after_two_failures() {
        let (api, notifier) = setup(2).await;
        notifier.send(&destination(), &event("Hi")).await.unwrap();
        assert_eq!(api.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_retry_budget() {
        let (api, notifier) = setup(usize::MAX).await;
        let err = notifier.send(&destination(), &event("Hi")).await.unwrap_err();
        assert!(matches!(err, DomainError::Dispatch(_)));
        assert_eq!(api.calls.load(Ordering::SeqCst), 4);
    }
}
