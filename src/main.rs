//! Wiring & DI. Entry point: bootstrap adapters, inject into services, run UI.
//! No business logic here.

use dotenv::dotenv;
use std::path::PathBuf;
use std::sync::Arc;
use stream_notify::adapters::notify::{SocialNotifier, WebhookNotifier};
use stream_notify::adapters::persistence::SqliteRepo;
use stream_notify::adapters::twitch::HelixClient;
use stream_notify::adapters::ui::{HeadlessInputPort, TuiInputPort};
use stream_notify::domain::DestinationKind;
use stream_notify::ports::{InputPort, StatusSource, TrackingStore};
use stream_notify::shared::config::AppConfig;
use stream_notify::usecases::{Dispatcher, ReconcileService, TrackingService};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let env_loaded = dotenv();
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    match &env_loaded {
        Ok(path) => info!(path = %path.display(), "loaded .env"),
        Err(_) => info!(cwd = %cwd.display(), "no .env found (check CWD)"),
    }

    let cfg = AppConfig::load().map_err(|e| anyhow::anyhow!("config: {}", e))?;
    if let Err(e) = cfg.validate() {
        anyhow::bail!("invalid configuration: {}", e);
    }

    let http = reqwest::Client::builder()
        .timeout(cfg.http_timeout())
        .build()
        .map_err(|e| anyhow::anyhow!("HTTP client: {}", e))?;

    // --- Twitch ---
    let source: Arc<dyn StatusSource> = Arc::new(HelixClient::new(
        http.clone(),
        cfg.twitch_api_url_or_default(),
        cfg.twitch_auth_url_or_default(),
        cfg.twitch_client_id().unwrap_or_default(),
        cfg.twitch_client_secret().unwrap_or_default(),
    ));

    // --- Store ---
    let data_path = PathBuf::from(cfg.data_dir_or_default());
    let repo = SqliteRepo::connect(&data_path)
        .await
        .map_err(|e| anyhow::anyhow!("SQLite connect failed: {}", e))?;
    info!(path = %repo.path().display(), "database");
    let store: Arc<dyn TrackingStore> = Arc::new(repo);

    // --- Notifiers ---
    let mut dispatcher =
        Dispatcher::new().with_notifier(Arc::new(WebhookNotifier::new(http.clone())));
    if cfg.is_social_configured() {
        info!(url = %cfg.social_api_url_or_default(), "social posting enabled");
        dispatcher = dispatcher.with_notifier(Arc::new(SocialNotifier::new(
            http.clone(),
            cfg.social_api_url_or_default(),
            cfg.social_access_token().unwrap_or_default(),
            cfg.social_retry_policy(),
        )));
    }
    if !dispatcher.has_notifier(DestinationKind::SocialPost) {
        warn!("TWITTER_ACCESS_TOKEN not set; social post destinations will fail");
    }

    // --- Services ---
    let reconcile = Arc::new(ReconcileService::new(
        Arc::clone(&store),
        Arc::clone(&source),
        Arc::new(dispatcher),
        cfg.poll_interval(),
    ));
    let tracking = Arc::new(TrackingService::new(Arc::clone(&store), Arc::clone(&source)));

    // Credential check only; the client authenticates lazily per request.
    match source.authenticate().await {
        Ok(()) => info!("authenticated with Twitch"),
        Err(e) => warn!(error = %e, "initial Twitch authentication failed"),
    }

    let input_port: Arc<dyn InputPort> = if cfg.is_headless() {
        Arc::new(HeadlessInputPort::new(reconcile))
    } else {
        Arc::new(TuiInputPort::new(tracking, reconcile))
    };

    input_port
        .run()
        .await
        .map_err(|e| anyhow::anyhow!("{}", e))?;

    Ok(())
}
