//! Tracking administration: which streamers are watched and where alerts go.

use crate::domain::{DestinationKind, DomainError, NotificationDestination, TrackedEntity};
use crate::ports::{StatusSource, TrackingStore};
use std::sync::Arc;
use tracing::info;

pub struct TrackingService {
    store: Arc<dyn TrackingStore>,
    source: Arc<dyn StatusSource>,
}

impl TrackingService {
    pub fn new(store: Arc<dyn TrackingStore>, source: Arc<dyn StatusSource>) -> Self {
        Self { store, source }
    }

    /// Resolve `name` on the platform and start tracking it (offline).
    /// Nothing is stored when the lookup fails.
    pub async fn track(&self, name: &str) -> Result<TrackedEntity, DomainError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(DomainError::Validation("username cannot be empty".into()));
        }
        let identity = self.source.resolve_identity(name).await?;
        let entity = self.store.add_tracked(&identity).await?;
        info!(
            streamer = %entity.username,
            display_name = %entity.display_name,
            "now tracking"
        );
        Ok(entity)
    }

    pub async fn untrack(&self, username: &str) -> Result<(), DomainError> {
        let username = username.trim().to_lowercase();
        self.store.remove_tracked(&username).await?;
        info!(streamer = %username, "stopped tracking");
        Ok(())
    }

    pub async fn list_tracked(&self) -> Result<Vec<TrackedEntity>, DomainError> {
        self.store.list_tracked().await
    }

    /// Register a destination. Webhooks need an http(s) URL, social posts a handle.
    pub async fn add_destination(
        &self,
        kind: DestinationKind,
        address: &str,
    ) -> Result<NotificationDestination, DomainError> {
        let address = address.trim();
        match kind {
            DestinationKind::ChatWebhook => {
                let url = reqwest::Url::parse(address)
                    .map_err(|e| DomainError::Validation(format!("invalid webhook URL: {}", e)))?;
                if url.scheme() != "https" && url.scheme() != "http" {
                    return Err(DomainError::Validation(
                        "webhook URL must use http or https".into(),
                    ));
                }
            }
            DestinationKind::SocialPost => {
                if address.is_empty() {
                    return Err(DomainError::Validation("account handle cannot be empty".into()));
                }
            }
        }
        let destination = self.store.add_destination(kind, address).await?;
        info!(
            destination_id = destination.id,
            kind = %destination.kind,
            "destination added"
        );
        Ok(destination)
    }

    pub async fn set_destination_enabled(&self, id: i64, enabled: bool) -> Result<(), DomainError> {
        self.store.set_destination_enabled(id, enabled).await?;
        info!(destination_id = id, enabled, "destination updated");
        Ok(())
    }

    pub async fn list_destinations(&self) -> Result<Vec<NotificationDestination>, DomainError> {
        self.store.list_destinations().await
    }
}
