//! Outbound ports. Application calls into infrastructure.
//!
//! Implemented by adapters.

use crate::domain::{
    ChannelIdentity, DestinationKind, DomainError, LiveEvent, NotificationDestination,
    TrackedEntity,
};
use std::collections::{BTreeSet, HashMap};

/// Streaming platform gateway. Authentication, identity lookup, live status.
#[async_trait::async_trait]
pub trait StatusSource: Send + Sync {
    /// Obtain or refresh the bearer credential. Idempotent; a cached, unexpired
    /// credential is reused. Safe to call concurrently.
    async fn authenticate(&self) -> Result<(), DomainError>;

    /// Map a typed-in username to the platform's canonical identity.
    ///
    /// Fails with `Validation` on empty input, `NotFound` when the platform has
    /// no such user, `Upstream` for any other failure, including an
    /// undecodable response.
    async fn resolve_identity(&self, name: &str) -> Result<ChannelIdentity, DomainError>;

    /// Live status for a batch of logins in as few round-trips as possible.
    ///
    /// The result holds exactly the subset that is currently live; absence
    /// means offline. An empty input returns an empty map without a call.
    async fn query_live_batch(
        &self,
        names: &BTreeSet<String>,
    ) -> Result<HashMap<String, LiveEvent>, DomainError>;
}

/// Tracking store port. Streamers and notification destinations.
///
/// The first three methods are what the reconciliation loop consumes; the rest
/// back the tracking administration use case.
#[async_trait::async_trait]
pub trait TrackingStore: Send + Sync {
    /// All tracked streamers, in a stable order.
    async fn list_tracked(&self) -> Result<Vec<TrackedEntity>, DomainError>;

    /// Destinations with `enabled == true`, in a stable order.
    async fn list_enabled_destinations(&self) -> Result<Vec<NotificationDestination>, DomainError>;

    /// Persist the live-state fields of one streamer. `NotFound` if its id is unknown.
    async fn update_tracked(&self, entity: &TrackedEntity) -> Result<(), DomainError>;

    /// Start tracking a resolved identity (offline). `Validation` if already tracked.
    async fn add_tracked(&self, identity: &ChannelIdentity) -> Result<TrackedEntity, DomainError>;

    /// Stop tracking a login. `NotFound` if it was not tracked.
    async fn remove_tracked(&self, username: &str) -> Result<(), DomainError>;

    /// All destinations, enabled or not.
    async fn list_destinations(&self) -> Result<Vec<NotificationDestination>, DomainError>;

    /// Register a new, enabled destination.
    async fn add_destination(
        &self,
        kind: DestinationKind,
        address: &str,
    ) -> Result<NotificationDestination, DomainError>;

    /// Toggle a destination. `NotFound` if its id is unknown.
    async fn set_destination_enabled(&self, id: i64, enabled: bool) -> Result<(), DomainError>;
}
