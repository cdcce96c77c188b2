//! Notifier outbound port. Deliver a go-live event to one destination kind.

use crate::domain::{DestinationKind, DomainError, LiveEvent, NotificationDestination};

/// Port for sending a single go-live event to a notification destination.
///
/// One implementation per [`DestinationKind`]. The dispatcher selects the
/// implementation once per destination and calls [`NotifierPort::send`].
#[async_trait::async_trait]
pub trait NotifierPort: Send + Sync {
    /// The destination kind this notifier serves.
    fn kind(&self) -> DestinationKind;

    /// Deliver `event` to `destination`.
    ///
    /// # Errors
    /// Returns `DomainError::Dispatch` when delivery failed (after any
    /// implementation-specific retries).
    async fn send(
        &self,
        destination: &NotificationDestination,
        event: &LiveEvent,
    ) -> Result<(), DomainError>;
}
