//! Fan-out of one go-live event to every enabled destination.
//!
//! Each destination is attempted independently and concurrently; a failure or
//! a slow sink never prevents the others from completing.

use crate::domain::{DestinationKind, DomainError, LiveEvent, NotificationDestination};
use crate::ports::NotifierPort;
use futures_util::future::join_all;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::warn;

/// Outcome of dispatching one event.
#[derive(Debug, Default)]
pub struct DispatchSummary {
    pub attempted: usize,
    /// (destination id, error) for every destination that was not reached.
    pub failures: Vec<(i64, DomainError)>,
}

impl DispatchSummary {
    pub fn delivered(&self) -> usize {
        self.attempted - self.failures.len()
    }
}

/// Holds one notifier per destination kind.
#[derive(Default)]
pub struct Dispatcher {
    notifiers: HashMap<DestinationKind, Arc<dyn NotifierPort>>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `notifier` for its kind, replacing any previous one.
    pub fn with_notifier(mut self, notifier: Arc<dyn NotifierPort>) -> Self {
        self.notifiers.insert(notifier.kind(), notifier);
        self
    }

    pub fn has_notifier(&self, kind: DestinationKind) -> bool {
        self.notifiers.contains_key(&kind)
    }

    /// Send `event` to every enabled destination and wait for all outcomes.
    pub async fn dispatch(
        &self,
        destinations: &[NotificationDestination],
        event: &LiveEvent,
    ) -> DispatchSummary {
        let sends = destinations
            .iter()
            .filter(|d| d.enabled)
            .map(|destination| async move {
                let result = match self.notifiers.get(&destination.kind) {
                    Some(notifier) => notifier.send(destination, event).await,
                    None => Err(DomainError::Dispatch(format!(
                        "no notifier configured for {}",
                        destination.kind
                    ))),
                };
                (destination, result)
            });

        let mut summary = DispatchSummary::default();
        for (destination, result) in join_all(sends).await {
            summary.attempted += 1;
            if let Err(e) = result {
                warn!(
                    destination_id = destination.id,
                    kind = %destination.kind,
                    streamer = %event.username,
                    error = %e,
                    "notification failed"
                );
                summary.failures.push((destination.id, e));
            }
        }
        summary
    }
}
