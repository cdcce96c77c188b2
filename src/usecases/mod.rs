//! Application use cases. Orchestrate domain logic via ports.

pub mod dispatcher;
pub mod reconcile_service;
pub mod tracking_service;

#[cfg(test)]
pub(crate) mod fakes;

pub use dispatcher::{DispatchSummary, Dispatcher};
pub use reconcile_service::{CycleReport, ReconcileService};
pub use tracking_service::TrackingService;
