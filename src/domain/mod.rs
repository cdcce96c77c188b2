//! Core domain layer. No external I/O dependencies.
//!
//! Entities and business rules live here. Dependencies flow inward.

pub mod entities;
pub mod errors;

pub use entities::{
    ChannelIdentity, DestinationKind, LiveEvent, NotificationDestination, TrackedEntity,
};
pub use errors::DomainError;
