//! Domain errors. Used by ports and use cases.
//!
//! Adapters map infrastructure errors into these.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DomainError {
    /// Bad caller input (e.g. an empty streamer name).
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Streamer, destination or record absent.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Transport failure or non-2xx response from the streaming platform.
    #[error("Upstream error: {0}")]
    Upstream(String),

    /// Upstream answered, but the payload could not be decoded.
    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Store error: {0}")]
    Store(String),

    /// Delivery to a single notification destination failed.
    #[error("Dispatch failed: {0}")]
    Dispatch(String),

    #[error("Configuration error: {0}")]
    Config(String),

    /// A background task panicked or was cancelled.
    #[error("Task failed: {0}")]
    Task(String),
}

impl DomainError {
    /// True for failures caused by the caller rather than infrastructure.
    pub fn is_client_error(&self) -> bool {
        matches!(self, DomainError::Validation(_) | DomainError::NotFound(_))
    }
}
