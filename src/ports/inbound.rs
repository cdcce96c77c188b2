//! Inbound port. UI (adapter) calls into the application.

use crate::domain::DomainError;

/// Input port: the operator surface drives the application through this.
#[async_trait::async_trait]
pub trait InputPort: Send + Sync {
    /// Run the operator session (menu or headless monitor) until it exits.
    async fn run(&self) -> Result<(), DomainError>;
}
