//! Headless operation: start the monitor immediately and stop on Ctrl-C.

use crate::domain::DomainError;
use crate::ports::InputPort;
use crate::usecases::ReconcileService;
use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinError;
use tracing::{error, info};

/// Run the reconciliation loop until `stop` resolves, then let the current
/// cycle finish and return.
pub async fn run_monitor<F>(service: Arc<ReconcileService>, stop: F) -> Result<(), DomainError>
where
    F: Future<Output = ()>,
{
    let (tx, rx) = watch::channel(false);
    let worker = Arc::clone(&service);
    let handle = tokio::spawn(async move { worker.run(rx).await });

    stop.await;
    info!("shutdown requested; waiting for the current cycle");
    // Receiver may already be gone if the loop exited on its own.
    let _ = tx.send(true);

    monitor_exit(handle.await)
}

fn monitor_exit(joined: Result<(), JoinError>) -> Result<(), DomainError> {
    joined.map_err(|e| {
        error!(error = %e, "monitor task failed");
        DomainError::Task(format!("monitor task failed: {}", e))
    })
}

/// Resolves on Ctrl-C. If the signal handler cannot be installed the future
/// never resolves and the process is stopped externally.
pub async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
}

pub struct HeadlessInputPort {
    reconcile: Arc<ReconcileService>,
}

impl HeadlessInputPort {
    pub fn new(reconcile: Arc<ReconcileService>) -> Self {
        Self { reconcile }
    }
}

#[async_trait]
impl InputPort for HeadlessInputPort {
    async fn run(&self) -> Result<(), DomainError> {
        info!("running headless; press Ctrl-C to stop");
        run_monitor(Arc::clone(&self.reconcile), ctrl_c()).await
    }
}
