//! Reconciliation loop: detect offline ↔ live transitions and notify.
//!
//! Each cycle: list tracked streamers -> one batched live query -> diff against
//! the stored flag -> persist changed streamers -> fan out go-live events.
//! A failure in one streamer's write or one destination's send never aborts
//! the rest of the cycle; a failure to list or query aborts only this cycle.

use crate::domain::{DomainError, LiveEvent, NotificationDestination, TrackedEntity};
use crate::ports::{StatusSource, TrackingStore};
use crate::usecases::dispatcher::Dispatcher;
use chrono::Utc;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::{Mutex, watch};
use tokio::time::MissedTickBehavior;
use tracing::{Instrument, debug, error, info, info_span, warn};

/// What one cycle observed and did.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CycleReport {
    pub tracked: usize,
    pub went_live: usize,
    pub went_offline: usize,
    pub store_failures: usize,
    pub dispatch_attempts: usize,
    pub dispatch_failures: usize,
    /// The previous cycle was still running; nothing was done.
    pub skipped: bool,
}

/// Logins are matched case-insensitively, ignoring surrounding whitespace.
fn live_key(username: &str) -> String {
    username.trim().to_lowercase()
}

/// Stream monitor. Runs reconciliation cycles on a fixed interval.
pub struct ReconcileService {
    store: Arc<dyn TrackingStore>,
    source: Arc<dyn StatusSource>,
    dispatcher: Arc<Dispatcher>,
    interval: Duration,
    /// Held for the duration of a cycle; a second caller skips instead of overlapping.
    running: Mutex<()>,
    cycles: AtomicU64,
}

impl ReconcileService {
    pub fn new(
        store: Arc<dyn TrackingStore>,
        source: Arc<dyn StatusSource>,
        dispatcher: Arc<Dispatcher>,
        interval: Duration,
    ) -> Self {
        Self {
            store,
            source,
            dispatcher,
            interval,
            running: Mutex::new(()),
            cycles: AtomicU64::new(0),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Run cycles until `shutdown` turns true (or its sender is dropped).
    /// The first cycle starts immediately. Shutdown is observed between
    /// cycles; an in-flight cycle always runs to completion.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        info!(
            interval_secs = self.interval.as_secs(),
            "stream monitor started"
        );
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            if *shutdown.borrow() {
                break;
            }
            tokio::select! {
                biased;
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
                _ = ticker.tick() => {
                    if let Err(e) = self.run_cycle().await {
                        error!(error = %e, "reconciliation cycle failed");
                    }
                }
            }
        }

        info!("stream monitor stopped");
    }

    /// One reconciliation pass. Skipped (not queued) if another is running.
    pub async fn run_cycle(&self) -> Result<CycleReport, DomainError> {
        let Ok(_guard) = self.running.try_lock() else {
            warn!("previous cycle still running; skipping");
            return Ok(CycleReport {
                skipped: true,
                ..Default::default()
            });
        };
        let n = self.cycles.fetch_add(1, Ordering::Relaxed) + 1;
        self.reconcile().instrument(info_span!("cycle", n)).await
    }

    async fn reconcile(&self) -> Result<CycleReport, DomainError> {
        let tracked = self.store.list_tracked().await?;
        let mut report = CycleReport {
            tracked: tracked.len(),
            ..Default::default()
        };
        if tracked.is_empty() {
            debug!("no tracked streamers");
            return Ok(report);
        }

        let names: BTreeSet<String> = tracked.iter().map(|e| live_key(&e.username)).collect();
        let mut live = self.source.query_live_batch(&names).await?;

        let transitions: Vec<(TrackedEntity, Option<LiveEvent>)> = tracked
            .into_iter()
            .filter_map(|entity| {
                let observed = live.remove(&live_key(&entity.username));
                match (entity.is_live, observed) {
                    (false, Some(event)) => Some((entity, Some(event))),
                    (true, None) => Some((entity, None)),
                    _ => None,
                }
            })
            .collect();

        if transitions.is_empty() {
            debug!(tracked = report.tracked, "no transitions");
            return Ok(report);
        }

        // Loaded before any write so a failure here leaves every transition
        // to be detected again next cycle.
        let destinations = if transitions.iter().any(|(_, event)| event.is_some()) {
            self.store.list_enabled_destinations().await?
        } else {
            Vec::new()
        };

        for (entity, observed) in transitions {
            match observed {
                Some(event) => self.go_live(entity, event, &destinations, &mut report).await,
                None => self.go_offline(entity, &mut report).await,
            }
        }

        info!(
            tracked = report.tracked,
            went_live = report.went_live,
            went_offline = report.went_offline,
            store_failures = report.store_failures,
            dispatch_failures = report.dispatch_failures,
            "cycle complete"
        );
        Ok(report)
    }

    async fn go_live(
        &self,
        mut entity: TrackedEntity,
        event: LiveEvent,
        destinations: &[NotificationDestination],
        report: &mut CycleReport,
    ) {
        entity.mark_live(event.started_at, Utc::now());
        if let Err(e) = self.store.update_tracked(&entity).await {
            report.store_failures += 1;
            error!(
                streamer = %entity.username,
                error = %e,
                "failed to persist live state; notifications skipped"
            );
            return;
        }
        report.went_live += 1;
        info!(
            streamer = %entity.display_name,
            game = %event.game_name,
            "{} went live playing {}",
            entity.display_name,
            event.game_name
        );

        let summary = self.dispatcher.dispatch(destinations, &event).await;
        report.dispatch_attempts += summary.attempted;
        report.dispatch_failures += summary.failures.len();
        if summary.failures.is_empty() {
            info!(
                streamer = %entity.display_name,
                sent = summary.delivered(),
                "all notifications sent"
            );
        } else {
            warn!(
                streamer = %entity.display_name,
                attempted = summary.attempted,
                delivered = summary.delivered(),
                failed = summary.failures.len(),
                "sent notifications for {} with {} errors",
                entity.display_name,
                summary.failures.len()
            );
        }
    }

    async fn go_offline(&self, mut entity: TrackedEntity, report: &mut CycleReport) {
        entity.mark_offline();
        match self.store.update_tracked(&entity).await {
            Ok(()) => {
                report.went_offline += 1;
                info!(streamer = %entity.display_name, "went offline");
            }
            Err(e) => {
                report.store_failures += 1;
                error!(
                    streamer = %entity.username,
                    error = %e,
                    "failed to persist offline state"
                );
            }
        }
    }
}
