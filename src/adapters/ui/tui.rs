//! Implements InputPort. Inquire-based interactive menu.

use crate::adapters::ui::headless::{ctrl_c, run_monitor};
use crate::domain::{DestinationKind, DomainError, NotificationDestination, TrackedEntity};
use crate::ports::InputPort;
use crate::usecases::{CycleReport, ReconcileService, TrackingService};
use async_trait::async_trait;
use inquire::error::InquireError;
use inquire::{Confirm, Select, Text};
use std::fmt;
use std::sync::Arc;
use tracing::{error, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MenuAction {
    StartMonitor,
    CheckNow,
    Track,
    Untrack,
    AddDestination,
    ToggleDestination,
    Show,
    Exit,
}

impl MenuAction {
    const ALL: [MenuAction; 8] = [
        MenuAction::StartMonitor,
        MenuAction::CheckNow,
        MenuAction::Track,
        MenuAction::Untrack,
        MenuAction::AddDestination,
        MenuAction::ToggleDestination,
        MenuAction::Show,
        MenuAction::Exit,
    ];
}

impl fmt::Display for MenuAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            MenuAction::StartMonitor => "Start monitor (Ctrl-C to stop)",
            MenuAction::CheckNow => "Run one check now",
            MenuAction::Track => "Track a streamer",
            MenuAction::Untrack => "Stop tracking a streamer",
            MenuAction::AddDestination => "Add notification destination",
            MenuAction::ToggleDestination => "Enable / disable a destination",
            MenuAction::Show => "Show streamers and destinations",
            MenuAction::Exit => "Exit",
        };
        f.write_str(label)
    }
}

fn streamer_line(e: &TrackedEntity) -> String {
    let status = if e.is_live { "LIVE" } else { "offline" };
    let last = e
        .last_notification_sent
        .map(|t| t.format("%Y-%m-%d %H:%M UTC").to_string())
        .unwrap_or_else(|| "never".into());
    format!(
        "{} ({}) [{}] last alert: {}",
        e.display_name, e.username, status, last
    )
}

fn destination_line(d: &NotificationDestination) -> String {
    let state = if d.enabled { "on" } else { "off" };
    format!("#{} {} -> {} [{}]", d.id, d.kind, d.address, state)
}

fn report_line(r: &CycleReport) -> String {
    if r.skipped {
        return "A check is already running; skipped.".into();
    }
    format!(
        "Checked {} streamer(s): {} went live, {} went offline, {}/{} notifications sent.",
        r.tracked,
        r.went_live,
        r.went_offline,
        r.dispatch_attempts - r.dispatch_failures,
        r.dispatch_attempts
    )
}

/// Ok(None) when the operator cancels the prompt (Esc / Ctrl-C).
fn answered<T>(result: Result<T, InquireError>) -> Result<Option<T>, DomainError> {
    match result {
        Ok(v) => Ok(Some(v)),
        Err(InquireError::OperationCanceled) | Err(InquireError::OperationInterrupted) => Ok(None),
        Err(e) => Err(DomainError::Validation(format!("prompt failed: {}", e))),
    }
}

/// TUI adapter. Inquire prompts.
pub struct TuiInputPort {
    tracking: Arc<TrackingService>,
    reconcile: Arc<ReconcileService>,
}

impl TuiInputPort {
    pub fn new(tracking: Arc<TrackingService>, reconcile: Arc<ReconcileService>) -> Self {
        Self {
            tracking,
            reconcile,
        }
    }

    async fn handle(&self, action: MenuAction) -> Result<(), DomainError> {
        match action {
            MenuAction::StartMonitor => {
                println!(
                    "Monitoring every {}s. Press Ctrl-C to stop.",
                    self.reconcile.interval().as_secs()
                );
                run_monitor(Arc::clone(&self.reconcile), ctrl_c()).await?;
                println!("Monitor stopped.");
            }
            MenuAction::CheckNow => {
                let report = self.reconcile.run_cycle().await?;
                println!("{}", report_line(&report));
            }
            MenuAction::Track => {
                let Some(name) = answered(Text::new("Twitch username:").prompt())? else {
                    return Ok(());
                };
                let entity = self.tracking.track(&name).await?;
                println!("Now tracking {}.", streamer_line(&entity));
            }
            MenuAction::Untrack => {
                let tracked = self.tracking.list_tracked().await?;
                if tracked.is_empty() {
                    println!("No streamers tracked.");
                    return Ok(());
                }
                let names: Vec<String> = tracked.into_iter().map(|e| e.username).collect();
                let Some(name) = answered(Select::new("Stop tracking:", names).prompt())? else {
                    return Ok(());
                };
                self.tracking.untrack(&name).await?;
                println!("Stopped tracking {}.", name);
            }
            MenuAction::AddDestination => {
                let kinds = vec![DestinationKind::ChatWebhook, DestinationKind::SocialPost];
                let Some(kind) = answered(Select::new("Destination type:", kinds).prompt())? else {
                    return Ok(());
                };
                let label = match kind {
                    DestinationKind::ChatWebhook => "Webhook URL:",
                    DestinationKind::SocialPost => "Account handle:",
                };
                let Some(address) = answered(Text::new(label).prompt())? else {
                    return Ok(());
                };
                let d = self.tracking.add_destination(kind, &address).await?;
                println!("Added {}.", destination_line(&d));
            }
            MenuAction::ToggleDestination => {
                let destinations = self.tracking.list_destinations().await?;
                if destinations.is_empty() {
                    println!("No destinations configured.");
                    return Ok(());
                }
                let options: Vec<String> = destinations.iter().map(destination_line).collect();
                let Some(idx) = answered(
                    Select::new("Destination:", options)
                        .raw_prompt()
                        .map(|o| o.index),
                )?
                else {
                    return Ok(());
                };
                let d = &destinations[idx];
                let Some(enabled) = answered(
                    Confirm::new("Enabled?")
                        .with_default(!d.enabled)
                        .prompt(),
                )?
                else {
                    return Ok(());
                };
                self.tracking.set_destination_enabled(d.id, enabled).await?;
            }
            MenuAction::Show => {
                let tracked = self.tracking.list_tracked().await?;
                println!("Streamers ({}):", tracked.len());
                for e in &tracked {
                    println!("  {}", streamer_line(e));
                }
                let destinations = self.tracking.list_destinations().await?;
                println!("Destinations ({}):", destinations.len());
                for d in &destinations {
                    println!("  {}", destination_line(d));
                }
            }
            MenuAction::Exit => {}
        }
        Ok(())
    }
}

#[async_trait]
impl InputPort for TuiInputPort {
    async fn run(&self) -> Result<(), DomainError> {
        loop {
            let choice = answered(
                Select::new("What next?", MenuAction::ALL.to_vec())
                    .with_page_size(MenuAction::ALL.len())
                    .prompt(),
            )?;
            let action = choice.unwrap_or(MenuAction::Exit);
            if action == MenuAction::Exit {
                return Ok(());
            }
            if let Err(e) = self.handle(action).await {
                if e.is_client_error() {
                    warn!(error = %e, "request rejected");
                } else {
                    error!(error = %e, "operation failed");
                }
                println!("Error: {}", e);
            }
        }
    }
}
