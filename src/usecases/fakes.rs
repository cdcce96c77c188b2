//! In-memory port implementations for use-case tests.

use crate::domain::{
    ChannelIdentity, DestinationKind, DomainError, LiveEvent, NotificationDestination,
    TrackedEntity,
};
use crate::ports::{NotifierPort, StatusSource, TrackingStore};
use chrono::{DateTime, Utc};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

pub fn tracked(id: i64, username: &str, is_live: bool) -> TrackedEntity {
    TrackedEntity {
        id,
        username: username.into(),
        display_name: username.to_uppercase(),
        is_live,
        last_stream_start: None,
        last_notification_sent: None,
    }
}

pub fn destination(id: i64, kind: DestinationKind) -> NotificationDestination {
    NotificationDestination {
        id,
        kind,
        address: format!("dest-{}", id),
        enabled: true,
    }
}

pub fn live_event(username: &str) -> LiveEvent {
    LiveEvent {
        username: username.into(),
        display_name: username.to_uppercase(),
        title: "Playing".into(),
        game_name: "X".into(),
        thumbnail_url: String::new(),
        viewer_count: 10,
        started_at: None,
    }
}

pub fn live_event_at(username: &str, started_at: DateTime<Utc>) -> LiveEvent {
    LiveEvent {
        started_at: Some(started_at),
        ..live_event(username)
    }
}

#[derive(Default)]
pub struct FakeStore {
    pub entities: Mutex<Vec<TrackedEntity>>,
    pub destinations: Mutex<Vec<NotificationDestination>>,
    pub updates: AtomicUsize,
    pub fail_list: AtomicBool,
    pub fail_destinations: AtomicBool,
    /// Usernames whose update fails.
    pub fail_update_for: Mutex<HashSet<String>>,
}

impl FakeStore {
    pub fn with(entities: Vec<TrackedEntity>, destinations: Vec<NotificationDestination>) -> Self {
        Self {
            entities: Mutex::new(entities),
            destinations: Mutex::new(destinations),
            ..Default::default()
        }
    }

    pub fn get(&self, username: &str) -> Option<TrackedEntity> {
        self.entities
            .lock()
            .unwrap()
            .iter()
            .find(|e| e.username == username)
            .cloned()
    }

    pub fn update_count(&self) -> usize {
        self.updates.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl TrackingStore for FakeStore {
    async fn list_tracked(&self) -> Result<Vec<TrackedEntity>, DomainError> {
        if self.fail_list.load(Ordering::SeqCst) {
            return Err(DomainError::Store("list failed".into()));
        }
        Ok(self.entities.lock().unwrap().clone())
    }

    async fn list_enabled_destinations(&self) -> Result<Vec<NotificationDestination>, DomainError> {
        if self.fail_destinations.load(Ordering::SeqCst) {
            return Err(DomainError::Store("destinations unavailable".into()));
        }
        Ok(self
            .destinations
            .lock()
            .unwrap()
            .iter()
            .filter(|d| d.enabled)
            .cloned()
            .collect())
    }

    async fn update_tracked(&self, entity: &TrackedEntity) -> Result<(), DomainError> {
        if self.fail_update_for.lock().unwrap().contains(&entity.username) {
            return Err(DomainError::Store("write failed".into()));
        }
        let mut entities = self.entities.lock().unwrap();
        let slot = entities
            .iter_mut()
            .find(|e| e.id == entity.id)
            .ok_or_else(|| DomainError::NotFound(format!("streamer {}", entity.id)))?;
        *slot = entity.clone();
        self.updates.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn add_tracked(&self, identity: &ChannelIdentity) -> Result<TrackedEntity, DomainError> {
        let mut entities = self.entities.lock().unwrap();
        if entities.iter().any(|e| e.username == identity.login) {
            return Err(DomainError::Validation("already tracked".into()));
        }
        let mut entity = tracked(entities.len() as i64 + 1, &identity.login, false);
        entity.display_name = identity.display_name.clone();
        entities.push(entity.clone());
        Ok(entity)
    }

    async fn remove_tracked(&self, username: &str) -> Result<(), DomainError> {
        let mut entities = self.entities.lock().unwrap();
        let before = entities.len();
        entities.retain(|e| e.username != username);
        if entities.len() == before {
            return Err(DomainError::NotFound(username.to_string()));
        }
        Ok(())
    }

    async fn list_destinations(&self) -> Result<Vec<NotificationDestination>, DomainError> {
        Ok(self.destinations.lock().unwrap().clone())
    }

    async fn add_destination(
        &self,
        kind: DestinationKind,
        address: &str,
    ) -> Result<NotificationDestination, DomainError> {
        let mut destinations = self.destinations.lock().unwrap();
        let mut d = destination(destinations.len() as i64 + 1, kind);
        d.address = address.to_string();
        destinations.push(d.clone());
        Ok(d)
    }

    async fn set_destination_enabled(&self, id: i64, enabled: bool) -> Result<(), DomainError> {
        let mut destinations = self.destinations.lock().unwrap();
        let d = destinations
            .iter_mut()
            .find(|d| d.id == id)
            .ok_or_else(|| DomainError::NotFound(format!("destination {}", id)))?;
        d.enabled = enabled;
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeSource {
    pub live: Mutex<HashMap<String, LiveEvent>>,
    pub known: Mutex<Vec<ChannelIdentity>>,
    pub batch_calls: AtomicUsize,
    pub fail: AtomicBool,
}

impl FakeSource {
    pub fn set_live(&self, events: Vec<LiveEvent>) {
        *self.live.lock().unwrap() = events
            .into_iter()
            .map(|e| (e.username.clone(), e))
            .collect();
    }

    pub fn know(&self, login: &str, display_name: &str) {
        self.known.lock().unwrap().push(ChannelIdentity {
            id: format!("id-{}", login),
            login: login.into(),
            display_name: display_name.into(),
        });
    }

    pub fn calls(&self) -> usize {
        self.batch_calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl StatusSource for FakeSource {
    async fn authenticate(&self) -> Result<(), DomainError> {
        Ok(())
    }

    async fn resolve_identity(&self, name: &str) -> Result<ChannelIdentity, DomainError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(DomainError::Validation("empty".into()));
        }
        self.known
            .lock()
            .unwrap()
            .iter()
            .find(|i| i.login.eq_ignore_ascii_case(name))
            .cloned()
            .ok_or_else(|| DomainError::NotFound(name.to_string()))
    }

    async fn query_live_batch(
        &self,
        names: &BTreeSet<String>,
    ) -> Result<HashMap<String, LiveEvent>, DomainError> {
        self.batch_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(DomainError::Upstream("503".into()));
        }
        Ok(self
            .live
            .lock()
            .unwrap()
            .iter()
            .filter(|(name, _)| names.contains(*name))
            .map(|(name, event)| (name.clone(), event.clone()))
            .collect())
    }
}

/// Records every destination id it is asked to send to.
pub struct RecordingNotifier {
    kind: DestinationKind,
    fail: bool,
    delay: Option<Duration>,
    sent: Mutex<Vec<i64>>,
}

impl RecordingNotifier {
    pub fn new(kind: DestinationKind) -> Self {
        Self {
            kind,
            fail: false,
            delay: None,
            sent: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(kind: DestinationKind) -> Self {
        Self {
            fail: true,
            ..Self::new(kind)
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn sent_to(&self) -> Vec<i64> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl NotifierPort for RecordingNotifier {
    fn kind(&self) -> DestinationKind {
        self.kind
    }

    async fn send(
        &self,
        destination: &NotificationDestination,
        _event: &LiveEvent,
    ) -> Result<(), DomainError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.sent.lock().unwrap().push(destination.id);
        if self.fail {
            return Err(DomainError::Dispatch("HTTP 500".into()));
        }
        Ok(())
    }
}
