//! SQLite-backed tracking store via libsql. Implements TrackingStore.
//!
//! One database file (streams.db) with a `streamers` table and a
//! `notification_destinations` table. Timestamps are stored as RFC 3339 text.

use crate::domain::{
    ChannelIdentity, DestinationKind, DomainError, NotificationDestination, TrackedEntity,
};
use crate::ports::TrackingStore;
use chrono::{DateTime, Utc};
use libsql::{Connection, Database, Row, params};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const STREAMERS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS streamers (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    username TEXT NOT NULL UNIQUE,
    display_name TEXT NOT NULL,
    is_live INTEGER NOT NULL DEFAULT 0,
    last_stream_start TEXT,
    last_notification_sent TEXT
)"#;

const DESTINATIONS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS notification_destinations (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    kind TEXT NOT NULL,
    destination TEXT NOT NULL,
    enabled INTEGER NOT NULL DEFAULT 1
)"#;

const STREAMER_COLUMNS: &str =
    "id, username, display_name, is_live, last_stream_start, last_notification_sent";

fn store_err(e: impl std::fmt::Display) -> DomainError {
    DomainError::Store(e.to_string())
}

fn encode_ts(ts: Option<DateTime<Utc>>) -> Option<String> {
    ts.map(|t| t.to_rfc3339())
}

fn decode_ts(raw: Option<String>) -> Option<DateTime<Utc>> {
    raw.and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
        .map(|t| t.with_timezone(&Utc))
}

/// SQLite repository. Safe to share via Arc; each call opens a connection.
pub struct SqliteRepo {
    db: Database,
    db_path: PathBuf,
}

impl SqliteRepo {
    /// Connect to (or create) `streams.db` in `base_dir` and ensure the schema exists.
    pub async fn connect(base_dir: impl AsRef<Path>) -> Result<Self, DomainError> {
        let base = base_dir.as_ref();
        std::fs::create_dir_all(base).map_err(store_err)?;
        let db_path = base.join("streams.db");
        let path_str = db_path.to_string_lossy();
        let db = libsql::Builder::new_local(path_str.as_ref())
            .build()
            .await
            .map_err(store_err)?;
        let conn = db.connect().map_err(store_err)?;

        // PRAGMA returns a row; consume it (execute fails when rows are returned).
        let mut wal_rows = conn
            .query("PRAGMA journal_mode=WAL", ())
            .await
            .map_err(|e| DomainError::Store(format!("WAL pragma failed: {}", e)))?;
        while wal_rows.next().await.map_err(store_err)?.is_some() {}

        conn.execute(STREAMERS_TABLE, ()).await.map_err(store_err)?;
        conn.execute(DESTINATIONS_TABLE, ())
            .await
            .map_err(store_err)?;

        info!(path = %db_path.display(), "SQLite tracking store ready");
        Ok(Self { db, db_path })
    }

    pub fn path(&self) -> &Path {
        &self.db_path
    }

    fn conn(&self) -> Result<Connection, DomainError> {
        self.db.connect().map_err(store_err)
    }

    fn row_to_entity(row: &Row) -> Result<TrackedEntity, DomainError> {
        Ok(TrackedEntity {
            id: row.get(0).map_err(store_err)?,
            username: row.get(1).map_err(store_err)?,
            display_name: row.get::<String>(2).unwrap_or_default(),
            is_live: row.get::<i64>(3).map_err(store_err)? != 0,
            last_stream_start: decode_ts(row.get::<String>(4).ok()),
            last_notification_sent: decode_ts(row.get::<String>(5).ok()),
        })
    }

    fn row_to_destination(row: &Row) -> Result<NotificationDestination, DomainError> {
        let kind: String = row.get(1).map_err(store_err)?;
        Ok(NotificationDestination {
            id: row.get(0).map_err(store_err)?,
            kind: kind.parse()?,
            address: row.get(2).map_err(store_err)?,
            enabled: row.get::<i64>(3).map_err(store_err)? != 0,
        })
    }

    async fn query_destinations(
        &self,
        only_enabled: bool,
    ) -> Result<Vec<NotificationDestination>, DomainError> {
        let sql = if only_enabled {
            "SELECT id, kind, destination, enabled FROM notification_destinations WHERE enabled = 1 ORDER BY id"
        } else {
            "SELECT id, kind, destination, enabled FROM notification_destinations ORDER BY id"
        };
        let conn = self.conn()?;
        let mut rows = conn.query(sql, ()).await.map_err(store_err)?;
        let mut out = Vec::new();
        while let Some(row) = rows.next().await.map_err(store_err)? {
            out.push(Self::row_to_destination(&row)?);
        }
        Ok(out)
    }
}

#[async_trait::async_trait]
impl TrackingStore for SqliteRepo {
    async fn list_tracked(&self) -> Result<Vec<TrackedEntity>, DomainError> {
        let conn = self.conn()?;
        let mut rows = conn
            .query(
                &format!("SELECT {} FROM streamers ORDER BY id", STREAMER_COLUMNS),
                (),
            )
            .await
            .map_err(store_err)?;
        let mut entities = Vec::new();
        while let Some(row) = rows.next().await.map_err(store_err)? {
            entities.push(Self::row_to_entity(&row)?);
        }
        Ok(entities)
    }

    async fn list_enabled_destinations(&self) -> Result<Vec<NotificationDestination>, DomainError> {
        self.query_destinations(true).await
    }

    async fn update_tracked(&self, entity: &TrackedEntity) -> Result<(), DomainError> {
        let conn = self.conn()?;
        let changed = conn
            .execute(
                r#"
                UPDATE streamers
                SET display_name = ?1, is_live = ?2, last_stream_start = ?3, last_notification_sent = ?4
                WHERE id = ?5
                "#,
                params![
                    entity.display_name.as_str(),
                    entity.is_live as i64,
                    encode_ts(entity.last_stream_start),
                    encode_ts(entity.last_notification_sent),
                    entity.id
                ],
            )
            .await
            .map_err(store_err)?;
        if changed == 0 {
            return Err(DomainError::NotFound(format!(
                "streamer {} ({})",
                entity.username, entity.id
            )));
        }
        debug!(streamer = %entity.username, is_live = entity.is_live, "streamer updated");
        Ok(())
    }

    async fn add_tracked(&self, identity: &ChannelIdentity) -> Result<TrackedEntity, DomainError> {
        let conn = self.conn()?;
        let mut existing = conn
            .query(
                "SELECT id FROM streamers WHERE username = ?1",
                params![identity.login.as_str()],
            )
            .await
            .map_err(store_err)?;
        if existing.next().await.map_err(store_err)?.is_some() {
            return Err(DomainError::Validation(format!(
                "streamer already tracked: {}",
                identity.login
            )));
        }

        conn.execute(
            "INSERT INTO streamers (username, display_name, is_live) VALUES (?1, ?2, 0)",
            params![identity.login.as_str(), identity.display_name.as_str()],
        )
        .await
        .map_err(store_err)?;

        Ok(TrackedEntity {
            id: conn.last_insert_rowid(),
            username: identity.login.clone(),
            display_name: identity.display_name.clone(),
            is_live: false,
            last_stream_start: None,
            last_notification_sent: None,
        })
    }

    async fn remove_tracked(&self, username: &str) -> Result<(), DomainError> {
        let conn = self.conn()?;
        let removed = conn
            .execute(
                "DELETE FROM streamers WHERE username = ?1",
                params![username],
            )
            .await
            .map_err(store_err)?;
        if removed == 0 {
            return Err(DomainError::NotFound(format!(
                "streamer not tracked: {}",
                username
            )));
        }
        Ok(())
    }

    async fn list_destinations(&self) -> Result<Vec<NotificationDestination>, DomainError> {
        self.query_destinations(false).await
    }

    async fn add_destination(
        &self,
        kind: DestinationKind,
        address: &str,
    ) -> Result<NotificationDestination, DomainError> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO notification_destinations (kind, destination, enabled) VALUES (?1, ?2, 1)",
            params![kind.as_str(), address],
        )
        .await
        .map_err(store_err)?;
        Ok(NotificationDestination {
            id: conn.last_insert_rowid(),
            kind,
            address: address.to_string(),
            enabled: true,
        })
    }

    async fn set_destination_enabled(&self, id: i64, enabled: bool) -> Result<(), DomainError> {
        let conn = self.conn()?;
        let changed = conn
            .execute(
                "UPDATE notification_destinations SET enabled = ?1 WHERE id = ?2",
                params![enabled as i64, id],
            )
            .await
            .map_err(store_err)?;
        if changed == 0 {
            return Err(DomainError::NotFound(format!("destination {}", id)));
        }
        Ok(())
    }
}
