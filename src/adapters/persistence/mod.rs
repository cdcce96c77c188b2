//! Persistence adapters. Implement TrackingStore.

pub mod sqlite_repo;

pub use sqlite_repo::SqliteRepo;
