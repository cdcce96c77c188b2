//! Infrastructure adapters. Implement outbound ports.
//!
//! Twitch Helix, notification sinks, SQLite, terminal UI. Map errors to DomainError.

pub mod notify;
pub mod persistence;
pub mod twitch;
pub mod ui;

#[cfg(test)]
pub(crate) mod test_support;
