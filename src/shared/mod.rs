//! Cross-cutting helpers: configuration and retry policy.

pub mod config;
pub mod retry;
