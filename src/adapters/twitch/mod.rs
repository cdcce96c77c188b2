//! Twitch Helix adapter. Implements StatusSource.

pub mod auth;
pub mod client;
pub mod mapper;

pub use auth::{AccessCredential, TokenProvider};
pub use client::HelixClient;
