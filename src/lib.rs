//! stream-notify: Twitch go-live monitor with chat webhook and social post alerts,
//! laid out as a hexagonal architecture.

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod shared;
pub mod usecases;
