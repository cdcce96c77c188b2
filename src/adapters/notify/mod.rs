//! Notification adapters. One NotifierPort implementation per destination kind.

pub mod social;
pub mod webhook;

pub use social::SocialNotifier;
pub use webhook::WebhookNotifier;
