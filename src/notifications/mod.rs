//! Notification emitter
//!
//! Transactional outbox: transitions enqueue in the same transaction,
//! a background relay delivers to WebSocket clients afterwards.

pub mod model;
mod relay;
mod service;

pub use model::{Notification, UnreadCount};
pub use relay::notification_relay;
pub use service::NotificationService;
